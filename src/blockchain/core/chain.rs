use crate::config::{LedgerConfig, MAX_DIFFICULTY};
use crate::crypto::sha256_hex;
use crate::error::{LedgerError, Result};
use crate::registry::{Identity, Registration, Registry, Role};
use crate::transaction::{SignatureMode, Transaction, TxKind};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::search::AttestationReceipt;

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Milliseconds since the Unix epoch.
    pub(crate) timestamp: i64,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) previous_hash: String,
    pub(crate) hash: String,
    pub(crate) nonce: u64,
}

impl Block {
    pub fn new(timestamp: i64, transactions: Vec<Transaction>, previous_hash: &str) -> Self {
        let mut block = Block {
            timestamp,
            transactions,
            previous_hash: previous_hash.to_string(),
            hash: String::new(),
            nonce: 0,
        };
        block.hash = block.calculate_hash();
        block
    }

    pub fn calculate_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.previous_hash.as_bytes());
        hasher.update(self.timestamp.to_string());
        for tx in &self.transactions {
            hasher.update(tx.content_digest());
        }
        hasher.update(self.nonce.to_string());
        hex::encode(hasher.finalize())
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn timestamp_rfc3339(&self) -> String {
        chrono::DateTime::from_timestamp_millis(self.timestamp)
            .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
            .unwrap_or_default()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Submission {
    /// Admitted to the pending queue.
    Queued { transaction_id: String },
    /// Attestations skip the queue and are mined into their own block.
    Attested(AttestationReceipt),
}

#[derive(Debug)]
pub struct Ledger {
    pub(crate) chain: Vec<Block>,
    pub(crate) pending: Vec<Transaction>,
    pub(crate) difficulty: usize,
    pub(crate) signature_mode: SignatureMode,
    pub(crate) registry: Registry,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(&LedgerConfig::default())
    }
}

impl Ledger {
    pub fn new(config: &LedgerConfig) -> Self {
        let difficulty = config.difficulty.min(MAX_DIFFICULTY);
        info!(difficulty, basic_mode = config.basic_mode, "creating ledger");
        Ledger {
            chain: vec![Self::create_genesis_block()],
            pending: Vec::new(),
            difficulty,
            signature_mode: config.signature_mode(),
            registry: Registry::new(),
        }
    }

    /// Strict-mode ledger with the given proof-of-work difficulty.
    pub fn with_difficulty(difficulty: usize) -> Self {
        Self::new(&LedgerConfig {
            difficulty,
            basic_mode: false,
        })
    }

    fn create_genesis_block() -> Block {
        Block::new(
            now_millis(),
            vec![Transaction::genesis()],
            GENESIS_PREVIOUS_HASH,
        )
    }

    /// Discards identities, pending transactions and blocks; keeps configuration.
    pub fn reset(&mut self) {
        self.chain = vec![Self::create_genesis_block()];
        self.pending.clear();
        self.registry = Registry::new();
        info!("ledger reset");
    }

    pub fn register(&mut self, username: &str, role: &str) -> Result<Registration> {
        self.registry.register(username, role)
    }

    pub fn register_role(&mut self, username: &str, role: Role) -> Result<Registration> {
        self.registry.register_role(username, role)
    }

    pub fn lookup_by_username(&self, username: &str) -> Option<&Identity> {
        self.registry.lookup_by_username(username)
    }

    pub fn lookup_by_address(&self, address: &str) -> Option<&Identity> {
        self.registry.lookup_by_address(address)
    }

    pub fn validate_secret(&self, username: &str, secret: &str) -> bool {
        self.registry.validate_secret(username, secret)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn signature_mode(&self) -> SignatureMode {
        self.signature_mode
    }

    pub fn latest_block(&self) -> Option<&Block> {
        self.chain.last()
    }

    fn tip_hash(&self) -> String {
        self.latest_block()
            .map(|b| b.hash.clone())
            .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string())
    }

    /// Validates `tx`, applies the admission rules for its kind and either
    /// queues it or, for attestations, mines it straight into its own block.
    pub fn submit_transaction(&mut self, tx: Transaction) -> Result<Submission> {
        if !tx.is_valid_in(self.signature_mode) {
            warn!(id = %tx.id(), kind = tx.kind().as_str(), "rejected transaction with invalid signature");
            return Err(LedgerError::InvalidSignature);
        }

        if let Err(e) = self.check_admission(&tx) {
            warn!(id = %tx.id(), kind = tx.kind().as_str(), error = %e, "transaction not admitted");
            return Err(e);
        }

        if tx.kind() == TxKind::Attestation {
            return Ok(Submission::Attested(self.record_attestation(tx)));
        }

        let transaction_id = tx.id().to_string();
        info!(id = %transaction_id, kind = tx.kind().as_str(), amount = tx.amount(), "transaction queued");
        self.pending.push(tx);
        Ok(Submission::Queued { transaction_id })
    }

    /// Records that `digest` existed now, labelled `label`.
    pub fn attest(&mut self, digest: &str, label: &str) -> Result<AttestationReceipt> {
        let tx = Transaction::attestation(digest, label);
        if !tx.is_valid() {
            warn!(digest, label, "rejected attestation without digest or label");
            return Err(LedgerError::InvalidSignature);
        }
        self.check_admission(&tx)?;
        Ok(self.record_attestation(tx))
    }

    /// Attests the SHA-256 digest of `content`.
    pub fn attest_content(&mut self, content: &[u8], label: &str) -> Result<AttestationReceipt> {
        self.attest(&sha256_hex(content), label)
    }

    fn record_attestation(&mut self, tx: Transaction) -> AttestationReceipt {
        let mut block = Block::new(now_millis(), vec![tx.clone()], &self.tip_hash());
        block.mine(self.difficulty);

        let (digest, label) = tx.attested().unwrap_or_default();
        let receipt = AttestationReceipt {
            block_hash: block.hash.clone(),
            transaction_id: tx.id().to_string(),
            digest: digest.to_string(),
            label: label.to_string(),
            timestamp: tx.timestamp().to_string(),
        };
        info!(digest = %receipt.digest, block = %receipt.block_hash, "attestation recorded");
        self.chain.push(block);
        receipt
    }

    /// Mines the whole pending queue into one block on behalf of a payment
    /// provider. Returns `None` when there is nothing to mine.
    pub fn mine_pending(&mut self, miner_username: &str) -> Result<Option<Block>> {
        match self.registry.lookup_by_username(miner_username) {
            Some(identity) if identity.role() == Role::PaymentProvider => {}
            _ => {
                warn!(miner = miner_username, "mining refused");
                return Err(LedgerError::PermissionDenied(format!(
                    "only payment providers can mine blocks: {}",
                    miner_username
                )));
            }
        }

        if self.pending.is_empty() {
            debug!(miner = miner_username, "nothing to mine");
            return Ok(None);
        }

        let transactions = std::mem::take(&mut self.pending);
        let mut block = Block::new(now_millis(), transactions, &self.tip_hash());
        block.mine(self.difficulty);

        self.apply_block_effects(&block);
        self.chain.push(block.clone());

        info!(
            miner = miner_username,
            height = self.chain.len() - 1,
            hash = %block.hash,
            transactions = block.transactions.len(),
            "block mined"
        );
        Ok(Some(block))
    }
}
