//! Read-only lookups over recorded blocks.

use crate::crypto::sha256_hex;
use crate::registry::{Balance, Role};
use crate::transaction::{Transaction, TxKind};
use serde::Serialize;

use super::chain::{Block, Ledger};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SearchHit {
    Block(Block),
    Transaction(TransactionHit),
}

/// A recorded transaction enriched with who sent it and where it lives.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionHit {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub from_username: Option<String>,
    pub to_username: Option<String>,
    pub block_hash: String,
    pub block_timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Sent,
    Received,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressTransaction {
    #[serde(flatten)]
    pub hit: TransactionHit,
    pub block_index: usize,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub total_transactions: usize,
    pub total_received: u64,
    pub total_sent: u64,
    pub current_balance: Balance,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressActivity {
    pub address: String,
    pub username: Option<String>,
    pub role: Option<Role>,
    /// Most recent block first.
    pub transactions: Vec<AddressTransaction>,
    pub summary: ActivitySummary,
}

/// Returned when an attestation is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationReceipt {
    pub block_hash: String,
    pub transaction_id: String,
    pub digest: String,
    pub label: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationRecord {
    pub digest: String,
    pub label: String,
    pub timestamp: String,
    pub block_hash: String,
    pub transaction_id: String,
    pub block_timestamp: String,
}

impl AttestationRecord {
    fn new(block: &Block, tx: &Transaction) -> Option<Self> {
        let (digest, label) = tx.attested()?;
        Some(AttestationRecord {
            digest: digest.to_string(),
            label: label.to_string(),
            timestamp: tx.timestamp().to_string(),
            block_hash: block.hash().to_string(),
            transaction_id: tx.id().to_string(),
            block_timestamp: block.timestamp_rfc3339(),
        })
    }
}

impl Ledger {
    fn username_of(&self, address: Option<&str>) -> Option<String> {
        address
            .and_then(|a| self.registry.lookup_by_address(a))
            .map(|identity| identity.username().to_string())
    }

    fn transaction_hit(&self, block: &Block, tx: &Transaction) -> TransactionHit {
        TransactionHit {
            transaction: tx.clone(),
            from_username: self.username_of(tx.from_address()),
            to_username: self.username_of(tx.to_address()),
            block_hash: block.hash().to_string(),
            block_timestamp: block.timestamp_rfc3339(),
        }
    }

    /// Block hashes are matched first, then transaction ids.
    pub fn search_by_hash(&self, hash: &str) -> Option<SearchHit> {
        if let Some(block) = self.chain.iter().find(|block| block.hash() == hash) {
            return Some(SearchHit::Block(block.clone()));
        }

        self.chain.iter().find_map(|block| {
            block
                .transactions()
                .iter()
                .find(|tx| tx.id() == hash)
                .map(|tx| SearchHit::Transaction(self.transaction_hit(block, tx)))
        })
    }

    /// Every recorded transaction touching `address`, newest block first,
    /// with totals that ignore genesis transactions.
    pub fn search_by_address(&self, address: &str) -> AddressActivity {
        let Some(identity) = self.registry.lookup_by_address(address) else {
            return AddressActivity {
                address: address.to_string(),
                username: None,
                role: None,
                transactions: Vec::new(),
                summary: ActivitySummary::default(),
            };
        };

        let mut transactions = Vec::new();
        let mut summary = ActivitySummary::default();

        for (block_index, block) in self.chain.iter().enumerate() {
            for tx in block.transactions() {
                let received = tx.to_address() == Some(address);
                let sent = tx.from_address() == Some(address);
                if !received && !sent {
                    continue;
                }

                if tx.kind() != TxKind::Genesis {
                    if received {
                        summary.total_received = summary.total_received.saturating_add(tx.amount());
                    } else {
                        summary.total_sent = summary.total_sent.saturating_add(tx.amount());
                    }
                }

                transactions.push(AddressTransaction {
                    hit: self.transaction_hit(block, tx),
                    block_index,
                    direction: if received {
                        Direction::Received
                    } else {
                        Direction::Sent
                    },
                });
            }
        }

        transactions.sort_by(|a, b| b.block_index.cmp(&a.block_index));
        summary.total_transactions = transactions.len();
        summary.current_balance = identity.balance();

        AddressActivity {
            address: address.to_string(),
            username: Some(identity.username().to_string()),
            role: Some(identity.role()),
            transactions,
            summary,
        }
    }

    pub fn find_attestation(&self, digest: &str) -> Option<AttestationRecord> {
        self.chain.iter().find_map(|block| {
            block
                .transactions()
                .iter()
                .find(|tx| matches!(tx.attested(), Some((d, _)) if d == digest))
                .and_then(|tx| AttestationRecord::new(block, tx))
        })
    }

    /// Hashes `content` and looks up its attestation.
    pub fn verify_content(&self, content: &[u8]) -> Option<AttestationRecord> {
        self.find_attestation(&sha256_hex(content))
    }

    /// All attestations, newest first.
    pub fn attestations(&self) -> Vec<AttestationRecord> {
        let mut records: Vec<_> = self
            .chain
            .iter()
            .rev()
            .flat_map(|block| {
                block
                    .transactions()
                    .iter()
                    .filter_map(move |tx| AttestationRecord::new(block, tx))
            })
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }
}
