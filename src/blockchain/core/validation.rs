use crate::error::{LedgerError, Result};
use crate::registry::{Balance, Identity, Role};
use crate::transaction::{Authorization, Transaction, TxBody};
use tracing::warn;

use super::chain::Ledger;

/// The signer key carried by a signed transaction must be the sender's own.
fn ensure_signer_is_sender(tx: &Transaction, sender: &Identity) -> Result<()> {
    match tx.authorization().and_then(Authorization::public_key) {
        Some(public_key) if public_key != sender.public_key() => Err(LedgerError::InvalidSignature),
        _ => Ok(()),
    }
}

impl Ledger {
    /// Kind-specific admission rules, evaluated against recorded state only.
    /// Pending transactions are not taken into account.
    pub(crate) fn check_admission(&self, tx: &Transaction) -> Result<()> {
        match tx.body() {
            TxBody::Genesis { .. } => Err(LedgerError::PermissionDenied(
                "genesis transactions are created by the ledger only".to_string(),
            )),
            TxBody::Issue { .. } => {
                let from = tx.from_address().unwrap_or_default();
                let issuer = self
                    .registry
                    .lookup_by_address(from)
                    .filter(|identity| identity.role() == Role::Issuer)
                    .ok_or_else(|| {
                        LedgerError::PermissionDenied(format!("only issuers can issue tokens: {}", from))
                    })?;
                ensure_signer_is_sender(tx, issuer)?;

                let to = tx.to_address().unwrap_or_default();
                if self.registry.lookup_by_address(to).is_none() {
                    return Err(LedgerError::MissingIdentity(to.to_string()));
                }
                Ok(())
            }
            TxBody::Transfer => {
                let from = tx.from_address().unwrap_or_default();
                let to = tx.to_address().unwrap_or_default();
                let sender = self
                    .registry
                    .lookup_by_address(from)
                    .ok_or_else(|| LedgerError::MissingIdentity(from.to_string()))?;
                if self.registry.lookup_by_address(to).is_none() {
                    return Err(LedgerError::MissingIdentity(to.to_string()));
                }
                if sender.role() != Role::Participant {
                    return Err(LedgerError::PermissionDenied(format!(
                        "only participants can transfer tokens: {}",
                        sender.username()
                    )));
                }
                ensure_signer_is_sender(tx, sender)?;

                if sender.balance() < Balance::from(tx.amount()) {
                    return Err(LedgerError::InsufficientBalance {
                        address: from.to_string(),
                        available: sender.balance(),
                        required: tx.amount(),
                    });
                }
                Ok(())
            }
            TxBody::Attestation { digest, .. } => {
                if self.attestation_exists(digest) {
                    return Err(LedgerError::DuplicateAttestation(digest.clone()));
                }
                Ok(())
            }
        }
    }

    /// Whether any recorded block already attests `digest`.
    pub fn attestation_exists(&self, digest: &str) -> bool {
        self.chain
            .iter()
            .flat_map(|block| block.transactions())
            .any(|tx| matches!(tx.attested(), Some((d, _)) if d == digest))
    }

    /// Walks the chain from the first block after genesis, checking stored
    /// hashes, back links and every contained transaction.
    pub fn is_chain_valid(&self) -> bool {
        for (height, pair) in self.chain.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            let height = height + 1;

            if current.hash() != current.calculate_hash() {
                warn!(height, "block hash does not match its contents");
                return false;
            }
            if current.previous_hash() != previous.hash() {
                warn!(height, "block is not linked to its predecessor");
                return false;
            }
            if let Some(tx) = current
                .transactions()
                .iter()
                .find(|tx| !tx.is_valid_in(self.signature_mode))
            {
                warn!(height, id = %tx.id(), "block contains an invalid transaction");
                return false;
            }
        }
        true
    }
}
