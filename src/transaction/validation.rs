/// Validity predicate for transactions, separated from type definitions
use crate::crypto;
use crate::transaction::types::{Authorization, Transaction, TxBody};
use tracing::debug;

/// Whether the basic-mode bypass marker is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureMode {
    #[default]
    Strict,
    /// Accepts [`Authorization::BasicMode`] without any signature check.
    AllowBasicMode,
}

impl Transaction {
    /// Strict validity: the basic-mode marker is rejected.
    pub fn is_valid(&self) -> bool {
        self.is_valid_in(SignatureMode::Strict)
    }

    pub fn is_valid_in(&self, mode: SignatureMode) -> bool {
        match &self.body {
            TxBody::Genesis { .. } => true,
            TxBody::Attestation { digest, label } => !digest.is_empty() && !label.is_empty(),
            TxBody::Issue { .. } | TxBody::Transfer => self.has_valid_authorization(mode),
        }
    }

    fn has_valid_authorization(&self, mode: SignatureMode) -> bool {
        match &self.authorization {
            Some(Authorization::Signed {
                signature,
                public_key,
            }) => {
                !signature.is_empty()
                    && !public_key.is_empty()
                    && crypto::verify(&self.signing_payload(), signature, public_key)
            }
            Some(Authorization::BasicMode) => {
                let accepted = mode == SignatureMode::AllowBasicMode;
                debug!(id = %self.id, accepted, "basic-mode transaction, signature check skipped");
                accepted
            }
            None => false,
        }
    }
}
