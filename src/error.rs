//! Error types for AssetLedger

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Identity already exists: {0}")]
    DuplicateIdentity(String),
    #[error("Invalid role: {0}")]
    InvalidRole(String),
    #[error("Identity not found: {0}")]
    MissingIdentity(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Insufficient balance: {address} holds {available}, transfer needs {required}")]
    InsufficientBalance {
        address: String,
        available: i128,
        required: u64,
    },
    #[error("Invalid transaction signature")]
    InvalidSignature,
    #[error("Digest already attested: {0}")]
    DuplicateAttestation(String),
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;
