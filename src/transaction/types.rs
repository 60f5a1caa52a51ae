/// Transaction types for AssetLedger
use crate::crypto::{self, SigningPayload};
use crate::error::{LedgerError, Result};
use chrono::SecondsFormat;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Wire value of the signature field that requests the unauthenticated path.
pub const BASIC_MODE_SIGNATURE: &str = "basic-mode-signature";

/// Sender and recipient recorded on attestation transactions.
pub const ATTESTATION_SYSTEM_ADDRESS: &str = "attestation_system";

pub const GENESIS_LABEL: &str = "Genesis Block";

/// Current time as an RFC 3339 string with millisecond precision.
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Genesis,
    Issue,
    Transfer,
    Attestation,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Genesis => "genesis",
            TxKind::Issue => "issue",
            TxKind::Transfer => "transfer",
            TxKind::Attestation => "attestation",
        }
    }
}

/// Kind-specific payload of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TxBody {
    Genesis { label: String },
    Issue { asset: String },
    Transfer,
    Attestation { digest: String, label: String },
}

impl TxBody {
    pub fn kind(&self) -> TxKind {
        match self {
            TxBody::Genesis { .. } => TxKind::Genesis,
            TxBody::Issue { .. } => TxKind::Issue,
            TxBody::Transfer => TxKind::Transfer,
            TxBody::Attestation { .. } => TxKind::Attestation,
        }
    }

    /// Asset label for issues, the fixed label for genesis.
    pub fn asset_label(&self) -> Option<&str> {
        match self {
            TxBody::Genesis { label } => Some(label),
            TxBody::Issue { asset } => Some(asset),
            TxBody::Transfer | TxBody::Attestation { .. } => None,
        }
    }
}

/// Proof attached to issue and transfer transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum Authorization {
    #[serde(rename_all = "camelCase")]
    Signed {
        signature: String,
        public_key: String,
    },
    /// Unauthenticated escape hatch. Only honoured by ledgers configured
    /// with `SignatureMode::AllowBasicMode`.
    BasicMode,
}

impl Authorization {
    /// Builds an authorization from raw wire fields, mapping the
    /// basic-mode marker to [`Authorization::BasicMode`].
    pub fn from_parts(signature: Option<String>, public_key: Option<String>) -> Option<Self> {
        match (signature, public_key) {
            (Some(sig), _) if sig == BASIC_MODE_SIGNATURE => Some(Authorization::BasicMode),
            (Some(signature), Some(public_key)) => Some(Authorization::Signed {
                signature,
                public_key,
            }),
            _ => None,
        }
    }

    pub fn public_key(&self) -> Option<&str> {
        match self {
            Authorization::Signed { public_key, .. } => Some(public_key),
            Authorization::BasicMode => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub(crate) id: String,
    pub(crate) from_address: Option<String>,
    pub(crate) to_address: Option<String>,
    pub(crate) amount: u64,
    pub(crate) timestamp: String,
    #[serde(flatten)]
    pub(crate) body: TxBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) authorization: Option<Authorization>,
}

impl Transaction {
    /// Builds a transaction and fixes its id. A missing timestamp is taken
    /// from the current clock.
    pub fn new(
        from_address: Option<String>,
        to_address: Option<String>,
        amount: u64,
        body: TxBody,
        timestamp: Option<String>,
        authorization: Option<Authorization>,
    ) -> Self {
        let mut tx = Transaction {
            id: String::new(),
            from_address,
            to_address,
            amount,
            timestamp: timestamp.unwrap_or_else(now_iso),
            body,
            authorization,
        };
        tx.id = tx.calculate_hash();
        tx
    }

    pub fn genesis() -> Self {
        Self::new(
            None,
            None,
            0,
            TxBody::Genesis {
                label: GENESIS_LABEL.to_string(),
            },
            None,
            None,
        )
    }

    /// Unsigned issue of `amount` units of `asset` from an issuer address.
    pub fn issue(from_address: &str, to_address: &str, amount: u64, asset: &str) -> Self {
        Self::new(
            Some(from_address.to_string()),
            Some(to_address.to_string()),
            amount,
            TxBody::Issue {
                asset: asset.to_string(),
            },
            None,
            None,
        )
    }

    /// Unsigned transfer between two participant addresses.
    pub fn transfer(from_address: &str, to_address: &str, amount: u64) -> Self {
        Self::new(
            Some(from_address.to_string()),
            Some(to_address.to_string()),
            amount,
            TxBody::Transfer,
            None,
            None,
        )
    }

    pub fn attestation(digest: &str, label: &str) -> Self {
        Self::new(
            Some(ATTESTATION_SYSTEM_ADDRESS.to_string()),
            Some(ATTESTATION_SYSTEM_ADDRESS.to_string()),
            0,
            TxBody::Attestation {
                digest: digest.to_string(),
                label: label.to_string(),
            },
            None,
            None,
        )
    }

    /// Attaches proof of authorization. The id does not cover it, so it is
    /// unchanged.
    pub fn with_authorization(mut self, authorization: Authorization) -> Self {
        self.authorization = Some(authorization);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn from_address(&self) -> Option<&str> {
        self.from_address.as_deref()
    }

    pub fn to_address(&self) -> Option<&str> {
        self.to_address.as_deref()
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn body(&self) -> &TxBody {
        &self.body
    }

    pub fn kind(&self) -> TxKind {
        self.body.kind()
    }

    pub fn authorization(&self) -> Option<&Authorization> {
        self.authorization.as_ref()
    }

    /// Digest/label pair of an attestation.
    pub fn attested(&self) -> Option<(&str, &str)> {
        match &self.body {
            TxBody::Attestation { digest, label } => Some((digest, label)),
            _ => None,
        }
    }

    pub fn signing_payload(&self) -> SigningPayload {
        SigningPayload {
            from_address: self.from_address.clone(),
            to_address: self.to_address.clone(),
            amount: self.amount,
            kind: self.kind().as_str().to_string(),
            timestamp: self.timestamp.clone(),
        }
    }

    /// Content hash over every data field; authorization is excluded.
    pub fn calculate_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.from_address.as_deref().unwrap_or_default());
        hasher.update(self.to_address.as_deref().unwrap_or_default());
        hasher.update(self.amount.to_string());
        hasher.update(&self.timestamp);
        hasher.update(self.kind().as_str());
        hasher.update(self.body.asset_label().unwrap_or_default());
        if let Some((digest, label)) = self.attested() {
            hasher.update(digest);
            hasher.update(label);
        }
        hex::encode(hasher.finalize())
    }

    /// Digest of the full record, authorization included. Feeds block hashing.
    pub(crate) fn content_digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.id.as_bytes());
        hasher.update(self.calculate_hash());
        match &self.authorization {
            Some(Authorization::Signed {
                signature,
                public_key,
            }) => {
                hasher.update("signed");
                hasher.update(signature);
                hasher.update(public_key);
            }
            Some(Authorization::BasicMode) => hasher.update(BASIC_MODE_SIGNATURE),
            None => hasher.update("unsigned"),
        }
        hasher.finalize().into()
    }
}

/// Signs `tx` with armoured private key text and attaches the signature
/// together with `public_key`.
pub fn sign_transaction(tx: Transaction, private_key: &str, public_key: &str) -> Result<Transaction> {
    let signature =
        crypto::sign(&tx.signing_payload(), private_key).ok_or(LedgerError::InvalidSignature)?;
    Ok(tx.with_authorization(Authorization::Signed {
        signature,
        public_key: public_key.to_string(),
    }))
}
