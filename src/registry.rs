//! Identity registry
//!
//! Owns every registered identity, indexed by username and by derived
//! address. Balances live here but are only changed by the ledger when a
//! block is mined.

use crate::crypto::{self, derive_address, normalize_key_material, KeyPair, SecretKeyMaterial};
use crate::error::{LedgerError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Signed ledger balance. Batches admitted against stale balances can push
/// it below zero, so it is not unsigned.
pub type Balance = i128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Issuer,
    Participant,
    PaymentProvider,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Issuer => "issuer",
            Role::Participant => "participant",
            Role::PaymentProvider => "payment_provider",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "issuer" => Ok(Role::Issuer),
            "participant" => Ok(Role::Participant),
            "payment_provider" => Ok(Role::PaymentProvider),
            other => Err(LedgerError::InvalidRole(other.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct Identity {
    username: String,
    role: Role,
    keypair: KeyPair,
    public_key: String,
    address: String,
    balance: Balance,
}

impl Identity {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    pub fn summary(&self) -> IdentitySummary {
        IdentitySummary {
            username: self.username.clone(),
            role: self.role,
            address: self.address.clone(),
            public_key: self.public_key.clone(),
            balance: self.balance,
        }
    }

    pub(crate) fn credit(&mut self, amount: u64) {
        self.balance += Balance::from(amount);
    }

    pub(crate) fn debit(&mut self, amount: u64) {
        self.balance -= Balance::from(amount);
    }
}

/// Public view of an identity; never carries private key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySummary {
    pub username: String,
    pub role: Role,
    pub address: String,
    pub public_key: String,
    pub balance: Balance,
}

/// Result of a successful registration. This is the only place the private
/// key is ever disclosed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub username: String,
    pub role: Role,
    pub address: String,
    pub public_key: String,
    pub private_key: SecretKeyMaterial,
}

#[derive(Debug, Default)]
pub struct Registry {
    identities: HashMap<String, Identity>,
    /// Reverse index: address -> username
    address_index: HashMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `username` under a role name (`issuer`, `participant`, `payment_provider`).
    pub fn register(&mut self, username: &str, role: &str) -> Result<Registration> {
        if self.identities.contains_key(username) {
            return Err(LedgerError::DuplicateIdentity(username.to_string()));
        }
        let role = role.parse::<Role>()?;
        self.register_role(username, role)
    }

    pub fn register_role(&mut self, username: &str, role: Role) -> Result<Registration> {
        if self.identities.contains_key(username) {
            return Err(LedgerError::DuplicateIdentity(username.to_string()));
        }

        let keypair = KeyPair::generate();
        let public_key = keypair.public_key_hex();
        let address = derive_address(&public_key, username);
        let private_key = crypto::secret_material(&keypair);

        let identity = Identity {
            username: username.to_string(),
            role,
            keypair,
            public_key: public_key.clone(),
            address: address.clone(),
            balance: 0,
        };
        self.address_index
            .insert(address.clone(), username.to_string());
        self.identities.insert(username.to_string(), identity);

        info!(username, %role, address = %address, "registered identity");

        Ok(Registration {
            username: username.to_string(),
            role,
            address,
            public_key,
            private_key,
        })
    }

    pub fn lookup_by_username(&self, username: &str) -> Option<&Identity> {
        self.identities.get(username)
    }

    pub fn lookup_by_address(&self, address: &str) -> Option<&Identity> {
        self.address_index
            .get(address)
            .and_then(|username| self.identities.get(username))
    }

    pub(crate) fn lookup_by_address_mut(&mut self, address: &str) -> Option<&mut Identity> {
        let username = self.address_index.get(address)?;
        self.identities.get_mut(username)
    }

    /// Compares offered key material with the stored key after normalising
    /// whitespace and line endings on both sides.
    pub fn validate_secret(&self, username: &str, secret: &str) -> bool {
        match self.identities.get(username) {
            Some(identity) => {
                normalize_key_material(&identity.keypair.armored_secret())
                    == normalize_key_material(secret)
            }
            None => false,
        }
    }

    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.identities.values()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}
