use crate::registry::{Balance, Identity, IdentitySummary, Registry, Role};
use crate::transaction::{Transaction, TxBody};
use std::collections::BTreeMap;

use super::chain::{Block, Ledger};

fn identity_at<'a>(registry: &'a mut Registry, address: Option<&str>) -> Option<&'a mut Identity> {
    registry.lookup_by_address_mut(address?)
}

/// Applies the balance effect of a single mined transaction.
///
/// Admission already checked balances, so nothing is re-validated here. A
/// batch holding several transfers from one sender can therefore overdraw it.
pub(crate) fn apply_transaction(registry: &mut Registry, tx: &Transaction) {
    match tx.body() {
        TxBody::Transfer => {
            if let Some(sender) = identity_at(registry, tx.from_address()) {
                sender.debit(tx.amount());
            }
            if let Some(recipient) = identity_at(registry, tx.to_address()) {
                recipient.credit(tx.amount());
            }
        }
        TxBody::Issue { .. } => {
            if let Some(recipient) = identity_at(registry, tx.to_address()) {
                recipient.credit(tx.amount());
            }
        }
        TxBody::Genesis { .. } | TxBody::Attestation { .. } => {}
    }
}

impl Ledger {
    pub(crate) fn apply_block_effects(&mut self, block: &Block) {
        for tx in block.transactions() {
            apply_transaction(&mut self.registry, tx);
        }
    }

    /// Recorded balance of `address`; unknown addresses hold nothing.
    pub fn balance_of(&self, address: &str) -> Balance {
        self.registry
            .lookup_by_address(address)
            .map_or(0, |identity| identity.balance())
    }

    /// Balances of every participant, keyed by username.
    pub fn balances_view(&self) -> BTreeMap<String, Balance> {
        self.registry
            .identities()
            .filter(|identity| identity.role() == Role::Participant)
            .map(|identity| (identity.username().to_string(), identity.balance()))
            .collect()
    }

    /// Every identity, sorted by username, without key material.
    pub fn users_view(&self) -> Vec<IdentitySummary> {
        let mut users: Vec<_> = self.registry.identities().map(|i| i.summary()).collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }
}
