//! Process-level wiring: configuration, tracing and a shareable ledger handle.

use crate::blockchain::{Block, Ledger, Submission};
use crate::config::{load_config, Config, LoggingConfig};
use crate::error::Result;
use crate::registry::{Balance, Registration};
use crate::transaction::Transaction;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Installs the global fmt subscriber. Later calls are no-ops.
pub fn init_tracing(config: &LoggingConfig) {
    let level = config
        .level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

/// Cloneable handle to one ledger. Every call holds the lock for its whole
/// duration, so admission checks and the pending-queue append cannot
/// interleave with another caller.
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        f(&*self.inner.lock())
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut Ledger) -> R) -> R {
        f(&mut *self.inner.lock())
    }

    pub fn register(&self, username: &str, role: &str) -> Result<Registration> {
        self.write(|ledger| ledger.register(username, role))
    }

    pub fn submit_transaction(&self, tx: Transaction) -> Result<Submission> {
        self.write(|ledger| ledger.submit_transaction(tx))
    }

    pub fn mine_pending(&self, miner_username: &str) -> Result<Option<Block>> {
        self.write(|ledger| ledger.mine_pending(miner_username))
    }

    pub fn is_chain_valid(&self) -> bool {
        self.read(Ledger::is_chain_valid)
    }

    pub fn balances_view(&self) -> BTreeMap<String, Balance> {
        self.read(Ledger::balances_view)
    }

    pub fn reset(&self) {
        self.write(Ledger::reset)
    }
}

pub struct Node {
    pub config: Config,
    ledger: SharedLedger,
}

impl Node {
    /// Loads `config_path`, installs tracing and creates a fresh ledger.
    pub fn init(config_path: &Path) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        let config = load_config(config_path)?;
        init_tracing(&config.logging);
        info!(
            config = %config_path.display(),
            difficulty = config.ledger.difficulty,
            "starting AssetLedger"
        );
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: Config) -> Self {
        let ledger = SharedLedger::new(Ledger::new(&config.ledger));
        Self { config, ledger }
    }

    pub fn ledger(&self) -> SharedLedger {
        self.ledger.clone()
    }
}
