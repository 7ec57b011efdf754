pub mod disk;
pub mod memory;

use crate::core::address::Address;
use crate::core::ledger::LedgerSnapshot;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything a deployment persists between commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub owner: Address,
    pub ledger: LedgerSnapshot,
    /// Native balances credited to accounts by withdrawals.
    #[serde(default)]
    pub accounts: BTreeMap<Address, u128>,
}

impl LedgerRecord {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            ledger: LedgerSnapshot::default(),
            accounts: BTreeMap::new(),
        }
    }

    /// Returns the stored deployment for `owner`, or a fresh one if nothing
    /// is stored yet. The owner of a deployment never changes.
    pub fn for_owner(stored: Option<LedgerRecord>, owner: &Address) -> Result<Self> {
        match stored {
            Some(record) if &record.owner != owner => bail!(
                "Ledger was deployed with owner {} but the configuration names {}",
                record.owner,
                owner
            ),
            Some(record) => Ok(record),
            None => Ok(Self::new(owner.clone())),
        }
    }
}

/// Persistence for a single ledger deployment. `save` replaces the whole
/// record in one write.
pub trait LedgerStore: Send + Sync {
    fn load(&self) -> Result<Option<LedgerRecord>>;
    fn save(&self, record: &LedgerRecord) -> Result<()>;
}
