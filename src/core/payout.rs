//! Value transfer out of the ledger

use crate::core::address::Address;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Moves native value from the ledger to a destination account. A failed
/// transfer must leave the destination unchanged.
#[async_trait]
pub trait Payout: Send + Sync {
    async fn transfer(&self, to: &Address, amount: u128) -> Result<()>;
}

/// In-process account balances credited by withdrawals.
#[derive(Clone, Default)]
pub struct AccountBook {
    balances: Arc<Mutex<BTreeMap<Address, u128>>>,
}

impl AccountBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_balances(balances: BTreeMap<Address, u128>) -> Self {
        Self {
            balances: Arc::new(Mutex::new(balances)),
        }
    }

    pub async fn balance_of(&self, account: &Address) -> u128 {
        self.balances
            .lock()
            .await
            .get(account)
            .copied()
            .unwrap_or(0)
    }

    pub async fn balances(&self) -> BTreeMap<Address, u128> {
        self.balances.lock().await.clone()
    }
}

#[async_trait]
impl Payout for AccountBook {
    async fn transfer(&self, to: &Address, amount: u128) -> Result<()> {
        let mut balances = self.balances.lock().await;
        let current = balances.get(to).copied().unwrap_or(0);
        let updated = current
            .checked_add(amount)
            .ok_or_else(|| anyhow!("Balance of {} would overflow", to))?;
        balances.insert(to.clone(), updated);
        debug!(%to, amount, "Credited account");
        Ok(())
    }
}
