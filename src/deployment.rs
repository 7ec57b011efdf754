//! Wires one ledger deployment to its configuration and persisted records.

use crate::core::amount::reference_units;
use crate::core::config::AppConfig;
use crate::core::{AccountBook, Ledger, PriceOracle};
use crate::store::{LedgerRecord, LedgerStore};
use anyhow::{Context, Result};
use chrono::Duration;
use std::sync::Arc;
use tracing::debug;

pub struct Deployment {
    pub ledger: Ledger,
    pub accounts: AccountBook,
    store: Box<dyn LedgerStore>,
}

impl Deployment {
    /// Restores the ledger recorded in `store`, or deploys a fresh one owned by
    /// the configured owner.
    pub fn open(
        config: &AppConfig,
        price_feed: Arc<dyn PriceOracle>,
        store: Box<dyn LedgerStore>,
    ) -> Result<Self> {
        let record = LedgerRecord::for_owner(store.load()?, &config.owner)?;
        debug!(owner = %record.owner, funders = record.ledger.funders.len(), "Opening deployment");

        let accounts = AccountBook::from_balances(record.accounts);
        let mut ledger = Ledger::new(
            record.owner,
            price_feed,
            Arc::new(accounts.clone()),
        )
        .with_minimum_contribution(reference_units(config.minimum_contribution));

        if let Some(secs) = config.max_rate_age_secs {
            let max_age = i64::try_from(secs)
                .ok()
                .and_then(Duration::try_seconds)
                .context("max_rate_age_secs is out of range")?;
            ledger = ledger.with_max_rate_age(max_age);
        }

        let ledger = ledger
            .restore(record.ledger)
            .context("Stored ledger records are inconsistent")?;

        Ok(Self {
            ledger,
            accounts,
            store,
        })
    }

    /// Persists the current ledger records and account balances.
    pub async fn commit(&self) -> Result<()> {
        let record = LedgerRecord {
            owner: self.ledger.owner().clone(),
            ledger: self.ledger.snapshot().await,
            accounts: self.accounts.balances().await,
        };
        self.store.save(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::amount::WEI_PER_NATIVE;
    use crate::core::config::PriceFeedConfig;
    use crate::providers::mock::MockAggregator;
    use crate::store::memory::MemoryStore;

    fn config(owner: &str) -> AppConfig {
        AppConfig {
            owner: owner.parse().unwrap(),
            minimum_contribution: 50,
            max_rate_age_secs: Some(3600),
            price_feed: PriceFeedConfig::default(),
            data_path: None,
        }
    }

    #[tokio::test]
    async fn test_deployment_persists_between_opens() {
        let store = MemoryStore::new();
        let feed = Arc::new(MockAggregator::new(8, 2000_00000000));
        let alice = "0xa11ce".parse().unwrap();

        let deployment =
            Deployment::open(&config("0xowner"), feed.clone(), Box::new(store.clone())).unwrap();
        deployment.ledger.fund(&alice, WEI_PER_NATIVE).await.unwrap();
        deployment.commit().await.unwrap();

        let reopened =
            Deployment::open(&config("0xowner"), feed.clone(), Box::new(store.clone())).unwrap();
        assert_eq!(reopened.ledger.amount_funded(&alice).await, WEI_PER_NATIVE);
        assert_eq!(reopened.ledger.max_rate_age(), Some(Duration::hours(1)));

        let owner = "0xowner".parse().unwrap();
        reopened.ledger.cheaper_withdraw(&owner).await.unwrap();
        reopened.commit().await.unwrap();

        let record = store.load().unwrap().unwrap();
        assert!(record.ledger.funders.is_empty());
        assert_eq!(record.accounts.get(&owner), Some(&WEI_PER_NATIVE));
    }

    #[tokio::test]
    async fn test_deployment_rejects_owner_change() {
        let store = MemoryStore::new();
        let feed = Arc::new(MockAggregator::new(8, 2000_00000000));

        let deployment =
            Deployment::open(&config("0xowner"), feed.clone(), Box::new(store.clone())).unwrap();
        deployment.commit().await.unwrap();

        assert!(Deployment::open(&config("0xintruder"), feed, Box::new(store)).is_err());
    }
}
