//! The crowdfunding ledger: admission control, contributor records and
//! owner-only withdrawal.

use crate::core::address::Address;
use crate::core::amount::MINIMUM_CONTRIBUTION;
use crate::core::conversion::{checked_rate, conversion_rate};
use crate::core::error::{LedgerError, LedgerResult};
use crate::core::oracle::PriceOracle;
use crate::core::payout::Payout;
use anyhow::{Result, bail};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Contributor records and held balance. `funders` is in first-contribution
/// order and holds exactly the keys of `contributions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub funders: Vec<Address>,
    pub contributions: BTreeMap<Address, u128>,
    pub balance: u128,
}

impl LedgerSnapshot {
    /// Checks that the list and map describe the same contributors and that
    /// their sum is the held balance.
    pub fn validate(&self) -> Result<()> {
        if self.funders.len() != self.contributions.len() {
            bail!(
                "{} funders listed but {} contribution entries",
                self.funders.len(),
                self.contributions.len()
            );
        }

        let mut seen = BTreeSet::new();
        let mut total: u128 = 0;
        for funder in &self.funders {
            if !seen.insert(funder) {
                bail!("Funder {} is listed more than once", funder);
            }
            match self.contributions.get(funder) {
                Some(0) => bail!("Funder {} has a zero contribution", funder),
                Some(amount) => {
                    total = total
                        .checked_add(*amount)
                        .ok_or(LedgerError::Overflow)?;
                }
                None => bail!("Funder {} has no contribution entry", funder),
            }
        }
        if total != self.balance {
            bail!(
                "Contributions sum to {} but the held balance is {}",
                total,
                self.balance
            );
        }
        Ok(())
    }
}

/// How `withdraw_with` clears contributor records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WithdrawStrategy {
    /// Walks the funder list, removing each entry, then empties the list.
    Naive,
    /// Reads the list length and balance once and resets both containers in
    /// one step.
    #[default]
    Optimized,
}

/// Receipt for an accepted contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub contributor: Address,
    pub amount: u128,
    pub total: u128,
    pub reference_value: u128,
    pub first_contribution: bool,
}

/// Receipt for a completed withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    pub to: Address,
    pub amount: u128,
    pub funders_cleared: usize,
}

pub struct Ledger {
    owner: Address,
    price_feed: Arc<dyn PriceOracle>,
    payout: Arc<dyn Payout>,
    minimum_contribution: u128,
    max_rate_age: Option<Duration>,
    state: Mutex<LedgerSnapshot>,
}

impl Ledger {
    pub fn new(owner: Address, price_feed: Arc<dyn PriceOracle>, payout: Arc<dyn Payout>) -> Self {
        Self {
            owner,
            price_feed,
            payout,
            minimum_contribution: MINIMUM_CONTRIBUTION,
            max_rate_age: None,
            state: Mutex::new(LedgerSnapshot::default()),
        }
    }

    /// Sets the threshold in 18-decimal reference units.
    pub fn with_minimum_contribution(mut self, minimum: u128) -> Self {
        self.minimum_contribution = minimum;
        self
    }

    /// Rejects rates whose timestamp is older than `max_age`.
    pub fn with_max_rate_age(mut self, max_age: Duration) -> Self {
        self.max_rate_age = Some(max_age);
        self
    }

    /// Resumes from previously saved records.
    pub fn restore(self, snapshot: LedgerSnapshot) -> Result<Self> {
        snapshot.validate()?;
        Ok(Self {
            state: Mutex::new(snapshot),
            ..self
        })
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn price_feed(&self) -> Arc<dyn PriceOracle> {
        Arc::clone(&self.price_feed)
    }

    pub fn minimum_contribution(&self) -> u128 {
        self.minimum_contribution
    }

    pub fn max_rate_age(&self) -> Option<Duration> {
        self.max_rate_age
    }

    /// Cumulative amount funded by `contributor` since the last withdrawal.
    pub async fn amount_funded(&self, contributor: &Address) -> u128 {
        let state = self.state.lock().await;
        state.contributions.get(contributor).copied().unwrap_or(0)
    }

    /// The funder at `index` in first-contribution order.
    pub async fn funder(&self, index: usize) -> Option<Address> {
        self.state.lock().await.funders.get(index).cloned()
    }

    pub async fn funders(&self) -> Vec<Address> {
        self.state.lock().await.funders.clone()
    }

    pub async fn balance(&self) -> u128 {
        self.state.lock().await.balance
    }

    pub async fn snapshot(&self) -> LedgerSnapshot {
        self.state.lock().await.clone()
    }

    /// Accepts `amount` from `caller` if it is worth at least the minimum at
    /// the current feed rate.
    #[instrument(name = "Fund", skip(self), fields(caller = %caller))]
    pub async fn fund(&self, caller: &Address, amount: u128) -> LedgerResult<Contribution> {
        if amount == 0 {
            return Err(LedgerError::InsufficientContribution {
                value: 0,
                minimum: self.minimum_contribution,
            });
        }

        let round = self.price_feed.current_rate().await.map_err(|e| {
            warn!(error = %e, "Price feed read failed");
            LedgerError::OracleUnavailable(e.to_string())
        })?;
        let rate = checked_rate(&round, self.max_rate_age, Utc::now())?;
        let reference_value = conversion_rate(amount, rate);
        debug!(?round, reference_value, "Converted contribution");

        if reference_value < self.minimum_contribution {
            return Err(LedgerError::InsufficientContribution {
                value: reference_value,
                minimum: self.minimum_contribution,
            });
        }

        let mut state = self.state.lock().await;
        let previous = state.contributions.get(caller).copied();
        let total = previous
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = state
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        if previous.is_none() {
            state.funders.push(caller.clone());
        }
        state.contributions.insert(caller.clone(), total);
        state.balance = balance;

        info!(amount, total, "Contribution accepted");
        Ok(Contribution {
            contributor: caller.clone(),
            amount,
            total,
            reference_value,
            first_contribution: previous.is_none(),
        })
    }

    /// Sends the whole balance to the owner, clearing contributors one by one.
    pub async fn withdraw(&self, caller: &Address) -> LedgerResult<Withdrawal> {
        self.withdraw_with(caller, WithdrawStrategy::Naive).await
    }

    /// Same outcome as [`Ledger::withdraw`] with a single bulk reset.
    pub async fn cheaper_withdraw(&self, caller: &Address) -> LedgerResult<Withdrawal> {
        self.withdraw_with(caller, WithdrawStrategy::Optimized).await
    }

    #[instrument(name = "Withdraw", skip(self), fields(caller = %caller))]
    pub async fn withdraw_with(
        &self,
        caller: &Address,
        strategy: WithdrawStrategy,
    ) -> LedgerResult<Withdrawal> {
        if caller != &self.owner {
            warn!("Withdrawal attempted by non-owner");
            return Err(LedgerError::NotOwner {
                caller: caller.clone(),
            });
        }

        let mut state = self.state.lock().await;
        let previous = match strategy {
            WithdrawStrategy::Naive => {
                let previous = state.clone();
                let funders = state.funders.clone();
                for funder in &funders {
                    state.contributions.remove(funder);
                }
                state.funders.clear();
                previous
            }
            WithdrawStrategy::Optimized => std::mem::take(&mut *state),
        };
        let amount = previous.balance;
        let funders_cleared = previous.funders.len();
        state.balance = 0;

        if amount > 0 {
            if let Err(e) = self.payout.transfer(&self.owner, amount).await {
                warn!(error = %e, "Payout failed, restoring records");
                *state = previous;
                return Err(LedgerError::TransferFailed {
                    to: self.owner.clone(),
                    reason: e.to_string(),
                });
            }
        }

        info!(amount, funders_cleared, ?strategy, "Withdrawal complete");
        Ok(Withdrawal {
            to: self.owner.clone(),
            amount,
            funders_cleared,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::amount::{WEI_PER_NATIVE, reference_units};
    use crate::core::oracle::RoundData;
    use crate::core::payout::AccountBook;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedOracle {
        round: RoundData,
        reads: AtomicUsize,
    }

    impl FixedOracle {
        fn new(answer: i128, decimals: u8) -> Arc<Self> {
            Arc::new(Self {
                round: RoundData::new(answer, decimals),
                reads: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PriceOracle for FixedOracle {
        async fn current_rate(&self) -> Result<RoundData> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.round)
        }

        fn description(&self) -> String {
            "fixed".to_string()
        }
    }

    struct DownOracle;

    #[async_trait]
    impl PriceOracle for DownOracle {
        async fn current_rate(&self) -> Result<RoundData> {
            Err(anyhow!("feed offline"))
        }

        fn description(&self) -> String {
            "down".to_string()
        }
    }

    struct RejectingPayout;

    #[async_trait]
    impl Payout for RejectingPayout {
        async fn transfer(&self, _to: &Address, _amount: u128) -> Result<()> {
            Err(anyhow!("destination rejected value"))
        }
    }

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    fn native(hundredths: u128) -> u128 {
        hundredths * WEI_PER_NATIVE / 100
    }

    fn ledger_at_2000() -> (Ledger, AccountBook) {
        let book = AccountBook::new();
        let ledger = Ledger::new(
            addr("0xowner"),
            FixedOracle::new(2000, 0),
            Arc::new(book.clone()),
        );
        (ledger, book)
    }

    #[tokio::test]
    async fn test_threshold_scenario() {
        let (ledger, book) = ledger_at_2000();
        let alice = addr("0xa11ce");

        let err = ledger.fund(&alice, native(1)).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientContribution {
                value: reference_units(20),
                minimum: reference_units(50),
            }
        );
        assert_eq!(ledger.snapshot().await, LedgerSnapshot::default());

        let receipt = ledger.fund(&alice, native(3)).await.unwrap();
        assert!(receipt.first_contribution);
        assert_eq!(receipt.reference_value, reference_units(60));
        assert_eq!(ledger.amount_funded(&alice).await, native(3));

        // every contribution is priced on its own
        let err = ledger.fund(&alice, native(2)).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientContribution { .. }));

        let receipt = ledger.fund(&alice, native(3)).await.unwrap();
        assert!(!receipt.first_contribution);
        assert_eq!(receipt.total, native(6));
        assert_eq!(ledger.funders().await, vec![alice.clone()]);

        let withdrawal = ledger.withdraw(&addr("0xowner")).await.unwrap();
        assert_eq!(withdrawal.amount, native(6));
        assert_eq!(withdrawal.funders_cleared, 1);
        assert_eq!(book.balance_of(&addr("0xowner")).await, native(6));
        assert_eq!(ledger.snapshot().await, LedgerSnapshot::default());
    }

    #[tokio::test]
    async fn test_funders_keep_first_contribution_order() {
        let (ledger, _) = ledger_at_2000();
        let (a, b, c) = (addr("0xa"), addr("0xb"), addr("0xc"));

        for who in [&b, &a, &b, &c, &a] {
            ledger.fund(who, native(5)).await.unwrap();
        }

        assert_eq!(ledger.funders().await, vec![b.clone(), a.clone(), c.clone()]);
        assert_eq!(ledger.funder(0).await, Some(b.clone()));
        assert_eq!(ledger.funder(3).await, None);
        assert_eq!(ledger.amount_funded(&b).await, native(10));
        assert_eq!(ledger.balance().await, native(25));
    }

    #[tokio::test]
    async fn test_zero_value_rejected_without_reading_feed() {
        let oracle = FixedOracle::new(2000, 0);
        let ledger = Ledger::new(addr("0xowner"), oracle.clone(), Arc::new(AccountBook::new()));

        let err = ledger.fund(&addr("0xa"), 0).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientContribution { value: 0, .. }));
        assert_eq!(oracle.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oracle_failures_fail_closed() {
        let ledger = Ledger::new(addr("0xowner"), Arc::new(DownOracle), Arc::new(AccountBook::new()));
        let err = ledger.fund(&addr("0xa"), WEI_PER_NATIVE).await.unwrap_err();
        assert_eq!(err, LedgerError::OracleUnavailable("feed offline".to_string()));

        let ledger = Ledger::new(
            addr("0xowner"),
            FixedOracle::new(0, 8),
            Arc::new(AccountBook::new()),
        );
        let err = ledger.fund(&addr("0xa"), WEI_PER_NATIVE).await.unwrap_err();
        assert!(matches!(err, LedgerError::OracleUnavailable(_)));
        assert!(ledger.funders().await.is_empty());
    }

    #[tokio::test]
    async fn test_stale_rate_rejected() {
        let ledger = Ledger::new(
            addr("0xowner"),
            FixedOracle::new(2000, 0),
            Arc::new(AccountBook::new()),
        )
        .with_max_rate_age(Duration::minutes(5));

        // FixedOracle publishes no timestamp
        let err = ledger.fund(&addr("0xa"), WEI_PER_NATIVE).await.unwrap_err();
        assert!(matches!(err, LedgerError::OracleUnavailable(_)));
    }

    #[tokio::test]
    async fn test_only_owner_withdraws() {
        let (ledger, book) = ledger_at_2000();
        ledger.fund(&addr("0xa"), native(10)).await.unwrap();
        let before = ledger.snapshot().await;

        let err = ledger.withdraw(&addr("0xa")).await.unwrap_err();
        assert_eq!(err, LedgerError::NotOwner { caller: addr("0xa") });
        let err = ledger.cheaper_withdraw(&addr("0xa")).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotOwner { .. }));

        assert_eq!(ledger.snapshot().await, before);
        assert!(book.balances().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_payout_rolls_back() {
        for strategy in [WithdrawStrategy::Naive, WithdrawStrategy::Optimized] {
            let ledger = Ledger::new(
                addr("0xowner"),
                FixedOracle::new(2000, 0),
                Arc::new(RejectingPayout),
            );
            ledger.fund(&addr("0xa"), native(5)).await.unwrap();
            ledger.fund(&addr("0xb"), native(7)).await.unwrap();
            let before = ledger.snapshot().await;

            let err = ledger
                .withdraw_with(&addr("0xowner"), strategy)
                .await
                .unwrap_err();
            assert!(matches!(err, LedgerError::TransferFailed { .. }));
            assert_eq!(ledger.snapshot().await, before);
        }
    }

    #[tokio::test]
    async fn test_withdraw_empty_ledger() {
        let (ledger, book) = ledger_at_2000();
        let receipt = ledger.cheaper_withdraw(&addr("0xowner")).await.unwrap();
        assert_eq!(receipt.amount, 0);
        assert_eq!(receipt.funders_cleared, 0);
        assert!(book.balances().await.is_empty());
    }

    #[tokio::test]
    async fn test_price_feed_accessor_returns_configured_feed() {
        let oracle = FixedOracle::new(2000, 0);
        let feed: Arc<dyn PriceOracle> = oracle.clone();
        let ledger = Ledger::new(addr("0xowner"), feed.clone(), Arc::new(AccountBook::new()));

        assert!(Arc::ptr_eq(&ledger.price_feed(), &feed));
        assert_eq!(ledger.price_feed().description(), "fixed");
        assert_eq!(ledger.owner(), &addr("0xowner"));
        assert_eq!(ledger.minimum_contribution(), MINIMUM_CONTRIBUTION);
    }

    #[tokio::test]
    async fn test_restore_validates_snapshot() {
        let (a, b) = (addr("0xa"), addr("0xb"));
        let good = LedgerSnapshot {
            funders: vec![b.clone(), a.clone()],
            contributions: BTreeMap::from([(a.clone(), 3), (b.clone(), 4)]),
            balance: 7,
        };
        let (ledger, _) = ledger_at_2000();
        let ledger = ledger.restore(good.clone()).unwrap();
        assert_eq!(ledger.snapshot().await, good);

        let bad_sum = LedgerSnapshot {
            balance: 8,
            ..good.clone()
        };
        assert!(ledger_at_2000().0.restore(bad_sum).is_err());

        let duplicate = LedgerSnapshot {
            funders: vec![a.clone(), a.clone()],
            contributions: BTreeMap::from([(a.clone(), 3), (b.clone(), 3)]),
            balance: 6,
        };
        assert!(ledger_at_2000().0.restore(duplicate).is_err());

        let zero_entry = LedgerSnapshot {
            funders: vec![a.clone()],
            contributions: BTreeMap::from([(a.clone(), 0)]),
            balance: 0,
        };
        assert!(ledger_at_2000().0.restore(zero_entry).is_err());
    }

    #[tokio::test]
    async fn test_overflow_rejected_without_mutation() {
        let a = addr("0xa");
        let (ledger, _) = ledger_at_2000();
        let ledger = ledger
            .restore(LedgerSnapshot {
                funders: vec![a.clone()],
                contributions: BTreeMap::from([(a.clone(), u128::MAX)]),
                balance: u128::MAX,
            })
            .unwrap();
        let before = ledger.snapshot().await;

        let err = ledger.fund(&addr("0xb"), WEI_PER_NATIVE).await.unwrap_err();
        assert_eq!(err, LedgerError::Overflow);
        assert_eq!(ledger.snapshot().await, before);
    }
}
