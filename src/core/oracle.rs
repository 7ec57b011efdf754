//! Price oracle abstractions

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One published exchange rate: `answer / 10^decimals` reference units per
/// native unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundData {
    pub answer: i128,
    pub decimals: u8,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RoundData {
    pub fn new(answer: i128, decimals: u8) -> Self {
        Self {
            answer,
            decimals,
            updated_at: None,
        }
    }

    pub fn at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }
}

/// Read-only view of an external price feed.
///
/// Implementations do not cache or retry: the ledger treats every failed
/// read as a rejection.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn current_rate(&self) -> Result<RoundData>;

    /// Human readable name of the feed, e.g. `"mock ETH/USD"`.
    fn description(&self) -> String;
}
