use crate::core::oracle::{PriceOracle, RoundData};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Development price feed with a settable answer.
///
/// Starts at the given answer and timestamps every update, so it also
/// satisfies a configured maximum rate age.
#[derive(Clone)]
pub struct MockAggregator {
    round: Arc<RwLock<RoundData>>,
}

impl MockAggregator {
    pub fn new(decimals: u8, initial_answer: i128) -> Self {
        Self {
            round: Arc::new(RwLock::new(
                RoundData::new(initial_answer, decimals).at(Utc::now()),
            )),
        }
    }

    pub async fn update_answer(&self, answer: i128) {
        let mut round = self.round.write().await;
        round.answer = answer;
        round.updated_at = Some(Utc::now());
        debug!(answer, "Mock aggregator answer updated");
    }

    /// Backdates the current round, e.g. to exercise staleness checks.
    pub async fn set_updated_at(&self, updated_at: DateTime<Utc>) {
        self.round.write().await.updated_at = Some(updated_at);
    }
}

#[async_trait]
impl PriceOracle for MockAggregator {
    async fn current_rate(&self) -> Result<RoundData> {
        Ok(*self.round.read().await)
    }

    fn description(&self) -> String {
        "mock aggregator".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_mock_aggregator_reports_answer() {
        let feed = MockAggregator::new(8, 2000_00000000);
        let round = feed.current_rate().await.unwrap();
        assert_eq!(round.answer, 2000_00000000);
        assert_eq!(round.decimals, 8);
        assert!(round.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_mock_aggregator_update() {
        let feed = MockAggregator::new(8, 2000_00000000);
        let old = Utc::now() - Duration::hours(2);
        feed.set_updated_at(old).await;
        assert_eq!(feed.current_rate().await.unwrap().updated_at, Some(old));

        feed.update_answer(1500_00000000).await;
        let round = feed.current_rate().await.unwrap();
        assert_eq!(round.answer, 1500_00000000);
        assert!(round.updated_at.unwrap() > old);
    }
}
