pub mod http_feed;
pub mod mock;
pub mod yahoo_finance;

use crate::core::config::PriceFeedConfig;
use crate::core::oracle::PriceOracle;
use std::sync::Arc;
use tracing::debug;

/// Builds the price feed named by the configuration.
pub fn price_feed_from_config(config: &PriceFeedConfig) -> Arc<dyn PriceOracle> {
    debug!(?config, "Creating price feed");
    match config {
        PriceFeedConfig::Mock { decimals, answer } => Arc::new(mock::MockAggregator::new(
            *decimals,
            i128::from(*answer),
        )),
        PriceFeedConfig::Http { base_url, pair } => {
            Arc::new(http_feed::HttpPriceFeed::new(base_url, pair))
        }
        PriceFeedConfig::Yahoo { base_url, symbol } => {
            Arc::new(yahoo_finance::YahooPriceFeed::new(base_url, symbol))
        }
    }
}
