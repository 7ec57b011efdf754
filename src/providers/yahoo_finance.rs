use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::oracle::{PriceOracle, RoundData};

/// Fixed-point precision of rates derived from Yahoo quotes.
pub const YAHOO_FEED_DECIMALS: u8 = 8;

/// Uses the regular market price of a Yahoo Finance pair such as `ETH-USD`
/// as an exchange rate.
pub struct YahooPriceFeed {
    base_url: String,
    symbol: String,
}

impl YahooPriceFeed {
    pub fn new(base_url: &str, symbol: &str) -> Self {
        YahooPriceFeed {
            base_url: base_url.to_string(),
            symbol: symbol.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Vec<ChartItem>,
}

#[derive(Debug, Deserialize)]
struct ChartItem {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: f64,
    #[serde(alias = "regularMarketTime")]
    regular_market_time: Option<i64>,
}

/// Converts a decimal quote into an integer answer with `decimals` places,
/// truncating any further precision.
fn to_fixed_point(price: f64, decimals: u8) -> Option<i128> {
    let price = Decimal::from_f64(price)?;
    let scale = Decimal::from(10u64.pow(u32::from(decimals)));
    price.checked_mul(scale)?.trunc().to_i128()
}

#[async_trait]
impl PriceOracle for YahooPriceFeed {
    #[instrument(
        name = "YahooFeedRead",
        skip(self),
        fields(symbol = %self.symbol)
    )]
    async fn current_rate(&self) -> Result<RoundData> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, self.symbol);
        debug!("Requesting quote from {}", url);

        let client = reqwest::Client::builder().user_agent("fundme/0.1").build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {}", e, self.symbol))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                self.symbol
            ));
        }

        let text = response.text().await?;
        let data: YahooChartResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", self.symbol, e))?;

        let item = data
            .chart
            .result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", self.symbol))?;

        let price = item.meta.regular_market_price;
        let answer = to_fixed_point(price, YAHOO_FEED_DECIMALS)
            .ok_or_else(|| anyhow!("Unrepresentable price {} for {}", price, self.symbol))?;
        let updated_at = match item.meta.regular_market_time {
            Some(secs) => Some(
                Utc.timestamp_opt(secs, 0)
                    .single()
                    .ok_or_else(|| anyhow!("Invalid market time {} for {}", secs, self.symbol))?,
            ),
            None => None,
        };

        Ok(RoundData {
            answer,
            decimals: YAHOO_FEED_DECIMALS,
            updated_at,
        })
    }

    fn description(&self) -> String {
        format!("Yahoo Finance {}", self.symbol)
    }
}
