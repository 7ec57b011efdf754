use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::oracle::{PriceOracle, RoundData};

/// Reads the latest round of a pair from a JSON price feed service at
/// `{base_url}/feeds/{pair}`.
pub struct HttpPriceFeed {
    base_url: String,
    pair: String,
}

impl HttpPriceFeed {
    pub fn new(base_url: &str, pair: &str) -> Self {
        HttpPriceFeed {
            base_url: base_url.trim_end_matches('/').to_string(),
            pair: pair.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct FeedResponse {
    answer: i64,
    decimals: u8,
    #[serde(alias = "updatedAt")]
    updated_at: Option<i64>,
}

#[async_trait]
impl PriceOracle for HttpPriceFeed {
    #[instrument(name = "HttpFeedRead", skip(self), fields(pair = %self.pair))]
    async fn current_rate(&self) -> Result<RoundData> {
        let url = format!("{}/feeds/{}", self.base_url, self.pair);
        debug!("Requesting latest round from {}", url);

        let client = reqwest::Client::builder().user_agent("fundme/0.1").build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for feed: {}", e, self.pair))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for feed: {}",
                response.status(),
                self.pair
            ));
        }

        let text = response.text().await?;
        let data: FeedResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", self.pair, e))?;

        let updated_at = match data.updated_at {
            Some(secs) => Some(
                Utc.timestamp_opt(secs, 0)
                    .single()
                    .ok_or_else(|| anyhow!("Invalid update timestamp {} for {}", secs, self.pair))?,
            ),
            None => None,
        };

        Ok(RoundData {
            answer: i128::from(data.answer),
            decimals: data.decimals,
            updated_at,
        })
    }

    fn description(&self) -> String {
        format!("{} via {}", self.pair, self.base_url)
    }
}
