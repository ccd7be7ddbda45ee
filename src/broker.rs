//! Stand-in for the third-party buy-and-distribute API.

use crate::core::config::BrokerConfig;
use crate::core::{BrokerClient, DistributionOrder};
use crate::providers::util::{ensure_success, http_client};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tracing::{debug, instrument};
use uuid::Uuid;

const LATENCY_PATH: &str = "/api/timezone/Etc/UTC";

/// Simulates broker latency with one round trip to a time endpoint, then issues a fake
/// transaction hash. Nothing is bought or sent.
pub struct MockBroker {
    base_url: String,
    client: reqwest::Client,
}

impl MockBroker {
    pub fn new(config: &BrokerConfig) -> Result<Self> {
        Ok(MockBroker {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: http_client(config.timeout_secs)?,
        })
    }

    fn fake_tx_hash() -> String {
        format!("0x{}", Uuid::new_v4().simple())
    }
}

#[async_trait]
impl BrokerClient for MockBroker {
    #[instrument(
        name = "BrokerDistribute",
        skip(self, order),
        fields(symbol = %order.symbol, recipients = order.addresses.len())
    )]
    async fn distribute(&self, order: &DistributionOrder) -> Result<String> {
        let url = format!("{}{}", self.base_url, LATENCY_PATH);
        debug!(
            fiat_total = order.fiat_total,
            crypto_total = order.crypto_total,
            "Submitting distribution to {}",
            url
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for broker at {}", e, url))?;
        ensure_success(response, "broker distribution")?;
        Ok(Self::fake_tx_hash())
    }
}
