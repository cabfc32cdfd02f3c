use super::util::{get_json, http_client, lookup_rate, with_access_key};
use crate::core::{ConversionRequest, RateProvider};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(default)]
    rates: Option<HashMap<String, Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct ConvertResponse {
    #[serde(default)]
    result: Option<f64>,
}

/// Looks up `rates[to]` from the `/latest` endpoint and scales it by the amount.
/// A response without that rate is an error.
pub struct LatestRatesProvider {
    base_url: String,
    access_key: Option<String>,
    client: reqwest::Client,
}

impl LatestRatesProvider {
    pub fn new(base_url: &str, access_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(LatestRatesProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key,
            client: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl RateProvider for LatestRatesProvider {
    fn name(&self) -> &str {
        "exchangerate.host/latest"
    }

    #[instrument(
        name = "ExchangerateHostLatest",
        skip(self, request),
        fields(from = %request.source, to = %request.destination)
    )]
    async fn convert(&self, request: &ConversionRequest) -> Result<Option<f64>> {
        let url = format!("{}/latest", self.base_url);
        let query = with_access_key(
            vec![
                ("base", request.source.to_string()),
                ("symbols", request.destination.to_string()),
            ],
            self.access_key.as_deref(),
        );

        let data: LatestResponse = get_json(&self.client, &url, &query).await?;
        let rate = lookup_rate(data.rates, request.destination.as_str())?;
        debug!(rate, "Received latest rate");

        Ok(Some(rate * request.amount.value()))
    }
}

/// Uses the `/convert` endpoint, which returns the converted amount directly.
pub struct ConvertProvider {
    base_url: String,
    access_key: Option<String>,
    client: reqwest::Client,
}

impl ConvertProvider {
    pub fn new(base_url: &str, access_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(ConvertProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key,
            client: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl RateProvider for ConvertProvider {
    fn name(&self) -> &str {
        "exchangerate.host/convert"
    }

    #[instrument(
        name = "ExchangerateHostConvert",
        skip(self, request),
        fields(from = %request.source, to = %request.destination)
    )]
    async fn convert(&self, request: &ConversionRequest) -> Result<Option<f64>> {
        let url = format!("{}/convert", self.base_url);
        let query = with_access_key(
            vec![
                ("from", request.source.to_string()),
                ("to", request.destination.to_string()),
                ("amount", request.amount.to_string()),
            ],
            self.access_key.as_deref(),
        );

        let data: ConvertResponse = get_json(&self.client, &url, &query).await?;
        debug!(result = ?data.result, "Received converted amount");

        Ok(data.result)
    }
}
