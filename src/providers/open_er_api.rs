use super::util::{get_json, http_client, lookup_rate, with_access_key};
use crate::core::{ConversionRequest, RateProvider};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct OpenErResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default, rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    rates: Option<HashMap<String, Option<f64>>>,
}

/// ExchangeRate-API open access endpoint; the base currency is part of the path.
pub struct OpenErApiProvider {
    base_url: String,
    access_key: Option<String>,
    client: reqwest::Client,
}

impl OpenErApiProvider {
    pub fn new(base_url: &str, access_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(OpenErApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key,
            client: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl RateProvider for OpenErApiProvider {
    fn name(&self) -> &str {
        "open.er-api.com"
    }

    #[instrument(
        name = "OpenErApi",
        skip(self, request),
        fields(from = %request.source, to = %request.destination)
    )]
    async fn convert(&self, request: &ConversionRequest) -> Result<Option<f64>> {
        let url = format!("{}/v6/latest/{}", self.base_url, request.source);
        let query = with_access_key(Vec::new(), self.access_key.as_deref());

        let data: OpenErResponse = get_json(&self.client, &url, &query).await?;
        debug!(status = ?data.result, "Received open.er-api rates");
        let error_type = data.error_type;
        let rate = lookup_rate(data.rates, request.destination.as_str()).map_err(|e| {
            match error_type {
                Some(kind) => e.context(format!("open.er-api error: {kind}")),
                None => e,
            }
        })?;

        Ok(Some(rate * request.amount.value()))
    }
}
