use anyhow::{Context, Error, anyhow};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("fxbot/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by a provider. Every request made through
/// it is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Issues a GET and decodes the JSON body, failing on non-2xx status.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, Error> {
    debug!(url, ?query, "Requesting exchange rate");

    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| anyhow!("Request error: {} URL: {}", e, url))?;

    if !response.status().is_success() {
        return Err(anyhow!("HTTP error: {} URL: {}", response.status(), url));
    }

    let text = response
        .text()
        .await
        .with_context(|| format!("Failed to get response text from {url}"))?;

    serde_json::from_str(&text).map_err(|e| anyhow!("Failed to parse JSON response from {}: {}", url, e))
}

/// Appends the optional access key to a query.
pub fn with_access_key(
    mut query: Vec<(&'static str, String)>,
    access_key: Option<&str>,
) -> Vec<(&'static str, String)> {
    if let Some(key) = access_key {
        query.push(("access_key", key.to_string()));
    }
    query
}

/// Picks `rates[code]` out of a rates table. A missing table, a missing
/// entry and a null entry are all errors.
pub fn lookup_rate(rates: Option<HashMap<String, Option<f64>>>, code: &str) -> Result<f64, Error> {
    let rates = rates.ok_or_else(|| anyhow!("Response has no rates field"))?;
    rates
        .get(code)
        .copied()
        .flatten()
        .ok_or_else(|| anyhow!("No rate for {} in response", code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_rate() {
        let rates: HashMap<String, Option<f64>> =
            [("USD".to_string(), Some(1.1)), ("KZT".to_string(), None)]
                .into_iter()
                .collect();

        assert_eq!(lookup_rate(Some(rates.clone()), "USD").unwrap(), 1.1);
        assert_eq!(
            lookup_rate(Some(rates.clone()), "KZT").unwrap_err().to_string(),
            "No rate for KZT in response"
        );
        assert_eq!(
            lookup_rate(Some(rates), "GBP").unwrap_err().to_string(),
            "No rate for GBP in response"
        );
        assert_eq!(
            lookup_rate(None, "USD").unwrap_err().to_string(),
            "Response has no rates field"
        );
    }
}
