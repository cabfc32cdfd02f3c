//! Resolves a conversion by walking an ordered chain of rate providers.

use crate::core::{ConversionRequest, RateProvider};
use anyhow::{Result, anyhow};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved { provider: String, value: f64 },
    Unavailable,
}

impl Resolution {
    pub fn value(&self) -> Option<f64> {
        match self {
            Resolution::Resolved { value, .. } => Some(*value),
            Resolution::Unavailable => None,
        }
    }
}

/// Outcome of a single provider call, as reported by [`RateResolver::probe`].
#[derive(Debug)]
pub enum ProviderOutcome {
    Value(f64),
    Absent,
    Failed(anyhow::Error),
}

impl Display for ProviderOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderOutcome::Value(v) => write!(f, "{v:.4}"),
            ProviderOutcome::Absent => write!(f, "no value"),
            ProviderOutcome::Failed(e) => write!(f, "error: {e}"),
        }
    }
}

#[derive(Debug)]
pub struct ProbeOutcome {
    pub provider: String,
    pub outcome: ProviderOutcome,
}

pub struct RateResolver {
    providers: Vec<Arc<dyn RateProvider>>,
    timeout: Duration,
}

impl RateResolver {
    pub fn new(providers: Vec<Arc<dyn RateProvider>>, timeout: Duration) -> Self {
        RateResolver { providers, timeout }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    async fn call(&self, provider: &dyn RateProvider, request: &ConversionRequest) -> Result<Option<f64>> {
        match tokio::time::timeout(self.timeout, provider.convert(request)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow!("Timed out after {:?}", self.timeout)),
        }
    }

    /// Returns the first value any provider produces, in priority order.
    ///
    /// Values are not sanity-checked: a provider answering `0` wins just
    /// like any other present value.
    #[instrument(
        name = "Resolve",
        skip(self, request),
        fields(amount = %request.amount, from = %request.source, to = %request.destination)
    )]
    pub async fn resolve(&self, request: &ConversionRequest) -> Resolution {
        for provider in &self.providers {
            match self.call(provider.as_ref(), request).await {
                Ok(Some(value)) => {
                    info!(provider = provider.name(), value, "Resolved conversion");
                    return Resolution::Resolved {
                        provider: provider.name().to_string(),
                        value,
                    };
                }
                Ok(None) => {
                    debug!(provider = provider.name(), "Provider returned no value");
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Rate provider failed");
                }
            }
        }

        warn!("All rate providers exhausted");
        Resolution::Unavailable
    }

    /// Calls every provider regardless of earlier successes.
    pub async fn probe(&self, request: &ConversionRequest) -> Vec<ProbeOutcome> {
        let mut outcomes = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let outcome = match self.call(provider.as_ref(), request).await {
                Ok(Some(value)) => ProviderOutcome::Value(value),
                Ok(None) => ProviderOutcome::Absent,
                Err(e) => ProviderOutcome::Failed(e),
            };
            outcomes.push(ProbeOutcome {
                provider: provider.name().to_string(),
                outcome,
            });
        }
        outcomes
    }
}
