pub mod exchangerate_host;
pub mod open_er_api;
pub mod util;

use crate::core::RateProvider;
use crate::core::config::{AppConfig, ProviderKind};
use anyhow::Result;
use std::sync::Arc;

/// Instantiates the configured providers, preserving their priority order.
pub fn build_providers(config: &AppConfig) -> Result<Vec<Arc<dyn RateProvider>>> {
    let timeout = config.provider_timeout();
    config
        .providers
        .iter()
        .map(|p| -> Result<Arc<dyn RateProvider>> {
            let key = p.access_key.clone();
            let provider: Arc<dyn RateProvider> = match p.kind {
                ProviderKind::ExchangerateHostLatest => Arc::new(
                    exchangerate_host::LatestRatesProvider::new(&p.base_url, key, timeout)?,
                ),
                ProviderKind::ExchangerateHostConvert => Arc::new(
                    exchangerate_host::ConvertProvider::new(&p.base_url, key, timeout)?,
                ),
                ProviderKind::OpenErApi => Arc::new(open_er_api::OpenErApiProvider::new(
                    &p.base_url,
                    key,
                    timeout,
                )?),
            };
            Ok(provider)
        })
        .collect()
}
