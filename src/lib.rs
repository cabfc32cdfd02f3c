pub mod cli;
pub mod conversation;
pub mod core;
pub mod providers;
pub mod resolver;
pub mod telegram;

use crate::conversation::{ConversationFlow, Dispatcher};
use crate::core::ConversionRequest;
use crate::core::config::AppConfig;
use crate::resolver::RateResolver;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    Run,
    Convert {
        amount: String,
        from: String,
        to: String,
    },
    Probe {
        amount: String,
        from: String,
        to: String,
    },
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub fn build_resolver(config: &AppConfig) -> Result<RateResolver> {
    let providers = providers::build_providers(config)?;
    Ok(RateResolver::new(providers, config.provider_timeout()))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;

    match command {
        AppCommand::Run => run_bot(config).await,
        AppCommand::Convert { amount, from, to } => {
            let request = ConversionRequest::parse(&amount, &from, &to)?;
            cli::convert::convert(&build_resolver(&config)?, &request).await
        }
        AppCommand::Probe { amount, from, to } => {
            let request = ConversionRequest::parse(&amount, &from, &to)?;
            cli::convert::probe(&build_resolver(&config)?, &request).await
        }
    }
}

async fn run_bot(config: AppConfig) -> Result<()> {
    let token = AppConfig::bot_token()?;
    let resolver = Arc::new(build_resolver(&config)?);
    info!(providers = ?resolver.provider_names(), "Rate provider chain ready");

    let client = Arc::new(telegram::TelegramClient::new(
        &config.telegram.api_base_url,
        &token,
        Duration::from_secs(config.telegram.poll_timeout_secs),
    )?);
    let flow = ConversationFlow::new(resolver, config.quick_pairs, config.currency_presets);
    let dispatcher = Arc::new(Dispatcher::new(flow, client.clone()));

    telegram::run_polling(client, dispatcher, config.telegram.poll_timeout_secs).await
}
