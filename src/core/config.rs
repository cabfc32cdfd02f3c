use crate::core::currency::ConversionRequest;
use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const TOKEN_ENV_VAR: &str = "BOT_TOKEN";
pub const QUICK_PAIR_PREFIX: &str = "convert:";
/// Telegram rejects buttons whose callback data is longer than this.
pub const MAX_CALLBACK_DATA: usize = 64;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    ExchangerateHostLatest,
    ExchangerateHostConvert,
    OpenErApi,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
}

impl ProviderConfig {
    fn new(kind: ProviderKind, base_url: &str) -> Self {
        ProviderConfig {
            kind,
            base_url: base_url.to_string(),
            access_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct QuickPair {
    pub amount: String,
    pub from: String,
    pub to: String,
}

impl QuickPair {
    fn new(amount: &str, from: &str, to: &str) -> Self {
        QuickPair {
            amount: amount.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn label(&self) -> String {
        format!("{} {} → {}", self.amount, self.from, self.to)
    }

    /// Callback data carried by the pair's button.
    pub fn callback_data(&self) -> String {
        format!("{QUICK_PAIR_PREFIX}{}:{}:{}", self.amount, self.from, self.to)
    }

    pub fn request(&self) -> Result<ConversionRequest> {
        ConversionRequest::parse(&self.amount, &self.from, &self.to)
            .with_context(|| format!("Invalid quick pair: {}", self.label()))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TelegramConfig {
    #[serde(default = "default_telegram_api")]
    pub api_base_url: String,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        TelegramConfig {
            api_base_url: default_telegram_api(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_timeout() -> u64 {
    5
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new(
            ProviderKind::ExchangerateHostLatest,
            "https://api.exchangerate.host",
        ),
        ProviderConfig::new(
            ProviderKind::ExchangerateHostConvert,
            "https://api.exchangerate.host",
        ),
        ProviderConfig::new(ProviderKind::OpenErApi, "https://open.er-api.com"),
    ]
}

fn default_quick_pairs() -> Vec<QuickPair> {
    vec![
        QuickPair::new("100", "USD", "KZT"),
        QuickPair::new("1", "EUR", "USD"),
        QuickPair::new("1", "GBP", "USD"),
        QuickPair::new("1", "USD", "EUR"),
    ]
}

fn default_presets() -> Vec<String> {
    ["USD", "EUR", "GBP", "KZT", "RUB"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_quick_pairs")]
    pub quick_pairs: Vec<QuickPair>,
    #[serde(default = "default_presets")]
    pub currency_presets: Vec<String>,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: default_providers(),
            timeout_secs: default_timeout(),
            quick_pairs: default_quick_pairs(),
            currency_presets: default_presets(),
            telegram: TelegramConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in
    /// defaults when no file exists there.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "fxbot", "fxbot")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be greater than zero"));
        }
        for pair in &self.quick_pairs {
            pair.request()?;
            if pair.callback_data().len() > MAX_CALLBACK_DATA {
                return Err(anyhow!(
                    "Quick pair {} exceeds {} bytes of callback data",
                    pair.label(),
                    MAX_CALLBACK_DATA
                ));
            }
        }
        Ok(())
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reads the bot token from the environment. There is no fallback value.
    pub fn bot_token() -> Result<String> {
        std::env::var(TOKEN_ENV_VAR)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("{} is not set; refusing to start without a bot token", TOKEN_ENV_VAR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.providers.len(), 3);
        assert_eq!(
            config.providers[0].kind,
            ProviderKind::ExchangerateHostLatest
        );
        assert_eq!(
            config.providers[1].kind,
            ProviderKind::ExchangerateHostConvert
        );
        assert_eq!(config.providers[2].kind, ProviderKind::OpenErApi);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.quick_pairs.len(), 4);
        assert_eq!(config.quick_pairs[0].label(), "100 USD → KZT");
        assert_eq!(config.currency_presets, vec!["USD", "EUR", "GBP", "KZT", "RUB"]);
        assert_eq!(config.telegram.api_base_url, "https://api.telegram.org");
        assert_eq!(config.telegram.poll_timeout_secs, 30);
    }

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
providers:
  - kind: open_er_api
    base_url: "http://example.com/er"
  - kind: exchangerate_host_convert
    base_url: "http://example.com/host"
    access_key: "secret"
timeout_secs: 2
quick_pairs:
  - amount: "10"
    from: "EUR"
    to: "GBP"
currency_presets: ["CHF"]
telegram:
  api_base_url: "http://example.com/tg"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].kind, ProviderKind::OpenErApi);
        assert_eq!(config.providers[0].base_url, "http://example.com/er");
        assert!(config.providers[0].access_key.is_none());
        assert_eq!(config.providers[1].access_key.as_deref(), Some("secret"));
        assert_eq!(config.provider_timeout(), Duration::from_secs(2));
        assert_eq!(config.quick_pairs, vec![QuickPair::new("10", "EUR", "GBP")]);
        assert_eq!(config.currency_presets, vec!["CHF"]);
        assert_eq!(config.telegram.api_base_url, "http://example.com/tg");
        assert_eq!(config.telegram.poll_timeout_secs, 30);
    }

    #[test]
    fn test_load_rejects_invalid_quick_pair() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "quick_pairs:\n  - amount: \"ten\"\n    from: USD\n    to: EUR\n",
        )
        .unwrap();

        let err = AppConfig::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid quick pair"));
    }

    #[test]
    fn test_load_rejects_oversized_quick_pair() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let amount = format!("1.{}", "0".repeat(60));
        std::fs::write(
            file.path(),
            format!("quick_pairs:\n  - amount: \"{amount}\"\n    from: USD\n    to: EUR\n"),
        )
        .unwrap();

        let err = AppConfig::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("exceeds 64 bytes of callback data"));
    }

    #[test]
    fn test_callback_data_encoding() {
        let pair = QuickPair::new("100", "USD", "KZT");
        assert_eq!(pair.callback_data(), "convert:100:USD:KZT");
        assert!(pair.callback_data().len() <= MAX_CALLBACK_DATA);
    }

    #[test]
    fn test_load_rejects_zero_timeout() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "timeout_secs: 0\n").unwrap();

        assert!(AppConfig::load_from_path(file.path()).is_err());
    }

    #[test]
    fn test_unknown_provider_kind_fails() {
        let yaml_str = "providers:\n  - kind: nope\n    base_url: x\n";
        assert!(serde_yaml::from_str::<AppConfig>(yaml_str).is_err());
    }
}
