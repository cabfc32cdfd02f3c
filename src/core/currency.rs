//! Currency conversion abstractions

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::fmt::Display;
use std::str::FromStr;

/// Three-letter currency code, always upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(CurrencyCode(code.to_ascii_uppercase()))
        } else {
            Err(anyhow!("Invalid currency code: {}", s))
        }
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A positive, finite amount of money.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Amount(f64);

impl Amount {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl FromStr for Amount {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid amount: {}", s))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(anyhow!("Amount must be a positive number: {}", s));
        }
        Ok(Amount(value))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub amount: Amount,
    pub source: CurrencyCode,
    pub destination: CurrencyCode,
}

impl ConversionRequest {
    pub fn new(amount: Amount, source: CurrencyCode, destination: CurrencyCode) -> Self {
        Self {
            amount,
            source,
            destination,
        }
    }

    /// Builds a request from raw user input, validating every part.
    pub fn parse(amount: &str, source: &str, destination: &str) -> Result<Self> {
        Ok(Self::new(amount.parse()?, source.parse()?, destination.parse()?))
    }
}

/// A single exchange-rate source.
///
/// `Ok(None)` means the provider answered but had no usable value for the
/// pair; errors cover transport failures and unexpected response shapes.
#[async_trait]
pub trait RateProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn convert(&self, request: &ConversionRequest) -> Result<Option<f64>>;
}
