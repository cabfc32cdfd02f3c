//! Core business logic abstractions

pub mod config;
pub mod currency;
pub mod log;

// Re-export main types for cleaner imports
pub use currency::{Amount, ConversionRequest, CurrencyCode, RateProvider};
