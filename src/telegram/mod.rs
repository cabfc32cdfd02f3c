//! Telegram Bot API transport: long polling in, `sendMessage` out.

pub mod client;
pub mod runner;
pub mod types;

pub use client::TelegramClient;
pub use runner::run_polling;
