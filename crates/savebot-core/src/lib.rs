//! Core domain + application logic for the subscription-gated save bot.
//!
//! This crate is framework-agnostic. Telegram lives behind the messaging and
//! membership ports implemented in the adapter crate.

pub mod config;
pub mod content;
pub mod domain;
pub mod errors;
pub mod gate;
pub mod logging;
pub mod messaging;
pub mod save;
pub mod search;
pub mod store;
pub mod texts;
pub mod utils;

pub use errors::{Error, Result};
