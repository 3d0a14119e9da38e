//! toot-relay - relay tweets to Mastodon
//!
//! This library provides the pieces of the relay daemon: configuration,
//! the Twitter streaming client, the Mastodon destination clients, and the
//! dispatcher that matches each incoming tweet to a configured relay.

pub mod config;
pub mod daemon;
pub mod destinations;
pub mod error;
pub mod logging;
pub mod relay;
pub mod twitter;

// Re-export commonly used types
pub use config::Config;
pub use error::{RelayError, Result};
pub use relay::{DispatchOutcome, Relays, WiredRelay};
pub use twitter::{StreamMessage, Tweet, TwitterClient};
