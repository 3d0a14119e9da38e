//! Destination clients
//!
//! A destination is one authenticated account on the receiving network. The
//! dispatcher only needs to create a post and know where it ended up.
//!
//! # Examples
//!
//! ```no_run
//! use libtootrelay::destinations::{mastodon::MastodonClient, Destination};
//!
//! # async fn example() -> libtootrelay::Result<()> {
//! let client = MastodonClient::new(
//!     "https://mastodon.social".to_string(),
//!     "access-token".to_string(),
//! )?;
//!
//! let posted = client.post("Hello from the relay").await?;
//! println!("Posted: {}", posted.url);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::Result;

pub mod mastodon;

// Available outside tests so integration tests can drive the daemon loop
pub mod mock;

/// A status created on a destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedStatus {
    /// Server-assigned status id
    pub id: String,

    /// Canonical URL of the status
    pub url: String,
}

#[async_trait]
pub trait Destination: Send + Sync {
    /// Create a new public status with `text` as its only content
    ///
    /// # Errors
    ///
    /// Returns `DestinationError` when the server rejects the status or
    /// cannot be reached. Callers decide whether that is fatal.
    async fn post(&self, text: &str) -> Result<PostedStatus>;

    /// Human-readable identifier for logs (the server address)
    fn name(&self) -> &str;
}
