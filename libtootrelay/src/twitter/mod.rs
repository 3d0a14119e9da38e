//! Twitter source client
//!
//! Signs requests with OAuth 1.0a, verifies the configured account and opens
//! its user stream. The stream is exposed as a [`futures::Stream`] of typed
//! [`StreamMessage`]s so the daemon can pull events in an explicit loop.

pub mod client;
pub mod oauth;
pub mod stream;
pub mod types;

pub use client::{StreamWith, TwitterClient};
pub use stream::MessageStream;
pub use types::{status_url, StreamMessage, Tweet, User};
