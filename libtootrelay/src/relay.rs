//! Matching tweets to relays and forwarding them
//!
//! The relay list is built once at startup and never changes afterwards.
//! For each stream message the dispatcher:
//!
//! 1. ignores anything that is not a tweet,
//! 2. picks the *first* relay whose screen name equals the tweet author's
//!    (case-sensitive),
//! 3. drops the tweet if it is a retweet, without looking at later relays,
//! 4. posts the tweet text plus a link back to the tweet.
//!
//! A failed post is logged and reported in the returned [`DispatchOutcome`];
//! it never stops the caller. Nothing is deduplicated: dispatching the same
//! tweet twice posts it twice.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::destinations::mastodon::MastodonClient;
use crate::destinations::{Destination, PostedStatus};
use crate::error::{RelayError, Result};
use crate::twitter::{StreamMessage, Tweet};

/// A configured relay joined with its constructed destination client
pub struct WiredRelay {
    screen_name: String,
    destination: Box<dyn Destination>,
}

impl WiredRelay {
    pub fn new(screen_name: impl Into<String>, destination: Box<dyn Destination>) -> Self {
        Self {
            screen_name: screen_name.into(),
            destination,
        }
    }

    /// Build the Mastodon client for one configured relay
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let client = MastodonClient::from_config(&config.mastodon)?;
        Ok(Self::new(config.twitter.screen_name.clone(), Box::new(client)))
    }

    pub fn screen_name(&self) -> &str {
        &self.screen_name
    }

    pub fn destination(&self) -> &dyn Destination {
        self.destination.as_ref()
    }
}

impl std::fmt::Debug for WiredRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WiredRelay")
            .field("screen_name", &self.screen_name)
            .field("destination", &self.destination.name())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotATweet,
    NoMatchingRelay,
    Reshare,
}

#[derive(Debug)]
pub enum DispatchOutcome {
    Ignored(IgnoreReason),
    Relayed {
        screen_name: String,
        posted: PostedStatus,
    },
    Failed {
        screen_name: String,
        error: RelayError,
    },
}

/// The immutable, ordered list of wired relays
#[derive(Debug, Default)]
pub struct Relays {
    relays: Vec<WiredRelay>,
}

impl Relays {
    pub fn new(relays: Vec<WiredRelay>) -> Self {
        let mut seen = HashSet::new();
        for relay in &relays {
            if !seen.insert(relay.screen_name.clone()) {
                warn!(
                    screen_name = relay.screen_name(),
                    destination = relay.destination().name(),
                    "Relay is shadowed by an earlier relay for the same screen name and will never be used"
                );
            }
        }

        Self { relays }
    }

    /// Wire every configured relay, in configuration order
    pub fn from_config(configs: &[RelayConfig]) -> Result<Self> {
        let relays = configs
            .iter()
            .map(WiredRelay::from_config)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(relays))
    }

    pub fn len(&self) -> usize {
        self.relays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WiredRelay> {
        self.relays.iter()
    }

    /// First relay configured for `screen_name`
    pub fn find(&self, screen_name: &str) -> Option<&WiredRelay> {
        self.relays.iter().find(|r| r.screen_name == screen_name)
    }

    /// Handle one stream message; issues at most one outbound post
    pub async fn dispatch(&self, message: &StreamMessage) -> DispatchOutcome {
        let StreamMessage::Tweet(tweet) = message else {
            debug!(kind = message.kind(), "Ignoring non-tweet stream message");
            return DispatchOutcome::Ignored(IgnoreReason::NotATweet);
        };

        let screen_name = tweet.user.screen_name.as_str();
        let Some(relay) = self.find(screen_name) else {
            debug!(screen_name, id = %tweet.id_str, "No relay for tweet author");
            return DispatchOutcome::Ignored(IgnoreReason::NoMatchingRelay);
        };

        if tweet.is_reshare() {
            debug!(screen_name, id = %tweet.id_str, "Skipping retweet");
            return DispatchOutcome::Ignored(IgnoreReason::Reshare);
        }

        let status = format_status(tweet);
        match relay.destination().post(&status).await {
            Ok(posted) => {
                info!(
                    screen_name,
                    tweet = %tweet.id_str,
                    destination = relay.destination().name(),
                    url = %posted.url,
                    "Relayed tweet"
                );
                DispatchOutcome::Relayed {
                    screen_name: screen_name.to_string(),
                    posted,
                }
            }
            Err(error) => {
                warn!(
                    screen_name,
                    tweet = %tweet.id_str,
                    destination = relay.destination().name(),
                    error = %error,
                    "Failed to relay tweet"
                );
                DispatchOutcome::Failed {
                    screen_name: screen_name.to_string(),
                    error,
                }
            }
        }
    }
}

/// Status text for a relayed tweet: the tweet text, a blank line, the tweet URL
pub fn format_status(tweet: &Tweet) -> String {
    format!("{}\n\n{}", tweet.text, tweet.url())
}
