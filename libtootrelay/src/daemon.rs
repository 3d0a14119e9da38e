//! The relay daemon
//!
//! Startup wires every relay and the Twitter client, verifies the Twitter
//! credentials and opens the user stream; any failure there is returned to
//! the caller as fatal. Once running, messages are pulled from the stream one
//! at a time and each dispatch finishes before the next message is read.
//! The daemon stops when the stream ends or fails.

use futures::{Stream, StreamExt};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{Result, TwitterError};
use crate::relay::{DispatchOutcome, Relays};
use crate::twitter::{MessageStream, StreamMessage, StreamWith, TwitterClient};

/// Counters reported when the stream ends
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    pub received: u64,
    pub relayed: u64,
    pub failed: u64,
    pub ignored: u64,
}

pub struct Daemon {
    relays: Relays,
    twitter: TwitterClient,
}

impl Daemon {
    /// Build every client from the configuration. No network access.
    pub fn from_config(config: &Config) -> Result<Self> {
        let relays = Relays::from_config(&config.relays)?;
        let twitter = TwitterClient::new(&config.twitter)?;

        info!(
            relays = relays.len(),
            screen_names = ?relays.iter().map(|r| r.screen_name()).collect::<Vec<_>>(),
            "Relays wired"
        );

        Ok(Self { relays, twitter })
    }

    pub fn relays(&self) -> &Relays {
        &self.relays
    }

    /// Verify the Twitter account and open its user stream
    pub async fn connect(&self) -> Result<MessageStream> {
        let user = self.twitter.verify_credentials().await?;
        info!(screen_name = %user.screen_name, "Authenticated with Twitter");

        let stream = self.twitter.user_stream(StreamWith::Followings).await?;
        Ok(stream)
    }

    /// Connect, then relay until the stream ends
    pub async fn run(self) -> Result<RelayStats> {
        let stream = self.connect().await?;
        relay_messages(&self.relays, stream).await
    }
}

/// Dispatch every message of `messages` in arrival order.
///
/// Returns the counters when the stream ends, or the stream's error.
pub async fn relay_messages<S>(relays: &Relays, mut messages: S) -> Result<RelayStats>
where
    S: Stream<Item = std::result::Result<StreamMessage, TwitterError>> + Unpin,
{
    let mut stats = RelayStats::default();

    while let Some(message) = messages.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, received = stats.received, "Twitter stream failed");
                return Err(e.into());
            }
        };
        stats.received += 1;

        match &message {
            StreamMessage::Disconnect(disconnect) => warn!(
                code = disconnect.code,
                reason = %disconnect.reason,
                "Twitter is closing the stream"
            ),
            StreamMessage::Warning(warning) => warn!(
                code = %warning.code,
                percent_full = warning.percent_full,
                "{}",
                warning.message
            ),
            _ => {}
        }

        match relays.dispatch(&message).await {
            DispatchOutcome::Relayed { .. } => stats.relayed += 1,
            DispatchOutcome::Failed { .. } => stats.failed += 1,
            DispatchOutcome::Ignored(_) => stats.ignored += 1,
        }
    }

    info!(
        received = stats.received,
        relayed = stats.relayed,
        failed = stats.failed,
        ignored = stats.ignored,
        "Twitter stream closed"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destinations::mock::MockDestination;
    use crate::error::RelayError;
    use crate::relay::WiredRelay;
    use crate::twitter::{Tweet, User};
    use futures::stream;

    fn feed(
        items: Vec<std::result::Result<StreamMessage, TwitterError>>,
    ) -> impl Stream<Item = std::result::Result<StreamMessage, TwitterError>> + Unpin {
        stream::iter(items)
    }

    fn tweet(screen_name: &str, id: &str, text: &str) -> StreamMessage {
        StreamMessage::Tweet(Tweet {
            id_str: id.to_string(),
            text: text.to_string(),
            user: User {
                id_str: "1".to_string(),
                screen_name: screen_name.to_string(),
                name: String::new(),
            },
            retweeted: false,
            retweeted_status: None,
        })
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_events() {
        let alice = MockDestination::post_failure("alice.social", "HTTP 503");
        let bob = MockDestination::success("bob.social");
        let relays = Relays::new(vec![
            WiredRelay::new("alice", Box::new(alice.clone())),
            WiredRelay::new("bob", Box::new(bob.clone())),
        ]);

        let messages = feed(vec![
            Ok(tweet("alice", "1", "first")),
            Ok(tweet("bob", "2", "second")),
        ]);
        let stats = relay_messages(&relays, messages).await.unwrap();

        assert_eq!(alice.post_call_count(), 1);
        assert_eq!(bob.posted_content(), vec!["second\n\nhttps://twitter.com/bob/status/2"]);
        assert_eq!(
            stats,
            RelayStats {
                received: 2,
                relayed: 1,
                failed: 1,
                ignored: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_messages_dispatched_in_arrival_order() {
        let mock = MockDestination::success("mock.social");
        let relays = Relays::new(vec![WiredRelay::new("alice", Box::new(mock.clone()))]);

        let messages = feed(vec![
            Ok(tweet("alice", "1", "one")),
            Ok(StreamMessage::Friends(vec![])),
            Ok(tweet("alice", "2", "two")),
            Ok(tweet("alice", "3", "three")),
        ]);
        relay_messages(&relays, messages).await.unwrap();

        let texts: Vec<String> = mock
            .posted_content()
            .into_iter()
            .map(|s| s.lines().next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_stream_error_is_returned() {
        let mock = MockDestination::success("mock.social");
        let relays = Relays::new(vec![WiredRelay::new("alice", Box::new(mock.clone()))]);

        let messages = feed(vec![
            Ok(tweet("alice", "1", "one")),
            Err(TwitterError::Stream("connection reset".to_string())),
            Ok(tweet("alice", "2", "two")),
        ]);
        let result = relay_messages(&relays, messages).await;

        assert!(matches!(
            result,
            Err(RelayError::Twitter(TwitterError::Stream(_)))
        ));
        assert_eq!(mock.post_call_count(), 1);
    }

    #[tokio::test]
    async fn test_control_messages_are_counted_as_ignored() {
        let relays = Relays::default();
        let messages = feed(vec![Ok(StreamMessage::from_value(serde_json::json!({
            "disconnect": {"code": 7, "stream_name": "bot", "reason": "admin logout"}
        }))
        .unwrap())]);

        let stats = relay_messages(&relays, messages).await.unwrap();
        assert_eq!(stats.received, 1);
        assert_eq!(stats.ignored, 1);
    }
}
