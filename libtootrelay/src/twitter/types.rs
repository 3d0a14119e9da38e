//! Twitter v1.1 objects as delivered on the user stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Twitter user, as embedded in tweets and returned by verify_credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id_str: String,

    pub screen_name: String,

    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub id_str: String,

    pub text: String,

    pub user: User,

    /// Set by Twitter when the authenticating account has retweeted this tweet
    #[serde(default)]
    pub retweeted: bool,

    /// Present when this tweet is itself a retweet
    #[serde(default)]
    pub retweeted_status: Option<Box<Tweet>>,
}

impl Tweet {
    /// Whether this tweet reshares someone else's content
    pub fn is_reshare(&self) -> bool {
        self.retweeted || self.retweeted_status.is_some()
    }

    /// Public URL of the tweet
    pub fn url(&self) -> String {
        status_url(&self.user.screen_name, &self.id_str)
    }
}

pub fn status_url(screen_name: &str, id: &str) -> String {
    format!("https://twitter.com/{}/status/{}", screen_name, id)
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusDeletion {
    pub id_str: String,
    #[serde(default)]
    pub user_id_str: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamLimit {
    #[serde(default)]
    pub track: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamDisconnect {
    pub code: i64,
    #[serde(default)]
    pub stream_name: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StallWarning {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub percent_full: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub event: String,
    #[serde(default)]
    pub source: Option<User>,
    #[serde(default)]
    pub target: Option<User>,
}

/// One message from the user stream.
#[derive(Debug, Clone)]
pub enum StreamMessage {
    Tweet(Tweet),
    Delete(StatusDeletion),
    Limit(StreamLimit),
    /// Friend ids sent once at the start of a user stream
    Friends(Vec<u64>),
    Event(Event),
    Disconnect(StreamDisconnect),
    Warning(StallWarning),
    StatusWithheld(Value),
    UserWithheld(Value),
    ScrubGeo(Value),
    DirectMessage(Value),
    Unknown(Value),
}

#[derive(Deserialize)]
struct DeleteEnvelope {
    status: StatusDeletion,
}

impl StreamMessage {
    /// Classify a decoded stream object by the keys it carries.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        let Some(object) = value.as_object() else {
            return Ok(StreamMessage::Unknown(value));
        };

        let take = |key: &str| object.get(key).cloned().unwrap_or(Value::Null);

        let message = if object.contains_key("delete") {
            let envelope: DeleteEnvelope = serde_json::from_value(take("delete"))?;
            StreamMessage::Delete(envelope.status)
        } else if object.contains_key("scrub_geo") {
            StreamMessage::ScrubGeo(take("scrub_geo"))
        } else if object.contains_key("limit") {
            StreamMessage::Limit(serde_json::from_value(take("limit"))?)
        } else if object.contains_key("status_withheld") {
            StreamMessage::StatusWithheld(take("status_withheld"))
        } else if object.contains_key("user_withheld") {
            StreamMessage::UserWithheld(take("user_withheld"))
        } else if object.contains_key("disconnect") {
            StreamMessage::Disconnect(serde_json::from_value(take("disconnect"))?)
        } else if object.contains_key("warning") {
            StreamMessage::Warning(serde_json::from_value(take("warning"))?)
        } else if object.contains_key("friends") {
            StreamMessage::Friends(serde_json::from_value(take("friends"))?)
        } else if object.contains_key("event") {
            StreamMessage::Event(serde_json::from_value(value)?)
        } else if object.contains_key("direct_message") {
            StreamMessage::DirectMessage(take("direct_message"))
        } else if object.contains_key("id_str")
            && object.contains_key("text")
            && object.contains_key("user")
        {
            StreamMessage::Tweet(serde_json::from_value(value)?)
        } else {
            StreamMessage::Unknown(value)
        };

        Ok(message)
    }

    /// Short name of the message kind, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            StreamMessage::Tweet(_) => "tweet",
            StreamMessage::Delete(_) => "delete",
            StreamMessage::Limit(_) => "limit",
            StreamMessage::Friends(_) => "friends",
            StreamMessage::Event(_) => "event",
            StreamMessage::Disconnect(_) => "disconnect",
            StreamMessage::Warning(_) => "warning",
            StreamMessage::StatusWithheld(_) => "status_withheld",
            StreamMessage::UserWithheld(_) => "user_withheld",
            StreamMessage::ScrubGeo(_) => "scrub_geo",
            StreamMessage::DirectMessage(_) => "direct_message",
            StreamMessage::Unknown(_) => "unknown",
        }
    }
}
