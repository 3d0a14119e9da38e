//! Mastodon destination
//!
//! Posts statuses through the megalodon library, so any server speaking the
//! Mastodon API (Pleroma, Akkoma, GoToSocial, ...) works as a relay target.

use async_trait::async_trait;
use megalodon::error::{Error as MegalodonError, Kind};
use megalodon::megalodon::PostStatusOutput;
use megalodon::{Megalodon, SNS};
use serde::Deserialize;

use crate::config::MastodonConfig;
use crate::destinations::{Destination, PostedStatus};
use crate::error::{DestinationError, Result};

pub struct MastodonClient {
    client: Box<dyn Megalodon + Send + Sync>,
    server: String,
}

impl MastodonClient {
    /// Create a client for `server` authenticated with `access_token`.
    ///
    /// No request is made; a bad token only shows up on the first post.
    pub fn new(server: String, access_token: String) -> Result<Self> {
        let client = megalodon::generator(SNS::Mastodon, server.clone(), Some(access_token), None)
            .map_err(|e| map_megalodon_error(e, "create client"))?;

        Ok(Self { client, server })
    }

    pub fn from_config(config: &MastodonConfig) -> Result<Self> {
        Self::new(
            normalize_server(&config.server),
            config.access_token.trim().to_string(),
        )
    }

    pub fn server(&self) -> &str {
        &self.server
    }
}

#[async_trait]
impl Destination for MastodonClient {
    async fn post(&self, text: &str) -> Result<PostedStatus> {
        let response = self
            .client
            .post_status(text.to_string(), None)
            .await
            .map_err(|e| map_megalodon_error(e, "post status"))?;

        let posted = match response.json {
            PostStatusOutput::Status(status) => PostedStatus {
                url: status.url.unwrap_or(status.uri),
                id: status.id,
            },
            PostStatusOutput::ScheduledStatus(scheduled) => PostedStatus {
                url: format!("{}/scheduled_statuses/{}", self.server, scheduled.id),
                id: scheduled.id,
            },
        };

        Ok(posted)
    }

    fn name(&self) -> &str {
        &self.server
    }
}

/// Ensure the server address carries a scheme and no trailing slash
pub fn normalize_server(server: &str) -> String {
    let server = server.trim().trim_end_matches('/');
    if server.starts_with("http://") || server.starts_with("https://") {
        server.to_string()
    } else {
        format!("https://{}", server)
    }
}


/// Sort a megalodon error into a [`DestinationError`].
///
/// HTTP failures are classified by their response status; anything without
/// a status by the kind of failure.
fn map_megalodon_error(error: MegalodonError, context: &str) -> DestinationError {
    match error {
        MegalodonError::OwnError(own) => match own.status {
            Some(status) => classify_status(status, &own.message, context),
            None => match own.kind {
                Kind::ParseError => DestinationError::Posting(format!(
                    "Unexpected Mastodon response ({}): {}",
                    context, own.message
                )),
                Kind::HTTPStatusError | Kind::HTTPPartialContentError => {
                    DestinationError::Network(format!(
                        "Mastodon request failed ({}): {}",
                        context, own.message
                    ))
                }
                kind => DestinationError::Posting(format!(
                    "Mastodon error ({}): {}: {}",
                    context, kind, own.message
                )),
            },
        },
        MegalodonError::RequestError(e) if e.is_decode() => DestinationError::Posting(format!(
            "Unexpected Mastodon response ({}): {}",
            context, e
        )),
        MegalodonError::RequestError(e) => {
            DestinationError::Network(format!("Mastodon request failed ({}): {}", context, e))
        }
        MegalodonError::JsonError(e) => DestinationError::Posting(format!(
            "Unexpected Mastodon response ({}): {}",
            context, e
        )),
        MegalodonError::ParseError(e) => DestinationError::Validation(format!(
            "Invalid Mastodon server address ({}): {}",
            context, e
        )),
        other => DestinationError::Network(format!("Mastodon error ({}): {}", context, other)),
    }
}

fn classify_status(status: u16, body: &str, context: &str) -> DestinationError {
    let detail = error_detail(body);

    match status {
        401 | 403 => DestinationError::Authentication(format!(
            "Mastodon rejected the access token ({}, HTTP {}): {}",
            context, status, detail
        )),
        422 => DestinationError::Validation(format!(
            "Mastodon refused the status ({}, HTTP {}): {}",
            context, status, detail
        )),
        429 => DestinationError::RateLimit(format!(
            "Mastodon rate limit exceeded ({}, HTTP {}): {}",
            context, status, detail
        )),
        500..=599 => DestinationError::Network(format!(
            "Mastodon server error ({}, HTTP {}): {}",
            context, status, detail
        )),
        _ => DestinationError::Posting(format!(
            "Mastodon HTTP error ({}, HTTP {}): {}",
            context, status, detail
        )),
    }
}

#[derive(Deserialize)]
struct ApiError {
    error: String,
}

/// The `error` field of a Mastodon error body, or the body itself
fn error_detail(body: &str) -> String {
    serde_json::from_str::<ApiError>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.trim().to_string())
}
