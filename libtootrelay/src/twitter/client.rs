//! Twitter REST and streaming client.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::config::TwitterConfig;
use crate::error::TwitterError;
use crate::twitter::oauth::OAuthSigner;
use crate::twitter::stream::{decode_messages, MessageStream};
use crate::twitter::types::User;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which accounts' tweets the user stream delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamWith {
    /// Only the authenticated user's own activity
    User,
    /// The authenticated user plus every account it follows
    Followings,
}

impl StreamWith {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamWith::User => "user",
            StreamWith::Followings => "followings",
        }
    }
}

pub struct TwitterClient {
    http: Client,
    api_url: String,
    stream_url: String,
    signer: OAuthSigner,
}

impl TwitterClient {
    pub fn new(config: &TwitterConfig) -> Result<Self, TwitterError> {
        // No overall timeout: the stream response never completes
        let http = Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .user_agent(format!("toot-relay/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            stream_url: config.stream_url.trim_end_matches('/').to_string(),
            signer: OAuthSigner::new(config),
        })
    }

    /// Check the configured credentials and return the authenticated user
    #[instrument(skip(self))]
    pub async fn verify_credentials(&self) -> Result<User, TwitterError> {
        let url = format!("{}/1.1/account/verify_credentials.json", self.api_url);
        let authorization = self.signer.authorization("GET", &url, &[])?;

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, authorization)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let user: User = ensure_success(response).await?.json().await?;
        debug!(screen_name = %user.screen_name, "Verified Twitter credentials");
        Ok(user)
    }

    /// Open the user stream.
    ///
    /// Fails if the connection cannot be established or Twitter rejects it;
    /// once open, read errors surface as items of the returned stream.
    #[instrument(skip(self))]
    pub async fn user_stream(&self, with: StreamWith) -> Result<MessageStream, TwitterError> {
        let url = format!("{}/1.1/user.json", self.stream_url);
        let params = [("with", with.as_str())];
        let authorization = self.signer.authorization("GET", &url, &params)?;

        let response = self
            .http
            .get(&url)
            .query(&params)
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        info!(url = %url, with = with.as_str(), "Connected to Twitter user stream");

        Ok(Box::pin(decode_messages(Box::pin(response.bytes_stream()))))
    }
}

#[derive(Deserialize)]
struct ApiErrors {
    errors: Vec<ApiErrorEntry>,
}

#[derive(Deserialize)]
struct ApiErrorEntry {
    message: String,
}

async fn ensure_success(response: Response) -> Result<Response, TwitterError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrors>(&body)
        .ok()
        .and_then(|e| e.errors.into_iter().next())
        .map(|e| e.message)
        .unwrap_or(body);

    Err(TwitterError::Api {
        status: status.as_u16(),
        message,
    })
}
