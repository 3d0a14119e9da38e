//! Mock destination for tests
//!
//! Records every status it is asked to post and can be told to fail, so the
//! dispatcher and daemon loop can be exercised without a Mastodon server.
//! Clones share their call log, which lets a test keep a handle after the
//! mock has been moved into a relay.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::destinations::{Destination, PostedStatus};
use crate::error::{DestinationError, Result};

#[derive(Debug, Clone)]
pub struct MockDestination {
    name: String,
    post_error: Option<DestinationError>,
    posted: Arc<Mutex<Vec<String>>>,
}

impl MockDestination {
    /// A destination that accepts every status
    pub fn success(name: &str) -> Self {
        Self {
            name: name.to_string(),
            post_error: None,
            posted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A destination that rejects every status with a posting error
    pub fn post_failure(name: &str, error: &str) -> Self {
        Self::failing(name, DestinationError::Posting(error.to_string()))
    }

    /// A destination that rejects every status with `error`
    pub fn failing(name: &str, error: DestinationError) -> Self {
        Self {
            post_error: Some(error),
            ..Self::success(name)
        }
    }

    /// Number of post attempts, failed ones included
    pub fn post_call_count(&self) -> usize {
        self.lock().len()
    }

    /// Text of every post attempt, in order
    pub fn posted_content(&self) -> Vec<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        // a poisoned log only means another test thread panicked mid-push
        self.posted.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Destination for MockDestination {
    async fn post(&self, text: &str) -> Result<PostedStatus> {
        let count = {
            let mut posted = self.lock();
            posted.push(text.to_string());
            posted.len()
        };

        if let Some(error) = &self.post_error {
            return Err(error.clone().into());
        }

        let id = uuid::Uuid::new_v4().to_string();
        Ok(PostedStatus {
            url: format!("https://{}/@mock/{}", self.name, count),
            id,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
