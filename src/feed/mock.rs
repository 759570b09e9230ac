//! Scripted feed source for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{FeedError, FeedSource};

/// Feed source that replays queued responses.
///
/// Each fetch pops the next queued response; once the queue is drained the
/// last response is repeated.
pub struct StaticFeed {
    responses: Mutex<VecDeque<Result<String, FeedError>>>,
    last: Mutex<Result<String, FeedError>>,
    delay: Option<Duration>,
    call_count: AtomicU32,
}

impl StaticFeed {
    /// Create a feed that always returns `body`.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            last: Mutex::new(Ok(body.into())),
            delay: None,
            call_count: AtomicU32::new(0),
        }
    }

    /// Create a feed that always fails with `error`.
    pub fn failing(error: FeedError) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            last: Mutex::new(Err(error)),
            delay: None,
            call_count: AtomicU32::new(0),
        }
    }

    /// Queue a response ahead of the default one.
    pub fn then(self, response: Result<String, FeedError>) -> Self {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
        self
    }

    /// Sleep before answering each fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the response returned once the queue is drained.
    pub fn set_body(&self, body: impl Into<String>) {
        if let Ok(mut last) = self.last.lock() {
            *last = Ok(body.into());
        }
    }

    /// Get the number of fetches served.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for StaticFeed {
    fn describe(&self) -> String {
        "static".to_string()
    }

    async fn fetch_body(&self) -> Result<String, FeedError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self
            .responses
            .lock()
            .map_err(|_| FeedError::Unavailable("mock feed poisoned".to_string()))?
            .pop_front();

        match queued {
            Some(response) => {
                if let Ok(mut last) = self.last.lock() {
                    *last = response.clone();
                }
                response
            }
            None => self
                .last
                .lock()
                .map_err(|_| FeedError::Unavailable("mock feed poisoned".to_string()))?
                .clone(),
        }
    }
}
