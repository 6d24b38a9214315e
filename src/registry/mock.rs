use super::{LookupError, PublishedVersionLookup};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Canned lookup results; unknown images are `NotFound`.
///
/// Every queried image name is recorded so tests can assert which lookups
/// happened.
#[derive(Debug, Default)]
pub struct StaticLookup {
    responses: HashMap<String, Result<String, LookupError>>,
    calls: Mutex<Vec<String>>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(mut self, image: &str, version: &str) -> Self {
        self.responses
            .insert(image.to_string(), Ok(version.to_string()));
        self
    }

    pub fn failing(mut self, image: &str, error: LookupError) -> Self {
        self.responses.insert(image.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl PublishedVersionLookup for StaticLookup {
    async fn published_version(&self, image: &str) -> Result<String, LookupError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(image.to_string());

        self.responses
            .get(image)
            .cloned()
            .unwrap_or_else(|| {
                Err(LookupError::NotFound {
                    image: image.to_string(),
                })
            })
    }
}
