use std::time::Duration;

use anyhow::Result;
use reqwest::StatusCode;

use crate::error::StageError;

/// Thin GET wrapper: browser-like user-agent, fixed timeout, no retry.
/// Anything other than a 200 body is a `StageError::Fetch` and the caller
/// treats the page as having no data.
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(PageFetcher { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<String, StageError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StageError::fetch(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(StageError::fetch(url, format!("status {}", status)));
        }

        response.text().await.map_err(|e| StageError::fetch(url, e))
    }
}
