use std::time::Duration;

use anyhow::{Context, Result};
use config::Config;
use serde::Deserialize;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: String,
    pub job_links_csv: String,
    pub filtered_links_csv: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub model: String,
    pub max_response_tokens: u32,
    /// Token-bucket burst size for outbound network/LLM calls.
    pub throttle_capacity: f64,
    /// Tokens added per second; 0.1 matches the original one-call-per-10s pace.
    pub throttle_refill_per_sec: f64,
}

impl Settings {
    /// Environment overrides (prefix CAREER_SCRAPER) on top of defaults,
    /// e.g. CAREER_SCRAPER_MODEL=gpt-4o. The OpenAI key itself is read by
    /// the client from OPENAI_API_KEY.
    pub fn load() -> Result<Self> {
        Config::builder()
            .set_default("db_path", "data/career_scraper.sqlite")?
            .set_default("job_links_csv", "job_links.csv")?
            .set_default("filtered_links_csv", "filtered_jobs_links.csv")?
            .set_default("user_agent", USER_AGENT)?
            .set_default("request_timeout_secs", 10)?
            .set_default("model", "gpt-4o-mini")?
            .set_default("max_response_tokens", 1000)?
            .set_default("throttle_capacity", 1.0)?
            .set_default("throttle_refill_per_sec", 0.1)?
            .add_source(config::Environment::with_prefix("CAREER_SCRAPER"))
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Invalid configuration value")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::load().unwrap();
        assert_eq!(s.request_timeout_secs, 10);
        assert_eq!(s.model, "gpt-4o-mini");
        assert_eq!(s.filtered_links_csv, "filtered_jobs_links.csv");
    }
}
