use thiserror::Error;

/// Per-stage failure for a single company. The batch loop logs these and
/// moves on; only batch-level problems (DB, config, input files) abort the
/// run, via anyhow at the binary boundary.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("parse: {0}")]
    Parse(String),
    #[error("model call: {0}")]
    ExternalService(String),
}

impl StageError {
    pub fn fetch(url: &str, reason: impl ToString) -> Self {
        StageError::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
