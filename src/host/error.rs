use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Failed to launch osascript: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("osascript exited with status {status:?}: {stderr}")]
    Failed { status: Option<i32>, stderr: String },
    #[error("Host reported an error: {0}")]
    Host(String),
    #[error("Host reply is not valid UTF-8")]
    InvalidUtf8,
    #[error("Malformed host reply: {0}")]
    Parse(#[from] serde_json::Error),
}
