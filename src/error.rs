use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the content client, the pagination layer and rendering.
#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Not a parseable date: {input:?}")]
    Date { input: String },

    #[error("No post found with uid {uid:?}")]
    NotFound { uid: String },

    #[error("Content API did not report a master ref")]
    MissingMasterRef,

    #[error("A page is already being loaded")]
    InFlight,

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Unknown locale: {0}")]
    UnknownLocale(String),
}
