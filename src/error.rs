use thiserror::Error;

/// Why no coordinates could be produced for this session.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    Denied,

    #[error("location unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error("no weather api key configured (use --api-key or WXDASH_API_KEY)")]
    MissingApiKey,
}

pub type Result<T> = std::result::Result<T, Error>;
