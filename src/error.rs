use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuggestError {
    #[error("invalid search endpoint '{0}': {1}")]
    InvalidEndpoint(String, String),

    #[error("security token is not a valid header value")]
    InvalidToken,

    #[error("search endpoint returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed search response: {0}")]
    MalformedPayload(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("widget has been unmounted")]
    Unmounted,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SuggestError>;
