use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TwitterError {
    #[error("failed to authenticate with x: {0}")]
    Auth(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unable to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("api error: {0}")]
    Api(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("unable to use session file {path:?}: {msg}")]
    Session { path: PathBuf, msg: String },
}
