use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("config error: {0}")]
    Config(String),

    #[error("candle feed returned status {status}: {body}")]
    FeedStatus { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
