use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeritError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("thread layout not recognised: {0}")]
    Layout(String),

    #[error("blob store rejected upload ({status}): {body}")]
    BlobRejected { status: u16, body: String },

    #[error("no blob store token; set VERCEL_TOKEN or MERIT_BLOB__TOKEN")]
    MissingToken,
}

pub type Result<T> = std::result::Result<T, MeritError>;
