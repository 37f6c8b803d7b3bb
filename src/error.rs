use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{predecessor} snapshot not found. Run --{predecessor} first before --{stage}.")]
    PreconditionMissing { stage: String, predecessor: String },

    #[error("API error: {message}")]
    Api { message: String },
}

impl ScraperError {
    pub fn api(message: impl Into<String>) -> Self {
        ScraperError::Api { message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
