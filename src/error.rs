use thiserror::Error;

/// Errors that abort a whole scrape. Nothing is extracted once one of these
/// is returned.
#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("error creating HTTP request: {0}")]
    RequestConstruction(String),

    #[error("error executing HTTP request: {0}")]
    Network(#[from] reqwest::Error),

    #[error("resource not modified (304), no new data available")]
    NotModified,

    #[error("unexpected status code: {status}")]
    UnexpectedStatus { status: reqwest::StatusCode },

    #[error("error parsing HTML document: {0}")]
    DocumentParse(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ScraperError>;

/// Per-candidate failures. These are logged and dropped by the processor and
/// never abort the batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FightError {
    #[error("missing essential fight data: fighter1={fighter1:?}, fighter2={fighter2:?}")]
    MissingField {
        fighter1: Option<String>,
        fighter2: Option<String>,
    },

    #[error("panic during parsing of candidate {index}: {message}")]
    Panicked { index: usize, message: String },
}
