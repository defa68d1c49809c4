use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Which side of a book a lookup needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    Bids,
    Asks,
}

impl std::fmt::Display for BookSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookSide::Bids => f.write_str("bids"),
            BookSide::Asks => f.write_str("asks"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Empty book: {exchange} has no {side}")]
    EmptyBook { exchange: String, side: BookSide },

    #[error("Division by zero: trade cost is zero")]
    DivisionByZero,

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AppError::Format(e.to_string())
        } else {
            AppError::Network(e.to_string())
        }
    }
}
