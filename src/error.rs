//! Engine error types.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced to callers of the engine. None of them is fatal.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// Block index outside the chain.
    #[error("No such block exists! (index {0})")]
    NotFound(u64),

    /// Unparsable or out-of-range caller input; no state was touched.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Bad key encoding or a private key that does not match the address.
    #[error("wallet error: {0}")]
    Wallet(&'static str),

    /// The chain is locked by a proof-of-work search.
    #[error("mining in progress, try again")]
    Busy,
}

impl ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::InvalidInput(_) | EngineError::Wallet(_) => StatusCode::BAD_REQUEST,
            EngineError::Busy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}
