use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Empty question.")]
    EmptyInput,

    #[error("Please keep it polite and safe.")]
    InappropriateInput,

    #[error("I couldn't understand that. Try a clearer request (e.g., 'dark fantasy about loyalty').")]
    GibberishInput,

    #[error("No candidates found.")]
    NoCandidates,

    #[error("No close matches. Add topics, mood, or genre.")]
    NoCloseMatch,

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let body = ErrorResponse {
            error: self.to_string(),
        };

        match self {
            ApiError::EmptyInput
            | ApiError::InappropriateInput
            | ApiError::GibberishInput
            | ApiError::NoCandidates
            | ApiError::NoCloseMatch => HttpResponse::BadRequest().json(body),
            // Callers get a generic retry message; the cause stays in the log
            // so "no match" and "backend down" are never conflated.
            ApiError::ExternalService(detail) => {
                error!("External service failure: {}", detail);
                HttpResponse::BadGateway().json(ErrorResponse {
                    error: "The recommendation service is temporarily unavailable. Please try again."
                        .to_string(),
                })
            }
            _ => HttpResponse::InternalServerError().json(body),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::ExternalService(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::Config(err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}
