use actix_web::{
    error::{BlockingError, JsonPayloadError, QueryPayloadError},
    http::StatusCode,
    web, HttpRequest, HttpResponse, ResponseError,
};
use log::error;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Every failure a handler can answer with.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),
    /// Bad credentials. Deliberately says nothing about which part was wrong.
    #[error("Invalid email or password")]
    Auth,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    /// Duplicate of something that must be unique.
    #[error("{0}")]
    Conflict(String),
    #[error("Server error")]
    Server(String),
}

/// Wire shape of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn server(source: impl std::fmt::Display) -> Self {
        ApiError::Server(source.to_string())
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Server(detail) => ErrorBody {
                message: self.to_string(),
                error: Some(detail.clone()),
            },
            other => ErrorBody {
                message: other.to_string(),
                error: None,
            },
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            // Duplicates have always been reported as a plain bad request.
            ApiError::Validation(_) | ApiError::Auth | ApiError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Server(detail) = self {
            error!("Request failed: {}", detail);
        }
        HttpResponse::build(self.status_code()).json(self.body())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(what) => ApiError::Conflict(what),
            other => ApiError::server(other),
        }
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::server(format!("password hashing failed: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ApiError::server(format!("session token error: {}", err))
    }
}

impl From<BlockingError> for ApiError {
    fn from(err: BlockingError) -> Self {
        ApiError::server(err)
    }
}

/// JSON body extractor settings: decode failures become validation errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        ApiError::validation(format!("Invalid request body: {}", err)).into()
    })
}

/// Query string extractor settings, same treatment as `json_config`.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req: &HttpRequest| {
        ApiError::validation(format!("Invalid query string: {}", err)).into()
    })
}
