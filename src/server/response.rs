//! Response envelope shared by every API route
//!
//! Success: `{success: true, message?, data?, pagination?}`.
//! Failure: `{success: false, error, code, details?, stack?}`.

use std::error::Error as _;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::config::Environment;
use crate::errors::CatalogError;
use crate::services::pagination::{Page, Pagination};
use crate::services::validation::FieldError;

static ENVIRONMENT: OnceCell<Environment> = OnceCell::new();

/// Record the process environment; only the first call takes effect.
pub fn set_environment(environment: Environment) {
    let _ = ENVIRONMENT.set(environment);
}

fn is_development() -> bool {
    ENVIRONMENT.get() == Some(&Environment::Development)
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            pagination: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    pub fn page(page: Page<T>) -> Self {
        Self {
            pagination: Some(page.pagination),
            ..Self::ok(page.items)
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            pagination: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// 201 with the envelope.
pub fn created<T: Serialize>(data: T, message: &str) -> Response {
    (StatusCode::CREATED, ApiResponse::with_message(data, message)).into_response()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<Vec<String>>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: code.into(),
            details: None,
            stack: None,
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut body = ErrorBody::new(self.to_string(), self.error_code());
        match &self {
            CatalogError::Validation(err) => body.details = Some(err.details.clone()),
            CatalogError::Database { .. } => body.error = "Internal server error".to_string(),
            _ => {}
        }

        if self.is_server_error() {
            error!("Request failed with {}: {}", status, error_chain(&self).join(": "));
            if is_development() {
                body.stack = Some(error_chain(&self));
            }
        } else {
            debug!("Request rejected with {}: {}", status, self);
        }

        (status, Json(body)).into_response()
    }
}

fn error_chain(err: &CatalogError) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}
