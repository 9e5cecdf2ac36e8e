use std::any::Any;
use std::fmt::Display;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use rollcall_core::EngineError;
use rollcall_store::StoreError;
use serde_json::json;
use thiserror::Error;

use crate::state::AppState;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{message}")]
    Internal { message: String, detail: String },
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn internal(message: impl Into<String>, detail: impl Display) -> Self {
        AppError::Internal {
            message: message.into(),
            detail: detail.to_string(),
        }
    }
}

/// Diagnostic detail of a 500, carried in response extensions until
/// [`attach_error_detail`] decides whether the client may see it.
#[derive(Debug, Clone)]
pub struct InternalDetail {
    pub message: String,
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(error) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "success": false, "error": error })))
                    .into_response()
            }
            AppError::Authentication(error) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "success": false, "error": error })))
                    .into_response()
            }
            AppError::Internal { message, detail } => {
                tracing::error!(%message, %detail, "request failed");
                let mut response = (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "error": &message })),
                )
                    .into_response();
                response
                    .extensions_mut()
                    .insert(InternalDetail { message, detail });
                response
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::internal("Database error", e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::internal("File storage error", e)
    }
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::NoFaceDetected => AppError::validation("No face detected in image"),
            EngineError::InvalidBase64(_) => AppError::validation(e.to_string()),
        }
    }
}

/// Re-render 500 bodies with their diagnostic detail when configured to.
pub async fn attach_error_detail(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !state.config.expose_error_detail {
        return response;
    }
    match response.extensions().get::<InternalDetail>().cloned() {
        Some(InternalDetail { message, detail }) => (
            response.status(),
            Json(json!({ "success": false, "error": message, "detail": detail })),
        )
            .into_response(),
        None => response,
    }
}

/// `CatchPanicLayer` hook: a panicking handler becomes an ordinary 500.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    AppError::internal("Internal server error", detail).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::validation("x").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Authentication("x".into()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::internal("x", "y").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_kept_out_of_band() {
        let response = AppError::internal("Database error", "disk I/O error").into_response();
        let detail = response.extensions().get::<InternalDetail>().unwrap();
        assert_eq!(detail.message, "Database error");
        assert_eq!(detail.detail, "disk I/O error");
    }

    #[test]
    fn test_engine_errors_are_validation() {
        assert!(matches!(
            AppError::from(EngineError::NoFaceDetected),
            AppError::Validation(_)
        ));
    }

    #[test]
    fn test_panic_payloads() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = response.extensions().get::<InternalDetail>().unwrap();
        assert_eq!(detail.detail, "boom");

        let response = panic_response(Box::new(String::from("owned boom")));
        assert_eq!(
            response.extensions().get::<InternalDetail>().unwrap().detail,
            "owned boom"
        );
    }
}
