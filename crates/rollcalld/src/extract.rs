//! Request extractors that report failures in the JSON error shape.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderMap},
    Form, Json,
};
use rollcall_core::engine::decode_base64_image;
use serde::{de::DeserializeOwned, Deserialize};

use crate::error::AppError;

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false)
}

/// A body accepted either as JSON or as `application/x-www-form-urlencoded`.
pub struct JsonOrForm<T>(pub T);

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_json(req.headers()) {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|_| AppError::validation("Invalid input"))?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|_| AppError::validation("Invalid input"))?;
            Ok(Self(value))
        }
    }
}

/// JSON body whose rejection is a validation error.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;
        Ok(Self(value))
    }
}

#[derive(Deserialize)]
struct Base64Image {
    image: Option<String>,
}

/// Image bytes sent raw, or as JSON `{"image": "<base64 or data URL>"}`.
pub struct ImagePayload(pub Vec<u8>);

impl<S> FromRequest<S> for ImagePayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = if is_json(req.headers()) {
            let JsonBody(body) = JsonBody::<Base64Image>::from_request(req, state).await?;
            let encoded = body.image.filter(|s| !s.trim().is_empty()).ok_or_else(|| {
                AppError::validation("No image data provided")
            })?;
            decode_base64_image(&encoded)?
        } else {
            Bytes::from_request(req, state)
                .await
                .map_err(|e| AppError::validation(e.body_text()))?
                .to_vec()
        };

        if bytes.is_empty() {
            return Err(AppError::validation("No image data provided"));
        }
        Ok(Self(bytes))
    }
}
