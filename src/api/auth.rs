//! API Key Authentication
//!
//! Extractor guarding write routes with the static key from configuration.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::handlers::AppState;
use crate::error::ApiError;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Proof that the request carried the configured API key.
///
/// Add it as a handler argument to protect a route; a missing or wrong key
/// rejects the request with 401 before the body is read.
#[derive(Debug, Clone, Copy)]
pub struct RequireApiKey;

#[async_trait]
impl FromRequestParts<AppState> for RequireApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        match provided {
            Some(key) if !state.config.api_key.is_empty() && key == state.config.api_key => {
                Ok(RequireApiKey)
            }
            _ => Err(ApiError::Unauthorized(
                "Unauthorized: Invalid API Key".to_string(),
            )),
        }
    }
}
