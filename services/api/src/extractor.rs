use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    Json,
};
use uuid::Uuid;

use driveconnect_auth::Claims;
use driveconnect_common::{ApiResponse, AppError};

use crate::state::AppState;

/// Authenticated caller, validated from the bearer token.
///
/// Use this extractor in protected handlers; public handlers simply omit it.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub claims: Claims,
}

fn reject(message: String) -> (StatusCode, Json<ApiResponse<()>>) {
    (StatusCode::UNAUTHORIZED, Json(ApiResponse::error(message)))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = (StatusCode, Json<ApiResponse<()>>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "));

        let token = match token {
            Some(token) => token,
            None => return Err(reject("Missing authentication token".to_string())),
        };

        // Expired and malformed tokens carry distinct messages
        let claims = state.jwt_service.validate_token(token).map_err(|err| {
            let message = match err {
                AppError::Authentication(msg) => msg,
                _ => "Invalid token".to_string(),
            };
            reject(message)
        })?;

        let user_id = claims
            .user_id()
            .map_err(|_| reject("Invalid user ID in token".to_string()))?;

        Ok(CurrentUser { user_id, claims })
    }
}
