use std::str::FromStr;

use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, models::Role, state::AppState};

/// Verified bearer identity. The signing key comes from the config carried in
/// [`AppState`], so tests can mint tokens without touching process env.
#[derive(Debug, Clone)]
pub struct AuthPrincipal {
    pub id: Uuid,
    pub role: Role,
    pub store_id: Option<Uuid>,
}

impl FromRequestParts<AppState> for AuthPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::Unauthorized("Invalid Authorization scheme".into()));
        }
        let token = auth_str.trim_start_matches("Bearer ").trim();

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

        let id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid subject in token".into()))?;
        let role = Role::from_str(&decoded.claims.role)
            .map_err(|_| AppError::Unauthorized("Invalid role in token".into()))?;
        let store_id = match decoded.claims.store_id.as_deref() {
            Some(raw) => Some(
                Uuid::parse_str(raw)
                    .map_err(|_| AppError::Unauthorized("Invalid store id in token".into()))?,
            ),
            None => None,
        };

        Ok(AuthPrincipal { id, role, store_id })
    }
}
