use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use bookswap_auth::claims::Claims;
use bookswap_auth::jwt::verify_token;
use bookswap_core::AppError;
use bookswap_models::roles;

use crate::state::AppState;

/// Extractor that validates the bearer token and provides its claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Get the user ID as UUID
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))
    }

    pub fn is_owner(&self) -> bool {
        self.0.role == roles::OWNER
    }

    /// Rejects non-owners with 403.
    pub fn require_owner(&self) -> Result<(), AppError> {
        if self.is_owner() {
            Ok(())
        } else {
            Err(AppError::forbidden("Only owners can list books"))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_user(sub: &str, role: &str) -> AuthUser {
        AuthUser(Claims {
            sub: sub.to_string(),
            email: "reader@example.com".to_string(),
            role: role.to_string(),
            exp: 9999999999,
            iat: 1234567890,
        })
    }

    #[test]
    fn test_user_id_parses_subject() {
        let id = Uuid::new_v4();
        assert_eq!(auth_user(&id.to_string(), roles::OWNER).user_id().unwrap(), id);
    }

    #[test]
    fn test_invalid_subject_is_unauthorized() {
        let err = auth_user("not-a-uuid", roles::OWNER).user_id().unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_require_owner() {
        assert!(auth_user("x", roles::OWNER).require_owner().is_ok());

        let err = auth_user("x", roles::SEEKER).require_owner().unwrap_err();
        assert_eq!(err.status.as_u16(), 403);
    }
}
