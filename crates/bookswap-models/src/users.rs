//! User profile models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Role names stored in `users.role` and carried in access tokens.
pub mod roles {
    /// Lists books for exchange.
    pub const OWNER: &str = "OWNER";
    /// Browses and requests books.
    pub const SEEKER: &str = "SEEKER";
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub mobile: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone, Default, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(min = 2, message = "name must be at least 2 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 10, message = "mobile must be at least 10 characters"))]
    pub mobile: Option<String>,
}
