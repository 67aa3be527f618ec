use sqlx::PgPool;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use bookswap_core::AppError;
use bookswap_models::{UpdateProfileDto, UserProfile};

const PROFILE_COLUMNS: &str = "id, email, name, mobile, role, created_at";

pub struct UserService;

impl UserService {
    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn get_profile(db: &PgPool, user_id: Uuid) -> Result<UserProfile, AppError> {
        let query = format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, UserProfile>(&query)
            .bind(user_id)
            .fetch_optional(db)
            .await
            .map_err(|e| {
                error!(user.id = %user_id, error = %e, "Database error fetching profile");
                AppError::from(e)
            })?
            .ok_or_else(|| {
                debug!(user.id = %user_id, "Profile not found");
                AppError::not_found(anyhow::anyhow!("User not found"))
            })
    }

    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "users"))]
    pub async fn update_profile(
        db: &PgPool,
        user_id: Uuid,
        dto: UpdateProfileDto,
    ) -> Result<UserProfile, AppError> {
        let query = format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                mobile = COALESCE($3, mobile), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {PROFILE_COLUMNS}"
        );

        let profile = sqlx::query_as::<_, UserProfile>(&query)
            .bind(user_id)
            .bind(&dto.name)
            .bind(&dto.mobile)
            .fetch_optional(db)
            .await
            .map_err(|e| {
                error!(user.id = %user_id, error = %e, "Database error updating profile");
                AppError::from(e)
            })?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        info!(user.id = %user_id, "Profile updated");

        Ok(profile)
    }
}
