use axum::{Json, extract::State};
use tracing::instrument;

use bookswap_core::{AppError, ErrorResponse};
use bookswap_models::{OwnerBooksResponse, UpdateProfileDto, UserProfile};

use crate::middleware::auth::AuthUser;
use crate::modules::books::service::BookService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::UserService;

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 401, description = "Unauthorized - missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    let profile = UserService::get_profile(&state.db, auth_user.user_id()?).await?;
    Ok(Json(profile))
}

/// Update the current user's name or mobile number
#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 401, description = "Unauthorized - missing or invalid token", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateProfileDto>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = UserService::update_profile(&state.db, auth_user.user_id()?, dto).await?;
    Ok(Json(profile))
}

/// List the books owned by the current user
#[utoipa::path(
    get,
    path = "/api/users/books",
    responses(
        (status = 200, description = "Books owned by the caller", body = OwnerBooksResponse),
        (status = 401, description = "Unauthorized - missing or invalid token", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_my_books(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<OwnerBooksResponse>, AppError> {
    let books = BookService::list_owner_books(&state.db, auth_user.user_id()?).await?;
    Ok(Json(OwnerBooksResponse { books }))
}
