use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use bookswap_core::{ErrorResponse, PaginationMeta};
use bookswap_models::{
    AppliedFilters, Book, BookListResponse, BookSearchResponse, BookWithOwner, CreateBookDto,
    MessageResponse, Owner, OwnerBooksResponse, UpdateBookDto, UpdateProfileDto, UserProfile,
};

use crate::modules::health::controller::{CacheStatus, HealthResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::health::controller::health,
        crate::modules::books::controller::list_books,
        crate::modules::books::controller::search_books,
        crate::modules::books::controller::get_book,
        crate::modules::books::controller::create_book,
        crate::modules::books::controller::update_book,
        crate::modules::books::controller::delete_book,
        crate::modules::users::controller::get_profile,
        crate::modules::users::controller::update_profile,
        crate::modules::users::controller::get_my_books,
    ),
    components(
        schemas(
            Book,
            Owner,
            BookWithOwner,
            CreateBookDto,
            UpdateBookDto,
            AppliedFilters,
            BookListResponse,
            BookSearchResponse,
            OwnerBooksResponse,
            MessageResponse,
            UserProfile,
            UpdateProfileDto,
            HealthResponse,
            CacheStatus,
            PaginationMeta,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Books", description = "Book listings, search and owner management"),
        (name = "Users", description = "Current user profile"),
        (name = "Health", description = "Service health")
    ),
    info(
        title = "Bookswap API",
        version = "0.1.0",
        description = "Peer-to-peer book exchange API built with Rust, Axum, PostgreSQL and Redis.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
