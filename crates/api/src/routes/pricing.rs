//! Route definitions for pricing tables.

use axum::routing::get;
use axum::Router;

use crate::handlers::pricing;
use crate::state::AppState;

/// Routes mounted at `/pricing`.
///
/// ```text
/// GET    /containers       -> list_containers (auth required)
/// POST   /containers       -> create_container (auth required)
/// GET    /containers/{id}  -> get_container (auth required)
/// PUT    /containers/{id}  -> update_container (auth required)
/// PATCH  /containers/{id}  -> update_container (auth required)
/// DELETE /containers/{id}  -> delete_container (auth required)
/// GET    /{id}             -> get_public_pricing
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/containers",
            get(pricing::list_containers).post(pricing::create_container),
        )
        .route(
            "/containers/{id}",
            get(pricing::get_container)
                .put(pricing::update_container)
                .patch(pricing::update_container)
                .delete(pricing::delete_container),
        )
        .route("/{id}", get(pricing::get_public_pricing))
}
