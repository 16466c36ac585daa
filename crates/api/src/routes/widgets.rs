//! Route definitions for form widgets.
//!
//! Two routers are provided:
//! - `owner_router()` for the builder, mounted at `/widgets`
//! - `public_router()` for embedded forms, mounted at `/public/widgets`

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{public_widgets, widgets};
use crate::state::AppState;

/// Owner routes mounted at `/widgets` (auth required).
///
/// ```text
/// GET    /                              -> list_widgets (?widget_type=)
/// POST   /                              -> create_widget
/// GET    /{id}                          -> get_widget
/// PUT    /{id}                          -> replace_widget
/// PATCH  /{id}                          -> update_widget
/// DELETE /{id}                          -> delete_widget
/// GET    /{id}/submissions              -> list_submissions
/// GET    /{id}/submissions/download     -> download_submissions (CSV)
/// ```
pub fn owner_router() -> Router<AppState> {
    Router::new()
        .route("/", get(widgets::list_widgets).post(widgets::create_widget))
        .route(
            "/{id}",
            get(widgets::get_widget)
                .put(widgets::replace_widget)
                .patch(widgets::update_widget)
                .delete(widgets::delete_widget),
        )
        .route("/{id}/submissions", get(widgets::list_submissions))
        .route(
            "/{id}/submissions/download",
            get(widgets::download_submissions),
        )
}

/// Public routes mounted at `/public/widgets`.
///
/// ```text
/// GET  /{id}         -> get_public_widget
/// POST /{id}/submit  -> submit (JSON or multipart)
/// ```
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(public_widgets::get_public_widget))
        .route("/{id}/submit", post(public_widgets::submit))
}

/// Embed script route, mounted at the root (not under `/api/v1`).
///
/// ```text
/// GET /form-builder/script/{file}  -> widget_script
/// ```
pub fn script_router() -> Router<AppState> {
    Router::new().route(
        "/form-builder/script/{file}",
        get(public_widgets::widget_script),
    )
}
