//! Route definitions for form templates.

use axum::routing::get;
use axum::Router;

use crate::handlers::form_templates;
use crate::state::AppState;

/// Routes mounted at `/form-templates`.
///
/// ```text
/// GET    /      -> list_templates
/// POST   /      -> create_template (admin only)
/// GET    /{id}  -> get_template
/// PUT    /{id}  -> update_template (admin only)
/// PATCH  /{id}  -> update_template (admin only)
/// DELETE /{id}  -> delete_template (admin only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(form_templates::list_templates).post(form_templates::create_template),
        )
        .route(
            "/{id}",
            get(form_templates::get_template)
                .put(form_templates::update_template)
                .patch(form_templates::update_template)
                .delete(form_templates::delete_template),
        )
}
