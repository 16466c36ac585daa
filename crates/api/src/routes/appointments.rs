//! Route definitions for appointment widgets and bookings.

use axum::routing::get;
use axum::Router;

use crate::handlers::appointments;
use crate::state::AppState;

/// Routes mounted at `/appointments`.
///
/// ```text
/// GET    /widgets                 -> list_widgets (auth required)
/// POST   /widgets                 -> create_widget (auth required)
/// GET    /widgets/{id}            -> get_widget (auth required)
/// PUT    /widgets/{id}            -> update_widget (auth required)
/// PATCH  /widgets/{id}            -> update_widget (auth required)
/// DELETE /widgets/{id}            -> delete_widget (auth required)
/// GET    /widgets/{id}/bookings   -> list_bookings (auth required)
/// GET    /{id}                    -> get_public_widget
/// POST   /{id}                    -> book
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/widgets",
            get(appointments::list_widgets).post(appointments::create_widget),
        )
        .route(
            "/widgets/{id}",
            get(appointments::get_widget)
                .put(appointments::update_widget)
                .patch(appointments::update_widget)
                .delete(appointments::delete_widget),
        )
        .route("/widgets/{id}/bookings", get(appointments::list_bookings))
        .route(
            "/{id}",
            get(appointments::get_public_widget).post(appointments::book),
        )
}
