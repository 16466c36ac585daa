pub mod appointments;
pub mod auth;
pub mod form_templates;
pub mod health;
pub mod pricing;
pub mod uploads;
pub mod widgets;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                              register (public)
/// /auth/login                                 login (public)
/// /auth/refresh                               refresh (public)
/// /auth/logout                                logout (requires auth)
/// /auth/me                                    current user (requires auth)
/// /auth/google                                Google consent redirect
/// /auth/google/callback                       Google sign-in / Sheets connect
///
/// /widgets                                    list, create (requires auth)
/// /widgets/{id}                               get, put, patch, delete
/// /widgets/{id}/submissions                   stored submissions
/// /widgets/{id}/submissions/download          submissions as CSV
///
/// /public/widgets/{id}                        embedded form definition
/// /public/widgets/{id}/submit                 form submission
///
/// /form-templates                             list (public), create (admin)
/// /form-templates/{id}                        get (public), update, delete (admin)
///
/// /uploads/images                             image upload (requires auth)
///
/// /pricing/containers                         list, create (requires auth)
/// /pricing/containers/{id}                    get, put, patch, delete
/// /pricing/{id}                               public pricing table
///
/// /appointments/widgets                       list, create (requires auth)
/// /appointments/widgets/{id}                  get, put, patch, delete
/// /appointments/widgets/{id}/bookings         bookings (requires auth)
/// /appointments/{id}                          public widget (GET), book (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication (email/password and Google).
        .nest("/auth", auth::router())
        // Form widget builder.
        .nest("/widgets", widgets::owner_router())
        // Embedded form endpoints.
        .nest("/public/widgets", widgets::public_router())
        // Starter templates.
        .nest("/form-templates", form_templates::router())
        // Builder image uploads.
        .nest("/uploads", uploads::router())
        // Pricing tables.
        .nest("/pricing", pricing::router())
        // Appointment booking widgets.
        .nest("/appointments", appointments::router())
}
