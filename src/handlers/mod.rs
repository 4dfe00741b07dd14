pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/profile", put(auth::update_profile))
        .route(
            "/api/services",
            get(catalog::list_services).post(catalog::create_service),
        )
        .route(
            "/api/services/:id",
            get(catalog::get_service)
                .put(catalog::update_service)
                .delete(catalog::delete_service),
        )
        .route("/api/availability", get(bookings::available_slots))
        .route(
            "/api/bookings/available-slots",
            get(bookings::available_slots),
        )
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/bookings/my-bookings", get(bookings::my_bookings))
        .route("/api/bookings/admin/all", get(bookings::list_all))
        .route("/api/bookings/:id", get(bookings::get_booking))
        .route("/api/bookings/:id/cancel", put(bookings::cancel_booking))
        .route("/api/bookings/:id/status", put(bookings::update_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
