use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Authentication routes
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        // Booking routes
        .route(
            "/bookings",
            get(handlers::list_bookings).post(handlers::create_booking),
        )
        .route("/bookings/:id", put(handlers::update_booking))
        // Slot routes
        .route("/slots", get(handlers::list_slots).post(handlers::create_slot))
        .route("/slots/:id", delete(handlers::delete_slot))
        // Instructor discovery and own profile
        .route("/instructors", get(handlers::list_instructors))
        .route(
            "/instructors/me",
            get(handlers::get_own_instructor).put(handlers::update_own_instructor),
        )
}
