//! Shelter site backend.
//!
//! A REST backend with SQLite persistence serving blog posts, blog likes and
//! Stripe-backed donations, plus the `client` module that drives the
//! donation form and like button flows against it.

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod donation;
pub mod errors;
pub mod models;
pub mod stripe;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use db::Repository;
use stripe::StripeClient;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub stripe: Arc<StripeClient>,
    pub config: Arc<Config>,
}

/// Create the application router with all routes.
///
/// The like endpoint reads the peer address, so the router must be served
/// with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.admin_psk.clone();

    // Admin routes, mounted under /api/admin
    let admin_routes = Router::new()
        .route("/blog", post(api::create_post))
        .route("/donations", get(api::list_donations))
        .layer(middleware::from_fn(move |req, next| {
            auth::admin_auth_layer(psk.clone(), req, next)
        }));

    // Public routes
    let public_routes = Router::new()
        .route("/blog", get(api::list_posts))
        .route("/blog/{id}", get(api::get_post))
        .route("/blog/{id}/like", post(api::toggle_like))
        .route(
            "/donations/create-payment-intent",
            post(api::create_payment_intent),
        );

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api/admin", admin_routes)
        .nest("/api", public_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
