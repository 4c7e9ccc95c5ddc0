//! HTTP adapter: webhook endpoints and the internal RPC surface.

mod dto;
mod error;
mod handlers;
mod state;
mod webhooks;

pub use error::ApiError;
pub use state::AppState;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Provider webhooks
        .route("/webhooks/paypal", post(webhooks::paypal_webhook))
        .route("/webhooks/stripe", post(webhooks::stripe_webhook))
        // Internal RPC surface (called by the gateway service)
        .route("/internal/subscriptions", post(handlers::create_subscription))
        .route(
            "/internal/subscriptions/renewal/disable",
            post(handlers::disable_auto_renewal),
        )
        .route(
            "/internal/subscriptions/renewal/enable",
            post(handlers::enable_auto_renewal),
        )
        .route(
            "/internal/subscriptions/cancel",
            post(handlers::cancel_subscription),
        )
        .route(
            "/internal/users/:user_id/subscription",
            get(handlers::get_subscription_info),
        )
        .route(
            "/internal/users/:user_id/payments",
            get(handlers::get_payments),
        )
        .route(
            "/internal/users/:user_id/username",
            put(handlers::update_username),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
