use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with every gateway route.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/create-poll", post(handler::create_poll))
        .route("/add-transaction-vote", post(handler::add_transaction_vote))
        .route("/transactions", get(handler::transactions))
        .route("/votes", get(handler::votes))
        .route("/create-vote", post(handler::create_vote))
        .route("/vote", post(handler::vote))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
