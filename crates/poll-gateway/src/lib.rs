//! HTTP gateway for the poll ledger.
//!
//! Maps REST routes onto contract invocations on the `transaction` and
//! `vote` channels, and ledger failures onto HTTP statuses.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use handler::AppState;
pub use server::GatewayServer;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use poll_types::Invocation;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = router::build_router(AppState::new());
        let (status, body) = send(&app, get("/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["channels"][0]["name"], "transaction");
    }

    #[tokio::test]
    async fn poll_routes_follow_the_lifecycle() {
        let state = AppState::new();
        let app = router::build_router(state.clone());

        let (status, body) = send(
            &app,
            post(
                "/create-poll",
                json!({"poll_table_id": "P1", "user_id": "U1", "time_stamp": "100"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["assetID"], "P1");

        let vote = json!({"poll_table_id": "P1", "user_id": "U2"});
        let (status, body) = send(&app, post("/add-transaction-vote", vote.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["transactionType"], "vote");

        let (status, body) = send(&app, post("/add-transaction-vote", vote)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["kind"], "AlreadyVoted");

        state
            .transactions
            .submit(&Invocation::new("UpdatePoll", ["P1", "end"]))
            .unwrap();
        let (status, _) = send(
            &app,
            post("/add-transaction-vote", json!({"poll_table_id": "P1", "user_id": "U3"})),
        )
        .await;
        assert_eq!(status, StatusCode::GONE);

        let (status, body) = send(&app, get("/transactions?pollID=P1")).await;
        assert_eq!(status, StatusCode::OK);
        let history = body["result"].as_array().unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[2]["Value"]["transactionType"], "end");
    }

    #[tokio::test]
    async fn vote_routes_count_votes() {
        let app = router::build_router(AppState::new());
        let (status, _) = send(
            &app,
            post(
                "/create-vote",
                json!({"id": "p1c1", "poll_table_id": "1", "candidate_id": "1", "time_stamp": "t0"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        for _ in 0..2 {
            let (status, _) = send(&app, post("/vote", json!({"id": "p1c1"}))).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(&app, get("/votes?pollID=1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"][0]["Key"], "p1c1");
        assert_eq!(body["result"][0]["Record"]["voteCount"], 2);
    }

    #[tokio::test]
    async fn create_vote_composes_missing_id() {
        let app = router::build_router(AppState::new());
        let (status, body) = send(
            &app,
            post(
                "/create-vote",
                json!({"poll_table_id": "2", "candidate_id": "7", "time_stamp": "t0"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["id"], "p2c7");

        let (status, body) = send(&app, post("/vote", json!({"id": "p2c7"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["voteCount"], 1);

        // Record plus its poll index entry.
        let (_, health) = send(&app, get("/v1/health")).await;
        assert_eq!(health["channels"][1]["name"], "vote");
        assert_eq!(health["channels"][1]["keys"], 2);
    }

    #[tokio::test]
    async fn other_ledger_errors_are_internal() {
        let app = router::build_router(AppState::new());
        let (status, body) = send(&app, post("/vote", json!({"id": "missing"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["kind"], "NotFound");
    }
}
