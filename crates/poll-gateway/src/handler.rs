use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Json;
use poll_ledger::{Channel, LedgerError, LedgerResult, TxReceipt};
use poll_types::{Invocation, TxId, TxTimestamp, Vote};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GatewayError, GatewayResult};

/// Channels shared by every request.
#[derive(Clone, Debug)]
pub struct AppState {
    pub transactions: Arc<Channel>,
    pub votes: Arc<Channel>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            transactions: Arc::new(Channel::transactions()),
            votes: Arc::new(Channel::votes()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePollRequest {
    pub poll_table_id: String,
    pub user_id: String,
    pub time_stamp: String,
}

#[derive(Debug, Deserialize)]
pub struct AddTransactionVoteRequest {
    pub poll_table_id: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateVoteRequest {
    /// Defaults to `p{poll_table_id}c{candidate_id}`.
    #[serde(default)]
    pub id: Option<String>,
    pub poll_table_id: String,
    pub candidate_id: String,
    pub time_stamp: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct PollQuery {
    #[serde(rename = "pollID")]
    pub poll_id: String,
}

/// Body of every successful invocation route.
#[derive(Debug, Serialize)]
pub struct InvocationResponse {
    pub tx_id: TxId,
    pub timestamp: TxTimestamp,
    /// Contract payload, parsed when it is JSON.
    pub result: Value,
}

impl From<TxReceipt> for InvocationResponse {
    fn from(receipt: TxReceipt) -> Self {
        let result =
            serde_json::from_str(&receipt.payload).unwrap_or(Value::String(receipt.payload));
        Self {
            tx_id: receipt.tx_id,
            timestamp: receipt.timestamp,
            result,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub channels: Vec<ChannelStatus>,
}

#[derive(Debug, Serialize)]
pub struct ChannelStatus {
    pub name: String,
    pub sequence: u64,
    /// Keys in world state, index entries included.
    pub keys: usize,
}

pub async fn health_handler(State(state): State<AppState>) -> GatewayResult<Json<HealthResponse>> {
    let mut channels = Vec::new();
    for channel in [&state.transactions, &state.votes] {
        channels.push(ChannelStatus {
            name: channel.name().to_string(),
            sequence: channel.sequence()?,
            keys: channel.store().len().map_err(LedgerError::from)?,
        });
    }
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        channels,
    }))
}

/// The poll is keyed by its table id.
pub async fn create_poll(
    State(state): State<AppState>,
    Json(req): Json<CreatePollRequest>,
) -> GatewayResult<Json<InvocationResponse>> {
    submit(
        &state.transactions,
        Invocation::new(
            "CreatePoll",
            [&req.poll_table_id, &req.poll_table_id, &req.user_id, &req.time_stamp],
        ),
    )
    .await
}

pub async fn add_transaction_vote(
    State(state): State<AppState>,
    Json(req): Json<AddTransactionVoteRequest>,
) -> GatewayResult<Json<InvocationResponse>> {
    submit(
        &state.transactions,
        Invocation::new("AddVoteTransaction", [req.poll_table_id, req.user_id]),
    )
    .await
}

pub async fn transactions(
    State(state): State<AppState>,
    Query(query): Query<PollQuery>,
) -> GatewayResult<Json<InvocationResponse>> {
    evaluate(
        &state.transactions,
        Invocation::new("GetPollTableHistory", [query.poll_id]),
    )
    .await
}

pub async fn votes(
    State(state): State<AppState>,
    Query(query): Query<PollQuery>,
) -> GatewayResult<Json<InvocationResponse>> {
    evaluate(&state.votes, Invocation::new("QueryVoteByPoll", [query.poll_id])).await
}

pub async fn create_vote(
    State(state): State<AppState>,
    Json(req): Json<CreateVoteRequest>,
) -> GatewayResult<Json<InvocationResponse>> {
    let id = req
        .id
        .unwrap_or_else(|| Vote::compose_id(&req.poll_table_id, &req.candidate_id));
    submit(
        &state.votes,
        Invocation::new(
            "CreateVote",
            [id, req.poll_table_id, req.candidate_id, req.time_stamp],
        ),
    )
    .await
}

pub async fn vote(
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> GatewayResult<Json<InvocationResponse>> {
    submit(&state.votes, Invocation::new("AddVote", [req.id])).await
}

async fn submit(
    channel: &Arc<Channel>,
    invocation: Invocation,
) -> GatewayResult<Json<InvocationResponse>> {
    let channel = Arc::clone(channel);
    run_blocking(move || channel.submit(&invocation)).await
}

async fn evaluate(
    channel: &Arc<Channel>,
    invocation: Invocation,
) -> GatewayResult<Json<InvocationResponse>> {
    let channel = Arc::clone(channel);
    run_blocking(move || channel.evaluate(&invocation)).await
}

/// Channels hold a blocking sequence lock for the whole invocation, so
/// invocations run on the blocking pool rather than a runtime worker.
async fn run_blocking<F>(invoke: F) -> GatewayResult<Json<InvocationResponse>>
where
    F: FnOnce() -> LedgerResult<TxReceipt> + Send + 'static,
{
    let receipt = tokio::task::spawn_blocking(invoke)
        .await
        .map_err(|err| GatewayError::Internal(format!("invocation task failed: {err}")))??;
    Ok(Json(receipt.into()))
}
