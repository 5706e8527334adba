//! # REST API
//!
//! Builds the axum router that exposes the ledger over HTTP. All endpoints
//! share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path              | Description                               |
//! |--------|-------------------|-------------------------------------------|
//! | GET    | `/`               | Full chain, pretty-printed JSON array     |
//! | POST   | `/`               | Append `{"payload": n}`, returns new block|
//! | GET    | `/tail`           | Current last block                        |
//! | GET    | `/blocks/:index`  | Block by index                            |
//! | POST   | `/chain`          | Offer a replacement chain                 |
//! | GET    | `/validate`       | Re-validate the stored chain              |
//! | GET    | `/health`         | Liveness check                            |
//! | GET    | `/status`         | Node status summary                       |
//!
//! Error bodies are always `{"error": "..."}`, including the ones produced
//! by extractors and layers (bad path parameters, oversized bodies, request
//! timeouts). They never repeat the request input.

use axum::{
    body::{Body, Bytes},
    extract::{
        rejection::{BytesRejection, PathRejection},
        DefaultBodyLimit, Path, Request, State,
    },
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{from_fn, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use linkchain_protocol::chain::{create_block, decode_payload, Block, ChainStore};
use linkchain_protocol::config::MAX_REQUEST_BODY_BYTES;
use linkchain_protocol::ChainError;

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone, everything lives behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The canonical chain.
    pub chain: Arc<ChainStore>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
    /// Signalled when a handler finds the stored chain corrupt. `main`
    /// waits on it and shuts the process down.
    pub fatal: Arc<Notify>,
    /// Upper bound on a single request.
    pub request_timeout: Duration,
}

impl AppState {
    /// Record a chain error in metrics and escalate it if it is fatal.
    ///
    /// Per-operation counters (rejected appends, rejected replacements) are
    /// bumped by the handler that knows which operation failed.
    fn observe(&self, err: &ChainError) {
        match err {
            ChainError::InvalidPayload(_) => self.metrics.invalid_payloads_total.inc(),
            ChainError::CorruptChain { .. } => {
                tracing::error!(error = %err, "stored chain failed validation, shutting down");
                self.fatal.notify_one();
            }
            ChainError::InvalidSuccessor { .. }
            | ChainError::ShorterOrEqualChain { .. }
            | ChainError::InvalidGenesis(_) => {}
        }
    }

    /// Record the length a store operation left the chain at, and dump the
    /// chain at debug level.
    fn record_chain_change(&self, length: usize) {
        self.metrics.record_chain_length(length);
        tracing::debug!(length, chain = ?self.chain.blocks(), "chain updated");
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, body limit,
/// request timeout, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);
    let request_timeout = state.request_timeout;

    let routes = Router::new()
        .route("/", get(chain_handler).post(write_handler))
        .route("/tail", get(tail_handler))
        .route("/blocks/:index", get(block_by_index_handler))
        .route("/chain", axum::routing::post(replace_handler))
        .route("/validate", get(validate_handler))
        .route("/health", get(health_handler))
        .route("/status", get(status_handler));

    with_transport_layers(routes, request_timeout)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Body limit, request timeout, and JSON error bodies.
///
/// The timeout sits inside [`json_error_bodies`] so its bare 408 is
/// rewritten like any other error.
fn with_transport_layers<S>(router: Router<S>, request_timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(from_fn(json_error_bodies))
}

/// Rewrite any error response that is not already JSON into an
/// [`ErrorResponse`] carrying the status's reason phrase.
async fn json_error_bodies(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
        return response;
    }

    let error = status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_lowercase();
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    let body = serde_json::json!({ "error": error }).to_string();
    Response::from_parts(parts, Body::from(body))
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Generic error body returned by every endpoint on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response payload for `POST /chain`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplaceResponse {
    /// Whether the candidate was adopted.
    pub replaced: bool,
    /// Chain length after the request.
    pub length: usize,
}

/// Response payload for `GET /validate`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub ok: bool,
    pub length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Number of blocks, genesis included.
    pub length: usize,
    /// Index of the last block.
    pub tail_index: u64,
    /// Hash of the last block.
    pub tail_hash: String,
    /// Digest algorithm used for block hashes.
    pub hash_algorithm: String,
    /// RFC 3339 timestamp of the response.
    pub timestamp: String,
}

/// A chain error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub ChainError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            ChainError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ChainError::InvalidSuccessor { .. }
            | ChainError::ShorterOrEqualChain { .. }
            | ChainError::InvalidGenesis(_) => StatusCode::CONFLICT,
            ChainError::CorruptChain { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Route every failure through [`AppState::observe`] before it becomes a
/// response.
fn reject(state: &AppState, err: ChainError) -> ApiError {
    state.observe(&err);
    ApiError(err)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// A request body that could not be read. Says why without echoing it.
fn body_rejection(rejection: BytesRejection) -> Response {
    let status = rejection.status();
    let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
        format!("request body exceeds {} bytes", MAX_REQUEST_BODY_BYTES)
    } else {
        "failed to read request body".to_string()
    };
    error_response(status, message)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /`: the whole chain as an indented JSON array.
///
/// The snapshot is validated before it is served; a broken link here means
/// memory corruption and brings the node down.
async fn chain_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let blocks = state
        .chain
        .audited_blocks()
        .map_err(|e| reject(&state, e))?;

    match serde_json::to_string_pretty(&blocks) {
        Ok(body) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()),
        Err(e) => {
            tracing::error!("failed to serialize chain: {}", e);
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "failed to serialize chain".into(),
                }),
            )
                .into_response())
        }
    }
}

/// `POST /`: append a block carrying the request's payload.
///
/// Decodes the payload, builds a candidate from the current tail, and asks
/// the store to append it. If another writer extended the chain in between,
/// the candidate no longer fits and the request gets 409.
async fn write_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return body_rejection(rejection),
    };
    let payload = match decode_payload(&body) {
        Ok(payload) => payload,
        Err(e) => return reject(&state, e).into_response(),
    };

    let candidate = create_block(&state.chain.tail(), payload);
    let block = match state.chain.append(candidate) {
        Ok(block) => block,
        Err(e) => {
            state.metrics.appends_rejected_total.inc();
            return reject(&state, e).into_response();
        }
    };

    state.metrics.blocks_appended_total.inc();
    // Indices are contiguous from genesis, so this is the length the append
    // left the chain at.
    state.record_chain_change(block.index as usize + 1);
    tracing::info!(index = block.index, hash = %block.hash, "block written");

    (StatusCode::CREATED, Json(block)).into_response()
}

/// `GET /tail`: the current last block.
async fn tail_handler(State(state): State<AppState>) -> Json<Block> {
    Json(state.chain.tail())
}

/// `GET /blocks/:index`: a block by index, or 404.
///
/// A non-numeric index is a 400 that does not repeat the path segment.
async fn block_by_index_handler(
    index: Result<Path<u64>, PathRejection>,
    State(state): State<AppState>,
) -> Response {
    let Ok(Path(index)) = index else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "block index must be a non-negative integer",
        );
    };
    match state.chain.get(index) {
        Some(block) => (StatusCode::OK, Json(block)).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Block not found at index {}", index),
        ),
    }
}

/// `POST /chain`: offer a replacement chain as a JSON array of blocks.
///
/// Adopted only if strictly longer than the current chain, valid link by
/// link, and rooted at the same genesis.
async fn replace_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return body_rejection(rejection),
    };
    let candidate: Vec<Block> = match serde_json::from_slice(&body) {
        Ok(candidate) => candidate,
        Err(e) => {
            let err = ChainError::InvalidPayload(format!(
                "expected a JSON array of blocks (line {}, column {})",
                e.line(),
                e.column()
            ));
            return reject(&state, err).into_response();
        }
    };

    match state.chain.replace_with(candidate) {
        Ok(length) => {
            state.metrics.chain_replacements_total.inc();
            state.record_chain_change(length);
            tracing::info!(length, "chain replaced by longer candidate");
            Json(ReplaceResponse {
                replaced: true,
                length,
            })
            .into_response()
        }
        Err(e) => {
            state.metrics.replacements_rejected_total.inc();
            reject(&state, e).into_response()
        }
    }
}

/// `GET /validate`: re-run validation over every stored block.
async fn validate_handler(State(state): State<AppState>) -> Response {
    let length = state.chain.len();
    match state.chain.audit() {
        Ok(()) => Json(ValidateResponse {
            ok: true,
            length,
            error: None,
        })
        .into_response(),
        Err(e) => {
            state.observe(&e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ValidateResponse {
                    ok: false,
                    length,
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// `GET /health`: returns 200 if the node is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status`: node status summary.
async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let summary = state.chain.summary();
    Json(StatusResponse {
        version: state.version.clone(),
        length: summary.length,
        tail_index: summary.tail.index,
        tail_hash: summary.tail.hash,
        hash_algorithm: linkchain_protocol::config::HASH_ALGORITHM.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use linkchain_protocol::chain::is_valid_successor;
    use tower::ServiceExt;

    /// Creates a test AppState with a fresh chain.
    fn test_app_state() -> AppState {
        AppState {
            version: "0.1.0-test".into(),
            chain: Arc::new(ChainStore::new()),
            metrics: Arc::new(crate::metrics::NodeMetrics::new()),
            fatal: Arc::new(Notify::new()),
            request_timeout: Duration::from_secs(5),
        }
    }

    /// Extends `chain` off-store by `n` blocks.
    fn extend(mut chain: Vec<Block>, n: usize) -> Vec<Block> {
        for i in 0..n {
            let next = chain.last().unwrap().next(i as i64);
            chain.push(next);
        }
        chain
    }

    /// Sends a GET request and returns the (status, body_bytes).
    async fn get(router: &Router, path: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    /// Sends a POST request with a raw body and returns (status, body_bytes).
    async fn post_raw(router: &Router, path: &str, body: Vec<u8>) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    /// Sends a POST request with a JSON body and returns (status, body_bytes).
    async fn post_json(
        router: &Router,
        path: &str,
        body: serde_json::Value,
    ) -> (StatusCode, Vec<u8>) {
        post_raw(router, path, serde_json::to_vec(&body).unwrap()).await
    }

    // -- 1. Health ------------------------------------------------------------

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/health").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    // -- 2. Fresh chain is genesis only ---------------------------------------

    #[tokio::test]
    async fn chain_endpoint_returns_genesis() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let blocks = json.as_array().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0]["index"], 0);
        assert_eq!(blocks[0]["prevHash"], "");
    }

    // -- 3. Appending a payload -----------------------------------------------

    #[tokio::test]
    async fn write_appends_block_to_genesis() {
        let state = test_app_state();
        let genesis = state.chain.tail();
        let router = create_router(state.clone());

        let (status, body) = post_json(&router, "/", serde_json::json!({ "payload": 100 })).await;

        assert_eq!(status, StatusCode::CREATED);
        let block: Block = serde_json::from_slice(&body).unwrap();
        assert_eq!(block.index, 1);
        assert_eq!(block.payload, 100);
        assert_eq!(block.prev_hash, genesis.hash);
        assert!(is_valid_successor(&genesis, &block));
        assert_eq!(state.chain.len(), 2);
        assert_eq!(state.metrics.blocks_appended_total.get(), 1);
        assert_eq!(state.metrics.chain_length.get(), 2);
    }

    #[tokio::test]
    async fn write_accepts_legacy_data_field() {
        let state = test_app_state();
        let router = create_router(state.clone());

        let (status, body) = post_json(&router, "/", serde_json::json!({ "Data": 7 })).await;

        assert_eq!(status, StatusCode::CREATED);
        let block: Block = serde_json::from_slice(&body).unwrap();
        assert_eq!(block.payload, 7);
    }

    #[tokio::test]
    async fn written_block_serializes_fields_in_order() {
        let router = create_router(test_app_state());
        let (_, body) = post_json(&router, "/", serde_json::json!({ "payload": 1 })).await;
        let text = String::from_utf8(body).unwrap();

        let order: Vec<usize> = ["\"index\"", "\"timestamp\"", "\"payload\"", "\"hash\"", "\"prevHash\""]
            .iter()
            .map(|k| text.find(k).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]), "{text}");
    }

    // -- 4. Invalid payloads --------------------------------------------------

    #[tokio::test]
    async fn write_rejects_malformed_json() {
        let state = test_app_state();
        let router = create_router(state.clone());

        let (status, body) = post_raw(&router, "/", b"{\"payload\": ".to_vec()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("invalid payload"));
        assert_eq!(state.chain.len(), 1);
        assert_eq!(state.metrics.invalid_payloads_total.get(), 1);
    }

    #[tokio::test]
    async fn write_rejects_non_integer_payload_without_echo() {
        let state = test_app_state();
        let router = create_router(state.clone());

        let (status, body) =
            post_json(&router, "/", serde_json::json!({ "payload": "hello-there" })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(!err.error.contains("hello-there"));
        assert_eq!(state.chain.len(), 1);
    }

    // -- 5. Block lookups -----------------------------------------------------

    #[tokio::test]
    async fn block_endpoint_returns_block_or_404() {
        let state = test_app_state();
        let written = state.chain.append_payload(5).unwrap();
        let router = create_router(state);

        let (status, body) = get(&router, "/blocks/1").await;
        assert_eq!(status, StatusCode::OK);
        let block: Block = serde_json::from_slice(&body).unwrap();
        assert_eq!(block, written);

        let (status, body) = get(&router, "/blocks/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("not found"));
    }

    #[tokio::test]
    async fn tail_endpoint_tracks_last_block() {
        let state = test_app_state();
        let router = create_router(state.clone());

        let (_, body) = get(&router, "/tail").await;
        let tail: Block = serde_json::from_slice(&body).unwrap();
        assert_eq!(tail.index, 0);

        state.chain.append_payload(1).unwrap();
        let (_, body) = get(&router, "/tail").await;
        let tail: Block = serde_json::from_slice(&body).unwrap();
        assert_eq!(tail.index, 1);
    }

    // -- 6. Replacement -------------------------------------------------------

    #[tokio::test]
    async fn replace_adopts_longer_valid_chain() {
        let state = test_app_state();
        let candidate = extend(vec![state.chain.genesis()], 3);
        let router = create_router(state.clone());

        let (status, body) =
            post_raw(&router, "/chain", serde_json::to_vec(&candidate).unwrap()).await;

        assert_eq!(status, StatusCode::OK);
        let resp: ReplaceResponse = serde_json::from_slice(&body).unwrap();
        assert!(resp.replaced);
        assert_eq!(resp.length, 4);
        assert_eq!(state.chain.blocks(), candidate);
        assert_eq!(state.metrics.chain_replacements_total.get(), 1);
    }

    #[tokio::test]
    async fn replace_ignores_equal_length_chain() {
        let state = test_app_state();
        state.chain.append_payload(1).unwrap();
        let before = state.chain.blocks();
        let candidate = extend(vec![state.chain.genesis()], 1);
        let router = create_router(state.clone());

        let (status, _) =
            post_raw(&router, "/chain", serde_json::to_vec(&candidate).unwrap()).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(state.chain.blocks(), before);
        assert_eq!(state.metrics.replacements_rejected_total.get(), 1);
    }

    #[tokio::test]
    async fn replace_rejects_forged_chain() {
        let state = test_app_state();
        let mut candidate = extend(vec![state.chain.genesis()], 4);
        candidate[2].payload = -1;
        let router = create_router(state.clone());

        let (status, body) =
            post_raw(&router, "/chain", serde_json::to_vec(&candidate).unwrap()).await;

        assert_eq!(status, StatusCode::CONFLICT);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("block 2"));
        assert_eq!(state.chain.len(), 1);
    }

    #[tokio::test]
    async fn replace_rejects_malformed_body() {
        let state = test_app_state();
        let router = create_router(state.clone());

        let (status, _) = post_json(&router, "/chain", serde_json::json!({ "not": "a chain" })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.chain.len(), 1);
    }

    // -- 7. Validation and status ---------------------------------------------

    #[tokio::test]
    async fn validate_reports_healthy_chain() {
        let state = test_app_state();
        state.chain.append_payload(1).unwrap();
        let router = create_router(state);

        let (status, body) = get(&router, "/validate").await;

        assert_eq!(status, StatusCode::OK);
        let resp: ValidateResponse = serde_json::from_slice(&body).unwrap();
        assert!(resp.ok);
        assert_eq!(resp.length, 2);
        assert!(resp.error.is_none());
    }

    #[tokio::test]
    async fn status_reports_length_and_tail() {
        let state = test_app_state();
        let block = state.chain.append_payload(3).unwrap();
        let router = create_router(state);

        let (status, body) = get(&router, "/status").await;

        assert_eq!(status, StatusCode::OK);
        let resp: StatusResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.version, "0.1.0-test");
        assert_eq!(resp.length, 2);
        assert_eq!(resp.tail_index, 1);
        assert_eq!(resp.tail_hash, block.hash);
        assert_eq!(resp.hash_algorithm, "SHA-256");
    }

    // -- 8. Error escalation --------------------------------------------------

    #[tokio::test]
    async fn corrupt_chain_signals_shutdown() {
        let state = test_app_state();
        let err = reject(
            &state,
            ChainError::CorruptChain {
                index: 1,
                reason: "test".into(),
            },
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // notify_one stores a permit, so this resolves immediately.
        tokio::time::timeout(Duration::from_secs(1), state.fatal.notified())
            .await
            .expect("fatal notification");
    }

    #[tokio::test]
    async fn rejections_do_not_signal_shutdown() {
        let state = test_app_state();
        let err = reject(&state, ChainError::InvalidPayload("x".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let notified =
            tokio::time::timeout(Duration::from_millis(50), state.fatal.notified()).await;
        assert!(notified.is_err());
    }

    // -- 9. Metrics attribution -----------------------------------------------

    #[tokio::test]
    async fn forged_replacement_is_not_counted_as_rejected_append() {
        let state = test_app_state();
        let mut forged = extend(vec![state.chain.genesis()], 4);
        forged[3].prev_hash = forged[1].hash.clone();
        forged[3].hash = forged[3].compute_hash();
        let router = create_router(state.clone());

        let (status, _) = post_raw(&router, "/chain", serde_json::to_vec(&forged).unwrap()).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(state.metrics.replacements_rejected_total.get(), 1);
        assert_eq!(state.metrics.appends_rejected_total.get(), 0);
    }

    #[tokio::test]
    async fn chain_length_gauge_follows_writes_and_replacements() {
        let state = test_app_state();
        let candidate = extend(vec![state.chain.genesis()], 4);
        let router = create_router(state.clone());

        let (status, _) =
            post_raw(&router, "/chain", serde_json::to_vec(&candidate).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.metrics.chain_length.get(), 5);

        let (status, _) = post_json(&router, "/", serde_json::json!({ "payload": 3 })).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(state.metrics.chain_length.get(), 6);
        assert_eq!(state.metrics.appends_rejected_total.get(), 0);
    }

    // -- 10. Transport errors are JSON ----------------------------------------

    #[tokio::test]
    async fn non_numeric_block_index_is_json_400_without_echo() {
        let router = create_router(test_app_state());

        for path in ["/blocks/abc", "/blocks/-1"] {
            let (status, body) = get(&router, path).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
            let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
            assert!(!err.error.contains("abc"));
            assert!(!err.error.contains("-1"));
        }
    }

    #[tokio::test]
    async fn oversized_body_is_json_413() {
        let state = test_app_state();
        let router = create_router(state.clone());
        let body = vec![b' '; MAX_REQUEST_BODY_BYTES + 1];

        for path in ["/", "/chain"] {
            let (status, resp) = post_raw(&router, path, body.clone()).await;
            assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "{path}");
            let err: ErrorResponse = serde_json::from_slice(&resp).unwrap();
            assert!(err.error.contains("exceeds"));
        }
        assert_eq!(state.chain.len(), 1);
    }

    #[tokio::test]
    async fn body_at_limit_is_read() {
        let state = test_app_state();
        let router = create_router(state.clone());
        let mut body = br#"{"payload": 9}"#.to_vec();
        body.resize(MAX_REQUEST_BODY_BYTES, b' ');

        let (status, _) = post_raw(&router, "/", body).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(state.chain.len(), 2);
    }

    #[tokio::test]
    async fn slow_request_times_out_with_json_408() {
        let slow: Router = Router::new().route(
            "/slow",
            axum::routing::get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                "late"
            }),
        );
        let router = with_transport_layers(slow, Duration::from_millis(20));

        let (status, body) = get(&router, "/slow").await;

        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.error, "request timeout");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let router = create_router(test_app_state());

        let (status, body) = get(&router, "/nope").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.error, "not found");
    }
}
