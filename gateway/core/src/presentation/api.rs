// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::application::session_request::{
    SessionRequestError, SessionRequestInput, SessionRequestService,
};

pub const SESSION_REQUESTS_TOTAL: &str = "session_requests_total";

pub struct AppState {
    pub session_service: Arc<dyn SessionRequestService>,
    pub metrics: Option<PrometheusHandle>,
    pub start_time: Instant,
}

pub fn app(
    session_service: Arc<dyn SessionRequestService>,
    metrics: Option<PrometheusHandle>,
) -> Router {
    let state = Arc::new(AppState {
        session_service,
        metrics,
        start_time: Instant::now(),
    });

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/session/request", post(session_request_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wire body of `POST /api/session/request`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequestBody {
    pub provider: String,
    pub owner: String,
    pub source: String,
    #[serde(rename = "type")]
    pub channel: String,
    pub expiry: u64,
    pub signature: String,
}

impl From<SessionRequestBody> for SessionRequestInput {
    fn from(body: SessionRequestBody) -> Self {
        Self {
            provider: body.provider,
            owner: body.owner,
            source: body.source,
            channel: body.channel,
            expiry: body.expiry,
            signature: body.signature,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequestResponse {
    pub session_request_tx_hash: String,
    pub status: u16,
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => error_response(StatusCode::NOT_FOUND, "metrics are disabled".to_string()),
    }
}

async fn session_request_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SessionRequestBody>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            record_outcome("invalid_request");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match state.session_service.request_session(body.into()).await {
        Ok(receipt) => {
            record_outcome("accepted");
            (
                StatusCode::OK,
                Json(SessionRequestResponse {
                    session_request_tx_hash: receipt.tx_hash.to_string(),
                    status: StatusCode::OK.as_u16(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            record_outcome(e.kind());
            session_error_response(&e)
        }
    }
}

fn record_outcome(outcome: &'static str) {
    metrics::counter!(SESSION_REQUESTS_TOTAL, "outcome" => outcome).increment(1);
}

fn error_response(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(json!({
            "error": message,
            "status": status.as_u16(),
        })),
    )
        .into_response()
}

/// HTTP status for a handshake failure.
pub fn status_for(error: &SessionRequestError) -> StatusCode {
    match error {
        SessionRequestError::InvalidRequest(_)
        | SessionRequestError::UnsupportedChannel(_)
        | SessionRequestError::ProviderMismatch { .. }
        | SessionRequestError::InvalidSignature
        | SessionRequestError::Expired => StatusCode::BAD_REQUEST,
        SessionRequestError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        SessionRequestError::SignerNotConfigured
        | SessionRequestError::Store(_)
        | SessionRequestError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SessionRequestError::Relay(_) | SessionRequestError::Delivery { .. } => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn session_error_response(error: &SessionRequestError) -> Response {
    let status = status_for(error);
    match error {
        // Server-side faults: details go to the log, never to the client.
        SessionRequestError::SignerNotConfigured
        | SessionRequestError::Store(_)
        | SessionRequestError::Signing(_) => {
            error!("Session request failed: {}", error);
            error_response(status, "internal server error".to_string())
        }
        SessionRequestError::Relay(e) => {
            error!(
                may_have_been_submitted = e.may_have_been_submitted(),
                "Session request relay failed: {}", e
            );
            error_response(status, "failed to relay session request".to_string())
        }
        SessionRequestError::Delivery { tx_hash, source } => {
            error!(%tx_hash, "Challenge delivery failed: {}", source);
            (
                status,
                Json(json!({
                    "error": "failed to deliver session challenge",
                    "sessionRequestTxHash": tx_hash.to_string(),
                    "status": status.as_u16(),
                })),
            )
                .into_response()
        }
        _ => {
            warn!("Rejected session request: {}", error);
            error_response(status, error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::session_request::SessionRequestReceipt;
    use crate::domain::delivery::DeliveryError;
    use crate::domain::ledger::{LedgerError, RelayStage};
    use alloy_primitives::B256;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::Mutex;
    use tower::ServiceExt;

    type Outcome = fn() -> Result<SessionRequestReceipt, SessionRequestError>;

    struct StubService {
        outcome: Outcome,
        seen: Mutex<Vec<SessionRequestInput>>,
    }

    #[async_trait]
    impl SessionRequestService for StubService {
        async fn request_session(
            &self,
            input: SessionRequestInput,
        ) -> Result<SessionRequestReceipt, SessionRequestError> {
            self.seen.lock().unwrap().push(input);
            (self.outcome)()
        }
    }

    fn router(outcome: Outcome) -> (Router, Arc<StubService>) {
        let service = Arc::new(StubService {
            outcome,
            seen: Mutex::new(Vec::new()),
        });
        (app(service.clone(), None), service)
    }

    fn body() -> serde_json::Value {
        json!({
            "provider": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "owner": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            "source": "+32478121212",
            "type": "sms",
            "expiry": 1735689600u64,
            "signature": "0x00"
        })
    }

    async fn post(router: Router, body: String) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/session/request")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_success_returns_tx_hash() {
        let (router, service) = router(|| {
            Ok(SessionRequestReceipt {
                tx_hash: B256::repeat_byte(0xab),
            })
        });

        let (status, json) = post(router, body().to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], 200);
        assert_eq!(
            json["sessionRequestTxHash"],
            format!("0x{}", "ab".repeat(32))
        );
        let seen = service.seen.lock().unwrap();
        assert_eq!(seen[0].channel, "sms");
        assert_eq!(seen[0].expiry, 1_735_689_600);
    }

    #[tokio::test]
    async fn test_invalid_signature_is_bad_request() {
        let (router, _) = router(|| Err(SessionRequestError::InvalidSignature));
        let (status, json) = post(router, body().to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["status"], 400);
        assert_eq!(json["error"], "invalid signature");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (router, service) = router(|| Err(SessionRequestError::InvalidSignature));
        let mut missing_type = body();
        missing_type.as_object_mut().unwrap().remove("type");

        let (status, json) = post(router, missing_type.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["status"], 400);
        assert!(service.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_is_429() {
        let (router, _) = router(|| Err(SessionRequestError::RateLimited));
        let (status, json) = post(router, body().to_string()).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["status"], 429);
    }

    #[tokio::test]
    async fn test_missing_signer_does_not_leak_detail() {
        let (router, _) = router(|| Err(SessionRequestError::SignerNotConfigured));
        let (status, json) = post(router, body().to_string()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "internal server error");
    }

    #[tokio::test]
    async fn test_relay_failure_is_bad_gateway() {
        let (router, _) = router(|| {
            Err(SessionRequestError::Relay(LedgerError::Rejected {
                stage: RelayStage::Prepare,
                code: 3,
                message: "execution reverted".into(),
            }))
        });
        let (status, json) = post(router, body().to_string()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(json.get("sessionRequestTxHash").is_none());
    }

    #[tokio::test]
    async fn test_delivery_failure_carries_tx_hash() {
        let (router, _) = router(|| {
            Err(SessionRequestError::Delivery {
                tx_hash: B256::repeat_byte(0x01),
                source: DeliveryError::Transport("timeout".into()),
            })
        });
        let (status, json) = post(router, body().to_string()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["status"], 502);
        assert_eq!(
            json["sessionRequestTxHash"],
            format!("0x{}", "01".repeat(32))
        );
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _) = router(|| Err(SessionRequestError::RateLimited));
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_metrics_disabled() {
        let (router, _) = router(|| Err(SessionRequestError::RateLimited));
        let response = router
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
