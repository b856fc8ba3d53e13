// HTTP request handlers
use crate::application::health_service::HealthService;
use crate::application::query_service::{
    cancel_after, DataResponse, QueryDataResponse, QueryService,
};
use crate::application::stream_service::StreamStatus;
use crate::domain::health::HealthCheckResult;
use crate::domain::instance::PluginContext;
use crate::domain::query::DataQuery;
use crate::infrastructure::chunked_stream::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDataRequest {
    #[serde(default)]
    pub plugin_context: PluginContext,
    #[serde(default)]
    pub queries: Vec<DataQuery>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRequest {
    #[serde(default)]
    pub plugin_context: PluginContext,
}

/// Liveness of the adapter itself
pub async fn liveness() -> &'static str {
    "ok"
}

/// Run a batch of queries; one result per ref id
pub async fn query_data(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryDataRequest>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let span = tracing::info_span!(
        "query_data",
        uid = request.plugin_context.uid().unwrap_or_default(),
        queries = request.queries.len()
    );

    let response = async {
        match state.api_key(&request.plugin_context) {
            Ok(key) => {
                let service = QueryService::new(state.connector.connect(&key));
                let cancel = CancellationToken::new();
                // a dropped handler (caller went away) cancels outstanding calls
                let _guard = cancel.clone().drop_guard();
                let timer = cancel_after(cancel.clone(), state.query_deadline);
                let response = service.query_data(request.queries, &cancel).await;
                timer.abort();
                response
            }
            Err(e) => {
                tracing::warn!(error = %e, "no api key for batch");
                QueryDataResponse {
                    results: request
                        .queries
                        .into_iter()
                        .map(|q| (q.ref_id, DataResponse::from(e.clone())))
                        .collect(),
                }
            }
        }
    }
    .instrument(span)
    .await;

    match json_response(StatusCode::OK, &response, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Ping the upstream with the instance's key
pub async fn check_health(
    State(state): State<Arc<AppState>>,
    request: Option<Json<HealthRequest>>,
) -> Json<HealthCheckResult> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let span = tracing::info_span!("health", uid = request.plugin_context.uid().unwrap_or_default());

    let result = async {
        match state.api_key(&request.plugin_context) {
            Ok(key) => {
                let cancel = CancellationToken::new();
                let _guard = cancel.clone().drop_guard();
                let timer = cancel_after(cancel.clone(), state.health_deadline);
                let result = HealthService::new(state.connector.connect(&key))
                    .check(&cancel)
                    .await;
                timer.abort();
                result
            }
            Err(e) => HealthCheckResult::unhealthy(e.to_string()),
        }
    }
    .instrument(span)
    .await;
    tracing::info!(healthy = result.is_healthy(), "health check finished");

    Json(result)
}

fn permission_denied() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({"error": "permission denied"})),
    )
        .into_response()
}

/// Subscribe to a push stream; frames arrive as NDJSON lines
pub async fn subscribe_stream(
    Path(path): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.stream_service.subscribe(&path) {
        StreamStatus::Ok => {
            tracing::info!(path = %path, "stream subscribed");
            let rx = state.stream_service.run_stream(
                &path,
                state.stream_period,
                state.shutdown.child_token(),
            );
            stream_from_receiver(rx).into_response()
        }
        StreamStatus::PermissionDenied => permission_denied(),
    }
}

pub async fn publish_stream(
    Path(path): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.stream_service.publish(&path) {
        StreamStatus::Ok => StatusCode::NO_CONTENT.into_response(),
        StreamStatus::PermissionDenied => permission_denied(),
    }
}
