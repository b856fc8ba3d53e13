// Query service - runs each query of a batch through the frame pipeline
use crate::application::novant_api::{call_cancellable, NovantApi, OP_POINTS};
use crate::application::trend_service::fetch_trends;
use crate::domain::bucket::bucketize;
use crate::domain::error::{DatasourceError, Result};
use crate::domain::frame::{assemble, Frame};
use crate::domain::point::resolve;
use crate::domain::query::{DataQuery, QueryParams};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Outcome of one query: frames, or an error with its kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataResponse {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<Frame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

impl DataResponse {
    pub fn from_result(result: Result<Frame>) -> Self {
        match result {
            Ok(frame) => Self {
                frames: vec![frame],
                error: None,
                error_kind: None,
            },
            Err(e) => Self {
                frames: Vec::new(),
                error: Some(e.to_string()),
                error_kind: Some(e.kind()),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Results keyed by ref id. Sorted, so output never depends on completion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryDataResponse {
    pub results: BTreeMap<String, DataResponse>,
}

#[derive(Clone)]
pub struct QueryService {
    api: Arc<dyn NovantApi>,
}

impl QueryService {
    pub fn new(api: Arc<dyn NovantApi>) -> Self {
        Self { api }
    }

    /// Runs every query concurrently. Never fails as a whole; each query
    /// carries its own result.
    pub async fn query_data(
        &self,
        queries: Vec<DataQuery>,
        cancel: &CancellationToken,
    ) -> QueryDataResponse {
        let runs = queries.into_iter().map(|q| async move {
            let span = tracing::info_span!(
                "query",
                ref_id = %q.ref_id,
                source_id = tracing::field::Empty
            );
            let result = self.query(&q, cancel).instrument(span).await;
            (q.ref_id, DataResponse::from_result(result))
        });

        let results: BTreeMap<_, _> = join_all(runs).await.into_iter().collect();
        let failed = results.values().filter(|r| r.is_error()).count();
        tracing::info!(total = results.len(), failed, "batch finished");

        QueryDataResponse { results }
    }

    /// Validate, fetch metadata, fetch trends bucket by bucket, assemble.
    pub async fn query(&self, query: &DataQuery, cancel: &CancellationToken) -> Result<Frame> {
        let params = QueryParams::parse(query.json.as_ref()).inspect_err(|e| {
            tracing::warn!(error = %e, "rejected query");
        })?;
        tracing::Span::current().record("source_id", params.source_id.as_str());

        let meta = call_cancellable(
            self.api.as_ref(),
            cancel,
            OP_POINTS,
            &[("source_id", params.source_id.clone())],
        )
        .await
        .inspect_err(|e| tracing::error!(error = %e, "/points request failed"))?;

        let lookup = resolve(meta)?;
        tracing::debug!(known = lookup.len(), "resolved point metadata");
        let points = lookup.select(&params.point_ids)?;

        let range = &query.time_range;
        let columns = fetch_trends(
            self.api.as_ref(),
            cancel,
            &params,
            bucketize(&range.from, &range.to),
        )
        .await?;

        if columns.is_empty() {
            tracing::debug!("no samples in range");
        }
        let frame = assemble(columns, &points);
        tracing::debug!(rows = frame.row_count(), points = points.len(), "assembled frame");
        Ok(frame)
    }
}

/// Cancels `cancel` once `deadline` passes, unless it is cancelled first.
pub fn cancel_after(cancel: CancellationToken, deadline: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(deadline) => {
                tracing::warn!(?deadline, "deadline reached, cancelling");
                cancel.cancel();
            }
        }
    })
}

impl From<DatasourceError> for DataResponse {
    fn from(err: DatasourceError) -> Self {
        Self::from_result(Err(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{object, ScriptedApi};
    use serde_json::json;

    fn query(ref_id: &str, from: &str, to: &str, json: serde_json::Value) -> DataQuery {
        serde_json::from_value(json!({
            "refId": ref_id,
            "timeRange": {"from": from, "to": to},
            "json": json
        }))
        .unwrap()
    }

    fn upstream() -> ScriptedApi {
        ScriptedApi::new(|op, p| match op {
            "points" => Ok(object(json!({"sources": [{"points": [
                {"id": "p1", "name": "Temp", "unit": "°F"},
                {"id": "p2", "name": "Humidity"},
                {"id": "p3"}
            ]}]}))),
            "trends" => {
                let date = &p["date"];
                Ok(object(json!({"trends": [
                    {"ts": format!("{date}T00:00:00Z"), "p1": 70.5, "p2": null},
                    {"ts": format!("{date}T00:15:00Z"), "p2": 41}
                ]})))
            }
            other => panic!("unexpected op {other}"),
        })
    }

    #[tokio::test]
    async fn test_same_instant_yields_aligned_columns() {
        let api = Arc::new(upstream());
        let service = QueryService::new(api.clone());
        let q = query(
            "A",
            "2024-01-01T08:00:00Z",
            "2024-01-01T08:00:00Z",
            json!({"sourceId": "s.1", "pointIds": "p2,p1,p3"}),
        );

        let frame = service.query(&q, &CancellationToken::new()).await.unwrap();

        let names: Vec<_> = frame.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["time", "Humidity", "Temp", "p3"]);
        assert_eq!(frame.fields.len(), 4);
        assert!(frame.fields.iter().all(|f| f.values.len() == 2));
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_params_make_no_calls() {
        let api = Arc::new(upstream());
        let service = QueryService::new(api.clone());

        for json in [
            json!({"sourceId": "  ", "pointIds": "p1"}),
            json!({"sourceId": "s.1", "pointIds": ""}),
            json!({}),
        ] {
            let q = query("A", "2024-01-01T00:00:00Z", "2024-01-01T00:00:00Z", json);
            let err = service.query(&q, &CancellationToken::new()).await.unwrap_err();
            assert_eq!(err.kind(), "validation");
        }
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_point_is_missing_point_error() {
        let service = QueryService::new(Arc::new(upstream()));
        let q = query(
            "A",
            "2024-01-01T00:00:00Z",
            "2024-01-01T00:00:00Z",
            json!({"sourceId": "s.1", "pointIds": "p1,p7"}),
        );

        let err = service.query(&q, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err, DatasourceError::MissingPoint("p7".to_string()));
    }

    #[tokio::test]
    async fn test_batch_results_are_independent() {
        let service = QueryService::new(Arc::new(upstream()));
        let queries = vec![
            query("bad", "2024-01-01T00:00:00Z", "2024-01-01T00:00:00Z", json!({"pointIds": "p1"})),
            query(
                "good",
                "2024-01-01T00:00:00Z",
                "2024-01-02T00:00:00Z",
                json!({"sourceId": "s.1", "pointIds": "p1"}),
            ),
        ];

        let response = service.query_data(queries, &CancellationToken::new()).await;

        assert_eq!(response.results.len(), 2);
        let bad = &response.results["bad"];
        assert!(bad.is_error());
        assert_eq!(bad.error_kind, Some("validation"));
        let good = &response.results["good"];
        assert!(!good.is_error());
        assert_eq!(good.frames[0].row_count(), 4);
    }

    #[tokio::test]
    async fn test_repeated_query_is_byte_identical() {
        let service = QueryService::new(Arc::new(upstream()));
        let make = || {
            vec![query(
                "A",
                "2024-01-01T08:00:00Z",
                "2024-01-03T01:00:00Z",
                json!({"sourceId": "s.1", "pointIds": "p1,p2"}),
            )]
        };

        let first = service.query_data(make(), &CancellationToken::new()).await;
        let second = service.query_data(make(), &CancellationToken::new()).await;

        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_is_reported_per_query() {
        let service = QueryService::new(Arc::new(ScriptedApi::new(|_, _| {
            Err(DatasourceError::Upstream("bad source".to_string()))
        })));
        let q = query(
            "A",
            "2024-01-01T00:00:00Z",
            "2024-01-01T00:00:00Z",
            json!({"sourceId": "s.404", "pointIds": "p1"}),
        );

        let response = service.query_data(vec![q], &CancellationToken::new()).await;

        let a = &response.results["A"];
        assert_eq!(a.error.as_deref(), Some("bad source"));
        assert_eq!(a.error_kind, Some("upstream"));
        assert!(a.frames.is_empty());
    }

    #[tokio::test]
    async fn test_empty_range_keeps_every_column() {
        let service = QueryService::new(Arc::new(ScriptedApi::new(|op, _| match op {
            "points" => Ok(object(json!({"points": [{"id": "p1", "name": "Temp"}]}))),
            _ => Ok(object(json!({"data": []}))),
        })));
        let q = query(
            "A",
            "2024-01-01T00:00:00Z",
            "2024-01-02T00:00:00Z",
            json!({"sourceId": "s.1", "pointIds": "p1"}),
        );

        let response = service.query_data(vec![q], &CancellationToken::new()).await;

        let a = &response.results["A"];
        assert!(!a.is_error());
        assert_eq!(a.frames[0].row_count(), 0);
        let names: Vec<_> = a.frames[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["time", "Temp"]);
    }

    #[tokio::test]
    async fn test_deadline_cancels_pending_calls() {
        let api = Arc::new(ScriptedApi::hanging());
        let service = QueryService::new(api.clone());
        let cancel = CancellationToken::new();
        let timer = cancel_after(cancel.clone(), Duration::from_millis(20));
        let q = query(
            "A",
            "2024-01-01T00:00:00Z",
            "2024-01-01T00:00:00Z",
            json!({"sourceId": "s.1", "pointIds": "p1"}),
        );

        let response = service.query_data(vec![q], &cancel).await;
        timer.await.unwrap();

        assert_eq!(response.results["A"].error_kind, Some("cancelled"));
        assert_eq!(api.call_count(), 1);
    }
}
