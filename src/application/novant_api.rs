// Upstream API trait - one request/response exchange per call
use crate::domain::error::{DatasourceError, Result};
use crate::domain::point::JsonObject;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const OP_PING: &str = "ping";
pub const OP_POINTS: &str = "points";
pub const OP_TRENDS: &str = "trends";

#[async_trait]
pub trait NovantApi: Send + Sync {
    /// POST `operation` with form-encoded `params`. Exactly one attempt.
    async fn call(&self, operation: &str, params: &[(&str, String)]) -> Result<JsonObject>;
}

/// Builds an API handle for one datasource instance's key
pub trait ApiConnector: Send + Sync {
    fn connect(&self, api_key: &str) -> Arc<dyn NovantApi>;
}

/// Races `call` against `cancel`; a cancelled token wins even if both are ready.
pub async fn call_cancellable(
    api: &dyn NovantApi,
    cancel: &CancellationToken,
    operation: &str,
    params: &[(&str, String)],
) -> Result<JsonObject> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DatasourceError::Cancelled),
        res = api.call(operation, params) => res,
    }
}
