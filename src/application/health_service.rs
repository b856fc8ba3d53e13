// Health service - checks the upstream with a no-op request
use crate::application::novant_api::{call_cancellable, NovantApi, OP_PING};
use crate::domain::health::HealthCheckResult;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct HealthService {
    api: Arc<dyn NovantApi>,
}

impl HealthService {
    pub fn new(api: Arc<dyn NovantApi>) -> Self {
        Self { api }
    }

    /// One `ping` call raced against `cancel`; any failure, cancellation
    /// included, becomes unhealthy with its message
    pub async fn check(&self, cancel: &CancellationToken) -> HealthCheckResult {
        match call_cancellable(self.api.as_ref(), cancel, OP_PING, &[]).await {
            Ok(_) => HealthCheckResult::healthy(),
            Err(e) => {
                tracing::error!(error = %e, "/ping request failed");
                HealthCheckResult::unhealthy(e.to_string())
            }
        }
    }
}
