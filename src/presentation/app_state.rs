// Application state for HTTP handlers
use crate::application::novant_api::ApiConnector;
use crate::application::stream_service::StreamService;
use crate::domain::error::Result;
use crate::domain::instance::PluginContext;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub connector: Arc<dyn ApiConnector>,
    pub default_api_key: Option<String>,
    pub query_deadline: Duration,
    pub health_deadline: Duration,
    pub stream_service: StreamService,
    pub stream_period: Duration,
    /// Cancelled on shutdown; ends every open stream
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn api_key(&self, ctx: &PluginContext) -> Result<String> {
        ctx.api_key(self.default_api_key.as_deref())
    }
}
