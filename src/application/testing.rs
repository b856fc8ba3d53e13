// Scripted upstream for service tests
use crate::application::novant_api::{ApiConnector, NovantApi};
use crate::domain::error::Result;
use crate::domain::point::JsonObject;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Responder = dyn Fn(&str, &HashMap<String, String>) -> Result<JsonObject> + Send + Sync;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: String,
    pub params: HashMap<String, String>,
}

pub struct ScriptedApi {
    calls: Mutex<Vec<RecordedCall>>,
    respond: Box<Responder>,
    hang: bool,
}

impl ScriptedApi {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&str, &HashMap<String, String>) -> Result<JsonObject> + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
            hang: false,
        }
    }

    /// Every call records itself and then never completes
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new(|_, _| Ok(JsonObject::new()))
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl NovantApi for ScriptedApi {
    async fn call(&self, operation: &str, params: &[(&str, String)]) -> Result<JsonObject> {
        let params: HashMap<String, String> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self.calls.lock().unwrap().push(RecordedCall {
            operation: operation.to_string(),
            params: params.clone(),
        });

        if self.hang {
            futures::future::pending::<()>().await;
        }
        (self.respond)(operation, &params)
    }
}

/// Hands out the same scripted api for every key, remembering the keys
pub struct ScriptedConnector {
    pub api: Arc<ScriptedApi>,
    pub keys: Mutex<Vec<String>>,
}

impl ScriptedConnector {
    pub fn new(api: ScriptedApi) -> Self {
        Self {
            api: Arc::new(api),
            keys: Mutex::new(Vec::new()),
        }
    }
}

impl ApiConnector for ScriptedConnector {
    fn connect(&self, api_key: &str) -> Arc<dyn NovantApi> {
        self.keys.lock().unwrap().push(api_key.to_string());
        self.api.clone()
    }
}

pub fn object(v: Value) -> JsonObject {
    match v {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}
