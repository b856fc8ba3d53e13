// Datasource instance settings passed along by the host
use crate::domain::error::{DatasourceError, Result};
use serde::Deserialize;
use std::collections::HashMap;

pub const API_KEY: &str = "apiKey";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSettings {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub decrypted_secure_json_data: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginContext {
    #[serde(default)]
    pub data_source_instance_settings: Option<InstanceSettings>,
}

impl PluginContext {
    pub fn uid(&self) -> Option<&str> {
        self.data_source_instance_settings
            .as_ref()
            .and_then(|s| s.uid.as_deref())
    }

    /// Instance key first, then `fallback`. Blank keys count as absent.
    pub fn api_key(&self, fallback: Option<&str>) -> Result<String> {
        self.data_source_instance_settings
            .as_ref()
            .and_then(|s| s.decrypted_secure_json_data.get(API_KEY))
            .map(String::as_str)
            .into_iter()
            .chain(fallback)
            .map(str::trim)
            .find(|k| !k.is_empty())
            .map(str::to_string)
            .ok_or_else(|| DatasourceError::Validation("Missing apiKey".to_string()))
    }
}
