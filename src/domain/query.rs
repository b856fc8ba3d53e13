// Query domain model - what the host asks for
use crate::domain::error::{DatasourceError, Result};
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<FixedOffset>,
    pub to: DateTime<FixedOffset>,
}

/// One query of a batch, keyed by the caller's correlation id
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuery {
    pub ref_id: String,
    pub time_range: TimeRange,
    #[serde(default)]
    pub json: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParams {
    #[serde(default)]
    source_id: Option<String>,
    #[serde(default)]
    point_ids: Option<String>,
}

/// Validated query parameters
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub source_id: String,
    /// Caller order is kept; it decides the output column order.
    pub point_ids: Vec<String>,
}

impl QueryParams {
    pub fn parse(json: Option<&Value>) -> Result<Self> {
        let raw = match json {
            None | Some(Value::Null) => RawParams::default(),
            Some(v) => RawParams::deserialize(v).map_err(|e| {
                DatasourceError::Validation(format!("Invalid query parameters: {}", e))
            })?,
        };

        let source_id = raw.source_id.unwrap_or_default().trim().to_string();
        if source_id.is_empty() {
            return Err(DatasourceError::Validation("Missing sourceId value".to_string()));
        }

        let point_ids = split_point_ids(raw.point_ids.as_deref().unwrap_or_default());
        if point_ids.is_empty() {
            return Err(DatasourceError::Validation("Missing pointIds value".to_string()));
        }

        Ok(Self {
            source_id,
            point_ids,
        })
    }

    /// Comma-joined form sent upstream as `point_ids`
    pub fn point_ids_param(&self) -> String {
        self.point_ids.join(",")
    }
}

fn split_point_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
