// Trend rows and the column accumulator they are merged into
use crate::domain::error::{DatasourceError, Result};
use crate::domain::point::JsonObject;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// One sample instant and whatever point values came with it
#[derive(Debug, Clone, Deserialize)]
pub struct TrendRow {
    pub ts: String,
    #[serde(flatten)]
    pub values: HashMap<String, Value>,
}

impl TrendRow {
    pub fn timestamp(&self) -> Result<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.ts)
            .map_err(|e| DatasourceError::Parse(format!("{:?}: {}", self.ts, e)))
    }

    /// Numeric value for `point_id`; null, absent and non-numeric are all "no data"
    pub fn value(&self, point_id: &str) -> Option<f64> {
        self.values.get(point_id).and_then(Value::as_f64)
    }
}

#[derive(Debug, Deserialize)]
pub struct TrendsResponseV1 {
    pub trends: Vec<TrendRow>,
}

#[derive(Debug, Deserialize)]
pub struct TrendsResponseV2 {
    pub data: Vec<TrendRow>,
}

/// `trends` and `data` are two generations of the same endpoint.
#[derive(Debug)]
pub enum TrendsResponse {
    V1(TrendsResponseV1),
    V2(TrendsResponseV2),
}

impl TrendsResponse {
    pub fn from_object(obj: JsonObject) -> Result<Self> {
        if obj.contains_key("trends") {
            Ok(Self::V1(serde_json::from_value(Value::Object(obj))?))
        } else if obj.contains_key("data") {
            Ok(Self::V2(serde_json::from_value(Value::Object(obj))?))
        } else {
            Err(DatasourceError::Decode(
                "trends response has neither `trends` nor `data`".to_string(),
            ))
        }
    }

    pub fn into_rows(self) -> Vec<TrendRow> {
        match self {
            Self::V1(v1) => v1.trends,
            Self::V2(v2) => v2.data,
        }
    }
}

/// Parallel time and value columns.
///
/// Every value column always has exactly as many entries as `times`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendColumns {
    pub times: Vec<DateTime<FixedOffset>>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl TrendColumns {
    pub fn new(point_count: usize) -> Self {
        Self {
            times: Vec::new(),
            values: vec![Vec::new(); point_count],
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Appends rows in the order given. A bad timestamp fails the whole
    /// batch of rows and leaves the columns untouched.
    pub fn append_rows(&mut self, rows: &[TrendRow], point_ids: &[String]) -> Result<()> {
        let stamps = rows
            .iter()
            .map(TrendRow::timestamp)
            .collect::<Result<Vec<_>>>()?;

        for (ts, row) in stamps.into_iter().zip(rows) {
            self.times.push(ts);
            for (column, id) in self.values.iter_mut().zip(point_ids) {
                column.push(row.value(id));
            }
        }
        Ok(())
    }
}
