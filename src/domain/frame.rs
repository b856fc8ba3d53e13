// Frame domain model - the columnar table handed back to the host
use crate::domain::point::PointRecord;
use crate::domain::trend::TrendColumns;
use chrono::{DateTime, FixedOffset};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

pub const FRAME_NAME: &str = "response";
pub const TIME_FIELD: &str = "time";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Time,
    Number,
}

/// Column values. Time is written as epoch milliseconds, `None` as `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValues {
    Time(Vec<DateTime<FixedOffset>>),
    Number(Vec<Option<f64>>),
}

impl FieldValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Time(v) => v.len(),
            Self::Number(v) => v.len(),
        }
    }
}

impl Serialize for FieldValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Time(v) => serializer.collect_seq(v.iter().map(|t| t.timestamp_millis())),
            Self::Number(v) => serializer.collect_seq(v),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<FieldConfig>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    pub values: FieldValues,
}

impl Field {
    pub fn time(name: impl Into<String>, values: Vec<DateTime<FixedOffset>>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Time,
            config: None,
            labels: BTreeMap::new(),
            values: FieldValues::Time(values),
        }
    }

    pub fn number(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Number,
            config: None,
            labels: BTreeMap::new(),
            values: FieldValues::Number(values),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub name: String,
    pub fields: Vec<Field>,
}

impl Frame {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn row_count(&self) -> usize {
        self.fields.first().map(|f| f.values.len()).unwrap_or(0)
    }
}

/// Time column first, then one column per point in request order.
///
/// `points` must be in the same order as `columns.values`. Rows are taken
/// as they are: no sorting, dedup or resampling.
pub fn assemble(columns: TrendColumns, points: &[&PointRecord]) -> Frame {
    let mut fields = Vec::with_capacity(points.len() + 1);
    fields.push(Field::time(TIME_FIELD, columns.times));

    for (point, values) in points.iter().zip(columns.values) {
        let mut field = Field::number(point.display_name(), values);
        field.labels.insert("pointId".to_string(), point.id.clone());
        if let Some(unit) = &point.unit {
            field.config = Some(FieldConfig {
                unit: Some(unit.clone()),
            });
        }
        fields.push(field);
    }

    Frame::new(FRAME_NAME, fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point(id: &str, name: Option<&str>, unit: Option<&str>) -> PointRecord {
        PointRecord {
            id: id.to_string(),
            name: name.map(str::to_string),
            unit: unit.map(str::to_string),
        }
    }

    #[test]
    fn test_assemble_orders_and_names_columns() {
        let t0 = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let columns = TrendColumns {
            times: vec![t0],
            values: vec![vec![Some(1.0)], vec![None]],
        };
        let p2 = point("p2", Some("Humidity"), None);
        let p1 = point("p1", None, Some("°F"));

        let frame = assemble(columns, &[&p2, &p1]);

        let names: Vec<_> = frame.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["time", "Humidity", "p1"]);
        assert_eq!(frame.row_count(), 1);
        assert!(frame.fields.iter().all(|f| f.values.len() == 1));
    }

    #[test]
    fn test_frame_json_shape() {
        let t0 = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let columns = TrendColumns {
            times: vec![t0],
            values: vec![vec![None]],
        };
        let p1 = point("p1", Some("Temp"), Some("°F"));

        let value = serde_json::to_value(assemble(columns, &[&p1])).unwrap();

        assert_eq!(
            value,
            json!({
                "name": "response",
                "fields": [
                    {"name": "time", "type": "time", "values": [1704067200000i64]},
                    {
                        "name": "Temp",
                        "type": "number",
                        "config": {"unit": "°F"},
                        "labels": {"pointId": "p1"},
                        "values": [null]
                    }
                ]
            })
        );
    }
}
