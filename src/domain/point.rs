// Point metadata - resolves the `points` response into a lookup by point id
use crate::domain::error::{DatasourceError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

pub type JsonObject = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PointRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl PointRecord {
    /// Display name, or the raw id when upstream gave none
    pub fn display_name(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => &self.id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PointsResponseFlat {
    pub points: Vec<PointRecord>,
}

#[derive(Debug, Deserialize)]
pub struct SourceGroup {
    #[serde(default)]
    pub points: Vec<PointRecord>,
}

#[derive(Debug, Deserialize)]
pub struct PointsResponseGrouped {
    pub sources: Vec<SourceGroup>,
}

/// The two shapes the `points` endpoint answers with.
///
/// The shape is sniffed from the top-level key. An explicit API version
/// parameter upstream would make this unnecessary.
#[derive(Debug)]
pub enum PointsResponse {
    Flat(PointsResponseFlat),
    Grouped(PointsResponseGrouped),
}

impl PointsResponse {
    pub fn from_object(obj: JsonObject) -> Result<Self> {
        if obj.contains_key("sources") {
            Ok(Self::Grouped(serde_json::from_value(Value::Object(obj))?))
        } else if obj.contains_key("points") {
            Ok(Self::Flat(serde_json::from_value(Value::Object(obj))?))
        } else {
            Err(DatasourceError::Decode(
                "points response has neither `points` nor `sources`".to_string(),
            ))
        }
    }

    pub fn into_points(self) -> Vec<PointRecord> {
        match self {
            Self::Flat(flat) => flat.points,
            Self::Grouped(grouped) => grouped
                .sources
                .into_iter()
                .flat_map(|source| source.points)
                .collect(),
        }
    }
}

/// Point id -> record. Built once per query, never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointLookup {
    points: HashMap<String, PointRecord>,
}

impl PointLookup {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn get(&self, id: &str) -> Option<&PointRecord> {
        self.points.get(id)
    }

    /// Records for `point_ids`, in that order
    pub fn select(&self, point_ids: &[String]) -> Result<Vec<&PointRecord>> {
        point_ids
            .iter()
            .map(|id| {
                self.get(id)
                    .ok_or_else(|| DatasourceError::MissingPoint(id.clone()))
            })
            .collect()
    }
}

/// Flattens either response shape into a lookup. Ids nobody asked for are kept.
pub fn resolve(meta: JsonObject) -> Result<PointLookup> {
    let points = PointsResponse::from_object(meta)?
        .into_points()
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();
    Ok(PointLookup { points })
}
