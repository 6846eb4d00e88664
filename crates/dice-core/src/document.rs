//! Persisted form of a school canvas.

use crate::stroke::{Stroke, StrokeSet, Timestamp};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Why a stored document could not be read.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Shape(String),
}

/// The unit of load/save for a school canvas: the full stroke set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeDocument {
    pub strokes: StrokeSet,
    /// Set by the persistence adapter on every save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl StrokeDocument {
    pub fn new(strokes: StrokeSet) -> Self {
        Self {
            strokes,
            updated_at: None,
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a stored document, tolerating older and partly damaged payloads.
    ///
    /// The payload must be a JSON object with a `strokes` array. Each entry is
    /// either `{"points": [...], "createdAt": ms}` or a bare array of points
    /// (written by clients that did not record start times; these get
    /// `createdAt = 0`). Entries matching neither shape are skipped.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(json)?;

        let Value::Object(mut root) = value else {
            return Err(DocumentError::Shape("document is not an object".to_string()));
        };
        let Some(Value::Array(entries)) = root.remove("strokes") else {
            return Err(DocumentError::Shape("`strokes` is missing or not a list".to_string()));
        };

        let total = entries.len();
        let strokes: StrokeSet = entries.into_iter().filter_map(parse_stroke).collect();
        if strokes.len() < total {
            log::warn!("Skipped {} unreadable stroke(s) of {}", total - strokes.len(), total);
        }

        let updated_at = root
            .get("updatedAt")
            .and_then(Value::as_u64)
            .map(Timestamp::from_millis);

        Ok(Self { strokes, updated_at })
    }
}

fn parse_stroke(entry: Value) -> Option<Stroke> {
    match entry {
        Value::Array(_) => serde_json::from_value::<Vec<Point>>(entry)
            .ok()
            .map(|points| Stroke::from_points(points, Timestamp::default())),
        Value::Object(_) => serde_json::from_value::<Stroke>(entry).ok(),
        _ => None,
    }
}
