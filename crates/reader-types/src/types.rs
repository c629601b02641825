use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::color::HighlightStyle;

/// Opaque identifier assigned by the backend. Accepts numeric or string ids
/// on the wire and keeps them as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

pub type HighlightId = RecordId;

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => RecordId(n.to_string()),
            Raw::Text(s) => RecordId(s),
        })
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId(value.to_string())
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        RecordId(value.to_string())
    }
}

/// Fractional rectangle relative to the rendered page box
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Page the fragment was captured on (written by the web client)
    #[serde(rename = "pageIndex", default, skip_serializing_if = "Option::is_none")]
    pub page_index: Option<u32>,
}

impl Rect {
    pub const FULL_PAGE: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
        page_index: None,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            page_index: None,
        }
    }

    pub fn on_page(mut self, page_number: u32) -> Self {
        self.page_index = Some(page_number);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PositionData {
    #[serde(default)]
    pub rects: Vec<Rect>,
}

/// A persisted text annotation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Highlight {
    pub id: HighlightId,
    pub page_number: u32,
    pub text_content: String,
    pub color: HighlightStyle,
    #[serde(default)]
    pub position_data: Option<PositionData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Highlight {
    /// Stored rectangles, possibly empty
    pub fn rects(&self) -> &[Rect] {
        self.position_data
            .as_ref()
            .map(|p| p.rects.as_slice())
            .unwrap_or(&[])
    }
}

/// Creation payload for `POST /reading/highlights/{bookId}/`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewHighlight {
    pub page_number: u32,
    pub text_content: String,
    pub color: HighlightStyle,
    pub position_data: PositionData,
}
