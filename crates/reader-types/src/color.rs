//! Highlight palette and render-mode encoding
//!
//! The backend stores a single `color` string per highlight. The base value is
//! one of the fixed palette names; an `-underline` suffix switches the overlay
//! from a translucent fill to a bottom stripe without changing the color.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;

const UNDERLINE_SUFFIX: &str = "-underline";

/// Fixed highlight palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    #[default]
    Yellow,
    Green,
    Blue,
    Pink,
    Purple,
    Orange,
}

impl HighlightColor {
    pub const ALL: [HighlightColor; 6] = [
        HighlightColor::Yellow,
        HighlightColor::Green,
        HighlightColor::Blue,
        HighlightColor::Pink,
        HighlightColor::Purple,
        HighlightColor::Orange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HighlightColor::Yellow => "yellow",
            HighlightColor::Green => "green",
            HighlightColor::Blue => "blue",
            HighlightColor::Pink => "pink",
            HighlightColor::Purple => "purple",
            HighlightColor::Orange => "orange",
        }
    }

    /// Display name for toolbars
    pub fn label(&self) -> &'static str {
        match self {
            HighlightColor::Yellow => "Yellow",
            HighlightColor::Green => "Green",
            HighlightColor::Blue => "Blue",
            HighlightColor::Pink => "Pink",
            HighlightColor::Purple => "Purple",
            HighlightColor::Orange => "Orange",
        }
    }

    /// RGB channels shared by the fill and the underline stroke
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            HighlightColor::Yellow => (255, 255, 0),
            HighlightColor::Green => (0, 255, 0),
            HighlightColor::Blue => (0, 150, 255),
            HighlightColor::Pink => (255, 105, 180),
            HighlightColor::Purple => (147, 51, 234),
            HighlightColor::Orange => (255, 165, 0),
        }
    }

    /// Translucent fill used for filled highlights
    pub fn fill_css(&self) -> String {
        self.rgba(0.3)
    }

    /// Stronger stroke used for the underline stripe
    pub fn stroke_css(&self) -> String {
        self.rgba(0.8)
    }

    fn rgba(&self, alpha: f64) -> String {
        let (r, g, b) = self.rgb();
        format!("rgba({}, {}, {}, {})", r, g, b, alpha)
    }
}

impl FromStr for HighlightColor {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HighlightColor::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TypesError::UnknownColor(s.to_string()))
    }
}

impl fmt::Display for HighlightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an annotation is drawn over the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    #[default]
    Highlight,
    Underline,
}

impl AnnotationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Highlight => "highlight",
            AnnotationKind::Underline => "underline",
        }
    }
}

impl FromStr for AnnotationKind {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "highlight" => Ok(AnnotationKind::Highlight),
            "underline" => Ok(AnnotationKind::Underline),
            _ => Err(TypesError::UnknownKind(s.to_string())),
        }
    }
}

/// Palette color plus render mode, encoded on the wire as `yellow` or
/// `yellow-underline`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct HighlightStyle {
    pub color: HighlightColor,
    pub kind: AnnotationKind,
}

impl HighlightStyle {
    pub fn new(color: HighlightColor, kind: AnnotationKind) -> Self {
        Self { color, kind }
    }

    pub fn is_underline(&self) -> bool {
        self.kind == AnnotationKind::Underline
    }

    pub fn to_wire(&self) -> String {
        match self.kind {
            AnnotationKind::Highlight => self.color.as_str().to_string(),
            AnnotationKind::Underline => format!("{}{}", self.color.as_str(), UNDERLINE_SUFFIX),
        }
    }

    /// Decode a stored color, keeping the underline flag and falling back to
    /// yellow for base colors outside the palette
    pub fn from_wire_lossy(value: &str) -> Self {
        let (base, kind) = split_suffix(value);
        Self {
            color: base.parse().unwrap_or_default(),
            kind,
        }
    }
}

fn split_suffix(value: &str) -> (&str, AnnotationKind) {
    match value.strip_suffix(UNDERLINE_SUFFIX) {
        Some(base) => (base, AnnotationKind::Underline),
        None => (value, AnnotationKind::Highlight),
    }
}

impl FromStr for HighlightStyle {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, kind) = split_suffix(s.trim());
        Ok(Self {
            color: base.parse()?,
            kind,
        })
    }
}

impl From<String> for HighlightStyle {
    fn from(value: String) -> Self {
        HighlightStyle::from_wire_lossy(&value)
    }
}

impl From<HighlightStyle> for String {
    fn from(style: HighlightStyle) -> Self {
        style.to_wire()
    }
}

impl fmt::Display for HighlightStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underline_suffix_on_wire() {
        let style = HighlightStyle::new(HighlightColor::Yellow, AnnotationKind::Underline);
        assert_eq!(style.to_wire(), "yellow-underline");

        let style = HighlightStyle::new(HighlightColor::Yellow, AnnotationKind::Highlight);
        assert_eq!(style.to_wire(), "yellow");
    }

    #[test]
    fn test_parse_wire_values() {
        let style: HighlightStyle = "purple-underline".parse().unwrap();
        assert_eq!(style.color, HighlightColor::Purple);
        assert!(style.is_underline());

        let style: HighlightStyle = "green".parse().unwrap();
        assert_eq!(style.color, HighlightColor::Green);
        assert_eq!(style.kind, AnnotationKind::Highlight);

        assert!("teal".parse::<HighlightStyle>().is_err());
    }

    #[test]
    fn test_underline_shares_palette_values() {
        let fill: HighlightStyle = "pink".parse().unwrap();
        let line: HighlightStyle = "pink-underline".parse().unwrap();
        assert_eq!(fill.color.rgb(), line.color.rgb());
    }

    #[test]
    fn test_lossy_decode_falls_back_to_yellow() {
        let style = HighlightStyle::from_wire_lossy("teal-underline");
        assert_eq!(style.color, HighlightColor::Yellow);
        assert!(style.is_underline());
    }

    #[test]
    fn test_css_colors() {
        assert_eq!(HighlightColor::Blue.fill_css(), "rgba(0, 150, 255, 0.3)");
        assert_eq!(HighlightColor::Orange.stroke_css(), "rgba(255, 165, 0, 0.8)");
    }

    #[test]
    fn test_serde_as_string() {
        let style = HighlightStyle::new(HighlightColor::Blue, AnnotationKind::Underline);
        let json = serde_json::to_string(&style).unwrap();
        assert_eq!(json, "\"blue-underline\"");

        let back: HighlightStyle = serde_json::from_str("\"blue\"").unwrap();
        assert_eq!(back.kind, AnnotationKind::Highlight);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(
            "Underline".parse::<AnnotationKind>().unwrap(),
            AnnotationKind::Underline
        );
        assert!("strike".parse::<AnnotationKind>().is_err());
    }
}
