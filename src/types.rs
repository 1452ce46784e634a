//! Core data types for parsed annotation logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag shown for regions that carry no tag.
pub const UNKNOWN_TAG: &str = "UNKNOWN";

/// Represents a bounding box in image pixels (x, y, width, height).
///
/// Coordinates are in LTWH (Left-Top-Width-Height) format where:
/// - x: Left coordinate
/// - y: Top coordinate
/// - width: Box width
/// - height: Box height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Build the axis-aligned box spanned by two opposite corners, in any order.
    ///
    /// ```
    /// use anno_compare::types::BoundingBox;
    ///
    /// let bbox = BoundingBox::from_corners((30.0, 5.0), (10.0, 25.0));
    /// assert_eq!(bbox, BoundingBox::new(10.0, 5.0, 20.0, 20.0));
    /// ```
    pub fn from_corners(p1: (f64, f64), p2: (f64, f64)) -> Self {
        let (x1, y1) = p1;
        let (x2, y2) = p2;
        Self {
            x: x1.min(x2),
            y: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        }
    }

    /// Top-left and bottom-right corners.
    pub fn corners(&self) -> ((f64, f64), (f64, f64)) {
        ((self.x, self.y), (self.right(), self.bottom()))
    }

    /// Get the area of the bounding box.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Get the right coordinate (x + width).
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Get the bottom coordinate (y + height).
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Check if the bounding box is valid (positive dimensions).
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Which of the two compared result files a box comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Annotator {
    First,
    Second,
}

impl Annotator {
    /// 1 for the first annotator, 2 for the second.
    pub fn number(self) -> u8 {
        match self {
            Annotator::First => 1,
            Annotator::Second => 2,
        }
    }
}

impl fmt::Display for Annotator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Annotator{}", self.number())
    }
}

/// A picture referenced by a log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Picture {
    /// The id exactly as exported; `null` and a missing id are both `None`.
    pub id: Option<serde_json::Value>,
    pub url: Option<String>,
    pub is_invalid: bool,
}

impl Picture {
    /// The id as an integer, when it is one or a string spelling one.
    pub fn numeric_id(&self) -> Option<i64> {
        let id = self.id.as_ref()?;
        id.as_i64().or_else(|| id.as_str().and_then(|s| s.parse().ok()))
    }
}

/// A named attribute dimension and the option values selected for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub values: Vec<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Values joined the way they are compared between annotators.
    pub fn canonical_value(&self) -> String {
        self.values.join(", ")
    }
}

/// One annotated area inside a log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub tag: Option<String>,
    /// Present only when the source region was drawn with two corner points.
    pub bbox: Option<BoundingBox>,
    pub attributes: Vec<Attribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_annotation: Option<serde_json::Value>,
}

impl Region {
    /// Tag as displayed; `"UNKNOWN"` when absent or empty.
    pub fn display_tag(&self) -> &str {
        match self.tag.as_deref() {
            Some(tag) if !tag.is_empty() => tag,
            _ => UNKNOWN_TAG,
        }
    }

    /// Human-readable attribute summary, e.g. `"color: red, blue; fit: None"`.
    pub fn attribute_summary(&self) -> String {
        self.attributes
            .iter()
            .map(|attr| {
                if attr.values.is_empty() {
                    format!("{}: None", attr.name)
                } else {
                    format!("{}: {}", attr.name, attr.canonical_value())
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// One annotator's submission for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationLog {
    pub id: String,
    pub is_invalid: bool,
    pub pictures: Vec<Picture>,
    pub regions: Vec<Region>,
}

impl AnnotationLog {
    /// Url of the first picture, which identifies the image being annotated.
    pub fn primary_url(&self) -> Option<&str> {
        self.pictures.first().and_then(|p| p.url.as_deref())
    }

    /// Number of regions that carry a box.
    pub fn box_count(&self) -> usize {
        self.regions.iter().filter(|r| r.bbox.is_some()).count()
    }
}
