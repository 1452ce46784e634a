//! Wire format of annotation-system logs and conversion to typed records.
//!
//! Every optional key of the wire format defaults to empty through serde, so a
//! sparse log parses without error. The only structural failure past the JSON
//! layer is a `labels` payload that does not decode to a list of labels.

use crate::error::{CompareError, Result};
use crate::types::{AnnotationLog, Attribute, BoundingBox, Picture, Region};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A log object exactly as it appears in an exported result file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawLog {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_invalid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture_list: Option<Vec<RawPicture>>,
    /// JSON-encoded string holding the list of labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPicture {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_invalid: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawLabel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<RawTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_annotation: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<RawPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_list: Option<Vec<RawDimension>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTag {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDimension {
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_value_list: Option<Vec<RawDimensionValue>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDimensionValue {
    pub name: Option<Value>,
}

/// Render a scalar JSON value as a string; `null` yields `None`.
fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Convert a raw log into an [`AnnotationLog`].
///
/// # Errors
///
/// Returns [`CompareError::InvalidLabels`] if `labels` is present but does not
/// decode to a list of label objects.
///
/// # Example
///
/// ```
/// use anno_compare::parser::{parse_log, RawLog};
///
/// let raw: RawLog = serde_json::from_str(r#"{
///     "id": "7",
///     "pictureList": [{"id": 1, "url": "https://img/a.jpg"}],
///     "labels": "[{\"tag\": {\"name\": \"sleeve1\"}, \"points\": [{\"x\": 0, \"y\": 0}, {\"x\": 4, \"y\": 2}]}]"
/// }"#).unwrap();
/// let log = parse_log(&raw).unwrap();
/// assert_eq!(log.regions.len(), 1);
/// assert_eq!(log.regions[0].bbox.unwrap().width, 4.0);
/// ```
pub fn parse_log(raw: &RawLog) -> Result<AnnotationLog> {
    let id = raw.id.as_ref().and_then(render_scalar).unwrap_or_default();

    let pictures = raw
        .picture_list
        .iter()
        .flatten()
        .map(|picture| Picture {
            id: picture.id.clone().filter(|v| !v.is_null()),
            url: picture.url.clone(),
            is_invalid: picture.is_invalid.unwrap_or(false),
        })
        .collect();

    let labels = decode_labels(&id, raw.labels.as_ref())?;
    let regions = labels.iter().map(parse_label).collect();

    Ok(AnnotationLog {
        id,
        is_invalid: raw.is_invalid.unwrap_or(false),
        pictures,
        regions,
    })
}

/// Parse a log from an untyped JSON value.
pub fn parse_value(value: Value) -> Result<AnnotationLog> {
    let raw: RawLog = serde_json::from_value(value)?;
    parse_log(&raw)
}

fn decode_labels(log_id: &str, labels: Option<&Value>) -> Result<Vec<RawLabel>> {
    let decoded = match labels {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(Vec::new()),
        Some(Value::String(s)) => serde_json::from_str::<Option<Vec<RawLabel>>>(s),
        // Some exports inline the list instead of encoding it.
        Some(other) => serde_json::from_value::<Option<Vec<RawLabel>>>(other.clone()),
    };

    decoded
        .map(Option::unwrap_or_default)
        .map_err(|source| CompareError::InvalidLabels {
            log_id: log_id.to_string(),
            source,
        })
}

fn parse_label(label: &RawLabel) -> Region {
    let bbox = match label.points.as_deref() {
        Some([p1, p2]) => Some(BoundingBox::from_corners((p1.x, p1.y), (p2.x, p2.y))),
        _ => None,
    };

    let attributes = label
        .dimension_list
        .iter()
        .flatten()
        .map(|dimension| Attribute {
            name: dimension.name.clone().unwrap_or_default(),
            values: dimension
                .dimension_value_list
                .iter()
                .flatten()
                .filter_map(|v| v.name.as_ref().and_then(render_scalar))
                .collect(),
        })
        .collect();

    Region {
        tag: label.tag.as_ref().and_then(|t| t.name.clone()),
        bbox,
        attributes,
        additional_annotation: label.additional_annotation.clone(),
    }
}

/// Convert a parsed log back into the wire shape.
///
/// Boxes are written as their top-left and bottom-right corners and the labels
/// are re-encoded into a JSON string, so parsing the result yields the same
/// tags, boxes and attribute values.
pub fn to_raw_log(log: &AnnotationLog) -> Result<RawLog> {
    let labels: Vec<RawLabel> = log.regions.iter().map(to_raw_label).collect();

    Ok(RawLog {
        id: Some(Value::String(log.id.clone())),
        is_invalid: Some(log.is_invalid),
        picture_list: Some(
            log.pictures
                .iter()
                .map(|p| RawPicture {
                    id: p.id.clone(),
                    url: p.url.clone(),
                    is_invalid: Some(p.is_invalid),
                })
                .collect(),
        ),
        labels: Some(Value::String(serde_json::to_string(&labels)?)),
    })
}

fn to_raw_label(region: &Region) -> RawLabel {
    RawLabel {
        tag: Some(RawTag {
            name: region.tag.clone(),
        }),
        additional_annotation: region.additional_annotation.clone(),
        points: region.bbox.map(|bbox| {
            let ((x1, y1), (x2, y2)) = bbox.corners();
            vec![RawPoint { x: x1, y: y1 }, RawPoint { x: x2, y: y2 }]
        }),
        dimension_list: Some(
            region
                .attributes
                .iter()
                .map(|attr| RawDimension {
                    name: Some(attr.name.clone()),
                    dimension_value_list: Some(
                        attr.values
                            .iter()
                            .map(|v| RawDimensionValue {
                                name: Some(Value::String(v.clone())),
                            })
                            .collect(),
                    ),
                })
                .collect(),
        ),
    }
}
