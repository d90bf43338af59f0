//! Positioned visual primitives placed on a design

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};

/// Position and size of an element, in the design's measurement unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise rotation in degrees
    #[serde(default)]
    pub rotation: f64,
}

impl Geometry {
    /// Unrotated rectangle
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation: 0.0,
        }
    }

    /// Whether every coordinate is a finite number
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height, self.rotation]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Supported barcode symbologies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    Code128,
    Code39,
    Ean13,
    UpcA,
    Gs1_128,
    Qr,
    DataMatrix,
}

/// How an image fills its box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    Contain,
    Cover,
    Stretch,
}

/// Basic shape outlines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Rectangle,
    Ellipse,
}

/// Type-specific attributes of an element
///
/// `binding` names the column of imported data a field is bound to during
/// batch generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Text {
        content: String,
        font_family: String,
        font_size: f64,
        #[serde(default)]
        bold: bool,
        #[serde(default)]
        italic: bool,
        color: String,
        align: TextAlign,
        #[serde(default)]
        binding: Option<String>,
    },
    Barcode {
        format: BarcodeFormat,
        value: String,
        #[serde(default)]
        show_text: bool,
        #[serde(default)]
        binding: Option<String>,
    },
    Image {
        source: String,
        fit: ImageFit,
    },
    Shape {
        shape: ShapeType,
        #[serde(default)]
        fill_color: Option<String>,
        #[serde(default)]
        stroke_color: Option<String>,
        #[serde(default)]
        stroke_width: f64,
    },
    Line {
        stroke_color: String,
        stroke_width: f64,
    },
}

impl ElementKind {
    /// Type tag as stored on the wire
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::Text { .. } => "text",
            ElementKind::Barcode { .. } => "barcode",
            ElementKind::Image { .. } => "image",
            ElementKind::Shape { .. } => "shape",
            ElementKind::Line { .. } => "line",
        }
    }

    /// Numeric styling attributes, by wire name
    fn numeric_attributes(&self) -> Vec<(&'static str, f64)> {
        match self {
            ElementKind::Text { font_size, .. } => vec![("font_size", *font_size)],
            ElementKind::Shape { stroke_width, .. } | ElementKind::Line { stroke_width, .. } => {
                vec![("stroke_width", *stroke_width)]
            }
            ElementKind::Barcode { .. } | ElementKind::Image { .. } => Vec::new(),
        }
    }
}

/// A positioned visual primitive with a stable, caller-assigned identity
///
/// Two elements are the same element across snapshots iff their
/// `element_id`s match. Attributes this model does not know about are kept in
/// `extra` so older or newer editors round-trip them untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub element_id: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub locked: bool,
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Element {
    /// Create an element with default stacking and no extra attributes
    pub fn new(element_id: impl Into<String>, geometry: Geometry, kind: ElementKind) -> Self {
        Self {
            element_id: element_id.into(),
            geometry,
            z_index: 0,
            locked: false,
            kind,
            extra: BTreeMap::new(),
        }
    }

    /// Plain left-aligned black text
    pub fn text(element_id: impl Into<String>, content: impl Into<String>, geometry: Geometry) -> Self {
        Self::new(
            element_id,
            geometry,
            ElementKind::Text {
                content: content.into(),
                font_family: "Helvetica".to_string(),
                font_size: 10.0,
                bold: false,
                italic: false,
                color: "#000000".to_string(),
                align: TextAlign::Left,
                binding: None,
            },
        )
    }

    /// Barcode showing its human-readable text
    pub fn barcode(
        element_id: impl Into<String>,
        format: BarcodeFormat,
        value: impl Into<String>,
        geometry: Geometry,
    ) -> Self {
        Self::new(
            element_id,
            geometry,
            ElementKind::Barcode {
                format,
                value: value.into(),
                show_text: true,
                binding: None,
            },
        )
    }

    /// Type tag of this element
    pub fn element_type(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Reject NaN and infinite numbers
    ///
    /// JSON has no encoding for them, so a stored snapshot could not be read
    /// back, and a NaN attribute never compares equal to itself.
    pub fn validate(&self) -> DomainResult<()> {
        if self.element_id.is_empty() {
            return Err(DomainError::validation("elements", "Element id cannot be empty"));
        }
        if !self.geometry.is_finite() {
            return Err(DomainError::validation(
                "elements",
                format!("Element {} has a non-finite geometry", self.element_id),
            ));
        }
        for (name, value) in self.kind.numeric_attributes() {
            if !value.is_finite() {
                return Err(DomainError::validation(
                    "elements",
                    format!("Element {} has a non-finite {}: {}", self.element_id, name, value),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_kind_is_tagged() {
        let element = Element::text("t1", "Hello", Geometry::new(1.0, 2.0, 30.0, 5.0));
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["kind"]["type"], "text");
        assert_eq!(json["kind"]["content"], "Hello");
        assert!(json.get("extra").is_none());
    }

    #[test]
    fn test_unknown_attributes_round_trip() {
        let json = serde_json::json!({
            "element_id": "b1",
            "geometry": {"x": 0.0, "y": 0.0, "width": 40.0, "height": 15.0},
            "kind": {"type": "barcode", "format": "ean13", "value": "4006381333931"},
            "extra": {"legacy_quiet_zone": 2.5}
        });

        let element: Element = serde_json::from_value(json).unwrap();
        assert_eq!(element.element_type(), "barcode");
        assert_eq!(element.extra["legacy_quiet_zone"], 2.5);
        assert_eq!(element.geometry.rotation, 0.0);

        let back = serde_json::to_value(&element).unwrap();
        assert_eq!(back["extra"]["legacy_quiet_zone"], 2.5);
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let mut rotated = Element::text("t1", "Hi", Geometry::new(0.0, 0.0, 10.0, 5.0));
        assert!(rotated.validate().is_ok());
        rotated.geometry.rotation = f64::NAN;
        assert!(rotated.validate().is_err());

        let line = Element::new(
            "l1",
            Geometry::new(0.0, 0.0, 10.0, 0.0),
            ElementKind::Line {
                stroke_color: "#000000".to_string(),
                stroke_width: f64::INFINITY,
            },
        );
        let err = line.validate().unwrap_err();
        assert!(err.to_string().contains("stroke_width"));
    }

    #[test]
    fn test_styling_change_breaks_equality() {
        let a = Element::text("t1", "Hello", Geometry::new(0.0, 0.0, 10.0, 5.0));
        let mut b = a.clone();
        if let ElementKind::Text { bold, .. } = &mut b.kind {
            *bold = true;
        }
        assert_ne!(a, b);
        assert_eq!(a.element_id, b.element_id);
    }
}
