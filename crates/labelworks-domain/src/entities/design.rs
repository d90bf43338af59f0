//! The live, editable label design

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::element::Element;
use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{DesignId, LabelType, MeasurementUnit, UserId};

/// A named set of elements that move and lock together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub group_id: String,
    pub name: String,
    pub element_ids: Vec<String>,
    #[serde(default)]
    pub locked: bool,
}

impl Group {
    /// Create an unlocked group
    pub fn new(group_id: impl Into<String>, name: impl Into<String>, element_ids: Vec<String>) -> Self {
        Self {
            group_id: group_id.into(),
            name: name.into(),
            element_ids,
            locked: false,
        }
    }
}

/// The versionable fields of a design
///
/// Everything a version snapshot captures and a restore writes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignContent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub unit: MeasurementUnit,
    pub background_color: String,
    #[serde(default)]
    pub border_width: f64,
    pub border_color: String,
    #[serde(default)]
    pub border_radius: f64,
    #[serde(default)]
    pub label_type: LabelType,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl DesignContent {
    /// Blank white label of the given size in millimetres
    pub fn blank(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            width,
            height,
            unit: MeasurementUnit::Mm,
            background_color: "#FFFFFF".to_string(),
            border_width: 0.0,
            border_color: "#000000".to_string(),
            border_radius: 0.0,
            label_type: LabelType::Standard,
            elements: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Find an element by its identifier
    pub fn element(&self, element_id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.element_id == element_id)
    }

    /// Validate the structural rules history depends on
    ///
    /// Element and group identifiers must be non-empty and unique, since
    /// diffing matches elements across versions by identifier. Every number
    /// must be finite so snapshots survive a JSON round trip.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name", "Design name cannot be empty"));
        }

        if !(self.width > 0.0 && self.height > 0.0)
            || !self.width.is_finite()
            || !self.height.is_finite()
        {
            return Err(DomainError::validation(
                "dimensions",
                format!("Width and height must be positive, got {}x{}", self.width, self.height),
            ));
        }

        for (field, value) in [
            ("border_width", self.border_width),
            ("border_radius", self.border_radius),
        ] {
            if !value.is_finite() {
                return Err(DomainError::validation(
                    field,
                    format!("{} must be a finite number, got {}", field, value),
                ));
            }
        }

        let mut seen = HashSet::new();
        for element in &self.elements {
            element.validate()?;
            if !seen.insert(element.element_id.as_str()) {
                return Err(DomainError::validation(
                    "elements",
                    format!("Duplicate element id: {}", element.element_id),
                ));
            }
        }

        let mut groups = HashSet::new();
        for group in &self.groups {
            if group.group_id.is_empty() || !groups.insert(group.group_id.as_str()) {
                return Err(DomainError::validation(
                    "groups",
                    format!("Invalid or duplicate group id: '{}'", group.group_id),
                ));
            }
        }

        Ok(())
    }
}

/// The live design document owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    pub id: DesignId,
    pub owner_id: UserId,
    #[serde(flatten)]
    pub content: DesignContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Design {
    /// Create a new design after validating its content
    pub fn new(owner_id: UserId, content: DesignContent) -> DomainResult<Self> {
        content.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: DesignId::new(),
            owner_id,
            content,
            created_at: now,
            updated_at: now,
        })
    }

    /// Overwrite every versionable field and bump `updated_at`
    pub fn apply_content(&mut self, content: DesignContent) {
        self.content = content;
        self.updated_at = Utc::now();
    }

    /// Number of elements currently on the design
    pub fn element_count(&self) -> usize {
        self.content.elements.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::element::Geometry;

    fn content_with(ids: &[&str]) -> DesignContent {
        let mut content = DesignContent::blank("Shelf label", 50.0, 30.0);
        for id in ids {
            content
                .elements
                .push(Element::text(*id, "x", Geometry::new(0.0, 0.0, 10.0, 5.0)));
        }
        content
    }

    #[test]
    fn test_design_new_valid() {
        let design = Design::new(UserId::from("u1"), content_with(&["a", "b"])).unwrap();
        assert_eq!(design.element_count(), 2);
        assert_eq!(design.created_at, design.updated_at);
    }

    #[test]
    fn test_duplicate_element_ids_rejected() {
        let err = Design::new(UserId::from("u1"), content_with(&["a", "a"])).unwrap_err();
        assert!(matches!(err, DomainError::ValidationError { ref field, .. } if field == "elements"));
    }

    #[test]
    fn test_non_positive_dimensions_rejected() {
        let mut content = content_with(&[]);
        content.height = 0.0;
        assert!(content.validate().is_err());
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let mut content = content_with(&["a"]);
        content.border_width = f64::NAN;
        assert!(matches!(
            content.validate(),
            Err(DomainError::ValidationError { ref field, .. }) if field == "border_width"
        ));

        let mut content = content_with(&[]);
        content.width = f64::INFINITY;
        assert!(content.validate().is_err());

        let mut content = content_with(&["a"]);
        content.elements[0].geometry.x = f64::NEG_INFINITY;
        assert!(matches!(
            content.validate(),
            Err(DomainError::ValidationError { ref field, .. }) if field == "elements"
        ));
    }

    #[test]
    fn test_apply_content_bumps_timestamp() {
        let mut design = Design::new(UserId::from("u1"), content_with(&[])).unwrap();
        let before = design.updated_at;
        let mut content = design.content.clone();
        content.name = "Renamed".to_string();
        design.apply_content(content);
        assert_eq!(design.content.name, "Renamed");
        assert!(design.updated_at >= before);
    }

    #[test]
    fn test_design_json_flattens_content() {
        let design = Design::new(UserId::from("u1"), content_with(&["a"])).unwrap();
        let json = serde_json::to_value(&design).unwrap();
        assert_eq!(json["name"], "Shelf label");
        assert_eq!(json["elements"][0]["element_id"], "a");
        let back: Design = serde_json::from_value(json).unwrap();
        assert_eq!(back, design);
    }
}
