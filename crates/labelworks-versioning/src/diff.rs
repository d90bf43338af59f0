//! Two-level comparison of versions: scalar fields, then elements by identity

use std::collections::{BTreeMap, HashMap};

use labelworks_domain::{DesignContent, Element};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::Version;

/// Scalar design fields covered by a diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignField {
    Name,
    Description,
    Width,
    Height,
    BackgroundColor,
    BorderWidth,
    BorderColor,
    BorderRadius,
    LabelType,
}

impl DesignField {
    pub const ALL: [DesignField; 9] = [
        DesignField::Name,
        DesignField::Description,
        DesignField::Width,
        DesignField::Height,
        DesignField::BackgroundColor,
        DesignField::BorderWidth,
        DesignField::BorderColor,
        DesignField::BorderRadius,
        DesignField::LabelType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DesignField::Name => "name",
            DesignField::Description => "description",
            DesignField::Width => "width",
            DesignField::Height => "height",
            DesignField::BackgroundColor => "background_color",
            DesignField::BorderWidth => "border_width",
            DesignField::BorderColor => "border_color",
            DesignField::BorderRadius => "border_radius",
            DesignField::LabelType => "label_type",
        }
    }

    fn value_in(&self, content: &DesignContent) -> Value {
        match self {
            DesignField::Name => json!(content.name),
            DesignField::Description => json!(content.description),
            DesignField::Width => json!(content.width),
            DesignField::Height => json!(content.height),
            DesignField::BackgroundColor => json!(content.background_color),
            DesignField::BorderWidth => json!(content.border_width),
            DesignField::BorderColor => json!(content.border_color),
            DesignField::BorderRadius => json!(content.border_radius),
            DesignField::LabelType => json!(content.label_type.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub from: Value,
    pub to: Value,
}

/// An element present on both sides whose record differs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedElement {
    pub id: String,
    pub from: Element,
    pub to: Element,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementDiff {
    /// Only in the newer side
    pub added: Vec<Element>,
    /// Only in the older side
    pub removed: Vec<Element>,
    /// Order is not significant
    pub modified: Vec<ModifiedElement>,
}

impl ElementDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionDiff {
    pub from_version: u32,
    pub to_version: u32,
    pub fields: BTreeMap<DesignField, FieldChange>,
    pub elements: ElementDiff,
}

impl VersionDiff {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.elements.is_empty()
    }

    /// Total number of changed fields and elements
    pub fn change_count(&self) -> usize {
        self.fields.len()
            + self.elements.added.len()
            + self.elements.removed.len()
            + self.elements.modified.len()
    }
}

/// Diff version `a` (older side) against version `b`
pub fn diff(a: &Version, b: &Version) -> VersionDiff {
    VersionDiff {
        from_version: a.version_number,
        to_version: b.version_number,
        fields: diff_fields(&a.content, &b.content),
        elements: diff_elements(&a.content.elements, &b.content.elements),
    }
}

/// Scalar fields whose values differ
pub fn diff_fields(a: &DesignContent, b: &DesignContent) -> BTreeMap<DesignField, FieldChange> {
    DesignField::ALL
        .iter()
        .filter_map(|field| {
            let from = field.value_in(a);
            let to = field.value_in(b);
            (from != to).then(|| (*field, FieldChange { from, to }))
        })
        .collect()
}

/// Elements matched by `element_id`
pub fn diff_elements(a: &[Element], b: &[Element]) -> ElementDiff {
    let before: HashMap<&str, &Element> = a.iter().map(|e| (e.element_id.as_str(), e)).collect();
    let after: HashMap<&str, &Element> = b.iter().map(|e| (e.element_id.as_str(), e)).collect();

    let mut diff = ElementDiff::default();
    for element in b {
        match before.get(element.element_id.as_str()) {
            None => diff.added.push(element.clone()),
            Some(old) if *old != element => diff.modified.push(ModifiedElement {
                id: element.element_id.clone(),
                from: (*old).clone(),
                to: element.clone(),
            }),
            Some(_) => {}
        }
    }
    diff.removed = a
        .iter()
        .filter(|e| !after.contains_key(e.element_id.as_str()))
        .cloned()
        .collect();

    diff
}
