//! Version records and operation outcomes

use chrono::{DateTime, Utc};
use labelworks_domain::{Design, DesignContent, DesignId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{VersioningError, VersioningResult};

/// Longest accepted custom version name, in characters
pub const MAX_CUSTOM_NAME_LEN: usize = 100;

/// Immutable snapshot of a design at a point in time
///
/// Only `custom_name` may change after the version is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub design_id: DesignId,
    /// Positive, unique per design, never reused
    pub version_number: u32,
    pub author_id: UserId,
    pub content: DesignContent,
    /// Hex SHA-256 over the canonical content and provenance
    pub content_hash: String,
    pub element_count: usize,
    pub group_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    /// Version this snapshot's content was restored from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restored_from: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl Version {
    /// Label shown in history lists
    pub fn display_name(&self) -> String {
        self.custom_name
            .clone()
            .unwrap_or_else(|| format!("Version {}", self.version_number))
    }

    pub fn summary(&self) -> VersionSummary {
        VersionSummary {
            version_number: self.version_number,
            author_id: self.author_id.clone(),
            content_hash: self.content_hash.clone(),
            element_count: self.element_count,
            group_count: self.group_count,
            custom_name: self.custom_name.clone(),
            restored_from: self.restored_from,
            created_at: self.created_at,
        }
    }
}

/// A version waiting for its number
///
/// Everything except `version_number` is fixed before the numbering
/// transaction starts, so a retry only re-reads the max.
#[derive(Debug, Clone)]
pub struct VersionDraft {
    pub design_id: DesignId,
    pub author_id: UserId,
    pub content: DesignContent,
    pub content_hash: String,
    pub custom_name: Option<String>,
    pub restored_from: Option<u32>,
}

impl VersionDraft {
    pub fn from_design(
        design: &Design,
        author_id: UserId,
        content_hash: String,
        custom_name: Option<String>,
        restored_from: Option<u32>,
    ) -> Self {
        Self {
            design_id: design.id,
            author_id,
            content: design.content.clone(),
            content_hash,
            custom_name,
            restored_from,
        }
    }

    /// Stamp the draft with its allocated number
    pub fn into_version(self, version_number: u32) -> Version {
        Version {
            design_id: self.design_id,
            version_number,
            author_id: self.author_id,
            element_count: self.content.elements.len(),
            group_count: self.content.groups.len(),
            content: self.content,
            content_hash: self.content_hash,
            custom_name: self.custom_name,
            restored_from: self.restored_from,
            created_at: Utc::now(),
        }
    }
}

/// Lightweight listing row for a version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub version_number: u32,
    pub author_id: UserId,
    pub content_hash: String,
    pub element_count: usize,
    pub group_count: usize,
    pub custom_name: Option<String>,
    pub restored_from: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied snapshot options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotOptions {
    pub custom_name: Option<String>,
    /// Overrides provenance recorded by a previous restore
    pub restored_from: Option<u32>,
}

impl SnapshotOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            custom_name: Some(name.into()),
            restored_from: None,
        }
    }
}

/// Result of a snapshot request
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotOutcome {
    /// A new version was written
    Created(Version),
    /// Content matches the most recent version; nothing was written
    Duplicate,
}

impl SnapshotOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, SnapshotOutcome::Created(_))
    }

    pub fn version(&self) -> Option<&Version> {
        match self {
            SnapshotOutcome::Created(version) => Some(version),
            SnapshotOutcome::Duplicate => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            SnapshotOutcome::Created(version) => format!("Saved {}", version.display_name()),
            SnapshotOutcome::Duplicate => "No changes to save".to_string(),
        }
    }
}

/// Out-of-band record of the last restore applied to a design
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreProvenance {
    pub restored_from: u32,
    pub restored_by: UserId,
    pub restored_at: DateTime<Utc>,
    /// Hash of the restored content without provenance, for dirty checks
    pub content_hash: String,
}

/// What a retention pass did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionReport {
    pub design_id: DesignId,
    /// Versions present before the pass
    pub before: usize,
    pub deleted: usize,
    /// Highest deleted version number
    pub cutoff: Option<u32>,
}

impl RetentionReport {
    pub fn untouched(design_id: DesignId, before: usize) -> Self {
        Self {
            design_id,
            before,
            deleted: 0,
            cutoff: None,
        }
    }
}

/// Trim a requested custom name; blank clears it
pub fn normalize_custom_name(name: Option<String>) -> VersioningResult<Option<String>> {
    let Some(name) = name else {
        return Ok(None);
    };
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_CUSTOM_NAME_LEN {
        return Err(VersioningError::validation(format!(
            "Version name cannot exceed {} characters",
            MAX_CUSTOM_NAME_LEN
        )));
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> VersionDraft {
        let design = Design::new(UserId::from("u1"), DesignContent::blank("Tag", 30.0, 20.0)).unwrap();
        VersionDraft::from_design(&design, UserId::from("u1"), "abc".to_string(), None, None)
    }

    #[test]
    fn test_into_version_counts() {
        let version = draft().into_version(3);
        assert_eq!(version.version_number, 3);
        assert_eq!(version.element_count, 0);
        assert_eq!(version.display_name(), "Version 3");
    }

    #[test]
    fn test_normalize_custom_name() {
        assert_eq!(normalize_custom_name(None).unwrap(), None);
        assert_eq!(normalize_custom_name(Some("   ".into())).unwrap(), None);
        assert_eq!(
            normalize_custom_name(Some("  Final  ".into())).unwrap().as_deref(),
            Some("Final")
        );
        let too_long = "x".repeat(MAX_CUSTOM_NAME_LEN + 1);
        assert!(normalize_custom_name(Some(too_long)).is_err());
    }

    #[test]
    fn test_duplicate_message() {
        assert_eq!(SnapshotOutcome::Duplicate.user_message(), "No changes to save");
        assert!(!SnapshotOutcome::Duplicate.is_created());
    }
}
