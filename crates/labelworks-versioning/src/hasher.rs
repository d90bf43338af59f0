//! Canonical serialization and content hashing

use labelworks_domain::DesignContent;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::VersioningResult;

/// The exact shape that gets hashed
///
/// Field order follows struct declaration order and open attribute maps are
/// `BTreeMap`s, so equal content always yields identical bytes.
#[derive(Serialize)]
struct CanonicalForm<'a> {
    content: &'a DesignContent,
    restored_from: Option<u32>,
}

/// Serialize versionable content plus provenance into canonical bytes
pub fn canonicalize(content: &DesignContent, restored_from: Option<u32>) -> VersioningResult<Vec<u8>> {
    let form = CanonicalForm {
        content,
        restored_from,
    };
    Ok(serde_json::to_vec(&form)?)
}

/// Hex-encoded SHA-256 of the given bytes
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Hash of content with a provenance tag
pub fn content_hash(content: &DesignContent, restored_from: Option<u32>) -> VersioningResult<String> {
    Ok(hash_bytes(&canonicalize(content, restored_from)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelworks_domain::{Element, Geometry};

    fn content() -> DesignContent {
        let mut content = DesignContent::blank("Bottle", 60.0, 40.0);
        let mut title = Element::text("title", "Olive oil", Geometry::new(2.0, 2.0, 40.0, 8.0));
        title
            .extra
            .insert("zeta".to_string(), serde_json::json!({"b": 1, "a": 2}));
        title.extra.insert("alpha".to_string(), serde_json::json!(true));
        content.elements.push(title);
        content
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(content_hash(&content(), None).unwrap(), content_hash(&content(), None).unwrap());
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = content_hash(&content(), None).unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_provenance_changes_hash() {
        let content = content();
        assert_ne!(
            content_hash(&content, None).unwrap(),
            content_hash(&content, Some(1)).unwrap()
        );
    }

    #[test]
    fn test_open_attribute_insertion_order_irrelevant() {
        let a = content();
        let mut b = content();
        let extra = &mut b.elements[0].extra;
        let zeta = extra.remove("zeta").unwrap();
        extra.insert("zeta".to_string(), zeta);
        assert_eq!(content_hash(&a, None).unwrap(), content_hash(&b, None).unwrap());
    }

    #[test]
    fn test_content_change_changes_hash() {
        let a = content();
        let mut b = content();
        b.background_color = "#FFFFFE".to_string();
        assert_ne!(content_hash(&a, None).unwrap(), content_hash(&b, None).unwrap());
    }
}
