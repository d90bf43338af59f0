//! Unit tests for labelworks-domain

use labelworks_domain::{
    AuditEvent, AuditSink, BarcodeFormat, Design, DesignCache, DesignContent, DesignId,
    DomainError, Element, Geometry, Group, NoopAuditSink, NoopDesignCache, UserId,
};
use proptest::prelude::*;

fn sample_content() -> DesignContent {
    let mut content = DesignContent::blank("Pallet label", 100.0, 150.0);
    content.elements.push(Element::text(
        "title",
        "ACME Corp",
        Geometry::new(5.0, 5.0, 90.0, 12.0),
    ));
    content.elements.push(Element::barcode(
        "sscc",
        BarcodeFormat::Gs1_128,
        "(00)123456789012345675",
        Geometry::new(5.0, 100.0, 90.0, 30.0),
    ));
    content.groups.push(Group::new(
        "header",
        "Header",
        vec!["title".to_string()],
    ));
    content
}

mod design_tests {
    use super::*;

    #[test]
    fn test_sample_design_is_valid() {
        let design = Design::new(UserId::from("owner"), sample_content()).unwrap();
        assert_eq!(design.element_count(), 2);
        assert!(design.content.element("sscc").is_some());
        assert!(design.content.element("missing").is_none());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut content = sample_content();
        content.name = "   ".to_string();
        let err = Design::new(UserId::from("owner"), content).unwrap_err();
        assert!(matches!(err, DomainError::ValidationError { .. }));
    }

    #[test]
    fn test_duplicate_group_rejected() {
        let mut content = sample_content();
        content.groups.push(Group::new("header", "Again", Vec::new()));
        assert!(content.validate().is_err());
    }
}

mod port_tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_ports_succeed() {
        let id = DesignId::new();
        NoopDesignCache.invalidate(&id).await.unwrap();
        NoopAuditSink
            .record(AuditEvent::version_created(id, UserId::from("u"), 1))
            .await
            .unwrap();
    }
}

proptest! {
    /// Any list of distinct element ids passes validation
    #[test]
    fn prop_unique_element_ids_validate(ids in prop::collection::hash_set("[a-z0-9]{1,12}", 0..20)) {
        let mut content = DesignContent::blank("Prop", 10.0, 10.0);
        for id in &ids {
            content.elements.push(Element::text(id.clone(), "v", Geometry::new(0.0, 0.0, 1.0, 1.0)));
        }
        prop_assert!(content.validate().is_ok());
    }

    /// Repeating any element id fails validation
    #[test]
    fn prop_repeated_element_id_rejected(
        ids in prop::collection::hash_set("[a-z0-9]{1,12}", 1..20),
        pick in any::<prop::sample::Index>(),
    ) {
        let ids: Vec<String> = ids.into_iter().collect();
        let mut content = DesignContent::blank("Prop", 10.0, 10.0);
        for id in &ids {
            content.elements.push(Element::text(id.clone(), "v", Geometry::new(0.0, 0.0, 1.0, 1.0)));
        }
        let dup = pick.get(&ids).clone();
        content.elements.push(Element::text(dup, "w", Geometry::new(0.0, 0.0, 1.0, 1.0)));
        prop_assert!(content.validate().is_err());
    }
}
