//! LabelWorks domain layer
//!
//! Entities and value objects for label designs, plus the port traits that
//! infrastructure crates implement: design persistence, read-cache
//! invalidation, and audit recording.

pub mod entities;
pub mod errors;
pub mod ports;
pub mod value_objects;

pub use entities::{
    BarcodeFormat, Design, DesignContent, Element, ElementKind, Geometry, Group, ImageFit,
    ShapeType, TextAlign,
};
pub use errors::{DomainError, DomainResult};
pub use ports::{
    AuditAction, AuditEvent, AuditSink, DesignCache, DesignRepository, NoopAuditSink,
    NoopDesignCache,
};
pub use value_objects::{DesignId, LabelType, MeasurementUnit, UserId};
