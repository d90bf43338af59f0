//! Domain entities

pub mod design;
pub mod element;

pub use design::{Design, DesignContent, Group};
pub use element::{BarcodeFormat, Element, ElementKind, Geometry, ImageFit, ShapeType, TextAlign};
