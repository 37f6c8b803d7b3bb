//! Domain data shapes shared across the pipeline stages and adapters

pub mod category;
pub mod credentials;
pub mod element;

pub use category::{Category, CategoryMap, RawExtract};
pub use credentials::Credentials;
pub use element::{format_elevation, Coordinates, Element, ElementKind, Geometry};
