pub mod catalog;
pub mod scene;

pub use catalog::{Catalog, CatalogError};
pub use scene::{Focus, Motion, Palette, Section, SemanticScene, StrobeRate};
