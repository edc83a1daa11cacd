pub mod catalog;
pub mod projection;

pub use catalog::{GameCoordinate, IconEntry, IconGroup, MapCatalog, MapDefinition};
pub use projection::{RenderConfig, ViewportTransform, fit, project};
