//! Features Module
//!
//! Feature model, dataset reading, and materialization into
//! feature collections.

pub mod gpkg;
pub mod materializer;
pub mod model;
pub mod wkb;

pub use gpkg::{DatasetReader, GeoPackageReader};
pub use materializer::{Materializer, SourceHandle};
pub use model::{Feature, FeatureCollection, Geometry, Position, Properties};
