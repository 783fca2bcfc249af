//! On-disk buildpack catalog for the scute lifecycle.
//!
//! A catalog root is laid out as `<root>/<escaped-id>/<version>/` with a
//! `buildpack.toml` and `bin/detect` + `bin/build` executables per version.
//! The catalog is scanned once per process; lookups resolve `(id, version)`
//! references to descriptors, and meta-buildpacks (descriptors that declare
//! a nested order) are expanded into leaf groups before evaluation.

pub mod catalog;
mod expand;

pub use catalog::{Catalog, Descriptor, LeafDescriptor, MetaDescriptor};

use scute_schema::{Buildpack, SchemaError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("buildpack {0} not found in catalog")]
    NotFound(Buildpack),
    #[error("cycle in buildpack order involving {0}")]
    OrderCycle(Buildpack),
    #[error("buildpack {0} declares an order and has no executables")]
    NotExecutable(Buildpack),
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
