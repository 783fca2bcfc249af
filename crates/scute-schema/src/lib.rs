//! Wire formats for the scute buildpack lifecycle.
//!
//! This crate defines the schema layer shared by every lifecycle phase:
//! buildpack descriptors (`buildpack.toml`), orderings (`order.toml`),
//! resolved groups (`group.toml`), detect plans, the consolidated plan
//! (`plan.toml`), launch declarations (`launch.toml`), and the build
//! metadata written at the end of the build phase (`metadata.toml`).

pub mod buildpack;
pub mod id;
pub mod io;
pub mod launch;
pub mod plan;

pub use buildpack::{
    read_group, read_order, write_group, Buildpack, BuildpackInfo, BuildpackRef, BuildpackToml,
    Group, Order,
};
pub use id::escape_id;
pub use io::{read_toml, write_toml};
pub use launch::{BomEntry, BuildMetadata, LaunchToml, Process};
pub use plan::{BuildPlan, DetectPlan, Plan, PlanAlternative, PlanEntry, Provide, Require};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}
