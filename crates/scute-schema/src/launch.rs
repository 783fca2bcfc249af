//! Launch process declarations and the final build metadata.

use crate::buildpack::Buildpack;
use crate::plan::Require;
use serde::{Deserialize, Serialize};

/// A launch process declared by a buildpack in its `launch.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    #[serde(rename = "type")]
    pub process_type: String,
    pub command: String,
}

/// Contents of a buildpack's `launch.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LaunchToml {
    #[serde(default)]
    pub processes: Vec<Process>,
}

/// One bill-of-materials record: a resolved require together with the
/// buildpack that supplied it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomEntry {
    #[serde(flatten)]
    pub require: Require,
    pub buildpack: Buildpack,
}

/// The build phase output, written to `<layers>/config/metadata.toml`. The
/// plain `buildpacks` array comes first so it lands in the root table ahead
/// of the array-of-tables fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildMetadata {
    pub buildpacks: Vec<String>,
    pub processes: Vec<Process>,
    pub bom: Vec<BomEntry>,
}
