//! Buildpack identities, references, orderings, and descriptors.

use crate::io::{read_toml, write_toml};
use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Identity of a buildpack: the pair written to `group.toml` entries, plan
/// providers, and BOM attributions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Buildpack {
    pub id: String,
    pub version: String,
}

impl Buildpack {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Buildpack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

/// A reference to a buildpack within an order or group declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildpackRef {
    pub id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl BuildpackRef {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            optional: false,
        }
    }

    pub fn optional(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            optional: true,
        }
    }

    pub fn buildpack(&self) -> Buildpack {
        Buildpack::new(self.id.clone(), self.version.clone())
    }
}

impl fmt::Display for BuildpackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

/// An ordered sequence of buildpack references, evaluated together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub group: Vec<BuildpackRef>,
}

impl Group {
    pub fn new(group: Vec<BuildpackRef>) -> Self {
        Self { group }
    }
}

/// An ordered sequence of candidate groups (`order.toml`, or the nested
/// order of a meta-buildpack).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub order: Vec<Group>,
}

/// Contents of a `buildpack.toml`. A non-empty `order` marks a
/// meta-buildpack, which has no executables and must be expanded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildpackToml {
    pub buildpack: BuildpackInfo,
    #[serde(default)]
    pub order: Vec<Group>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildpackInfo {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "clear-env")]
    pub clear_env: bool,
}

/// Read an `order.toml`.
pub fn read_order(path: impl AsRef<Path>) -> Result<Order, SchemaError> {
    read_toml(path)
}

/// Read a `group.toml`. Entries carry no optional flag on disk; resolution
/// has already happened by the time a group file exists.
pub fn read_group(path: impl AsRef<Path>) -> Result<Group, SchemaError> {
    read_toml(path)
}

// group.toml records only the identity of each member.
#[derive(Serialize)]
struct GroupFile {
    group: Vec<Buildpack>,
}

/// Write a resolved group to `group.toml`, recording only id and version.
pub fn write_group(path: impl AsRef<Path>, group: &Group) -> Result<(), SchemaError> {
    let file = GroupFile {
        group: group.group.iter().map(BuildpackRef::buildpack).collect(),
    };
    write_toml(path, &file)
}
