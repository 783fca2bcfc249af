//! Catalog scanning and `(id, version)` lookup.

use crate::expand::expand_group;
use crate::CatalogError;
use scute_schema::{read_toml, BuildpackRef, BuildpackToml, Group};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A resolved catalog entry. Plain buildpacks and meta-buildpacks are
/// variants of one sum type; only leaves carry executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    Leaf(LeafDescriptor),
    Meta(MetaDescriptor),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafDescriptor {
    pub id: String,
    pub version: String,
    pub name: String,
    pub clear_env: bool,
    /// Directory containing `buildpack.toml` and `bin/`.
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaDescriptor {
    pub id: String,
    pub version: String,
    pub name: String,
    pub order: Vec<Group>,
}

impl Descriptor {
    pub fn id(&self) -> &str {
        match self {
            Descriptor::Leaf(leaf) => &leaf.id,
            Descriptor::Meta(meta) => &meta.id,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            Descriptor::Leaf(leaf) => &leaf.version,
            Descriptor::Meta(meta) => &meta.version,
        }
    }
}

/// Catalog of buildpacks under a single root directory.
///
/// The root is scanned once on [`open`](Self::open); descriptors are served
/// from memory afterwards. Version directories named `latest` (typically
/// symlinks) are indexed under the literal key `latest` while the descriptor
/// itself carries the concrete version read from its `buildpack.toml`, so
/// orders referencing `latest` round-trip unchanged.
#[derive(Debug)]
pub struct Catalog {
    root: PathBuf,
    entries: BTreeMap<String, Descriptor>,
}

fn key(id: &str, version: &str) -> String {
    format!("{id}@{version}")
}

impl Catalog {
    /// Scan a catalog root. Directories without a `buildpack.toml` are
    /// skipped; a `buildpack.toml` whose id does not match its directory is
    /// skipped with a warning.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let root = root.into();
        let mut entries = BTreeMap::new();

        for id_entry in fs::read_dir(&root)? {
            let id_dir = id_entry?.path();
            if !id_dir.is_dir() {
                continue;
            }
            for version_entry in fs::read_dir(&id_dir)? {
                let version_dir = version_entry?.path();
                if !version_dir.is_dir() {
                    continue;
                }
                let toml_path = version_dir.join("buildpack.toml");
                if !toml_path.is_file() {
                    continue;
                }
                let parsed: BuildpackToml = read_toml(&toml_path)?;

                let dir_name = id_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if scute_schema::escape_id(&parsed.buildpack.id) != dir_name {
                    warn!(
                        "skipping {}: buildpack id {} does not match directory",
                        toml_path.display(),
                        parsed.buildpack.id
                    );
                    continue;
                }

                // The lookup key uses the directory name so that `latest`
                // symlinks stay addressable as written in orders.
                let version_key = version_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();

                let descriptor = if parsed.order.is_empty() {
                    Descriptor::Leaf(LeafDescriptor {
                        id: parsed.buildpack.id.clone(),
                        version: parsed.buildpack.version,
                        name: parsed.buildpack.name,
                        clear_env: parsed.buildpack.clear_env,
                        path: version_dir,
                    })
                } else {
                    Descriptor::Meta(MetaDescriptor {
                        id: parsed.buildpack.id.clone(),
                        version: parsed.buildpack.version,
                        name: parsed.buildpack.name,
                        order: parsed.order,
                    })
                };
                entries.insert(key(&parsed.buildpack.id, &version_key), descriptor);
            }
        }

        debug!("catalog at {} holds {} buildpacks", root.display(), entries.len());
        Ok(Self { root, entries })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a reference to its descriptor.
    pub fn lookup(&self, reference: &BuildpackRef) -> Result<&Descriptor, CatalogError> {
        self.entries
            .get(&key(&reference.id, &reference.version))
            .ok_or_else(|| CatalogError::NotFound(reference.buildpack()))
    }

    /// Resolve a reference that must name an executable buildpack.
    pub fn lookup_leaf(&self, reference: &BuildpackRef) -> Result<&LeafDescriptor, CatalogError> {
        match self.lookup(reference)? {
            Descriptor::Leaf(leaf) => Ok(leaf),
            Descriptor::Meta(_) => Err(CatalogError::NotExecutable(reference.buildpack())),
        }
    }

    /// Expand a declared group into leaf groups: each meta-buildpack member
    /// is substituted by each of its nested groups in turn, depth-first and
    /// left-to-right, producing the Cartesian expansion in member order.
    pub fn expand(&self, group: &Group) -> Result<Vec<Group>, CatalogError> {
        let mut stack = Vec::new();
        let leaves = expand_group(self, group, &mut stack)?;
        Ok(leaves.into_iter().map(Group::new).collect())
    }
}
