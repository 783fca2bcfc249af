//! The build phase: running `bin/build` for each resolved group member while
//! threading environment state between layers.

use crate::env::BuildEnv;
use scute_catalog::{Catalog, CatalogError};
use scute_schema::{
    escape_id, read_toml, write_toml, BomEntry, Buildpack, BuildMetadata, BuildPlan, BuildpackRef,
    Group, LaunchToml, Plan, Process, SchemaError,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BuildError {
    /// A build executable exited nonzero, aborting the phase.
    #[error("build failed for {buildpack}: exit status {code}")]
    BuildFail { buildpack: Buildpack, code: i32 },
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Orchestrates the build phase over a resolved group.
///
/// Owns the environment accumulator and consumes the consolidated plan: each
/// member receives the subset of plan requires it provides, may rewrite that
/// plan file, and the requires it reports back become BOM entries and leave
/// the live plan. Layers a member marks `build = true` contribute to the
/// environment of every later member.
pub struct Builder<'a> {
    pub app_dir: PathBuf,
    pub layers_dir: PathBuf,
    pub platform_dir: PathBuf,
    pub catalog: &'a Catalog,
    pub env: BuildEnv,
    pub group: Group,
    pub plan: Plan,
}

impl Builder<'_> {
    pub fn build(
        &mut self,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<BuildMetadata, BuildError> {
        let app_dir = std::path::absolute(&self.app_dir)?;
        let layers_dir = std::path::absolute(&self.layers_dir)?;
        let platform_dir = std::path::absolute(&self.platform_dir)?;
        let plan_dir = tempfile::Builder::new().prefix("plan.").tempdir()?;

        let mut plan = self.plan.clone();
        let mut processes: BTreeMap<String, Process> = BTreeMap::new();
        let mut bom = Vec::new();
        let mut buildpack_ids = Vec::new();

        for member in &self.group.group {
            let leaf = self.catalog.lookup_leaf(member)?;
            let dir_name = escape_id(&member.id);
            let bp_layers = layers_dir.join(&dir_name);
            let bp_plan_dir = plan_dir.path().join(&dir_name);
            fs::create_dir_all(&bp_layers)?;
            fs::create_dir_all(&bp_plan_dir)?;
            buildpack_ids.push(member.id.clone());

            let bp_plan_path = bp_plan_dir.join("plan.toml");
            write_toml(&bp_plan_path, &plan_for(&plan, member))?;

            debug!("running build for {member}");
            let output = Command::new(leaf.path.join("bin").join("build"))
                .arg(&bp_layers)
                .arg(&platform_dir)
                .arg(&bp_plan_path)
                .current_dir(&app_dir)
                .env_clear()
                .envs(self.env.vars())
                .output()?;

            if !output.stdout.is_empty() || !output.stderr.is_empty() {
                let _ = writeln!(out, "======== Output: {member} ========");
                let _ = out.write_all(&output.stdout);
                let _ = err.write_all(&output.stderr);
            }
            if !output.status.success() {
                return Err(BuildError::BuildFail {
                    buildpack: member.buildpack(),
                    code: output.status.code().unwrap_or(-1),
                });
            }

            setup_env(&mut self.env, &bp_layers)?;

            let reported: BuildPlan = read_toml(&bp_plan_path)?;
            let (remaining, mut member_bom) = filter_plan(plan, member, reported);
            plan = remaining;
            bom.append(&mut member_bom);

            let launch_path = bp_layers.join("launch.toml");
            if launch_path.is_file() {
                let launch: LaunchToml = read_toml(&launch_path)?;
                for process in launch.processes {
                    processes.insert(process.process_type.clone(), process);
                }
            }
        }

        Ok(BuildMetadata {
            processes: processes.into_values().collect(),
            buildpacks: buildpack_ids,
            bom,
        })
    }
}

/// The plan handed to one member: the flattened requires of every
/// consolidated entry that lists it as a provider.
fn plan_for(plan: &Plan, member: &BuildpackRef) -> BuildPlan {
    let key = member.buildpack();
    let mut entries = Vec::new();
    for entry in &plan.entries {
        if entry.providers.contains(&key) {
            entries.extend(entry.requires.iter().cloned());
        }
    }
    BuildPlan { entries }
}

/// Turn the requires a member reported back into BOM entries and drop every
/// consolidated entry they satisfy, so later members no longer see them as
/// live demands.
fn filter_plan(plan: Plan, member: &BuildpackRef, reported: BuildPlan) -> (Plan, Vec<BomEntry>) {
    let names: HashSet<&str> = reported.entries.iter().map(|r| r.name.as_str()).collect();
    let entries = plan
        .entries
        .into_iter()
        .filter(|entry| !entry.requires.iter().any(|r| names.contains(r.name.as_str())))
        .collect();
    let bom = reported
        .entries
        .into_iter()
        .map(|require| BomEntry {
            require,
            buildpack: member.buildpack(),
        })
        .collect();
    (Plan { entries }, bom)
}

#[derive(Debug, Default, Deserialize)]
struct LayerToml {
    #[serde(default)]
    build: bool,
}

fn is_build_layer(layer_dir: &Path) -> bool {
    let Some(name) = layer_dir.file_name() else {
        return false;
    };
    let Some(parent) = layer_dir.parent() else {
        return false;
    };
    let toml_path = parent.join(format!("{}.toml", name.to_string_lossy()));
    read_toml::<LayerToml>(&toml_path)
        .map(|layer| layer.build)
        .unwrap_or(false)
}

/// Fold a member's `build = true` layers into the environment: every layer
/// root first, then each layer's `env/` and `env.build/` overlays.
fn setup_env(env: &mut BuildEnv, layers_dir: &Path) -> Result<(), BuildError> {
    let mut layer_dirs: Vec<PathBuf> = fs::read_dir(layers_dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    layer_dirs.sort();

    for dir in &layer_dirs {
        if is_build_layer(dir) {
            env.add_root_dir(dir);
        }
    }
    for dir in &layer_dirs {
        if is_build_layer(dir) {
            env.add_env_dir(&dir.join("env"))?;
            env.add_env_dir(&dir.join("env.build"))?;
        }
    }
    Ok(())
}
