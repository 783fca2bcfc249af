//! The detect phase: running `bin/detect` across candidate groups and
//! resolving the first viable one.

use crate::resolve::{resolve, Trial};
use scute_catalog::{Catalog, CatalogError};
use scute_schema::{read_toml, Buildpack, DetectPlan, Group, Order, Plan, SchemaError};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DetectError {
    /// No candidate group resolved. Recoverable at the caller level as
    /// "no buildpack was applicable".
    #[error("no buildpack group passed detection")]
    Unresolvable,
    /// A detect executable exited with a code other than 0 (pass) or
    /// 100 (fail), aborting the phase.
    #[error("detect failed for {buildpack}: exit status {code}")]
    DetectFail { buildpack: Buildpack, code: i32 },
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Inputs shared by every detect invocation.
///
/// Both environments are opaque key/value lists passed to the child process
/// verbatim; a buildpack declaring `clear-env` receives `clear_env`, all
/// others receive `full_env`.
#[derive(Debug, Clone)]
pub struct DetectConfig {
    pub app_dir: PathBuf,
    pub platform_dir: PathBuf,
    pub full_env: Vec<(String, String)>,
    pub clear_env: Vec<(String, String)>,
}

/// A successful detect phase: the reduced group and its consolidated plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub group: Group,
    pub plan: Plan,
}

/// Run the detect phase over a declared order.
///
/// Each order entry is expanded into leaf groups, and each leaf group is
/// evaluated in turn; the first group that resolves wins. The transcript for
/// every attempted group is written to `out` so a rejected order can be
/// diagnosed afterwards.
pub fn detect(
    order: &Order,
    catalog: &Catalog,
    config: &DetectConfig,
    out: &mut dyn Write,
) -> Result<Resolution, DetectError> {
    for entry in &order.order {
        for leaf_group in catalog.expand(entry)? {
            if let Some(resolution) = evaluate_group(catalog, &leaf_group, config, out)? {
                return Ok(resolution);
            }
        }
    }
    Err(DetectError::Unresolvable)
}

struct DetectRun {
    code: i32,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    plan_path: PathBuf,
}

/// Evaluate one leaf group: run detect for every member (never
/// short-circuited, so logs exist for all of them), classify the results,
/// and hand the passing members to the plan resolver.
fn evaluate_group(
    catalog: &Catalog,
    group: &Group,
    config: &DetectConfig,
    out: &mut dyn Write,
) -> Result<Option<Resolution>, DetectError> {
    let plan_dir = tempfile::Builder::new().prefix("detect.").tempdir()?;

    let mut runs = Vec::with_capacity(group.group.len());
    for (index, member) in group.group.iter().enumerate() {
        let leaf = catalog.lookup_leaf(member)?;
        let member_dir = plan_dir.path().join(index.to_string());
        fs::create_dir_all(&member_dir)?;
        let plan_path = member_dir.join("plan.toml");

        let env = if leaf.clear_env {
            &config.clear_env
        } else {
            &config.full_env
        };
        debug!("running detect for {member}");
        let output = Command::new(leaf.path.join("bin").join("detect"))
            .arg(&config.platform_dir)
            .arg(&plan_path)
            .current_dir(&config.app_dir)
            .env_clear()
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .output()?;

        runs.push(DetectRun {
            code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
            plan_path,
        });
    }

    for (member, run) in group.group.iter().zip(&runs) {
        if run.stdout.is_empty() && run.stderr.is_empty() {
            continue;
        }
        let _ = writeln!(out, "======== Output: {member} ========");
        write_stream(out, &run.stdout);
        write_stream(out, &run.stderr);
    }

    let _ = writeln!(out, "======== Results ========");
    let mut rejected = false;
    let mut error: Option<(Buildpack, i32)> = None;
    for (member, run) in group.group.iter().zip(&runs) {
        match run.code {
            0 => {
                let _ = writeln!(out, "pass: {member}");
            }
            100 => {
                if member.optional {
                    let _ = writeln!(out, "skip: {member}");
                } else {
                    let _ = writeln!(out, "fail: {member}");
                    rejected = true;
                }
            }
            code => {
                let _ = writeln!(out, "err: {member} ({code})");
                if error.is_none() {
                    error = Some((member.buildpack(), code));
                }
            }
        }
    }
    if let Some((buildpack, code)) = error {
        return Err(DetectError::DetectFail { buildpack, code });
    }
    if rejected {
        return Ok(None);
    }

    let mut trials = Vec::new();
    for (member, run) in group.group.iter().zip(&runs) {
        if run.code != 0 {
            continue;
        }
        let plan: DetectPlan = if run.plan_path.is_file() {
            read_toml(&run.plan_path)?
        } else {
            DetectPlan::default()
        };
        trials.push(Trial::new(member.clone(), plan));
    }

    Ok(resolve(&trials, out).map(|(members, plan)| Resolution {
        group: Group::new(members),
        plan,
    }))
}

fn write_stream(out: &mut dyn Write, stream: &[u8]) {
    if stream.is_empty() {
        return;
    }
    let _ = out.write_all(stream);
    if !stream.ends_with(b"\n") {
        let _ = out.write_all(b"\n");
    }
}
