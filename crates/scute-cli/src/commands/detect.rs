use crate::commands::{EXIT_DETECT_FAILED, EXIT_SAVE_FAILED, EXIT_SUCCESS};
use scute_catalog::Catalog;
use scute_core::{detect, DetectConfig, DetectError};
use scute_schema::{read_order, write_group, write_toml};
use std::io;
use std::path::PathBuf;

pub struct DetectArgs {
    pub buildpacks: PathBuf,
    pub order: PathBuf,
    pub group: PathBuf,
    pub plan: PathBuf,
    pub app: PathBuf,
    pub platform: PathBuf,
}

pub fn run(args: &DetectArgs) -> Result<u8, String> {
    let catalog =
        Catalog::open(&args.buildpacks).map_err(|e| format!("read buildpacks directory: {e}"))?;
    let order = read_order(&args.order).map_err(|e| format!("read buildpack order: {e}"))?;

    let config = DetectConfig {
        app_dir: args.app.clone(),
        platform_dir: args.platform.clone(),
        full_env: full_env(),
        clear_env: clear_env(),
    };

    let mut out = io::stdout();
    match detect(&order, &catalog, &config, &mut out) {
        Ok(resolution) => {
            if let Err(e) = write_group(&args.group, &resolution.group) {
                eprintln!("error: write buildpack group: {e}");
                return Ok(EXIT_SAVE_FAILED);
            }
            if let Err(e) = write_toml(&args.plan, &resolution.plan) {
                eprintln!("error: write detect plan: {e}");
                return Ok(EXIT_SAVE_FAILED);
            }
            Ok(EXIT_SUCCESS)
        }
        Err(DetectError::Unresolvable) => {
            eprintln!("error: no buildpack group passed detection");
            Ok(EXIT_DETECT_FAILED)
        }
        Err(e) => Err(format!("detect: {e}")),
    }
}

fn full_env() -> Vec<(String, String)> {
    std::env::vars().collect()
}

/// The platform-only environment handed to `clear-env` buildpacks: the
/// baseline POSIX variables plus anything lifecycle-specific.
fn clear_env() -> Vec<(String, String)> {
    std::env::vars()
        .filter(|(key, _)| {
            matches!(key.as_str(), "PATH" | "HOME" | "LANG" | "TERM")
                || key.starts_with("CNB_")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_env_is_a_subset_of_the_host_environment() {
        let full: std::collections::HashMap<_, _> = full_env().into_iter().collect();
        for (key, value) in clear_env() {
            assert_eq!(full.get(&key), Some(&value));
        }
    }
}
