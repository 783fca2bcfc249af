use crate::commands::{EXIT_BUILD_FAILED, EXIT_SAVE_FAILED, EXIT_SUCCESS};
use scute_catalog::Catalog;
use scute_core::{BuildEnv, BuildError, Builder};
use scute_schema::{read_group, read_toml, write_toml, Plan};
use std::io;
use std::path::PathBuf;

pub struct BuildArgs {
    pub layers: PathBuf,
    pub buildpacks: PathBuf,
    pub group: PathBuf,
    pub plan: PathBuf,
    pub app: PathBuf,
    pub platform: PathBuf,
}

pub fn run(args: &BuildArgs) -> Result<u8, String> {
    let catalog =
        Catalog::open(&args.buildpacks).map_err(|e| format!("read buildpacks directory: {e}"))?;
    let group = read_group(&args.group).map_err(|e| format!("read buildpack group: {e}"))?;
    let plan: Plan = read_toml(&args.plan).map_err(|e| format!("parse detect plan: {e}"))?;

    let mut builder = Builder {
        app_dir: args.app.clone(),
        layers_dir: args.layers.clone(),
        platform_dir: args.platform.clone(),
        catalog: &catalog,
        env: BuildEnv::new(std::env::vars()),
        group,
        plan,
    };

    let mut out = io::stdout();
    let mut err = io::stderr();
    match builder.build(&mut out, &mut err) {
        Ok(metadata) => {
            let path = args.layers.join("config").join("metadata.toml");
            if let Err(e) = write_toml(&path, &metadata) {
                eprintln!("error: write build metadata: {e}");
                return Ok(EXIT_SAVE_FAILED);
            }
            Ok(EXIT_SUCCESS)
        }
        Err(e @ BuildError::BuildFail { .. }) => {
            eprintln!("error: {e}");
            Ok(EXIT_BUILD_FAILED)
        }
        Err(e) => Err(format!("build: {e}")),
    }
}
