mod commands;

use clap::{Parser, Subcommand};
use commands::{EXIT_FAILURE, EXIT_INVALID_ARGS};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "scute",
    version,
    about = "Buildpack lifecycle engine: detect, resolve, and build"
)]
struct Cli {
    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Select a buildpack group for an application and resolve its plan.
    Detect {
        /// Path to the buildpacks directory.
        #[arg(long, env = "CNB_BUILDPACKS_DIR", default_value = "/cnb/buildpacks")]
        buildpacks: PathBuf,
        /// Path to order.toml.
        #[arg(long, env = "CNB_ORDER_PATH", default_value = "/cnb/order.toml")]
        order: PathBuf,
        /// Path to write the resolved group.toml.
        #[arg(long, env = "CNB_GROUP_PATH", default_value = "./group.toml")]
        group: PathBuf,
        /// Path to write the consolidated plan.toml.
        #[arg(long, env = "CNB_PLAN_PATH", default_value = "./plan.toml")]
        plan: PathBuf,
        /// Path to the application directory.
        #[arg(long, env = "CNB_APP_DIR", default_value = "/workspace")]
        app: PathBuf,
        /// Path to the platform directory.
        #[arg(long, env = "CNB_PLATFORM_DIR", default_value = "/platform")]
        platform: PathBuf,
    },
    /// Run each resolved buildpack's build and write the build metadata.
    Build {
        /// Path to the layers directory.
        #[arg(long, env = "CNB_LAYERS_DIR", default_value = "/layers")]
        layers: PathBuf,
        /// Path to the buildpacks directory.
        #[arg(long, env = "CNB_BUILDPACKS_DIR", default_value = "/cnb/buildpacks")]
        buildpacks: PathBuf,
        /// Path to the resolved group.toml.
        #[arg(long, env = "CNB_GROUP_PATH", default_value = "./group.toml")]
        group: PathBuf,
        /// Path to the consolidated plan.toml.
        #[arg(long, env = "CNB_PLAN_PATH", default_value = "./plan.toml")]
        plan: PathBuf,
        /// Path to the application directory.
        #[arg(long, env = "CNB_APP_DIR", default_value = "/workspace")]
        app: PathBuf,
        /// Path to the platform directory.
        #[arg(long, env = "CNB_PLATFORM_DIR", default_value = "/platform")]
        platform: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(EXIT_INVALID_ARGS)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SCUTE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Detect {
            buildpacks,
            order,
            group,
            plan,
            app,
            platform,
        } => commands::detect::run(&commands::detect::DetectArgs {
            buildpacks,
            order,
            group,
            plan,
            app,
            platform,
        }),
        Commands::Build {
            layers,
            buildpacks,
            group,
            plan,
            app,
            platform,
        } => commands::build::run(&commands::build::BuildArgs {
            layers,
            buildpacks,
            group,
            plan,
            app,
            platform,
        }),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
