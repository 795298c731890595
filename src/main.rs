use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use topup_gear::app::{handle_fatal_error, init_logging, AppConfig};
use topup_gear::command::{build_command_list, join_command, OptionMap, OptionValue};
use topup_gear::fsl::FslRunnerImpl;
use topup_gear::gear::{GearContext, GearEnvironment, DEFAULT_ENVIRON_PATH, DEFAULT_GEAR_DIR};
use topup_gear::pipeline::TopupPipeline;
use topup_gear::subprocess::SubprocessManager;
use topup_gear::transform::{format_premat, rigid_transform, write_premat, MotionParameters};
use topup_gear::volume::NiftiProbe;

/// FSL topup distortion correction gear
#[derive(Parser)]
#[command(name = "topup-gear", version)]
#[command(about = "Run FSL topup distortion correction as a gear", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the topup pipeline on the gear's inputs
    Run {
        /// Gear root containing config.json
        #[arg(long, default_value = DEFAULT_GEAR_DIR)]
        gear_dir: PathBuf,

        /// JSON file holding the environment FSL tools run with
        #[arg(long, default_value = DEFAULT_ENVIRON_PATH)]
        environ: PathBuf,

        /// Directory holding the FSL binaries (defaults to PATH lookup)
        #[arg(long)]
        fsl_bin: Option<PathBuf>,

        /// Log the commands without running them
        #[arg(long)]
        dry_run: bool,
    },
    /// Print or write the rigid-body premat matrix for six motion parameters
    Premat {
        /// tx ty tz (mm) then rx ry rz (radians)
        #[arg(
            num_args = 6,
            required = true,
            allow_negative_numbers = true,
            value_names = ["TX", "TY", "TZ", "RX", "RY", "RZ"]
        )]
        params: Vec<f64>,

        /// Write the matrix to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the command line assembled from KEY=VALUE options
    Assemble {
        /// Program name, the first token
        program: String,

        /// Options: KEY (true flag), KEY= (bare option) or KEY=VALUE
        #[arg(allow_hyphen_values = true)]
        options: Vec<String>,

        /// Emit option values without their names
        #[arg(long)]
        no_keys: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The gear config may set the log level; a malformed config is reported by `run` itself
    let gear_log_level = match &cli.command {
        Commands::Run { gear_dir, .. } => GearContext::load(gear_dir)
            .ok()
            .map(|context| context.config().log_level.clone()),
        _ => None,
    };
    let config = AppConfig::new(cli.verbose).with_gear_log_level(gear_log_level);
    init_logging(&config);

    let result = match cli.command {
        Commands::Run {
            gear_dir,
            environ,
            fsl_bin,
            dry_run,
        } => run_gear(gear_dir, environ, fsl_bin, dry_run).await,
        Commands::Premat { params, output } => run_premat(&params, output),
        Commands::Assemble {
            program,
            options,
            no_keys,
        } => run_assemble(program, &options, !no_keys),
    };

    if let Err(e) = result {
        handle_fatal_error(e, cli.verbose);
    }
}

async fn run_gear(
    gear_dir: PathBuf,
    environ: PathBuf,
    fsl_bin: Option<PathBuf>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let context = GearContext::load(&gear_dir)?;

    info!("setting up gear environment");
    let environment =
        GearEnvironment::load(&environ).context("Error setting up gear environment")?;

    let subprocess = if dry_run {
        SubprocessManager::dry_run()
    } else {
        SubprocessManager::production()
    };

    let mut fsl = FslRunnerImpl::new(subprocess.runner(), environment);
    if let Some(dir) = fsl_bin {
        debug!("Using FSL binaries in {}", dir.display());
        fsl = fsl.with_bin_dir(dir);
    }

    let pipeline =
        TopupPipeline::new(context, Arc::new(fsl), Arc::new(NiftiProbe)).with_dry_run(dry_run);
    let outcome = pipeline.run().await?;

    for path in outcome
        .corrected
        .iter()
        .chain(&outcome.motion_corrected)
        .chain(&outcome.reports)
    {
        info!("Wrote {}", path.display());
    }
    Ok(())
}

fn run_premat(params: &[f64], output: Option<PathBuf>) -> anyhow::Result<()> {
    let values: [f64; 6] = params
        .try_into()
        .context("premat takes exactly six motion parameters")?;
    let matrix = rigid_transform(&MotionParameters::from(values))?;

    match output {
        Some(path) => {
            write_premat(&path, &matrix)?;
            info!("Wrote premat {}", path.display());
        }
        None => print!("{}", format_premat(&matrix)),
    }
    Ok(())
}

fn run_assemble(program: String, assignments: &[String], include_keys: bool) -> anyhow::Result<()> {
    let options = assignments
        .iter()
        .map(|a| OptionValue::parse_assignment(a))
        .collect::<Result<OptionMap, _>>()?;

    let command = build_command_list(vec![program], &options, include_keys)?;
    println!("{}", join_command(&command));
    Ok(())
}
