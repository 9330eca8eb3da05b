use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use moorprof_core::config::DeploymentConfig;
use moorprof_core::ingest::DeploymentStreams;
use moorprof_core::outputs::write_deployment_products;
use moorprof_core::pipeline::run_deployment;
use moorprof_parser::parse_profile_file;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Moored-profiler deployment processing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process one deployment of unpacked profile files
    Process(ProcessArgs),
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Deployment metadata TOML
    #[arg(long)]
    config: PathBuf,

    /// Directory of unpacked instrument text files
    #[arg(long)]
    data_dir: PathBuf,

    /// Output directory for the L1/L2 products and run summary
    #[arg(long)]
    out: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Process(args) => process(args),
    }
}

fn process(args: ProcessArgs) -> Result<()> {
    let config = DeploymentConfig::from_toml_path(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    info!(
        deployment = config.deployment.id.as_str(),
        profiles = config.deployment.profile_count,
        "configuration loaded"
    );

    let mut streams = DeploymentStreams::allocate(config.deployment.profile_count);

    let pattern = args.data_dir.join("*.TXT");
    let pattern = pattern.to_string_lossy().into_owned();
    let mut imported = 0usize;
    for entry in glob::glob(&pattern).context("invalid data directory pattern")? {
        let path = entry.context("failed to read data directory entry")?;
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        match parse_profile_file(&content) {
            Ok(parsed) => {
                streams.import(parsed)?;
                imported += 1;
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "skipping unparseable file");
            }
        }
    }
    if imported == 0 {
        anyhow::bail!("no profile files imported from {}", args.data_dir.display());
    }
    info!(files = imported, "import complete");

    let output = run_deployment(&mut streams, &config)?;
    write_deployment_products(&args.out, &output.products, &output.summary)?;
    info!(
        out = %args.out.display(),
        run_id = %output.summary.run_id,
        "deployment products written"
    );
    Ok(())
}
