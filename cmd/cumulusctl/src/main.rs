use std::path::Path;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use pkg_constants::build::{DIGEST_IGNORE_DIRS, DIGEST_PATTERNS};
use pkg_types::config::{DeploymentFile, load_config_file};
use tracing::info;

mod deploy;

#[derive(Parser)]
#[command(name = "cumulusctl", about = "Declare and inspect cumulus deployment stacks")]
struct Cli {
    /// Path to the deployment YAML file
    #[arg(long, short = 'f', default_value = "deployment.yaml")]
    file: String,

    /// Project id, overriding the deployment file
    #[arg(long)]
    project: Option<String>,

    /// Region, overriding the deployment file
    #[arg(long)]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Declare the stack and print the resource manifest
    Preview,
    /// Print the rendered instance boot document
    CloudInit,
    /// Print the remote build request document
    BuildConfig,
    /// Print the source-tree digest for a directory
    Hash {
        /// Source directory to hash
        dir: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    if let Commands::Hash { dir } = &cli.command {
        let digest =
            pkg_build::source_tree_digest(Path::new(dir), DIGEST_PATTERNS, DIGEST_IGNORE_DIRS)?;
        println!("{digest}");
        return Ok(());
    }

    let mut file: DeploymentFile = load_config_file(&cli.file)?;
    // Merge: CLI args > deployment file
    if cli.project.is_some() {
        file.project = cli.project.clone();
    }
    if cli.region.is_some() {
        file.region = cli.region.clone();
    }
    info!("Deployment file: {}", cli.file);

    let deployment = deploy::declare(&file)?;
    match cli.command {
        Commands::Preview => {
            print!("{}", deployment.stack.manifest()?);
        }
        Commands::CloudInit => {
            let Some(cluster) = &deployment.cluster else {
                bail!("deployment file has no `cluster` section");
            };
            print!("{}", cluster.boot_document());
        }
        Commands::BuildConfig => {
            let Some(build) = &deployment.build else {
                bail!("deployment file has no `build` section");
            };
            println!("{}", serde_json::to_string_pretty(build.descriptor())?);
        }
        Commands::Hash { .. } => unreachable!(),
    }

    Ok(())
}
