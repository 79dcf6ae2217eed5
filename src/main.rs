//! CLI entry point: builds the au-generator zip.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use augen::{copy_to_destination, create_zip, default_bundle, stage_bundle, SystemRunner};

/// Package the update-payload generator and everything it needs to run
/// into a single zip file.
#[derive(Debug, Parser)]
#[command(name = "augen", version)]
struct Cli {
    /// Verbose output
    #[arg(short = 'd', long)]
    debug: bool,

    /// Where the finished zip file is copied
    #[arg(short, long, default_value = "/tmp/au-generator")]
    output_dir: PathBuf,

    /// Name of the zip file
    #[arg(short, long, default_value = "au-generator.zip")]
    zip_name: String,

    /// Keep the scratch directory after the run
    #[arg(short, long)]
    keep_temp: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
    debug!("Options are {cli:?}");

    if let Err(e) = run(&cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let temp = tempfile::Builder::new()
        .prefix("tmp")
        .suffix("au")
        .tempdir()
        .context("Failed to create scratch directory")?;
    debug!("Using tempdir = {}", temp.path().display());

    // Detach the scratch dir from its cleanup guard up front so a fatal
    // staging error still leaves it behind for inspection.
    let (scratch, _cleanup) = if cli.keep_temp {
        let kept = temp.keep();
        info!("Keeping temp files in {}", kept.display());
        (kept, None)
    } else {
        (temp.path().to_path_buf(), Some(temp))
    };

    let dest_files_root = scratch.join("au-generator");
    fs::create_dir_all(&dest_files_root)
        .with_context(|| format!("Failed to create {}", dest_files_root.display()))?;

    let runner = SystemRunner;
    stage_bundle(&runner, &default_bundle(), &dest_files_root)?;

    let zip_path = scratch.join(&cli.zip_name);
    let zipped = create_zip(&runner, &zip_path, &dest_files_root);
    let delivered = copy_to_destination(&cli.output_dir, &zip_path);

    let final_zip = cli.output_dir.join(&cli.zip_name);
    if !zipped || !delivered {
        bail!("Failed to produce {}", final_zip.display());
    }
    info!("Generated {}", final_zip.display());
    Ok(())
}
