use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gaqet::prelude::*;

/// Genome Annotation Quality Evaluation Tools.
///
/// Needs a YAML configuration file to work; every other option overrides
/// the corresponding field of that file.
#[derive(Parser)]
#[command(name = "gaqet")]
#[command(about = "Evaluate genome annotation quality with a battery of external tools")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(short = 'i', long = "yaml", value_name = "FILE")]
    yaml: PathBuf,

    /// Override YAML species identifier
    #[arg(short, long)]
    species: Option<String>,

    /// Override YAML assembly path
    #[arg(short, long)]
    genome: Option<PathBuf>,

    /// Override YAML annotation path
    #[arg(short, long)]
    annotation: Option<PathBuf>,

    /// Override NCBI taxid for OMArk
    #[arg(short, long)]
    taxid: Option<String>,

    /// Override YAML output directory
    #[arg(short, long)]
    outbase: Option<PathBuf>,

    /// Run BUSCO on all proteins instead of the duplicate-filtered set
    #[arg(short = 'f', long)]
    disable_busco_filter: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "gaqet=debug" } else { "gaqet=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("GAQET has failed: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut raw = RawConfig::load(&cli.yaml)?;
    raw.apply_overrides(&CliOverrides {
        species: cli.species,
        genome: cli.genome,
        annotation: cli.annotation,
        taxid: cli.taxid,
        outbase: cli.outbase,
        disable_busco_filter: cli.disable_busco_filter,
    });

    let report = validate(&raw, default_basedir());
    println!("{}\n", report.text);
    let config = match report.config {
        Some(config) => config,
        None => anyhow::bail!("configuration is not valid, see the report above"),
    };

    let dependencies = check_dependencies(&config);
    println!("{}\n", dependencies.text);
    if !dependencies.ok {
        anyhow::bail!("some dependencies are missing. GAQET has stopped working");
    }

    let pipeline = Pipeline::new(config);
    let outcome = pipeline.run().await.map_err(|e| {
        anyhow::anyhow!(
            "{}; check {} for details",
            e,
            pipeline.config().basedir.join("GAQET.log.txt").display()
        )
    })?;

    println!(
        "\nReport written to {} ({} metrics)",
        outcome.report_path.display(),
        outcome.metrics.len()
    );
    Ok(())
}
