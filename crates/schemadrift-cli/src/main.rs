mod render;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use schemadrift_catalog::{survey, MetadataSource, PostgresSource, SurveyOptions};
use schemadrift_core::{Granularity, HostId, HostsFile, InventoryReport};
use schemadrift_engine::{compute_diff, HostSets, InventoryBuilder};

use render::{Format, RenderOptions};

const EXIT_HOSTS_FILE_MISSING: i32 = 1;
const EXIT_INVALID_HOSTS_FILE: i32 = 2;
const EXIT_BASELINE_UNAVAILABLE: i32 = 3;
const EXIT_DRIFT_FOUND: i32 = 4;

/// SchemaDrift - Compare schema inventories across database hosts
#[derive(Parser)]
#[command(name = "schemadrift")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the hosts file (TOML)
    hosts_file: PathBuf,

    /// Host label to compare against (default: hosts file `baseline`, then first host)
    #[arg(short, long)]
    baseline: Option<String>,

    /// Comparison level: schema, table or column
    #[arg(short, long)]
    granularity: Option<Granularity>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only show objects missing from at least one host
    #[arg(long)]
    drift_only: bool,

    /// Disable coloured output
    #[arg(long)]
    no_color: bool,

    /// Exit with status 4 when any drift is found
    #[arg(long)]
    fail_on_drift: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Why a run stopped before producing a report
#[derive(Debug)]
struct Failure {
    code: i32,
    message: String,
}

/// Load the hosts file and resolve the baseline label
fn load_hosts_file(path: &Path, baseline: Option<&str>) -> Result<(HostsFile, HostId), Failure> {
    if !path.exists() {
        return Err(Failure {
            code: EXIT_HOSTS_FILE_MISSING,
            message: format!("Hosts file not found: {}", path.display()),
        });
    }

    let invalid = |e: schemadrift_core::ConfigError| Failure {
        code: EXIT_INVALID_HOSTS_FILE,
        message: format!("Invalid hosts file {}: {}", path.display(), e),
    };

    let hosts_file = HostsFile::from_file(path).map_err(invalid)?;
    let baseline = hosts_file.baseline_id(baseline).map_err(invalid)?;

    Ok((hosts_file, baseline))
}

/// Survey every host and build the report
///
/// A host that fails is listed as unavailable and the run continues, unless
/// it is the baseline.
async fn build_report(
    source: Arc<dyn MetadataSource>,
    hosts_file: &HostsFile,
    baseline: &HostId,
    granularity: Granularity,
    verbose: bool,
) -> Result<InventoryReport, Failure> {
    let options = SurveyOptions {
        max_concurrency: hosts_file.max_concurrency,
        timeout: hosts_file.timeout_secs.map(Duration::from_secs),
    };
    let outcome = survey(source, &hosts_file.hosts, &options).await;

    if verbose {
        for fetched in &outcome.fetched {
            eprintln!("  {} {} ({} rows)", "✓".green(), fetched.host, fetched.rows.len());
        }
    }
    for failure in &outcome.failures {
        eprintln!("  {} {}: {}", "✗".red(), failure.host, failure.error);
    }

    if let Some(failure) = outcome.failure_for(baseline) {
        return Err(Failure {
            code: EXIT_BASELINE_UNAVAILABLE,
            message: format!("baseline host '{}' could not be surveyed: {}", baseline, failure.error),
        });
    }

    let builder = InventoryBuilder::new(granularity)
        .with_excluded_schemas(hosts_file.exclude_schemas.iter().cloned());
    let host_sets: HostSets = outcome
        .fetched
        .iter()
        .map(|fetched| (fetched.host.clone(), builder.build(&fetched.host, &fetched.rows)))
        .collect();

    let matrix = compute_diff(&host_sets, baseline).map_err(|e| Failure {
        code: EXIT_INVALID_HOSTS_FILE,
        message: format!("Failed to build presence matrix: {}", e),
    })?;

    Ok(InventoryReport::new(matrix, granularity, outcome.unavailable()))
}

/// Process status after the report has been emitted
fn exit_code(report: &InventoryReport, fail_on_drift: bool) -> i32 {
    if fail_on_drift && report.has_drift() {
        EXIT_DRIFT_FOUND
    } else {
        0
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "error" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    let (hosts_file, baseline) = match load_hosts_file(&cli.hosts_file, cli.baseline.as_deref()) {
        Ok(loaded) => loaded,
        Err(failure) => {
            eprintln!("{} {}", "Error:".red().bold(), failure.message);
            std::process::exit(failure.code);
        }
    };

    let granularity = cli.granularity.unwrap_or(hosts_file.granularity);

    if cli.verbose {
        eprintln!("{} {}", "Loaded hosts from:".cyan(), cli.hosts_file.display());
        eprintln!("{} {}", "Baseline:".cyan(), baseline);
        eprintln!("{} {}", "Granularity:".cyan(), granularity);
        eprintln!("{} {} hosts...", "Surveying".cyan(), hosts_file.hosts.len());
    }

    let source: Arc<dyn MetadataSource> = Arc::new(PostgresSource::new());
    let report = match build_report(source, &hosts_file, &baseline, granularity, cli.verbose).await {
        Ok(report) => report,
        Err(failure) => {
            eprintln!("{} {}", "Error:".red().bold(), failure.message);
            std::process::exit(failure.code);
        }
    };

    let render_options = RenderOptions {
        drift_only: cli.drift_only,
        color: !cli.no_color && cli.output.is_none(),
    };
    let rendered = render::render(&report, cli.format, &render_options)?;

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if cli.verbose {
                eprintln!("{} {}", "Report saved to:".green(), path.display());
            }
        }
        None => print!("{}", rendered),
    }

    if cli.verbose {
        eprintln!(
            "{} objects compared, {} drifted",
            report.summary.objects, report.summary.drifted
        );
    }

    let code = exit_code(&report, cli.fail_on_drift);
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
