//! `rscan` binary: read the package CSV, run the pool, log a summary.

use std::path::{Path, PathBuf};

use clap::Parser;
use rscan_agent::{run_pool, AgentConfig, PackageParser, PoolError, ReportSink, SinkError};

#[derive(Parser, Debug)]
#[command(name = "rscan", version, about = "Static analyzer for R package sources")]
struct Args {
    /// CSV file with `Package` and `SourceURL` columns
    #[arg(long, default_value = "packages.csv")]
    packages: PathBuf,

    /// JSON-lines output file; reruns append and skip completed packages
    #[arg(long, default_value = "reports.jsonl")]
    output: PathBuf,

    /// Parallel workers, one R interpreter each
    #[arg(long, default_value_t = num_cpus::get())]
    procs: usize,

    /// R interpreter binary
    #[arg(long, default_value = "Rscript")]
    interpreter: String,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("could not read package CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("package CSV is missing the required '{column}' column")]
    MissingColumn { column: &'static str },

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

fn read_package_urls(path: &Path) -> Result<Vec<String>, CliError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let url_column = headers
        .iter()
        .position(|h| h == "SourceURL")
        .ok_or(CliError::MissingColumn { column: "SourceURL" })?;
    if !headers.iter().any(|h| h == "Package") {
        return Err(CliError::MissingColumn { column: "Package" });
    }

    let mut urls = Vec::new();
    for record in reader.records() {
        let record = record?;
        urls.push(record.get(url_column).unwrap_or_default().to_string());
    }
    Ok(urls)
}

fn run(args: &Args) -> Result<(), CliError> {
    let urls = read_package_urls(&args.packages)?;
    let (sink, completed) = ReportSink::open(&args.output)?;
    log::info!(
        "extracting {} packages with {} workers ({} already done)",
        urls.len(),
        args.procs,
        completed.len()
    );

    let config = AgentConfig::with_interpreter(&args.interpreter);
    let summary = run_pool(&urls, &completed, &sink, args.procs, || {
        PackageParser::new(config.clone())
    })?;

    log::info!(
        "done: processed {}, skipped {}, interpreter [{}]",
        summary.processed,
        summary.skipped,
        summary.stats
    );
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(err) = run(&args) {
        log::error!("{err}");
        std::process::exit(1);
    }
}
