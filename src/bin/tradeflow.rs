//! tradeflow CLI - batch chart generation from a raw trade-flow CSV
//!
//! ## Example Usage
//!
//! ```bash
//! # Generate export charts for all three classification columns
//! tradeflow records.csv --out-dir plots --prefix JP
//!
//! # Both directions, keeping the normalized table
//! tradeflow records.csv --flows export,import --cleaned cleaned.csv
//! ```

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tradeflow::classify::{ClassificationTable, CountryNames};
use tradeflow::normalize::normalize;
use tradeflow::report::{run_flows, ReportOptions};
use tradeflow::source;
use tradeflow::types::FlowDirection;

/// Trade-flow aggregation and stacked-chart generation
#[derive(Parser)]
#[command(name = "tradeflow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Trade-flow aggregation and stacked-chart generation", long_about = None)]
struct Cli {
    /// Raw monthly records CSV (time_code, country, subcode, quantity,
    /// value[, flow, is_reexport])
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Directory for chart artifacts and the run manifest
    #[arg(short, long, default_value = "plots")]
    out_dir: PathBuf,

    /// Filename prefix for artifacts
    #[arg(short, long, default_value = "TF")]
    prefix: String,

    /// Classification columns to fan out over
    #[arg(long, value_delimiter = ',', default_values_t = [
        "subcode".to_string(), "group".to_string(), "class".to_string()
    ])]
    columns: Vec<String>,

    /// Flow directions to run (export, import)
    #[arg(long, value_delimiter = ',', default_values_t = ["export".to_string()])]
    flows: Vec<String>,

    /// Write the normalized table to this path
    #[arg(long)]
    cleaned: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let flows: Vec<FlowDirection> = cli
        .flows
        .iter()
        .map(|f| f.parse())
        .collect::<Result<_, _>>()
        .context("invalid --flows value")?;

    let raw = source::read_raw_csv(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    log::info!("loaded {} raw records", raw.len());

    let records = normalize(
        &raw,
        &ClassificationTable::default(),
        &CountryNames::default(),
    )
    .context("normalizing input records")?;

    if let Some(path) = &cli.cleaned {
        source::write_normalized_csv(path, &records)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Normalized table written to {}", path.display());
    }

    let options = ReportOptions {
        out_dir: cli.out_dir.clone(),
        prefix: cli.prefix,
        columns: cli.columns,
        flows,
    };
    let summary = run_flows(&records, &options);

    println!(
        "{} artifacts written to {}",
        summary.artifact_count,
        cli.out_dir.display()
    );

    if !summary.failed.is_empty() {
        for (flow, err) in &summary.failed {
            eprintln!("{} run failed: {}", flow, err);
        }
        process::exit(1);
    }

    Ok(())
}
