use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use stockflow_core::ProductId;
use stockflow_inventory::OutgoingOrder;
use stockflow_report::{
    ConfigError, ProductSnapshot, ReportConfig, build_report, load_snapshot, read_snapshot,
    report_single,
};

#[derive(Parser, Debug)]
#[command(name = "stockflow-report")]
#[command(author, version, about = "FIFO stock report from a product snapshot", long_about = None)]
struct Args {
    /// Snapshot JSON file (reads stdin when omitted or "-")
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Report a single product by id
    #[arg(short, long, value_name = "ID")]
    product: Option<i64>,

    /// Override the restock threshold
    #[arg(long, value_name = "QTY")]
    restock_threshold: Option<i64>,

    /// Process outgoing transactions by date instead of snapshot order
    #[arg(long)]
    chronological: bool,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

impl Args {
    /// Configuration from `lookup`, with command-line flags taking precedence.
    fn config<F>(&self, lookup: F) -> Result<ReportConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ReportConfig::from_lookup(lookup)?;
        if let Some(threshold) = self.restock_threshold {
            config.restock_threshold = threshold;
        }
        if self.chronological {
            config.outgoing_order = OutgoingOrder::Chronological;
        }
        Ok(config)
    }

    /// Snapshot file to read; `None` means stdin.
    fn input_path(&self) -> Option<&Path> {
        self.file
            .as_deref()
            .filter(|path| path.as_os_str() != "-")
    }
}

fn main() -> anyhow::Result<()> {
    stockflow_observability::init();
    let args = Args::parse();

    let config = args
        .config(|key| std::env::var(key).ok())
        .context("invalid configuration")?;
    tracing::debug!(?config, "report configuration");

    let snapshot = match args.input_path() {
        Some(path) => load_snapshot(path)
            .with_context(|| format!("failed to load snapshot from {}", path.display()))?,
        None => read_snapshot(io::stdin().lock()).context("failed to read snapshot from stdin")?,
    };
    tracing::info!("loaded {} product(s)", snapshot.data.len());

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_report(&args, &config, snapshot, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Write either the single-product report or the full report as JSON.
fn write_report<W: Write>(
    args: &Args,
    config: &ReportConfig,
    snapshot: ProductSnapshot,
    out: &mut W,
) -> anyhow::Result<()> {
    match args.product {
        Some(id) => {
            let report = report_single(snapshot, ProductId::new(id), config)
                .with_context(|| format!("cannot report product {id}"))?;
            write_json(out, &report, args.compact)
        }
        None => {
            let report = build_report(snapshot, config);
            if !report.skipped.is_empty() {
                tracing::warn!("{} product(s) skipped", report.skipped.len());
            }
            write_json(out, &report, args.compact)
        }
    }
}

fn write_json<W, T>(out: &mut W, value: &T, compact: bool) -> anyhow::Result<()>
where
    W: Write,
    T: serde::Serialize,
{
    if compact {
        serde_json::to_writer(&mut *out, value)?;
    } else {
        serde_json::to_writer_pretty(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}
