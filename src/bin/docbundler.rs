use std::path::PathBuf;

use clap::Parser;

use docbundler::{AggregationDriver, BundleConfig, OutputFormat};

#[derive(Parser)]
#[command(
    name = "docbundler",
    about = "Combine crawled page records into bounded Markdown/JSON artifacts"
)]
struct Cli {
    /// Path to the bundle config JSON file
    #[arg(short, long)]
    config: PathBuf,

    /// Record store root to scan
    #[arg(long, default_value = "storage/datasets/default")]
    records_root: PathBuf,

    /// Override the configured output file name
    #[arg(long)]
    output: Option<String>,

    /// Override the output format (json | markdown | human_readable_markdown)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Override the per-artifact size ceiling, in megabytes
    #[arg(long)]
    max_file_size: Option<u64>,

    /// Override the per-artifact token ceiling
    #[arg(long)]
    max_tokens: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = BundleConfig::from_file(&cli.config)?;
    if let Some(output) = cli.output {
        config.output_file_name = output;
    }
    if let Some(format) = cli.format {
        config.output_file_format = format;
    }
    if let Some(max_file_size) = cli.max_file_size {
        config.max_file_size = Some(max_file_size);
    }
    if let Some(max_tokens) = cli.max_tokens {
        config.max_tokens = Some(max_tokens);
    }

    let driver = AggregationDriver::new(&config, &cli.records_root);
    let summary = driver.run()?;

    println!(
        "Wrote {} artifact(s), {} record(s):",
        summary.artifacts.len(),
        summary.records_written
    );
    for artifact in &summary.artifacts {
        println!(
            "  {} ({} records, blake3 {})",
            artifact.path.display(),
            artifact.records,
            artifact.digest
        );
    }

    if !summary.records_skipped.is_empty() {
        println!("Skipped {} record(s):", summary.records_skipped.len());
        for skipped in &summary.records_skipped {
            println!("  {}: {}", skipped.path.display(), skipped.reason);
        }
    }

    Ok(())
}
