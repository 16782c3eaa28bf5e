use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use ring_visualiser_core::{AppConfig, RingChart, RingRenderer, Wedge};
use tracing_subscriber::EnvFilter;

fn main() -> ring_visualiser_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { count, walk } => run_demo(count, walk),
        Commands::Export { count, output } => run_export(count, &output),
    }
}

fn run_demo(count: Option<usize>, walk: Option<u64>) -> ring_visualiser_core::Result<()> {
    let config = AppConfig::default();
    let count = count.unwrap_or(config.chart.bulk_add_count);
    tracing::info!(count, "starting ring demo");

    let chart = RingChart::from_config(&config.chart);
    let renderer = RingRenderer::new();
    renderer.attach(&chart.handle())?;

    // The bulk-add gesture: many insertions, one notification.
    chart.batch(|model| {
        for _ in 0..count {
            model.add_wedge(Wedge::random());
        }
    })?;

    for (id, wedge) in chart.snapshot()?.iter_ordered() {
        tracing::info!(
            id = id.raw(),
            start = wedge.start(),
            end = wedge.end(),
            depth = wedge.depth,
            hue = wedge.hue,
            "wedge"
        );
    }

    if let Some(seconds) = walk {
        tracing::info!(seconds, "running random walk");
        chart.set_random_walk(true)?;
        std::thread::sleep(Duration::from_secs(seconds));
        chart.set_random_walk(false)?;
    }

    let frames = renderer.frames_built()?;
    tracing::info!(frames, "demo complete");
    Ok(())
}

fn run_export(count: Option<usize>, output: &PathBuf) -> ring_visualiser_core::Result<()> {
    let config = AppConfig::default();
    let count = count.unwrap_or(config.chart.bulk_add_count);
    tracing::info!(count, ?output, "exporting ring snapshot");

    let chart = RingChart::from_config(&config.chart);
    chart.batch(|model| {
        for _ in 0..count {
            model.add_wedge(Wedge::random());
        }
    })?;

    let json = chart.snapshot()?.to_json()?;
    std::fs::write(output, json)?;
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive ring chart playground", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a ring of random wedges and print the packed layout.
    Demo {
        /// Number of wedges to add in one batched gesture.
        #[arg(short, long)]
        count: Option<usize>,
        /// Keep the random walk running for this many seconds.
        #[arg(short, long)]
        walk: Option<u64>,
    },
    /// Build a ring and persist its snapshot as JSON.
    Export {
        /// Number of wedges to add before exporting.
        #[arg(short, long)]
        count: Option<usize>,
        /// Output path for the snapshot file.
        output: PathBuf,
    },
}
