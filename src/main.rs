//! satscope - headless tracking host
//!
//! Loads a satellite record dump (or assembles one from element files),
//! ingests it on the live cadence and runs the frame loop against an
//! in-memory marker buffer.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use satscope::data::{load_catalog, load_records, DecodedRecords};
use satscope::ingest::Progress;
use satscope::propagation::Sgp4Propagator;
use satscope::renderer::{pointer_to_ndc, MarkerBuffer};
use satscope::selection::Viewport;
use satscope::{Tracker, TrackerConfig};

#[derive(Parser, Debug)]
#[command(name = "satscope", version, about = "Satellite tracking and coordinate pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest records and run the frame loop
    Run(RunArgs),
    /// Merge element files into a satellite-data JSON dump
    Merge(MergeArgs),
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Record dump (.json or .json.gz), or a source definitions file with --sources
    input: PathBuf,
    /// Treat the input as a source definitions file
    #[arg(long)]
    sources: bool,
    /// Tracker configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override records per ingestion batch
    #[arg(long)]
    batch_size: Option<usize>,
    /// Frames to run after ingestion completes
    #[arg(long, default_value_t = 120)]
    frames: u32,
    /// Simulated frame interval in milliseconds
    #[arg(long, default_value_t = 16)]
    frame_ms: i64,
    /// Start time (RFC 3339), defaults to now
    #[arg(long, value_parser = parse_time)]
    start: Option<DateTime<Utc>>,
    /// Only one popup at a time
    #[arg(long)]
    exclusive_popups: bool,
    /// Objects to list in the summary
    #[arg(long, default_value_t = 5)]
    sample: usize,
}

#[derive(Args, Debug, Clone)]
struct MergeArgs {
    /// Source definitions file
    sources: PathBuf,
    /// Output JSON file path
    #[arg(long, default_value = "out/satellite-data.json")]
    output: PathBuf,
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("invalid RFC 3339 time: {}", value))?
        .with_timezone(&Utc))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Run(args) => run(args),
        Command::Merge(args) => merge(args),
    }
}

fn load_input(path: &Path, sources: bool) -> Result<DecodedRecords> {
    if sources {
        load_catalog(path)
    } else {
        load_records(path)
    }
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    };
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    config.exclusive_popups |= args.exclusive_popups;
    config.validate()?;

    let decoded = load_input(&args.input, args.sources)?;
    if decoded.records.is_empty() {
        return Err(anyhow::anyhow!("no usable records in {:?}", args.input));
    }

    let mut tracker = Tracker::new(Sgp4Propagator::new(), config);
    let mut scene = MarkerBuffer::new();
    let viewport = Viewport::new(1600.0, 900.0);
    let frame_interval = Duration::milliseconds(args.frame_ms.max(1));

    let progress = ProgressBar::new(decoded.records.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{elapsed_precise} {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );
    let bar = progress.clone();
    tracker.set_progress_observer(move |p: &Progress| {
        bar.set_length(p.total as u64);
        bar.set_position((p.admitted + p.rejected) as u64);
        bar.set_message(format!("{} rejected", p.rejected));
    });

    let mut now = args.start.unwrap_or_else(Utc::now);
    log::info!("Tracking {} records from {}", decoded.records.len(), now);
    tracker.enqueue(decoded.records);

    // Ingestion and rendering share one loop, as they would in a live host
    let mut frames = 0u32;
    let mut last = None;
    while tracker.is_ingesting() || frames < args.frames {
        tracker.poll_ingestion(now, &mut scene);
        tracker.camera_mut().orbit(1.0, 0.0);
        last = Some(tracker.frame(now, &mut scene, viewport));

        if !tracker.is_ingesting() {
            frames += 1;
        }
        now += frame_interval;
    }
    progress.finish_and_clear();

    let progress = tracker.progress();
    log::info!(
        "Ingested {} of {} records ({} rejected)",
        progress.admitted,
        progress.total,
        progress.rejected
    );

    if let Some(report) = last {
        let sun = report.environment.sun_direction;
        log::info!(
            "Last frame at {}: {} updated, {} failed, sun ({:.3}, {:.3}, {:.3}), planet rotation {:.1}°",
            now - frame_interval,
            report.updated,
            report.failed,
            sun.x,
            sun.y,
            sun.z,
            report.environment.earth_rotation.to_degrees()
        );
    }

    for object in tracker.registry().iter().take(args.sample) {
        let elements = object.handle().elements();
        let age = object.handle().age_days(now);
        match object.last_known_position() {
            Some(p) => log::info!(
                "  {:<28} #{:<6} age {:>6.1} d  ({:.4}, {:.4}, {:.4}) r={:.4}",
                object.label(),
                elements.catalog_number,
                age,
                p.x,
                p.y,
                p.z,
                p.length()
            ),
            None => log::info!(
                "  {:<28} #{:<6} age {:>6.1} d  no position",
                object.label(),
                elements.catalog_number,
                age
            ),
        }
    }

    let center = pointer_to_ndc(
        viewport.width / 2.0,
        viewport.height / 2.0,
        viewport.width,
        viewport.height,
    );
    match tracker.click(center, viewport, &scene, now) {
        Some(id) => log::info!(
            "Object under the view center: {}",
            tracker.selection().popup(id).map(|p| p.label.as_str()).unwrap_or("?")
        ),
        None => log::info!("Nothing under the view center"),
    }

    log::info!(
        "{} markers visible, {} objects currently failing",
        scene.instances().len(),
        tracker.failing()
    );

    Ok(())
}

fn merge(args: MergeArgs) -> Result<()> {
    let decoded = load_catalog(&args.sources)?;

    if let Some(parent) = args.output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }

    let json = serde_json::to_string_pretty(&decoded.records)?;
    std::fs::write(&args.output, json)
        .with_context(|| format!("Failed to write {:?}", args.output))?;

    log::info!("Wrote {} records to {:?}", decoded.records.len(), args.output);
    Ok(())
}
