use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sqam_rs::sqam::{SequenceQualityEngine, SqamConfig, TrackId, TracingSink};
use sqam_rs::utils::Rect;

/// Replays recorded tracker output through the sequence quality analysis
#[derive(Parser, Debug)]
#[command(name = "sqam-replay", about = "Sequence quality analysis over recorded tracks")]
struct Args {
    /// YAML file with tunables (flat or under `sqam_cfg`). Defaults are used if omitted
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// JSON lines file, one frame per line: {"boxes": [[cx, cy, w, h], ...], "track_ids": [...]}
    #[arg(long, value_name = "PATH")]
    detections: PathBuf,
    /// Scene height in pixels
    #[arg(long)]
    height: i32,
    /// Scene width in pixels
    #[arg(long)]
    width: i32,
    /// Where diagrams are put
    #[arg(long, default_value = "outputs/acquisition_system")]
    output: PathBuf,
}

#[derive(Debug, Deserialize)]
struct DetectionFrame {
    #[serde(default)]
    boxes: Vec<[f32; 4]>,
    #[serde(default)]
    track_ids: Vec<TrackId>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
    let args = Args::parse();
    run(args)
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => SqamConfig::from_file(path)
            .with_context(|| format!("can't load config from {}", path.display()))?,
        None => SqamConfig::default(),
    };
    info!(?config, "Config loaded");

    let mut sink = TracingSink::new();
    sink.reset_time();
    let mut engine: SequenceQualityEngine<usize> =
        SequenceQualityEngine::new(args.height, args.width, config)
            .context("error while creating the sequence quality engine")?
            .with_sink(Box::new(sink));
    info!("{}", engine);
    info!("Start Tracking!");

    let file = File::open(&args.detections)
        .with_context(|| format!("can't open detections {}", args.detections.display()))?;
    let mut frames = 0;
    let mut completed = 0;
    let mut excluded = 0;
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: DetectionFrame = match serde_json::from_str(&line) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(line = line_no + 1, "Skipping malformed frame: {}", err);
                continue;
            }
        };
        let boxes: Vec<Rect> = frame
            .boxes
            .iter()
            .map(|b| Rect::new(b[0], b[1], b[2], b[3]))
            .collect();
        let report = engine.process_new_frame(frames, &boxes, &frame.track_ids);
        completed += report.summary.valid_sequence_num;
        excluded += report.summary.exclusions_num;
        frames += 1;
    }

    info!(frames, completed, excluded, "Replay is done");
    engine.end(&args.output)?;
    Ok(())
}
