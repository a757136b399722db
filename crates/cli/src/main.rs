mod session_file;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use roster_core::detection::domain::detection_provider::DetectionProvider;
use roster_core::pipeline::infrastructure::threaded_session_worker::{
    OutcomeResult, ThreadedSessionWorker,
};
use roster_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use roster_core::pipeline::process_frame_use_case::ProcessFrameUseCase;
use roster_core::shared::config::{AssignmentStrategy, EngineConfig};

use session_file::{ReplayStep, SessionFile};

/// Replays a recorded detection session and reports attendance.
#[derive(Parser)]
#[command(name = "roster")]
struct Cli {
    /// Session JSON file (gallery plus per-frame detections).
    input: PathBuf,

    /// Write the attendance report here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Engine config JSON (default: <config dir>/Roster/engine.json if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frames per attendance window.
    #[arg(long)]
    window_size: Option<usize>,

    /// Fraction of window frames an identity must appear in (0.0-1.0).
    #[arg(long)]
    presence_ratio: Option<f64>,

    /// Minimum cosine similarity for a known identity (-1.0-1.0).
    #[arg(long)]
    similarity_threshold: Option<f64>,

    /// Lower the similarity threshold for partially covered faces.
    #[arg(long)]
    reduced_occlusion: bool,

    /// Assignment strategy: greedy or optimal.
    #[arg(long)]
    strategy: Option<AssignmentStrategy>,

    /// IoU above which fused detections are treated as duplicates (0.0-1.0).
    #[arg(long)]
    iou_threshold: Option<f64>,

    /// Log progress every N frames.
    #[arg(long, default_value = "30")]
    log_every: usize,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    let plan = SessionFile::load(&cli.input)?.into_plan()?;
    log::info!(
        "Loaded {} identities, {} frames",
        plan.gallery.len(),
        plan.provider.indices().len()
    );

    let mut provider = plan.provider;
    let use_case = ProcessFrameUseCase::from_config(
        &config,
        plan.gallery,
        Box::new(StdoutPipelineLogger::new(cli.log_every)),
    )?;
    log::info!("Matching with the {} strategy", use_case.matcher_name());
    let worker = ThreadedSessionWorker::spawn(use_case);

    let mut failures = 0;
    for step in plan.steps {
        match step {
            ReplayStep::ReplaceGallery(gallery) => {
                log::info!("Switching gallery to {} identities", gallery.len());
                worker.replace_gallery(gallery)?;
            }
            ReplayStep::Frame { index, excluded } => {
                worker.submit_excluding(provider.detect(index)?, excluded)?;
            }
        }
        for outcome in worker.outcomes().try_iter() {
            failures += log_outcome(outcome);
        }
    }

    let (use_case, pending) = worker.shutdown()?;
    for outcome in pending {
        failures += log_outcome(outcome);
    }
    if failures > 0 {
        log::warn!("{failures} frames failed and were skipped");
    }

    let report = use_case.report();
    for verdict in &report.verdicts {
        log::info!(
            "{}: {} ({}/{} frames, ratio {:.2})",
            verdict.label,
            if verdict.present { "present" } else { "absent" },
            verdict.observed_frame_count,
            verdict.window_frame_count,
            verdict.presence_ratio()
        );
    }
    let json = serde_json::to_string_pretty(&report)?;
    match &cli.output {
        Some(path) => {
            fs::write(path, json)?;
            log::info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Logs one frame's identifications; returns 1 if the frame failed.
fn log_outcome(outcome: OutcomeResult) -> usize {
    match outcome {
        Ok(outcome) => {
            let labels: Vec<String> = outcome
                .faces
                .iter()
                .map(|f| format!("{} ({:.2})", f.result.label, f.result.score))
                .collect();
            log::info!("Frame {}: {}", outcome.index, labels.join(", "));
            if let Some(report) = outcome.report {
                log::debug!(
                    "Window at frame {}: present {:?}",
                    outcome.index,
                    report.present_labels()
                );
            }
            0
        }
        // Already logged by the worker.
        Err(_) => 1,
    }
}

fn build_config(cli: &Cli) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => {
                log::info!("Using config {}", path.display());
                EngineConfig::load(&path)?
            }
            None => EngineConfig::default(),
        },
    };

    if let Some(window_size) = cli.window_size {
        config.window_size = window_size;
    }
    if let Some(ratio) = cli.presence_ratio {
        config.presence_ratio = ratio;
    }
    if let Some(threshold) = cli.similarity_threshold {
        config.similarity_threshold = threshold;
    }
    if cli.reduced_occlusion {
        config.reduced_occlusion = true;
    }
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy;
    }
    if let Some(iou) = cli.iou_threshold {
        config.fusion_iou_threshold = iou;
    }

    config.validate()?;
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Roster").join("engine.json"))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Session file not found: {}", cli.input.display()).into());
    }
    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(format!("Config file not found: {}", path.display()).into());
        }
    }
    if let Some(parent) = cli.output.as_deref().and_then(Path::parent) {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(format!("Output directory not found: {}", parent.display()).into());
        }
    }
    if cli.log_every == 0 {
        return Err("--log-every must be at least 1".into());
    }
    Ok(())
}
