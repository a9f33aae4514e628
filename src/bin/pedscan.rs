//! pedscan command-line entry point.
//!
//! Wires a frame source, a detector backend and an output sink into a
//! [`Pipeline`] and runs it to completion. Ctrl-C requests a graceful stop
//! at the next frame boundary.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;

use pedscan::config::PipelineConfig;
use pedscan::detect::{BackendRegistry, HogBackend};
use pedscan::ingest::{create_source, SourceKind};
use pedscan::pipeline::Pipeline;
use pedscan::report::ReportGenerator;
use pedscan::sampler::FrameSampler;
use pedscan::sink::{AnnotatingSink, NullSink, Sink};
use pedscan::ui::Ui;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceArg {
    /// Image-sequence directory named by --input.
    File,
    /// Live V4L2 camera (requires the ingest-v4l2 feature).
    Camera,
    /// Deterministic generated frames.
    Synthetic,
}

#[derive(Parser, Debug)]
#[command(name = "pedscan", version, about = "Pedestrian detection reduction pipeline")]
struct Args {
    /// Where frames come from.
    #[arg(long, value_enum, default_value = "synthetic")]
    source: SourceArg,

    /// Image-sequence directory (required with --source file).
    #[arg(long)]
    input: Option<PathBuf>,

    /// Camera index (with --source camera).
    #[arg(long, default_value_t = 0)]
    camera_index: u32,

    /// Number of synthetic frames to generate (with --source synthetic).
    #[arg(long, default_value_t = 120)]
    frames: u64,

    /// Configuration file (TOML). PEDSCAN_CONFIG takes precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Detector backend tag; defaults to the configured one.
    #[arg(long)]
    backend: Option<String>,

    /// Override the configured confidence threshold.
    #[arg(long)]
    confidence_threshold: Option<f32>,

    /// Override the configured NMS overlap threshold.
    #[arg(long)]
    overlap_threshold: Option<f32>,

    /// Override the working-frame width.
    #[arg(long)]
    target_width: Option<u32>,

    /// Run the detector sweep twice at a finer stride.
    #[arg(long)]
    multi_pass: bool,

    /// Write annotated frames under the output directory.
    #[arg(long)]
    save_output: bool,

    /// Override the configured output directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Skip the JSON run report.
    #[arg(long)]
    no_report: bool,

    /// Progress display: auto, plain or pretty.
    #[arg(long)]
    ui: Option<String>,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(e) = run(Args::parse()) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = PipelineConfig::load(args.config.as_deref())?;
    if let Some(v) = args.confidence_threshold {
        config.detection.confidence_threshold = v;
    }
    if let Some(v) = args.overlap_threshold {
        config.detection.overlap_threshold = v;
    }
    if let Some(v) = args.target_width {
        config.target_width = v;
    }
    if args.multi_pass {
        config.detection.multi_pass = true;
    }
    if let Some(dir) = args.output_dir {
        config.output.output_dir = dir;
    }
    if args.save_output {
        config.output.save_annotated = true;
    }
    if args.no_report {
        config.output.enable_report = false;
    }
    config.validate()?;

    let kind = match args.source {
        SourceArg::File => {
            let path = args
                .input
                .context("--source file requires --input <dir>")?;
            SourceKind::File { path }
        }
        SourceArg::Camera => SourceKind::Camera {
            index: args.camera_index,
        },
        SourceArg::Synthetic => SourceKind::Synthetic {
            frames: args.frames,
        },
    };
    let source = create_source(kind)?;

    let mut registry = BackendRegistry::new();
    registry.register(HogBackend::new(config.hog_config()));
    let tag = args.backend.as_deref().unwrap_or(&config.detection.backend);
    let backend = registry.take(Some(tag))?;

    let sink: Box<dyn Sink> = if config.output.save_annotated {
        Box::new(AnnotatingSink::new(
            config.output.output_dir.join("annotated"),
            config.output.high_confidence_threshold,
        )?)
    } else {
        Box::new(NullSink)
    };

    let mut pipeline = Pipeline::new(source, backend, sink, &config)?;
    if config.output.enable_report {
        pipeline = pipeline.with_reporter(ReportGenerator::new(&config.output.output_dir)?);
    }
    if config.output.enable_sampling {
        pipeline = pipeline.with_sampler(FrameSampler::new(config.sampler_settings())?);
    }
    let ui = Ui::from_flag(args.ui.as_deref(), std::io::stderr().is_terminal());
    let progress = ui.progress(pipeline.total_frames());
    let mut pipeline = pipeline.with_progress(progress);

    let cancel = pipeline.cancel_flag();
    ctrlc::set_handler(move || {
        log::info!("interrupt received, finishing current frame");
        cancel.store(true, Ordering::SeqCst);
    })
    .context("failed to install interrupt handler")?;

    let summary = pipeline.run()?;
    log::info!(
        "done: {} frames, {} detections kept",
        summary.frames_processed,
        summary.detections_total
    );
    pipeline.write_report(config.summary())?;
    Ok(())
}
