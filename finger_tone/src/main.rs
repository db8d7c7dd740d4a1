//! finger_tone: interactive entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use finger_tone::app::run;
use finger_tone::config::{AppConfig, AudioKind, SourceKind};

#[derive(Debug, Parser)]
#[command(name = "finger_tone", version, about = "Count fingers, play tones, draw trails")]
struct Args {
    /// JSON config file; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay a JSON-lines landmark recording instead of simulated hands.
    #[arg(long)]
    replay: Option<PathBuf>,

    #[arg(long, value_enum)]
    audio: Option<AudioKind>,

    /// Draw the camera panel unmirrored.
    #[arg(long)]
    no_mirror: bool,

    #[arg(long)]
    fps: Option<u32>,

    /// Log filter, e.g. `debug` or `finger_count=trace`.  Overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,

    /// Skip the banner and start with defaults.
    #[arg(long)]
    quick: bool,
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(l) => EnvFilter::new(l),
        None    => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("finger_tone=info,finger_count=info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    let mut cfg = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None       => AppConfig::default(),
    };
    if let Some(path) = args.replay {
        cfg.source      = SourceKind::Replay;
        cfg.replay_path = Some(path);
    }
    if let Some(audio) = args.audio { cfg.audio = audio; }
    if let Some(fps)   = args.fps   { cfg.frame_rate = fps; }
    if args.no_mirror               { cfg.mirror = false; }

    if !args.quick {
        println!();
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║          Finger Tone — count fingers, hear the scale         ║");
        println!("╚══════════════════════════════════════════════════════════════╝");
        println!();
        match cfg.source {
            SourceKind::Sim    => println!("  Source: simulated hands (mouse + number keys)"),
            SourceKind::Replay => println!("  Source: recording {}",
                cfg.replay_path.as_deref().map(|p| p.display().to_string()).unwrap_or_default()),
        }
        println!("  Audio:  {:?}", cfg.audio);
        println!();
        println!("  Opening visualizer window…  SPACE starts detection, Q quits.");
        println!();
    }

    tracing::info!(source = ?cfg.source, audio = ?cfg.audio, fps = cfg.frame_rate, "starting");
    run(cfg).context("finger_tone exited with an error")
}
