//! gestik - gesture-controlled game launcher driven by a keypoint stream.
//!
//! Reads one s-expression frame per line (from a file or stdin) and writes
//! gesture, action, state and key events to stdout.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use gestik::ipc::FrameServer;
use gestik::SessionConfig;

#[derive(Parser, Debug)]
#[command(name = "gestik", about = "Gesture control for keyboard-driven games")]
struct Cli {
    /// Frame stream to read, one s-expression per line (default: stdin)
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Frames a gesture stays suppressed after it fires
    #[arg(long, default_value_t = 10)]
    cooldown_frames: u32,

    /// Frames without a gesture before the announcement resets
    #[arg(long, default_value_t = 5)]
    idle_frames: u32,

    /// Seconds to hold the rock sign to quit
    #[arg(long, default_value_t = 2.0)]
    quit_hold: f64,

    /// Seconds to hold the peace sign to toggle menu and game
    #[arg(long, default_value_t = 1.2)]
    toggle_hold: f64,

    /// Seconds to hold palms together to leave the pose game
    #[arg(long, default_value_t = 3.0)]
    pose_menu_hold: f64,

    /// Longest gesture dropout (seconds) that keeps hold progress
    #[arg(long, default_value_t = 0.2)]
    tolerance: f64,

    /// Log every emitted event to stderr
    #[arg(long)]
    trace_events: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

impl Cli {
    fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::default();
        config.cooldown.window_frames = self.cooldown_frames;
        config.idle.threshold_frames = self.idle_frames;
        config.quit_hold.duration_s = self.quit_hold;
        config.toggle_hold.duration_s = self.toggle_hold;
        config.pose_menu_hold.duration_s = self.pose_menu_hold;
        for hold in [
            &mut config.quit_hold,
            &mut config.toggle_hold,
            &mut config.pose_menu_hold,
        ] {
            hold.tolerance_s = self.tolerance;
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("gestik {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Logs go to stderr; stdout carries the event stream.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gestik=info".into()),
        )
        .init();

    info!("gestik v{} starting", env!("CARGO_PKG_VERSION"));
    let config = cli.session_config();
    info!("config: {}", config.config_sexp());

    let stdout = io::stdout();
    let mut server = FrameServer::new(config, stdout.lock(), cli.trace_events);
    match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening frame stream {}", path.display()))?;
            server.run(BufReader::new(file))
        }
        None => server.run(io::stdin().lock()),
    }
}
