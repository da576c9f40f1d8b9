//! gesture_media — command-line entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use gesture_media::{open_sink, run, App, AppConfig, ControlMode, LandmarkSource, ReplaySource};

#[derive(Parser, Debug)]
#[command(name = "gesture_media", version, about = "Control media playback with hand gestures")]
struct Cli {
    /// JSON config file; missing fields take defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Key layout to press: youtube or system
    #[arg(long, value_enum)]
    mode: Option<ControlMode>,

    /// JSON-lines landmark recording to replay ("-" reads stdin)
    #[arg(long, default_value = "-")]
    replay: PathBuf,

    /// Mirror replayed frames horizontally for a capture this many pixels wide
    #[arg(long, value_name = "WIDTH")]
    mirror: Option<u32>,

    /// Replay frames at their recorded timestamps instead of as fast as possible
    #[arg(long)]
    realtime: bool,

    /// Read hands from a LeapMotion controller instead of a recording
    #[cfg(feature = "leap")]
    #[arg(long)]
    leap: bool,

    /// Log actions instead of pressing keys
    #[arg(long)]
    dry_run: bool,

    /// Ignore the seek gesture
    #[arg(long)]
    no_seek: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn app_config(&self) -> anyhow::Result<AppConfig> {
        let mut cfg = match &self.config {
            Some(path) => AppConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => AppConfig::default(),
        };
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if self.no_seek {
            cfg.controller.enable_seek = false;
        }
        Ok(cfg)
    }

    fn replay_source(&self) -> anyhow::Result<Box<dyn LandmarkSource>> {
        let mut replay = ReplaySource::open(&self.replay)
            .with_context(|| format!("opening {}", self.replay.display()))?
            .realtime(self.realtime);
        if let Some(width) = self.mirror {
            replay = replay.mirrored(width);
        }
        Ok(Box::new(replay))
    }
}

/// LeapMotion hands projected onto the configured frame, 640×480 if unset.
#[cfg(feature = "leap")]
fn leap_source(cfg: &AppConfig) -> Box<dyn LandmarkSource> {
    let (width, height) = cfg.classifier.frame.unwrap_or((640, 480));
    Box::new(gesture_media::source::LeapSource { width, height })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gesture_media=info".into()),
        )
        .init();

    let cfg = cli.app_config()?;
    if cli.print_config {
        println!("{}", cfg.to_json()?);
        return Ok(());
    }

    info!(
        "gesture_media v{} starting (mode: {}, seek: {})",
        env!("CARGO_PKG_VERSION"),
        cfg.mode.as_str(),
        if cfg.controller.enable_seek { "on" } else { "off" },
    );

    #[cfg(feature = "leap")]
    let source = if cli.leap { leap_source(&cfg) } else { cli.replay_source()? };
    #[cfg(not(feature = "leap"))]
    let source = cli.replay_source()?;

    let sink = open_sink(cfg.mode, cli.dry_run);
    let mut app = App::new(&cfg, sink);
    run(&mut app, source)?;
    Ok(())
}
