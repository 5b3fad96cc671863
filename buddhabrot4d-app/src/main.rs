mod settings;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use clap::{Parser, ValueHint};
use tracing::{error, info, warn};

use buddhabrot4d_core::{Blend, BuddhabrotConfig, Density, VolumeTriple};
use buddhabrot4d_render::{export_png, Buddhabrot, ScanEvent, ScanState};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Height in pixels of the progress bar drawn on preview frames.
const PROGRESS_BAR_THICKNESS: u32 = 4;
const PROGRESS_BAR_COLOR: [u8; 4] = [255, 255, 255, 255];

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(author, version, about = "Render a 4D Buddhabrot projection to PNG")]
struct Cli {
    /// Settings file (JSON). Missing fields take their defaults.
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Write the effective settings to this file and continue
    #[arg(long, value_hint = ValueHint::FilePath)]
    save_config: Option<PathBuf>,

    /// Output image
    #[arg(short, long, default_value = "buddhabrot4d.png", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Rewrite this image on every refresh while the scan runs
    #[arg(long, value_hint = ValueHint::FilePath)]
    preview: Option<PathBuf>,

    /// Presentation refresh interval in milliseconds
    #[arg(long, default_value_t = 500)]
    refresh_ms: u64,

    /// Cancel the scan after this many seconds and export what was gathered
    #[arg(long)]
    time_limit: Option<f64>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Red channel escape threshold
    #[arg(long)]
    red: Option<u32>,

    /// Green channel escape threshold
    #[arg(long)]
    green: Option<u32>,

    /// Blue channel escape threshold
    #[arg(long)]
    blue: Option<u32>,

    /// Iteration cap used to classify the boundary mask
    #[arg(long)]
    boundary_cap: Option<u32>,

    /// Shortest escape that still contributes
    #[arg(long)]
    min_escape: Option<u32>,

    /// Samples per cell side
    #[arg(long, conflicts_with = "density")]
    oversampling: Option<u32>,

    /// Oversampling preset: low, standard or high
    #[arg(long, value_parser = parse_density)]
    density: Option<Density>,

    /// First projection volume, e.g. "zr,zi,cr"
    #[arg(long)]
    volume_a: Option<VolumeTriple>,

    /// Second projection volume, e.g. "cr,ci,zi"
    #[arg(long)]
    volume_b: Option<VolumeTriple>,

    /// Blend weight from volume A (0) to volume B (1), applied to every axis
    #[arg(long)]
    blend: Option<f64>,

    /// Rotation latitude in radians
    #[arg(long, allow_negative_numbers = true)]
    latitude: Option<f64>,

    /// Rotation longitude in radians
    #[arg(long, allow_negative_numbers = true)]
    longitude: Option<f64>,

    #[arg(long)]
    brightness: Option<f64>,

    /// Count at which a channel saturates
    #[arg(long)]
    color_cap: Option<u32>,

    /// Cooperative time slice in milliseconds
    #[arg(long)]
    yield_ms: Option<u64>,
}

fn parse_density(s: &str) -> Result<Density, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "low" => Ok(Density::Low),
        "standard" => Ok(Density::Standard),
        "high" => Ok(Density::High),
        other => Err(format!("unknown density {other:?} (expected low, standard or high)")),
    }
}

impl Cli {
    /// Settings file (if any) with command-line overrides applied on top.
    ///
    /// Without an explicit oversampling the `standard` density is used.
    fn resolve_config(&self) -> Result<BuddhabrotConfig, settings::SettingsError> {
        let mut cfg = match &self.config {
            Some(path) => settings::load(path)?,
            None => BuddhabrotConfig::default(),
        };

        if let Some(w) = self.width {
            cfg.width = w;
        }
        if let Some(h) = self.height {
            cfg.height = h;
        }
        if let Some(n) = self.red {
            cfg.thresholds.red = n;
        }
        if let Some(n) = self.green {
            cfg.thresholds.green = n;
        }
        if let Some(n) = self.blue {
            cfg.thresholds.blue = n;
        }
        if let Some(n) = self.boundary_cap {
            cfg.boundary_cap = n;
        }
        if let Some(n) = self.min_escape {
            cfg.min_escape = n;
        }
        if let Some(n) = self.oversampling {
            cfg.oversampling = Some(n);
        }
        let density = match (self.density, cfg.oversampling) {
            (Some(d), _) => Some(d),
            (None, None) => Some(Density::Standard),
            (None, Some(_)) => None,
        };
        if let Some(d) = density {
            cfg.oversampling = Some(d.oversampling(cfg.width, cfg.height));
        }
        if let Some(v) = self.volume_a {
            cfg.volume_a = v;
        }
        if let Some(v) = self.volume_b {
            cfg.volume_b = v;
        }
        if let Some(t) = self.blend {
            cfg.blend = Blend::uniform(t);
        }
        let latitude = self.latitude.unwrap_or(cfg.latitude);
        let longitude = self.longitude.unwrap_or(cfg.longitude);
        cfg.set_angles(latitude, longitude);
        if let Some(b) = self.brightness {
            cfg.brightness = b;
        }
        if let Some(n) = self.color_cap {
            cfg.color_cap = n;
        }
        if let Some(ms) = self.yield_ms {
            cfg.yield_interval_ms = ms;
        }
        Ok(cfg)
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

fn log_events(events: &mpsc::Receiver<ScanEvent>) {
    for event in events.try_iter() {
        info!(
            event = event.kind.name(),
            success = event.success,
            at_ms = event.timestamp.as_millis(),
            "Scan event"
        );
    }
}

fn run(cli: &Cli) -> AppResult<()> {
    let config = cli.resolve_config()?;
    if let Some(path) = &cli.save_config {
        if !settings::save(&config, path) {
            warn!("Continuing without saving settings");
        }
    }

    info!(
        width = config.width,
        height = config.height,
        oversampling = config.effective_oversampling(),
        volume_a = %config.volume_a,
        volume_b = %config.volume_b,
        "Configured"
    );

    let mut engine = Buddhabrot::new(config)?;
    let events = engine.subscribe();
    let refresh = Duration::from_millis(cli.refresh_ms.max(1));
    let deadline = cli
        .time_limit
        .filter(|s| s.is_finite() && *s > 0.0)
        .map(|s| Instant::now() + Duration::from_secs_f64(s));

    engine.initialize()?;
    let mut last_refresh = Instant::now();
    while engine.tick()? {
        if last_refresh.elapsed() >= refresh {
            present(&mut engine, cli)?;
            last_refresh = Instant::now();
        }
    }

    let (tx, rx) = mpsc::channel();
    engine.scan(move |success| {
        let _ = tx.send(success);
    })?;
    log_events(&events);

    while engine.tick()? {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            warn!("Time limit reached, canceling scan");
            engine.cancel()?;
            break;
        }
        if last_refresh.elapsed() >= refresh {
            present(&mut engine, cli)?;
            log_events(&events);
            last_refresh = Instant::now();
        }
    }
    log_events(&events);

    let success = rx.try_recv().unwrap_or(false);
    if engine.state() == ScanState::Canceled || !success {
        warn!("Scan did not run to completion; exporting partial result");
    }

    let config = engine.config().clone();
    export_png(engine.render(), &cli.output, &config)?;
    info!("Wrote {}", cli.output.display());
    Ok(())
}

/// One presentation refresh: log progress and, when requested, write the
/// current frame with a progress bar.
fn present(engine: &mut Buddhabrot, cli: &Cli) -> AppResult<()> {
    let progress = engine.progress();
    let state = engine.state();
    if progress >= 0.0 {
        info!(state = ?state, "Scan {:.1}%", progress * 100.0);
    } else {
        info!(state = ?state, "Working");
    }

    let Some(path) = &cli.preview else {
        return Ok(());
    };
    let config = engine.config().clone();
    let mut frame = engine.render().clone();
    frame.draw_progress_bar(progress, PROGRESS_BAR_THICKNESS, PROGRESS_BAR_COLOR);
    export_png(&frame, path, &config)?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!("Starting buddhabrot4d");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
