//! trackpipe: run a demo pipeline headless, driven by a control script.
//!
//! The control surface is an in-memory slider panel moved by the script,
//! the key input is the script's key presses, and every window's final
//! frame can be written out as PNG. Useful for:
//!
//! - Checking which windows a control move re-renders
//! - Reproducing a tuning session without a display
//! - Collecting engine statistics for a scripted session
//!
//! # Usage
//!
//! ```text
//! cargo run --bin trackpipe -- [OPTIONS] <COMMAND>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod error;
mod script;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trackpipe::headless::{ControlPanel, RecordingSurface, ScriptedInput};
use trackpipe::{
    Engine, EngineConfig, EngineStats, FailurePolicy, FanOut, Frontend, Pipeline, Stage,
    Surface, TerminationReason, TickOutcome, Window,
};
use trackpipe_ops::{Canny, Canvas, DrawLine, GaussianBlur, LoadImage};

use crate::error::CliError;
use crate::script::Script;

/// Headless runner for trackpipe demo pipelines.
#[derive(Parser)]
#[command(name = "trackpipe", version)]
struct Cli {
    #[command(subcommand)]
    demo: Demo,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Demo {
    /// Draw a red line on a blank 640x480 canvas (one implicit window).
    Line,
    /// Load an image and blur it, then blur the result again in a second
    /// window.
    Blur {
        /// Path to the input image (PNG, JPEG, BMP, WebP).
        image: PathBuf,
    },
    /// Blur an image in one window, then find Canny edges in a second.
    Edges {
        /// Path to the input image (PNG, JPEG, BMP, WebP).
        image: PathBuf,
    },
    /// Blur several images with one shared set of controls (the first
    /// image's window owns them).
    Parallel {
        /// Paths to the input images; the first is the master.
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// JSON file of scheduled control moves and key presses.
    #[arg(long, global = true)]
    script: Option<PathBuf>,

    /// Stop after this many ticks when the config sets no limit.
    #[arg(long, global = true, default_value_t = DEFAULT_TICKS, value_parser = clap::builder::RangedU64ValueParser::<u64>::new().range(1..))]
    ticks: u64,

    /// Directory to write every window's final frame into, as PNG.
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    /// Abort on the first failing transform instead of passing its input
    /// through.
    #[arg(long, global = true)]
    strict: bool,

    /// Print the run report as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Full engine config as a JSON string.
    ///
    /// When provided, `--strict` is ignored. `--ticks` still applies if
    /// the JSON sets no `max_ticks`.
    #[arg(long, global = true)]
    config_json: Option<String>,

    /// More log output (-v info, -vv debug, -vvv trace). `RUST_LOG`
    /// overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

const DEFAULT_TICKS: u64 = 60;

/// Build an [`EngineConfig`] from CLI arguments.
///
/// A headless run always gets a tick limit: the recording surface never
/// closes on its own.
fn config_from_cli(args: &RunArgs) -> Result<EngineConfig, CliError> {
    let mut config = match args.config_json {
        Some(ref json) => serde_json::from_str(json)?,
        None => EngineConfig {
            on_transform_error: if args.strict {
                FailurePolicy::Propagate
            } else {
                FailurePolicy::PassThrough
            },
            ..EngineConfig::default()
        },
    };
    config.max_ticks = config.max_ticks.or(Some(args.ticks));
    config.validate()?;
    Ok(config)
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_engine(demo: &Demo, config: EngineConfig) -> Result<Box<dyn Engine>, CliError> {
    let engine: Box<dyn Engine> = match demo {
        Demo::Line => Box::new(Pipeline::new(
            [
                Stage::new(Canvas::new(640, 480)).into(),
                Stage::new(DrawLine::new()).into(),
            ],
            None,
            config,
        )?),
        Demo::Blur { image } => {
            let windows = [
                Window::unnamed(vec![
                    Stage::new(LoadImage::open(image)?),
                    Stage::new(GaussianBlur),
                ])?,
                Window::unnamed(vec![Stage::new(GaussianBlur)])?,
            ];
            Box::new(Pipeline::new(windows.map(Into::into), None, config)?)
        }
        Demo::Edges { image } => {
            let windows = [
                Window::new(
                    "blurred",
                    vec![
                        Stage::new(LoadImage::open(image)?),
                        Stage::new(GaussianBlur),
                    ],
                )?,
                Window::new("edges", vec![Stage::new(Canny)])?,
            ];
            Box::new(Pipeline::new(windows.map(Into::into), None, config)?)
        }
        Demo::Parallel { images } => Box::new(FanOut::open(
            [Stage::new(GaussianBlur).into()],
            images,
            config,
        )?),
    };
    Ok(engine)
}

/// In-memory frontend the script drives.
#[derive(Default)]
struct Headless {
    controls: ControlPanel,
    surface: RecordingSurface,
    input: ScriptedInput,
}

/// Tick `engine` until it terminates, applying scripted events before
/// each tick.
fn drive(
    engine: &mut dyn Engine,
    script: &Script,
    headless: &mut Headless,
) -> Result<TerminationReason, CliError> {
    let mut tick = 0;
    loop {
        script.apply(tick, &mut headless.controls, &mut headless.input)?;
        let mut frontend = Frontend::new(
            &mut headless.controls,
            &mut headless.surface,
            &mut headless.input,
        );
        match engine.tick(&mut frontend) {
            Ok(TickOutcome::Terminated(reason)) => return Ok(reason),
            Ok(outcome) => tracing::trace!(tick, ?outcome),
            Err(err) => {
                headless.surface.close_all();
                return Err(err.into());
            }
        }
        tick += 1;
    }
}

/// Replace characters that do not belong in a file name.
fn file_stem_for(identity: &str) -> String {
    identity
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write each window's last frame to `dir` and return the paths written.
fn write_frames(surface: &RecordingSurface, dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    std::fs::create_dir_all(dir).map_err(|source| CliError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut written = Vec::new();
    for identity in surface.identities() {
        let Some(image) = surface.last_image(identity) else {
            continue;
        };
        if image.width() == 0 || image.height() == 0 {
            warn!(window = identity, "skipping empty frame");
            continue;
        }
        let path = dir.join(format!("{}.png", file_stem_for(identity)));
        image.save(&path).map_err(|source| CliError::WriteImage {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }
    Ok(written)
}

#[derive(Serialize)]
struct RunReport<'a> {
    reason: TerminationReason,
    stats: &'a EngineStats,
    windows: Vec<&'a str>,
    written: Vec<PathBuf>,
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = config_from_cli(&cli.run)?;
    let script = match cli.run.script {
        Some(ref path) => Script::load(path)?,
        None => Script::default(),
    };
    let mut engine = build_engine(&cli.demo, config)?;
    let mut headless = Headless::default();

    let reason = drive(engine.as_mut(), &script, &mut headless)?;
    info!(?reason, "run finished");

    let written = match cli.run.out {
        Some(ref dir) => write_frames(&headless.surface, dir)?,
        None => Vec::new(),
    };

    let report = RunReport {
        reason,
        stats: engine.stats(),
        windows: headless.surface.identities().collect(),
        written,
    };
    if cli.run.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("terminated: {:?}", report.reason);
        println!("windows:    {}", report.windows.join(", "));
        println!("{}", report.stats.report());
        for path in &report.written {
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.run.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("trackpipe").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_are_accepted_after_the_subcommand() {
        let cli = parse(&["line", "--ticks", "5", "--json", "-vv"]);
        assert!(matches!(cli.demo, Demo::Line));
        assert_eq!(cli.run.ticks, 5);
        assert!(cli.run.json);
        assert_eq!(cli.run.verbose, 2);
    }

    #[test]
    fn parallel_needs_at_least_one_image() {
        let result = Cli::try_parse_from(["trackpipe", "parallel"]);
        assert!(result.is_err());
    }

    #[test]
    fn zero_ticks_is_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["trackpipe", "line", "--ticks", "0"]).is_err());
    }

    #[test]
    fn ticks_fill_in_a_missing_limit() {
        let cli = parse(&["line", "--ticks", "7", "--strict"]);
        let config = config_from_cli(&cli.run).unwrap();
        assert_eq!(config.max_ticks, Some(7));
        assert_eq!(config.on_transform_error, FailurePolicy::Propagate);
    }

    #[test]
    fn config_json_limit_wins_over_ticks() {
        let cli = parse(&["line", "--config-json", r#"{"max_ticks": 3}"#, "--strict"]);
        let config = config_from_cli(&cli.run).unwrap();
        assert_eq!(config.max_ticks, Some(3));
        assert_eq!(config.on_transform_error, FailurePolicy::PassThrough);
    }

    #[test]
    fn invalid_config_json_is_reported() {
        let cli = parse(&["line", "--config-json", r#"{"cancel_key": 0}"#]);
        assert!(matches!(
            config_from_cli(&cli.run),
            Err(CliError::Engine(trackpipe::TrackpipeError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn file_stems_are_sanitized() {
        assert_eq!(file_stem_for("Step 1"), "Step_1");
        assert_eq!(file_stem_for("imgs/a.png"), "imgs_a.png");
    }

    #[test]
    fn scripted_line_run_redraws_on_the_scheduled_tick() {
        let config = EngineConfig {
            max_ticks: Some(4),
            ..EngineConfig::default()
        };
        let mut engine = build_engine(&Demo::Line, config).unwrap();
        let script = Script::from_json(
            r#"{"moves": [{"tick": 2, "window": "Step 1", "label": "theta", "position": 45}]}"#,
        )
        .unwrap();
        let mut headless = Headless::default();

        let reason = drive(engine.as_mut(), &script, &mut headless).unwrap();
        assert_eq!(reason, TerminationReason::TickLimit);
        let stats = engine.stats();
        assert_eq!(stats.ticks, 4);
        assert_eq!(stats.redraw_ticks, 1);
        assert_eq!(stats.idle_ticks, 3);
        assert_eq!(headless.surface.show_count("Step 1"), 2);
        assert!(headless.surface.is_released());
    }

    #[test]
    fn scripted_cancel_key_stops_the_run() {
        let mut engine = build_engine(&Demo::Line, EngineConfig::default()).unwrap();
        let script = Script::from_json(r#"{"keys": [{"tick": 3, "key": 27}]}"#).unwrap();
        let mut headless = Headless::default();

        let reason = drive(engine.as_mut(), &script, &mut headless).unwrap();
        assert_eq!(reason, TerminationReason::Cancelled);
        assert_eq!(engine.stats().ticks, 2);
    }

    #[test]
    fn frames_are_written_as_png() {
        let dir = std::env::temp_dir().join(format!("trackpipe-cli-{}", std::process::id()));
        let mut surface = RecordingSurface::new();
        surface.show("Step 1", &trackpipe::RgbaImage::new(2, 2));
        surface.show("empty", &trackpipe::RgbaImage::new(0, 0));

        let written = write_frames(&surface, &dir).unwrap();
        assert_eq!(written, [dir.join("Step_1.png")]);
        assert!(written[0].exists());
    }
}
