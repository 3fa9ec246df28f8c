//! `tagpose` – replays recorded marker detections through the pose
//! smoothing engine.
//!
//! 1. Loads `~/.tagpose/config.toml` (or `--config PATH`), applying
//!    `TAGPOSE_*` environment overrides.
//! 2. Reads one JSON frame per line from `INPUT` (or stdin).
//! 3. Smooths every frame, gates markers on consecutive sightings and writes
//!    one `{"topic", "payload"}` line per published position to stdout.
//! 4. Stops after the current frame on Ctrl-C.
//!
//! `--init-config` writes the default configuration and exits.
//!
//! Logs go to stderr; stdout carries data only.

mod config;
mod replay;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tagpose_middleware::JsonLinesPublisher;
use tagpose_perception::PoseSmoothingEngine;
use tagpose_perception::clock::SystemClock;
use tracing::{error, info, warn};

const USAGE: &str = "usage: tagpose [--config PATH] [--debug] [--init-config] [INPUT]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    input: Option<PathBuf>,
    debug: bool,
    init_config: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--debug" => parsed.debug = true,
            "--init-config" => parsed.init_config = true,
            "-h" | "--help" => return Err(USAGE.to_string()),
            flag if flag.starts_with("--") => return Err(format!("unknown flag {flag}\n{USAGE}")),
            path => {
                if parsed.input.replace(PathBuf::from(path)).is_some() {
                    return Err(format!("more than one input given\n{USAGE}"));
                }
            }
        }
    }
    Ok(parsed)
}

fn init_logging() {
    // RUST_LOG controls the filter (default "info"); TAGPOSE_LOG_FORMAT=json
    // switches to newline-delimited JSON for log aggregators.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("TAGPOSE_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

fn main() -> ExitCode {
    init_logging();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::from(2);
        }
    };

    if args.init_config {
        let path = args.config.clone().unwrap_or_else(config::config_path);
        return match config::save_to(&config::Config::default(), &path) {
            Ok(()) => {
                info!(path = %path.display(), "default config written");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(error = %e, "cannot write config");
                ExitCode::FAILURE
            }
        };
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; replay will not stop gracefully");
    }

    let cfg = match config::load(args.config.as_deref()) {
        Ok(Some(cfg)) => cfg,
        Ok(None) => {
            info!("no config file found, using defaults");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            error!(error = %e, "config error");
            return ExitCode::from(2);
        }
    };
    info!(?cfg, "configuration loaded");

    let engine = match PoseSmoothingEngine::new(cfg.smoothing) {
        Ok(engine) => engine,
        Err(e) => {
            error!(error = %e, "cannot build smoothing engine");
            return ExitCode::from(2);
        }
    };

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                error!(path = %path.display(), error = %e, "cannot open input");
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(std::io::stdin().lock()),
    };

    let publisher = JsonLinesPublisher::new(std::io::stdout().lock());
    let mut pipeline = replay::Pipeline::new(
        engine,
        publisher,
        Box::new(SystemClock),
        cfg.min_ticks,
        cfg.topic_prefix,
    )
    .with_debug(args.debug);

    match pipeline.run(reader, &shutdown) {
        Ok(summary) => {
            info!(
                frames = summary.frames,
                published = summary.published,
                malformed = summary.malformed_lines,
                rejected = summary.rejected_samples,
                "replay finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "replay aborted");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, String> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_arguments_reads_stdin_with_default_config() {
        assert_eq!(args(&[]).unwrap(), Args::default());
    }

    #[test]
    fn parses_all_options() {
        let parsed =
            args(&["--debug", "--config", "/tmp/c.toml", "--init-config", "frames.jsonl"]).unwrap();
        assert!(parsed.debug);
        assert!(parsed.init_config);
        assert_eq!(parsed.config, Some(PathBuf::from("/tmp/c.toml")));
        assert_eq!(parsed.input, Some(PathBuf::from("frames.jsonl")));
    }

    #[test]
    fn rejects_bad_invocations() {
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--verbose"]).unwrap_err().contains("unknown flag"));
        assert!(args(&["a.jsonl", "b.jsonl"]).is_err());
        assert_eq!(args(&["--help"]).unwrap_err(), USAGE);
    }
}
