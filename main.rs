/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Replays a recorded simulator event log and prints the final statistics.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use bpaf::Bpaf;
use simview::render::{LogRenderSink, NullPresenter};
use simview::transport::{EventSource, JsonLinesSource, pump};
use simview::{EventDispatcher, GraphCoordinator, SimviewConfig, SimviewError};

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
/// Replay newline-delimited simulator events and report topology statistics.
struct Options {
    /// TOML configuration file
    #[bpaf(long, argument("PATH"))]
    config: Option<PathBuf>,

    /// Log filter directive, overrides the configured one
    #[bpaf(long("log-filter"), argument("FILTER"))]
    log_filter: Option<String>,

    /// Event log to replay; stdin when omitted
    #[bpaf(positional("EVENTS"))]
    events: Option<PathBuf>,
}

fn main() -> ExitCode {
    let options = options().run();

    let config = match options.config.as_deref() {
        Some(path) => match SimviewConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("simview: {e}");
                return ExitCode::FAILURE;
            },
        },
        None => SimviewConfig::default(),
    };

    init_logging(options.log_filter.as_deref().unwrap_or(&config.log_filter));

    match replay(&config, options.events) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("replay failed: {e}");
            eprintln!("simview: {e}");
            ExitCode::FAILURE
        },
    }
}

fn replay(config: &SimviewConfig, events: Option<PathBuf>) -> Result<(), SimviewError> {
    let coordinator = GraphCoordinator::with_collaborators(
        config,
        Box::new(LogRenderSink),
        Box::new(NullPresenter),
    );
    let mut dispatcher = EventDispatcher::new(coordinator, config);

    let mut source: Box<dyn EventSource> = match events {
        Some(path) => {
            let file = File::open(&path)
                .map_err(|e| SimviewError::Io(format!("{}: {e}", path.display())))?;
            Box::new(JsonLinesSource::new(BufReader::new(file)))
        },
        None => Box::new(JsonLinesSource::new(io::stdin().lock())),
    };

    let report = pump(&mut dispatcher, source.as_mut())?;
    log::info!(
        "replayed {} frames ({} discarded), final state {:?}",
        report.total(),
        report.discarded,
        dispatcher.state()
    );

    let stats = dispatcher.coordinator().stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
    {
        eprintln!("simview: logging unavailable: {e}");
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(_filter: &str) {}
