// SPDX-License-Identifier: MIT OR Apache-2.0
//! Kindle effect previewer.
//!
//! Plays a scene of effect sites headlessly and prints every sampled
//! frame as a JSON line on stdout. Logs go to stderr.
//!
//! ```text
//! kindle_preview [scene.ron]
//! ```
//!
//! Without a scene path the built-in demo scene is played.

mod config;
mod error;
mod runner;

use config::PreviewConfig;
use error::PreviewError;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("kindle_preview=info,kindle_trigger=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Kindle preview v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run() {
        tracing::error!("Preview failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), PreviewError> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => PreviewConfig::load(Path::new(&path))?,
        None => {
            tracing::info!("No scene given, playing the built-in demo");
            PreviewConfig::default()
        }
    };

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if config.realtime {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_time()
            .build()?;
        runtime.block_on(runner::run_realtime(&config, &mut out))?;
    } else {
        runner::run(&config, &mut out)?;
    }

    out.flush()?;
    Ok(())
}
