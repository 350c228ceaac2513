//! Tracing subscriber setup
//!
//! Shared by the `phpx-grammar` binary and the tests.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Logs go to `log_file` when given (truncated on start), otherwise to
/// stderr. `RUST_LOG` overrides `default_level`.
pub fn init_global(log_file: Option<&Path>, default_level: LevelFilter) -> std::io::Result<()> {
    let writer = match log_file {
        Some(path) => BoxMakeWriter::new(Arc::new(File::create(path)?)),
        None => BoxMakeWriter::new(std::io::stderr),
    };

    build_subscriber(writer, default_level).init();
    Ok(())
}

/// Build the subscriber used by [`init_global`].
pub fn build_subscriber(
    writer: BoxMakeWriter,
    default_level: LevelFilter,
) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer().with_writer(writer).with_ansi(false);

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}
