//! Tracing subscriber setup.
//!
//! Logs go to stderr so answers and JSON on stdout stay machine-readable.
//! `RUST_LOG` wins when set; otherwise `info`, or `debug` with `--verbose`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
