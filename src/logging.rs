//! Diagnostic logging setup shared by both binaries.
//!
//! Library code logs through the `log` facade. The binaries install a
//! `tracing-subscriber` formatter on stderr, which also receives `log`
//! records through its `tracing-log` bridge.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Environment variable overriding the verbosity flags.
pub const LOG_ENV: &str = "PROMPT_EXTRACT_LOG";

/// Filter directive for the verbosity flags.
///
/// # Examples
///
/// ```
/// use prompt_extract::logging::default_directive;
///
/// assert_eq!(default_directive(0, true), "warn");
/// assert_eq!(default_directive(0, false), "info");
/// assert_eq!(default_directive(2, false), "trace");
/// ```
#[must_use]
pub fn default_directive(verbosity: u8, quiet: bool) -> &'static str {
    match (quiet, verbosity) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

/// Install the stderr subscriber.
///
/// [`LOG_ENV`] wins over the flags when it holds a valid filter. Colours are
/// only emitted when stderr is a terminal.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(
    verbosity: u8,
    quiet: bool,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity, quiet)));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr),
        )
        .try_init()
}
