//! Log subscriber initialisation for the CLI.
//!
//! Library code logs through the `log` facade. The subscriber installed here
//! also captures those records and writes everything to standard error.
//! `RUST_LOG` directives take precedence over the command-line level.

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Map the `-v`/`-q` flags to a level filter.
///
/// # Examples
///
/// ```
/// use modpack_publisher::logging::level_for;
/// use tracing_subscriber::filter::LevelFilter;
///
/// assert_eq!(level_for(0, false), LevelFilter::WARN);
/// assert_eq!(level_for(2, false), LevelFilter::DEBUG);
/// assert_eq!(level_for(0, true), LevelFilter::ERROR);
/// ```
#[must_use]
pub fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber.
///
/// Calling this more than once keeps the first subscriber.
pub fn init(verbosity: u8, quiet: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_for(verbosity, quiet).into())
        .from_env_lossy();
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    if tracing_subscriber::registry().with(layer).try_init().is_err() {
        log::debug!("log subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, false, LevelFilter::WARN)]
    #[case(1, false, LevelFilter::INFO)]
    #[case(2, false, LevelFilter::DEBUG)]
    #[case(3, false, LevelFilter::TRACE)]
    #[case(9, false, LevelFilter::TRACE)]
    #[case(0, true, LevelFilter::ERROR)]
    fn flags_map_to_levels(#[case] verbosity: u8, #[case] quiet: bool, #[case] expected: LevelFilter) {
        assert_eq!(level_for(verbosity, quiet), expected);
    }

    #[test]
    fn repeated_initialisation_is_harmless() {
        init(0, false);
        init(2, false);
    }
}
