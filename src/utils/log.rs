#![allow(dead_code)]

use std::sync::OnceLock;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Verbosity requested on the command line: `-q/--quiet` suppresses
/// everything but the exit code, `-v/--verbose` narrates each slot probe
/// and the bitmask observation (per §7's user-visible behavior), the
/// default level reports warnings and errors only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::OFF,
            Verbosity::Normal => LevelFilter::WARN,
            Verbosity::Verbose => LevelFilter::DEBUG,
        }
    }
}

/// Installs a `tracing-subscriber` fmt layer writing to stderr, gated by
/// the requested verbosity. Stdout is reserved for the report (summary/
/// full/JSON output); nothing here writes to it. Safe to call more than
/// once; only the first call takes effect.
pub fn init_tracing(verbosity: Verbosity) {
    if LOGGER_INIT.get().is_some() {
        return;
    }

    let _ = tracing_subscriber::registry()
        .with(verbosity.level_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(false),
        )
        .try_init();

    let _ = LOGGER_INIT.set(());
}
