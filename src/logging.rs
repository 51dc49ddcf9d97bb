//! Structured logging setup.
//!
//! `RUST_LOG` takes precedence over the configured level, e.g.
//!
//! ```bash
//! RUST_LOG=servo_hand::calibration=debug servo-hand --simulate
//! ```

use tracing::warn;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::reload;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Registry;

/// Lets the level be changed once the config has been read.
pub struct LogLevel {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogLevel {
    /// Applies the configured level unless `RUST_LOG` already chose one.
    pub fn apply(&self, level: &str) {
        if self.from_env {
            return;
        }
        match EnvFilter::try_new(level) {
            Ok(filter) => {
                if let Err(e) = self.handle.reload(filter) {
                    warn!(error = %e, "failed to change log level");
                }
            }
            Err(e) => warn!(level, error = %e, "invalid log level in config, keeping current"),
        }
    }
}

/// Installs the global subscriber. Returns `None` if one was already set.
pub fn init(default_level: &str) -> Option<LogLevel> {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (
            EnvFilter::try_new(default_level).unwrap_or_else(|_| EnvFilter::new("info")),
            false,
        ),
    };
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()
        .ok()?;

    Some(LogLevel { handle, from_env })
}
