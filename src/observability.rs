//! Observability hooks for the bridge: one-shot logger installation and the
//! `log_metric!` macro used on the evaluation hot path.
//!
//! The macro is compiled out of release builds through `#[cfg(debug_assertions)]`,
//! so per-window metrics cost nothing in production.

use std::fs::OpenOptions;
use std::sync::Once;

use log::LevelFilter;

use crate::config::LoggingConfig;
use crate::error::{BridgeError, Result};

/// Logs a structured key-value metric line at debug level, only in debug builds.
///
/// # Example
/// ```
/// use catboost_bridge::log_metric;
/// let rows = 4;
/// log_metric!("event" = "window", "rows" = rows);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            $crate::__log::debug!("CATBOOST_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` backend according to `config`.
///
/// Only the first call has an effect; later calls (and calls made after another
/// logger was installed by the host application) are no-ops.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level: LevelFilter = config
        .level
        .parse()
        .map_err(|_| BridgeError::Config(format!("unknown log level '{}'", config.level)))?;

    // Open the file up front so a bad path surfaces as an error instead of a panic
    // inside the `Once`.
    let file = match &config.file {
        Some(path) => Some(OpenOptions::new().append(true).create(true).open(path)?),
        None => None,
    };

    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(level);

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}
