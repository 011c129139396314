use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::domain::XVError;

/// Logs go to a file, the terminal belongs to the table view.
/// `RUST_LOG` takes precedence over `level`.
pub fn init(log_file: &Path, level: &str) -> Result<(), XVError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| XVError::Validation(format!("Logging already initialised: {e}")))?;
    Ok(())
}
