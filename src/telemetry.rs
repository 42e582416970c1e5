//! Logging setup.
//!
//! The terminal belongs to the UI, so log lines go to a file instead.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::Result;

/// Initialize the global subscriber, appending to `log_path`.
///
/// Filtering follows `RUST_LOG`, defaulting to `info`.
pub fn init_tracing(log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,timefighter=info"));

    let fmt_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    // a subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();

    tracing::info!(path = %log_path.display(), "Tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_log_file_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("timefighter.log");
        init_tracing(&path).unwrap();
        assert!(path.exists());
    }
}
