// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod runtime;
pub mod session;
pub mod snapshot;
pub mod telemetry;
pub mod timer;

pub use error::{Error, Result};
pub use session::{Phase, SessionConfig, SessionController, SessionEvent, SessionView};
pub use snapshot::Snapshot;
