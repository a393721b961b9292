//! Input replay seam.
//!
//! The host never synthesizes keystrokes itself; it hands command strings
//! (`"ctrl+c"`, `"play_pause"`, …) to an [`InputExecutor`] supplied by the
//! embedder.  Which commands a *client* may trigger is decided earlier, in
//! the dispatch layer's allow-list; by the time a command reaches the
//! executor it has already been authorized.

use thiserror::Error;
use tracing::debug;

/// Error type for input replay.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("input replay failed: {0}")]
    Replay(String),
}

/// Replays a named input command on the host.
pub trait InputExecutor: Send + Sync {
    /// Executes one command string, e.g. `"ctrl+v"` or `"next_track"`.
    fn execute(&self, command: &str) -> Result<(), InputError>;
}

/// Default executor for headless wiring: logs the command and succeeds.
///
/// Embedders with a real input stack (media keys, synthetic keystrokes)
/// substitute their own implementation at context construction.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingInputExecutor;

impl InputExecutor for LoggingInputExecutor {
    fn execute(&self, command: &str) -> Result<(), InputError> {
        debug!("input command replayed: {command}");
        Ok(())
    }
}
