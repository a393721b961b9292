//! External collaborator seams: input replay, metric sampling, and media
//! session polling.
//!
//! Each collaborator is a trait so the application layer stays fully
//! unit-testable; the shipped implementations here are the defaults the
//! binary wires in.

pub mod input;
pub mod media;
pub mod system_monitor;

pub use input::{InputError, InputExecutor, LoggingInputExecutor};
pub use media::{MediaInfoProvider, NullMediaProvider, StubMediaProvider};
pub use system_monitor::{SysinfoMonitor, SystemMonitor};
