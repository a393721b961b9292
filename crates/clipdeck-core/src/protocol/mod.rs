//! The JSON wire protocol spoken between the host and companion clients.

pub mod codec;
pub mod messages;
