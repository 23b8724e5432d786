//! Discord IPC transport.
//!
//! Implements the local rich-presence protocol the desktop client exposes
//! over a Unix socket: a framed-JSON wire format (`wire`) and the transport
//! client itself (`ipc`).

pub mod ipc;
pub mod wire;

pub use ipc::{DiscordIpcTransport, DiscordTransportFactory};
