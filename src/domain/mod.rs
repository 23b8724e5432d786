//! # Domain Layer
//!
//! The domain layer contains the core business logic of the presence bridge.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **playback**: Inbound playback events and their normalization rules
//! - **presence**: Outbound presence payloads
//! - **session**: Presence session state and update admission control
//! - **transport**: The presence transport seam and its error taxonomy
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Pure business logic and domain rules
//! - The transport trait defines the IPC contract without naming a protocol

pub mod playback;
pub mod presence;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use playback::{PlaybackEvent, PlaybackStatus};
pub use presence::{ActivityButton, PresencePayload};
pub use session::{Admission, SessionState, UpdateTicket};
pub use transport::{PresenceTransport, TransportError, TransportFactory};
