//! Application Layer
//!
//! Contains the presence controller service that orchestrates the flow
//! between the presentation and domain layers.

pub mod presence_service;

pub use presence_service::{ClearOutcome, PresenceError, PresenceService, UpdateOutcome};
