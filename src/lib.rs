//! # Presence Bridge
//!
//! This crate provides a local HTTP bridge that forwards playback status
//! events to Discord Rich Presence:
//! - A small HTTP API the browser extension POSTs playback events to
//! - A Discord IPC transport speaking the local rich-presence protocol
//! - A presence session state machine with reconnect and rate limiting
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Playback normalization, payloads, session state, transport seam
//! - **Application Layer**: The presence controller (update/clear state machines)
//! - **Infrastructure Layer**: Connection management and the Discord IPC client
//! - **Presentation Layer**: HTTP routes, handlers, and middleware
//!
//! ## Module Structure
//!
//! ```text
//! presence_bridge/
//! +-- config/        Configuration management
//! +-- domain/        Playback events, presence payloads, session state
//! +-- application/   Presence controller service
//! +-- infrastructure/ Connection manager, Discord IPC, metrics
//! +-- presentation/  HTTP routes and handlers
//! +-- shared/        Common utilities (errors)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
