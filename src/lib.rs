//! # mpdwire
//!
//! Client-side protocol engine for the line-oriented music daemon
//! control protocol:
//! - Line framing over any ordered byte stream
//! - Strict FIFO correlation of commands and replies, with pipelining
//! - Command lists (batched commands acknowledged item by item)
//! - Generic `key: value` response grammar decoded per command
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Client                                │
//! │              (command table → grammar)                       │
//! └──────────────┬──────────────────────────────▲───────────────┘
//!                │ encode + register            │ ReplyHandle
//! ┌──────────────▼──────────────┐   ┌───────────┴───────────────┐
//! │       Serialized Writer      │   │        Correlator          │
//! │      (one line at a time)    │   │     (FIFO of replies)      │
//! └──────────────┬──────────────┘   └───────────▲───────────────┘
//!                │                               │ terminator
//!                ▼                   ┌───────────┴───────────────┐
//!             server ──────────────▶ │  Line Framer → Session     │
//!                                    │  (reader thread)           │
//!                                    └───────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod session;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{MpdError, Result, ServerAck};
pub use config::ClientConfig;
pub use network::Client;
pub use protocol::{Command, FieldValue, Grammar, Object, Response};
pub use session::ReplyHandle;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of mpdwire
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
