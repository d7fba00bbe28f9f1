//! Error types for mpdwire
//!
//! Provides a unified error type for all client operations.

use thiserror::Error;

/// Result type alias using MpdError
pub type Result<T> = std::result::Result<T, MpdError>;

/// Unified error type for mpdwire operations
#[derive(Debug, Error)]
pub enum MpdError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    // -------------------------------------------------------------------------
    // Wire Grammar Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Server Errors
    // -------------------------------------------------------------------------
    /// The server answered with an `ACK` line; `text` is everything after the marker
    #[error("Command error: {text}")]
    Command { text: String },

    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Command list error: {0}")]
    CommandList(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

impl MpdError {
    /// True for errors that mean the connection is gone
    pub fn is_connection(&self) -> bool {
        matches!(self, MpdError::Io(_) | MpdError::Connection(_))
    }
}

/// Fields of a standard server error line
///
/// The server formats its error text as `[code@index] {command} message`.
/// The raw text stays on [`MpdError::Command`]; this is for callers that
/// want the pieces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAck {
    /// Numeric error code
    pub code: u32,

    /// Position of the failing command inside a command list (0 outside one)
    pub list_index: u32,

    /// Name of the command that failed (may be empty)
    pub command: String,

    /// Human readable message
    pub message: String,
}

impl ServerAck {
    /// Parse the text that followed the `ACK ` marker
    ///
    /// Returns None when the text does not follow the standard layout.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.strip_prefix('[')?;
        let (location, rest) = rest.split_once(']')?;
        let (code, list_index) = location.split_once('@')?;

        let rest = rest.trim_start().strip_prefix('{')?;
        let (command, message) = rest.split_once('}')?;

        Some(Self {
            code: code.parse().ok()?,
            list_index: list_index.parse().ok()?,
            command: command.to_string(),
            message: message.trim_start().to_string(),
        })
    }
}
