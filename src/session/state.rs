//! Protocol state machine
//!
//! Classifies every inbound line and drives the correlator. One session
//! exists per connection and is fed by a single sequential reader.

use std::mem;

use crate::error::{MpdError, Result};
use crate::protocol::{Grammar, ProtocolVersion, ERROR_PREFIX, HELLO_PREFIX, NEXT, SUCCESS};
use super::correlator::{Correlator, Framing, ReplyHandle};

/// Where the session is in the line grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, greeting not seen yet
    AwaitingGreeting,

    /// Between responses
    Idle,

    /// Collecting data lines of a plain response
    Buffering(Vec<String>),

    /// Inside a command list; holds the data lines of the current item
    InBatch(Vec<String>),
}

/// Line classification for one connection
#[derive(Debug)]
pub struct Session {
    version: Option<ProtocolVersion>,
    state: SessionState,
    correlator: Correlator,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            version: None,
            state: SessionState::AwaitingGreeting,
            correlator: Correlator::new(),
        }
    }

    /// Version from the greeting, once it has arrived
    pub fn version(&self) -> Option<&ProtocolVersion> {
        self.version.as_ref()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state != SessionState::AwaitingGreeting
    }

    /// Number of commands still waiting for a reply
    pub fn pending(&self) -> usize {
        self.correlator.len()
    }

    /// Register a sent command answered with the plain terminator
    pub fn submit(&mut self, command: &str, grammar: Grammar) -> ReplyHandle {
        self.correlator.submit(command, grammar)
    }

    /// Register a sent command with an explicit terminator kind
    pub fn submit_framed(&mut self, command: &str, grammar: Grammar, framing: Framing) -> ReplyHandle {
        self.correlator.submit_framed(command, grammar, framing)
    }

    /// Feed one inbound line (delimiter already stripped)
    ///
    /// Errors describe lines that break the grammar; the session stays
    /// usable after them.
    pub fn on_line(&mut self, line: String) -> Result<()> {
        if self.state == SessionState::AwaitingGreeting {
            return self.on_greeting(&line);
        }

        if line.starts_with(HELLO_PREFIX) {
            return Err(MpdError::Protocol(format!("Unexpected greeting: {:?}", line)));
        }

        self.enter_batch_if_due();

        if let Some(text) = line.strip_prefix(ERROR_PREFIX) {
            return self.on_error(text.trim());
        }

        match mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::InBatch(lines) => self.on_batch_line(line, lines),
            SessionState::Buffering(lines) => self.on_plain_line(line, lines),
            SessionState::Idle => self.on_plain_line(line, Vec::new()),
            SessionState::AwaitingGreeting => unreachable!("greeting handled above"),
        }
    }

    /// Drop all state and fail every pending reply with a connection error
    ///
    /// Returns how many replies were failed.
    pub fn disconnect(&mut self, reason: &str) -> usize {
        let failed = self.correlator.fail_all(reason);
        self.version = None;
        self.state = SessionState::AwaitingGreeting;
        failed
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    fn on_greeting(&mut self, line: &str) -> Result<()> {
        let version = line
            .strip_prefix(HELLO_PREFIX)
            .ok_or_else(|| MpdError::Protocol(format!("Expected greeting, got {:?}", line)))?;

        let version = ProtocolVersion::parse(version);
        tracing::debug!("Server protocol version {}", version);
        self.version = Some(version);
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Switch to `InBatch` once the oldest pending reply is a list item
    fn enter_batch_if_due(&mut self) {
        if self.state == SessionState::Idle
            && self.correlator.oldest().map(|p| p.framing()) == Some(Framing::ListItem)
        {
            self.state = SessionState::InBatch(Vec::new());
        }
    }

    fn on_plain_line(&mut self, line: String, mut lines: Vec<String>) -> Result<()> {
        if line == SUCCESS {
            // state is already Idle
            return self.correlator.complete_oldest(lines);
        }

        if line == NEXT {
            self.state = SessionState::Buffering(lines);
            return Err(MpdError::Protocol(format!("{} outside a command list", NEXT)));
        }

        lines.push(line);
        self.state = SessionState::Buffering(lines);
        Ok(())
    }

    fn on_batch_line(&mut self, line: String, mut lines: Vec<String>) -> Result<()> {
        if line == NEXT {
            self.state = SessionState::InBatch(Vec::new());
            return self.correlator.complete_oldest(lines);
        }

        if line == SUCCESS {
            // Items the server never acknowledged cannot be answered any more
            while let Some(pending) = self.correlator.oldest() {
                if pending.framing() != Framing::ListItem {
                    break;
                }
                let message = format!("Command list closed before {} was answered", pending.command());
                self.correlator.fail_oldest_with(MpdError::Protocol(message))?;
            }
            // Resolves the reply to command_list_end; state is Idle again
            return self.correlator.complete_oldest(lines);
        }

        lines.push(line);
        self.state = SessionState::InBatch(lines);
        Ok(())
    }

    /// An error line answers the oldest command
    ///
    /// Inside a command list the server stops executing the list, so every
    /// later item and the list itself fail with the same text.
    fn on_error(&mut self, text: &str) -> Result<()> {
        self.state = SessionState::Idle;

        let Some(oldest) = self.correlator.oldest() else {
            return Err(MpdError::Protocol(format!(
                "Error line with no command pending: {}",
                text
            )));
        };
        let list_item = oldest.framing() == Framing::ListItem;

        self.correlator.fail_oldest(text)?;

        if list_item {
            while let Some(pending) = self.correlator.oldest() {
                let item = pending.framing() == Framing::ListItem;
                self.correlator.fail_oldest(text)?;
                if !item {
                    // That was the command_list_end reply
                    break;
                }
            }
        }

        Ok(())
    }
}
