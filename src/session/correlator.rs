//! Command/response correlator
//!
//! FIFO of pending replies. The server answers commands on one connection
//! strictly in the order they were sent, so the oldest pending entry is
//! always the one a finished response belongs to.

use std::collections::VecDeque;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::error::{MpdError, Result};
use crate::protocol::{Grammar, Response};

/// Outcome delivered to a reply handle
pub type Reply = Result<Response>;

/// Which terminator ends a pending reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Ends with `OK`
    Plain,
    /// Command list item, ends with `list_OK`
    ListItem,
}

/// A sent command waiting for its reply
#[derive(Debug)]
pub struct Pending {
    command: String,
    grammar: Grammar,
    framing: Framing,
    tx: Sender<Reply>,
}

impl Pending {
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Resolve the handle; consumes the entry so it resolves once
    fn resolve(self, reply: Reply) {
        if self.tx.send(reply).is_err() {
            tracing::trace!("Reply for {} dropped, handle no longer held", self.command);
        }
    }
}

/// Caller side of a pending reply
///
/// Resolves exactly once. Dropping the handle is fine: the reply is
/// still consumed in order and then discarded.
#[derive(Debug)]
pub struct ReplyHandle {
    command: String,
    rx: Receiver<Reply>,
}

impl ReplyHandle {
    /// A handle that is already resolved
    pub fn resolved(command: impl Into<String>, reply: Reply) -> Self {
        let (tx, rx) = channel::bounded(1);
        // The receiver is alive and the slot empty, send cannot fail
        let _ = tx.send(reply);
        Self {
            command: command.into(),
            rx,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Block until the reply arrives
    pub fn wait(self) -> Result<Response> {
        match self.rx.recv() {
            Ok(reply) => reply,
            Err(_) => Err(self.abandoned()),
        }
    }

    /// Block for at most `timeout`
    ///
    /// `None` means the reply has not arrived yet; the handle stays valid
    /// and the reply will still be delivered to it later.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<Response>> {
        match self.rx.recv_timeout(timeout) {
            Ok(reply) => Some(reply),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(self.abandoned())),
        }
    }

    /// Take the reply if it has already arrived
    pub fn try_take(&self) -> Option<Result<Response>> {
        match self.rx.try_recv() {
            Ok(reply) => Some(reply),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(self.abandoned())),
        }
    }

    /// True once a reply is waiting to be taken
    pub fn is_ready(&self) -> bool {
        !self.rx.is_empty()
    }

    fn abandoned(&self) -> MpdError {
        MpdError::Connection(format!("No reply for {}: already taken or never sent", self.command))
    }
}

/// FIFO of pending replies for one connection
#[derive(Debug, Default)]
pub struct Correlator {
    pending: VecDeque<Pending>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a reply ended by the plain terminator
    pub fn submit(&mut self, command: &str, grammar: Grammar) -> ReplyHandle {
        self.submit_framed(command, grammar, Framing::Plain)
    }

    /// Enqueue a reply with an explicit terminator kind
    pub fn submit_framed(&mut self, command: &str, grammar: Grammar, framing: Framing) -> ReplyHandle {
        let (tx, rx) = channel::bounded(1);
        self.pending.push_back(Pending {
            command: command.to_string(),
            grammar,
            framing,
            tx,
        });
        ReplyHandle {
            command: command.to_string(),
            rx,
        }
    }

    /// Parse `lines` with the oldest entry's grammar and resolve it
    ///
    /// A parse failure goes to that entry's handle only. Errors returned
    /// here mean there was nothing pending.
    pub fn complete_oldest(&mut self, lines: Vec<String>) -> Result<()> {
        let pending = self.pop_oldest()?;
        let reply = pending.grammar.parse(lines);
        if let Err(ref e) = reply {
            tracing::warn!("Failed to decode reply to {}: {}", pending.command, e);
        }
        pending.resolve(reply);
        Ok(())
    }

    /// Resolve the oldest entry with a server error, without parsing
    pub fn fail_oldest(&mut self, text: &str) -> Result<()> {
        let pending = self.pop_oldest()?;
        pending.resolve(Err(MpdError::Command {
            text: text.to_string(),
        }));
        Ok(())
    }

    /// Resolve the oldest entry with an arbitrary error
    pub fn fail_oldest_with(&mut self, error: MpdError) -> Result<()> {
        self.pop_oldest()?.resolve(Err(error));
        Ok(())
    }

    /// Resolve every pending entry with a connection error
    ///
    /// Returns how many entries were resolved.
    pub fn fail_all(&mut self, reason: &str) -> usize {
        let count = self.pending.len();
        for pending in self.pending.drain(..) {
            pending.resolve(Err(MpdError::Connection(reason.to_string())));
        }
        count
    }

    pub fn oldest(&self) -> Option<&Pending> {
        self.pending.front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn pop_oldest(&mut self) -> Result<Pending> {
        self.pending
            .pop_front()
            .ok_or_else(|| MpdError::Protocol("Response received with no command pending".to_string()))
    }
}
