//! Client
//!
//! Typed entry point on top of [`Connection`]: every command goes through
//! the command table to pick its response grammar.

use std::io::{Read, Write};

use crate::config::ClientConfig;
use crate::error::{MpdError, Result};
use crate::protocol::{Command, Grammar, Object, ProtocolVersion, Response};
use crate::session::ReplyHandle;
use super::Connection;

/// Client for one server connection
///
/// Commands may be pipelined from several threads; replies are delivered
/// in the order the commands went out on the wire.
pub struct Client {
    connection: Connection,
}

impl Client {
    /// Connect over TCP, read the greeting and authenticate if configured
    pub fn connect(config: ClientConfig) -> Result<Self> {
        tracing::debug!("Connecting to {}", config.server_addr);
        let client = Self {
            connection: Connection::connect(&config)?,
        };
        client.authenticate(&config)?;
        Ok(client)
    }

    /// Run the client over an already established byte stream pair
    pub fn from_parts<R, W>(reader: R, writer: W, peer_addr: impl Into<String>) -> Result<Self>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        Ok(Self {
            connection: Connection::from_parts(reader, writer, peer_addr)?,
        })
    }

    fn authenticate(&self, config: &ClientConfig) -> Result<()> {
        if let Some(password) = &config.password {
            self.call(&Command::new("password").arg(password))?;
            tracing::debug!("Authenticated with {}", self.connection.peer_addr());
        }
        Ok(())
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Send a command from the command table
    ///
    /// The handle resolves with the reply decoded by the command's grammar.
    pub fn execute(&self, command: &Command) -> Result<ReplyHandle> {
        let spec = command
            .spec()
            .ok_or_else(|| MpdError::UnknownCommand(command.name().to_string()))?;
        self.connection.send(command, spec.grammar)
    }

    /// Send a command that is not in the table, decoding its reply with `grammar`
    pub fn execute_with(&self, command: &Command, grammar: Grammar) -> Result<ReplyHandle> {
        self.connection.send(command, Some(grammar))
    }

    /// Send a command and block until its reply arrives
    pub fn call(&self, command: &Command) -> Result<Response> {
        if self.connection.in_batch() {
            return Err(MpdError::CommandList(format!(
                "Cannot wait for {} inside a command list",
                command.name()
            )));
        }
        self.execute(command)?.wait()
    }

    // =========================================================================
    // Command Lists
    // =========================================================================

    /// Start a command list; replies to the following commands arrive
    /// after [`Client::command_list_end`]
    pub fn command_list_ok_begin(&self) -> Result<()> {
        self.connection.begin_batch()
    }

    /// Send the open command list for execution
    pub fn command_list_end(&self) -> Result<ReplyHandle> {
        self.connection.end_batch()
    }

    pub fn in_command_list(&self) -> bool {
        self.connection.in_batch()
    }

    // =========================================================================
    // Typed Shortcuts
    // =========================================================================

    pub fn ping(&self) -> Result<()> {
        self.call(&Command::new("ping"))?.into_nothing()
    }

    pub fn status(&self) -> Result<Object> {
        self.call(&Command::new("status"))?.into_object()
    }

    pub fn stats(&self) -> Result<Object> {
        self.call(&Command::new("stats"))?.into_object()
    }

    pub fn current_song(&self) -> Result<Object> {
        self.call(&Command::new("currentsong"))?.into_object()
    }

    pub fn playlist_info(&self) -> Result<Vec<Object>> {
        Ok(self.call(&Command::new("playlistinfo"))?.into_objects()?.collect())
    }

    pub fn outputs(&self) -> Result<Vec<Object>> {
        Ok(self.call(&Command::new("outputs"))?.into_objects()?.collect())
    }

    pub fn commands(&self) -> Result<Vec<String>> {
        self.call(&Command::new("commands"))?.into_list()
    }

    // =========================================================================
    // Connection State
    // =========================================================================

    /// Version announced in the greeting
    pub fn version(&self) -> Option<ProtocolVersion> {
        self.connection.version()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Commands sent and not yet answered
    pub fn pending(&self) -> usize {
        self.connection.pending()
    }

    /// Say goodbye to the server and tear the connection down
    pub fn close(&self) {
        if self.connection.is_connected() && !self.connection.in_batch() {
            if let Err(e) = self.connection.send(&Command::new("close"), None) {
                tracing::debug!("Failed to send close: {}", e);
            }
        }
        self.connection.shutdown();
    }
}
