//! Connection
//!
//! Owns the transport for one server connection: a buffered, serialized
//! write path and a dedicated reader thread that feeds every inbound
//! line, in arrival order, to the session state machine.

use std::io::{BufWriter, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::config::ClientConfig;
use crate::error::{MpdError, Result};
use crate::protocol::{
    encode_command, write_command, Command, Grammar, LineReader, ProtocolVersion, Response,
    COMMAND_LIST_END, COMMAND_LIST_OK_BEGIN,
};
use crate::session::{Framing, ReplyHandle, Session};

const NO_ARGS: &[&str] = &[];

/// State shared with the reader thread
struct Shared {
    session: Mutex<Session>,

    /// Only changed while `session` is locked
    connected: AtomicBool,
}

impl Shared {
    /// Mark the connection dead and fail everything still pending
    fn close(&self, reason: &str) -> usize {
        let mut session = self.session.lock();
        self.connected.store(false, Ordering::Release);
        session.disconnect(reason)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

/// Write side; the lock spans registering a reply and writing its line
/// so the pending queue always matches wire order
struct Outbound {
    writer: BufWriter<Box<dyn Write + Send>>,
    batch_open: bool,
}

/// A live connection to one server
pub struct Connection {
    outbound: Mutex<Outbound>,
    shared: Arc<Shared>,
    reader: Option<JoinHandle<()>>,

    /// Kept for TCP connections so shutdown can unblock the reader
    socket: Option<TcpStream>,

    peer_addr: String,
}

impl Connection {
    /// Open a TCP connection and complete the greeting
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let stream = open_stream(config)?;

        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| config.server_addr.clone());

        stream.set_nodelay(config.nodelay)?;
        stream.set_read_timeout(config.read_timeout())?;
        stream.set_write_timeout(config.write_timeout())?;

        // Separate handles for the reader thread and the write path
        let read_stream = stream.try_clone()?;
        let write_stream = stream.try_clone()?;

        let mut connection = Self::establish(read_stream, write_stream, peer_addr)?;
        connection.socket = Some(stream);
        Ok(connection)
    }

    /// Run the protocol over an arbitrary byte stream pair
    ///
    /// Blocks until the greeting has been read from `reader`.
    pub fn from_parts<R, W>(reader: R, writer: W, peer_addr: impl Into<String>) -> Result<Self>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        Self::establish(reader, writer, peer_addr.into())
    }

    fn establish<R, W>(reader: R, writer: W, peer_addr: String) -> Result<Self>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let mut lines = LineReader::new(reader);
        let mut session = Session::new();

        let greeting = lines.next_line()?.ok_or_else(|| {
            MpdError::Connection(format!("{} closed the connection before the greeting", peer_addr))
        })?;
        session.on_line(greeting)?;

        tracing::debug!(
            "Connected to {} (protocol {})",
            peer_addr,
            session.version().map(|v| v.as_str()).unwrap_or("unknown")
        );

        let shared = Arc::new(Shared {
            session: Mutex::new(session),
            connected: AtomicBool::new(true),
        });

        let reader_shared = Arc::clone(&shared);
        let reader_peer = peer_addr.clone();
        let reader = thread::Builder::new()
            .name("mpdwire-reader".to_string())
            .spawn(move || read_loop(lines, reader_shared, reader_peer))?;

        let writer: Box<dyn Write + Send> = Box::new(writer);

        Ok(Self {
            outbound: Mutex::new(Outbound {
                writer: BufWriter::new(writer),
                batch_open: false,
            }),
            shared,
            reader: Some(reader),
            socket: None,
            peer_addr,
        })
    }

    // =========================================================================
    // Sending
    // =========================================================================

    /// Send one command
    ///
    /// With a grammar the reply is registered and decoded with it. Without
    /// one the server sends no reply, so the handle resolves right away
    /// to [`Response::Nothing`].
    pub fn send(&self, command: &Command, grammar: Option<Grammar>) -> Result<ReplyHandle> {
        let mut outbound = self.outbound.lock();

        let framing = if outbound.batch_open {
            Framing::ListItem
        } else {
            Framing::Plain
        };

        let handle = match grammar {
            Some(grammar) => self.register(command.name(), grammar, framing)?,
            None if outbound.batch_open => {
                return Err(MpdError::CommandList(format!(
                    "{} not allowed in command list",
                    command.name()
                )));
            }
            None => {
                self.ensure_connected()?;
                ReplyHandle::resolved(command.name(), Ok(Response::Nothing))
            }
        };

        self.write_line(&mut outbound, command.name(), command.arguments())?;
        Ok(handle)
    }

    /// Open a command list whose items are acknowledged one by one
    pub fn begin_batch(&self) -> Result<()> {
        let mut outbound = self.outbound.lock();
        if outbound.batch_open {
            return Err(MpdError::CommandList("Already in command list".to_string()));
        }

        self.ensure_connected()?;
        self.write_line(&mut outbound, COMMAND_LIST_OK_BEGIN, NO_ARGS)?;
        outbound.batch_open = true;
        Ok(())
    }

    /// Close the open command list
    ///
    /// The returned handle resolves when the server has answered the whole
    /// list.
    pub fn end_batch(&self) -> Result<ReplyHandle> {
        let mut outbound = self.outbound.lock();
        if !outbound.batch_open {
            return Err(MpdError::CommandList("Not in command list".to_string()));
        }

        outbound.batch_open = false;
        let handle = self.register(COMMAND_LIST_END, Grammar::Nothing, Framing::Plain)?;
        self.write_line(&mut outbound, COMMAND_LIST_END, NO_ARGS)?;
        Ok(handle)
    }

    pub fn in_batch(&self) -> bool {
        self.outbound.lock().batch_open
    }

    fn register(&self, name: &str, grammar: Grammar, framing: Framing) -> Result<ReplyHandle> {
        let mut session = self.shared.session.lock();
        if !self.shared.is_connected() {
            return Err(self.not_connected());
        }
        Ok(session.submit_framed(name, grammar, framing))
    }

    fn write_line<S: AsRef<str>>(&self, outbound: &mut Outbound, name: &str, args: &[S]) -> Result<()> {
        tracing::trace!("Sending to {}: {}", self.peer_addr, encode_command(name, args));

        if let Err(e) = write_command(&mut outbound.writer, name, args) {
            tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
            outbound.batch_open = false;
            let failed = self.shared.close(&format!("write to {} failed: {}", self.peer_addr, e));
            tracing::debug!("{} pending replies failed after write error", failed);
            return Err(e);
        }
        Ok(())
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.shared.is_connected() {
            Ok(())
        } else {
            Err(self.not_connected())
        }
    }

    fn not_connected(&self) -> MpdError {
        MpdError::Connection(format!("Not connected to {}", self.peer_addr))
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Version announced in the greeting
    pub fn version(&self) -> Option<ProtocolVersion> {
        self.shared.session.lock().version().cloned()
    }

    pub fn is_connected(&self) -> bool {
        self.shared.is_connected()
    }

    /// Commands sent and not yet answered
    pub fn pending(&self) -> usize {
        self.shared.session.lock().pending()
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Tear the connection down; pending replies fail with a connection error
    pub fn shutdown(&self) {
        let failed = self.shared.close("connection closed by client");
        if failed > 0 {
            tracing::debug!("{} pending replies failed on shutdown", failed);
        }
        if let Some(socket) = &self.socket {
            let _ = socket.shutdown(Shutdown::Both);
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.shutdown();
        // Without a socket there is no way to unblock the reader; leave it detached
        if self.socket.is_some() {
            if let Some(reader) = self.reader.take() {
                let _ = reader.join();
            }
        }
    }
}

fn open_stream(config: &ClientConfig) -> Result<TcpStream> {
    let Some(timeout) = config.connect_timeout() else {
        return Ok(TcpStream::connect(&config.server_addr)?);
    };

    let mut last_error = None;
    for addr in config.server_addr.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }

    Err(match last_error {
        Some(e) => e.into(),
        None => MpdError::Connection(format!("{} did not resolve to any address", config.server_addr)),
    })
}

/// Body of the reader thread: the single sequential consumer of lines
fn read_loop<R: Read>(mut lines: LineReader<R>, shared: Arc<Shared>, peer_addr: String) {
    let reason = loop {
        if !shared.is_connected() {
            break "connection closed by client".to_string();
        }

        match lines.next_line() {
            Ok(Some(line)) => {
                tracing::trace!("Received from {}: {}", peer_addr, line);
                if let Err(e) = shared.session.lock().on_line(line) {
                    tracing::warn!("Unexpected line from {}: {}", peer_addr, e);
                }
            }
            Ok(None) => break format!("connection closed by {}", peer_addr),
            Err(e) => break format!("read from {} failed: {}", peer_addr, e),
        }
    };

    let failed = shared.close(&reason);
    tracing::debug!("Reader for {} stopped: {} ({} pending replies failed)", peer_addr, reason, failed);
}
