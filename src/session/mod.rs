//! Session Module
//!
//! Per-connection protocol state.
//!
//! ## Components
//! - [`Correlator`]: FIFO of pending replies, one per sent command
//! - [`Session`]: line state machine that feeds the correlator
//!
//! ```text
//!  line ──▶ Session ──(terminator)──▶ Correlator ──▶ oldest ReplyHandle
//!              │
//!              └──(data)──▶ buffer
//! ```

mod correlator;
mod state;

pub use correlator::{Correlator, Framing, Pending, Reply, ReplyHandle};
pub use state::{Session, SessionState};
