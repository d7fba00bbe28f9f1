//! Protocol Module
//!
//! Defines the client side of the line-oriented music daemon protocol.
//!
//! ## Wire Format
//!
//! Every unit on the wire is one `\n` terminated line of text.
//!
//! ### Request Format
//! ```text
//! command "arg 1" "arg \"2\""
//! ```
//!
//! ### Response Format
//! ```text
//! OK MPD 0.23.5          greeting, once per connection
//! key: value             data line (repeated)
//! OK                     success terminator
//! ACK [50@0] {play} ...  error line, replaces the terminator
//! list_OK                per-item terminator inside a command list
//! ```
//!
//! ### Command Lists
//! ```text
//! command_list_ok_begin
//! status
//! currentsong
//! command_list_end
//! ```
//! is answered with `...status lines... list_OK ...song lines... list_OK OK`.

mod codec;
mod command;
mod framer;
mod parser;
mod response;
mod version;

pub use codec::{decode_command, encode_command, escape, unescape, write_command};
pub use command::{lookup, Command, CommandSpec, COMMANDS};
pub use framer::{LineFramer, LineReader};
pub use parser::{
    parse_item, parse_list, parse_nothing, parse_object, parse_objects, parse_pairs,
    parse_playlist, Grammar, CHANGE_BOUNDARIES, DATABASE_BOUNDARIES, OUTPUT_BOUNDARIES,
    PLAYLIST_BOUNDARIES, SONG_BOUNDARIES,
};
pub use response::{FieldValue, Object, Objects, Response};
pub use version::ProtocolVersion;

/// Prefix of the greeting line sent once after connect
pub const HELLO_PREFIX: &str = "OK MPD ";

/// Prefix of an error line
pub const ERROR_PREFIX: &str = "ACK ";

/// Plain success terminator
pub const SUCCESS: &str = "OK";

/// Per-item terminator inside a command list
pub const NEXT: &str = "list_OK";

/// Separator between key and value in a data line
pub const SEPARATOR: &str = ": ";

/// Separator between position and value in a `playlist` response
pub const PLAYLIST_SEPARATOR: char = ':';

/// Opens a command list whose items are answered with [`NEXT`]
pub const COMMAND_LIST_OK_BEGIN: &str = "command_list_ok_begin";

/// Closes a command list
pub const COMMAND_LIST_END: &str = "command_list_end";
