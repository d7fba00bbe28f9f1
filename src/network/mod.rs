//! Network Module
//!
//! Transport plumbing for the client.
//!
//! ## Architecture
//! - One reader thread per connection, the only consumer of inbound lines
//! - Writes serialized behind a lock so lines never interleave
//! - Replies delivered through [`ReplyHandle`](crate::session::ReplyHandle)s

mod client;
mod connection;

pub use client::Client;
pub use connection::Connection;
