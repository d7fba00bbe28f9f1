//! Protocol codec
//!
//! Encoding of outgoing command lines, plus the matching decoder.
//!
//! ## Line Format
//! ```text
//! ┌──────────┬───┬──────────┬───┬──────────┬────┐
//! │   name   │ ␠ │ "arg 1"  │ ␠ │ "arg 2"  │ \n │
//! └──────────┴───┴──────────┴───┴──────────┴────┘
//! ```
//!
//! Inside an argument, `\` and `"` are escaped with a leading backslash
//! before the argument is wrapped in double quotes. Arguments must not
//! contain newlines.

use std::io::Write;

use crate::error::{MpdError, Result};
use super::framer::DELIMITER;

// =============================================================================
// Escaping
// =============================================================================

/// Escape backslashes and double quotes with a leading backslash
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        if c == '\\' || c == '"' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Inverse of [`escape`]
///
/// A backslash keeps the character after it literally. A lone trailing
/// backslash is kept as is.
pub fn unescape(text: &str) -> String {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => unescaped.push(next),
                None => unescaped.push('\\'),
            }
        } else {
            unescaped.push(c);
        }
    }
    unescaped
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command name and its arguments as one line (without delimiter)
pub fn encode_command<S: AsRef<str>>(name: &str, args: &[S]) -> String {
    let mut line = String::from(name);
    for arg in args {
        line.push_str(" \"");
        line.push_str(&escape(arg.as_ref()));
        line.push('"');
    }
    line
}

/// Decode a command line back into its name and arguments
///
/// Accepts quoted arguments (with escapes) and bare words.
pub fn decode_command(line: &str) -> Result<(String, Vec<String>)> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let (name, mut rest) = match line.split_once(' ') {
        Some((name, rest)) => (name, rest),
        None => (line, ""),
    };

    if name.is_empty() {
        return Err(MpdError::Protocol("Empty command line".to_string()));
    }

    let mut args = Vec::new();
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }

        if let Some(quoted) = rest.strip_prefix('"') {
            let end = closing_quote(quoted).ok_or_else(|| {
                MpdError::Protocol(format!("Unterminated quoted argument in {:?}", line))
            })?;
            args.push(unescape(&quoted[..end]));
            rest = &quoted[end + 1..];
        } else {
            let end = rest.find(' ').unwrap_or(rest.len());
            args.push(rest[..end].to_string());
            rest = &rest[end..];
        }
    }

    Ok((name.to_string(), args))
}

/// Byte offset of the first unescaped `"` in `text`
fn closing_quote(text: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a command line to a stream and flush it
pub fn write_command<W: Write, S: AsRef<str>>(writer: &mut W, name: &str, args: &[S]) -> Result<()> {
    let mut line = encode_command(name, args).into_bytes();
    line.push(DELIMITER);
    writer.write_all(&line)?;
    writer.flush()?;
    Ok(())
}
