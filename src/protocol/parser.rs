//! Response grammar parsers
//!
//! Every parser takes the data lines of one response (terminator and
//! error lines already stripped) and builds a structured [`Response`].

use crate::error::{MpdError, Result};
use super::response::{Object, Objects, Response};
use super::{PLAYLIST_SEPARATOR, SEPARATOR};

/// Boundary keys for song listings
pub const SONG_BOUNDARIES: &[&str] = &["file"];

/// Boundary keys for stored playlist listings
pub const PLAYLIST_BOUNDARIES: &[&str] = &["playlist"];

/// Boundary keys for mixed database listings
pub const DATABASE_BOUNDARIES: &[&str] = &["file", "directory", "playlist"];

/// Boundary keys for audio output listings
pub const OUTPUT_BOUNDARIES: &[&str] = &["outputid"];

/// Boundary keys for position/id change listings
pub const CHANGE_BOUNDARIES: &[&str] = &["cpos"];

/// Response grammar applied to a command's reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// No payload
    Nothing,
    /// Homogeneous `key: value` list
    List,
    /// `pos:value` list from the `playlist` command
    Playlist,
    /// One object
    Object,
    /// One value
    Item,
    /// Objects split on `file`
    Songs,
    /// Objects split on `playlist`
    Playlists,
    /// Objects split on `file`, `directory` and `playlist`
    Database,
    /// Objects split on `outputid`
    Outputs,
    /// Objects split on `cpos`
    Changes,
}

impl Grammar {
    /// Boundary keys for the object-sequence grammars, empty otherwise
    pub fn boundary_keys(self) -> &'static [&'static str] {
        match self {
            Grammar::Songs => SONG_BOUNDARIES,
            Grammar::Playlists => PLAYLIST_BOUNDARIES,
            Grammar::Database => DATABASE_BOUNDARIES,
            Grammar::Outputs => OUTPUT_BOUNDARIES,
            Grammar::Changes => CHANGE_BOUNDARIES,
            _ => &[],
        }
    }

    /// Decode one response's lines
    pub fn parse(self, lines: Vec<String>) -> Result<Response> {
        match self {
            Grammar::Nothing => Ok(parse_nothing(&lines)),
            Grammar::List => parse_list(&lines).map(Response::List),
            Grammar::Playlist => parse_playlist(&lines).map(Response::List),
            Grammar::Object => parse_object(&lines).map(Response::Object),
            Grammar::Item => parse_item(&lines).map(Response::Item),
            Grammar::Songs
            | Grammar::Playlists
            | Grammar::Database
            | Grammar::Outputs
            | Grammar::Changes => parse_objects(&lines, self.boundary_keys()).map(Response::Objects),
        }
    }
}

// =============================================================================
// Line Splitting
// =============================================================================

fn split_line<'a>(line: &'a str, separator: &str) -> Result<(&'a str, &'a str)> {
    line.split_once(separator).ok_or_else(|| {
        MpdError::Protocol(format!(
            "Missing separator {:?} in line {:?}",
            separator, line
        ))
    })
}

/// Split every line on the first `": "`
pub fn parse_pairs<S: AsRef<str>>(lines: &[S]) -> Result<Vec<(String, String)>> {
    lines
        .iter()
        .map(|line| {
            split_line(line.as_ref(), SEPARATOR).map(|(k, v)| (k.to_string(), v.to_string()))
        })
        .collect()
}

// =============================================================================
// Parsers
// =============================================================================

/// Reply without payload; any lines are ignored
pub fn parse_nothing<S: AsRef<str>>(_lines: &[S]) -> Response {
    Response::Nothing
}

/// Values of a list whose lines all share the first line's key
pub fn parse_list<S: AsRef<str>>(lines: &[S]) -> Result<Vec<String>> {
    let mut seen: Option<&str> = None;
    let mut values = Vec::with_capacity(lines.len());

    for line in lines {
        let (key, value) = split_line(line.as_ref(), SEPARATOR)?;
        match seen {
            Some(expected) if expected != key => {
                return Err(MpdError::Protocol(format!(
                    "Expected key '{}', got '{}'",
                    expected, key
                )));
            }
            Some(_) => {}
            None => seen = Some(key),
        }
        values.push(value.to_string());
    }

    Ok(values)
}

/// Values of a `playlist` reply (`pos:value`), positions dropped
pub fn parse_playlist<S: AsRef<str>>(lines: &[S]) -> Result<Vec<String>> {
    lines
        .iter()
        .map(|line| {
            let line = line.as_ref();
            line.split_once(PLAYLIST_SEPARATOR)
                .map(|(_, value)| value.to_string())
                .ok_or_else(|| {
                    MpdError::Protocol(format!(
                        "Missing separator {:?} in playlist line {:?}",
                        PLAYLIST_SEPARATOR, line
                    ))
                })
        })
        .collect()
}

/// All lines as one object; empty object for an empty reply
pub fn parse_object<S: AsRef<str>>(lines: &[S]) -> Result<Object> {
    Ok(parse_objects(lines, &[])?.next().unwrap_or_default())
}

/// Objects split on `boundaries`
///
/// Lines are validated up front; objects are assembled lazily.
pub fn parse_objects<S: AsRef<str>>(lines: &[S], boundaries: &[&str]) -> Result<Objects> {
    Ok(Objects::new(parse_pairs(lines)?, boundaries))
}

/// The value of a single-line reply, None for any other line count
pub fn parse_item<S: AsRef<str>>(lines: &[S]) -> Result<Option<String>> {
    if lines.len() != 1 {
        return Ok(None);
    }
    let (_, value) = split_line(lines[0].as_ref(), SEPARATOR)?;
    Ok(Some(value.to_string()))
}
