//! Protocol version announced in the greeting

use std::fmt;

/// Version string from the greeting line
///
/// The raw text is always kept. The numeric triple is only present when the
/// text has the usual `major.minor.patch` shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolVersion {
    raw: String,
    numbers: Option<(u32, u32, u32)>,
}

impl ProtocolVersion {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().to_string();

        let mut parts = raw.split('.').map(|p| p.parse::<u32>());
        let numbers = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Ok(major)), Some(Ok(minor)), patch, None) => match patch {
                Some(Ok(patch)) => Some((major, minor, patch)),
                None => Some((major, minor, 0)),
                Some(Err(_)) => None,
            },
            _ => None,
        };

        Self { raw, numbers }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// `(major, minor, patch)` if the version is numeric
    pub fn numbers(&self) -> Option<(u32, u32, u32)> {
        self.numbers
    }

    /// True if the server version is at least `major.minor.patch`
    pub fn at_least(&self, major: u32, minor: u32, patch: u32) -> bool {
        self.numbers
            .map(|v| v >= (major, minor, patch))
            .unwrap_or(false)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
