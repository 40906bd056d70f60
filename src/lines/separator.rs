use std::fmt::{self, Write};

use crate::error::Error;

/// Byte sequence that ends a line, or `None` to read the remaining stream
/// as a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Separator {
    Bytes(Vec<u8>),
    None,
}

impl Default for Separator {
    fn default() -> Self {
        Self::newline()
    }
}

impl Separator {
    #[must_use]
    pub fn newline() -> Self {
        Self::Bytes(vec![b'\n'])
    }

    /// Empty input means "no separator".
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        if bytes.is_empty() {
            Self::None
        } else {
            Self::Bytes(bytes)
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b.as_slice()),
            Self::None => None,
        }
    }

    /// Byte length of the separator; 0 for `None`.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.as_bytes().map_or(0, <[u8]>::len)
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Parse the textual form used on the command line and in config files.
    /// Recognized escapes: `\n`, `\r`, `\t`, `\0`, `\\`, `\xHH`.
    pub fn parse_escaped(text: &str) -> Result<Self, Error> {
        let invalid = |reason: String| Error::InvalidArgument {
            argument: "separator",
            reason,
        };

        let mut out = Vec::with_capacity(text.len());
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                continue;
            }
            match chars.next() {
                Some('n') => out.push(b'\n'),
                Some('r') => out.push(b'\r'),
                Some('t') => out.push(b'\t'),
                Some('0') => out.push(0),
                Some('\\') => out.push(b'\\'),
                Some('x') => {
                    let hex: String = chars.by_ref().take(2).collect();
                    let byte = (hex.len() == 2)
                        .then(|| u8::from_str_radix(&hex, 16).ok())
                        .flatten()
                        .ok_or_else(|| invalid(format!("bad hex escape \"\\x{hex}\"")))?;
                    out.push(byte);
                }
                Some(other) => return Err(invalid(format!("unknown escape \"\\{other}\""))),
                None => return Err(invalid("trailing backslash".into())),
            }
        }
        Ok(Self::from_bytes(out))
    }

    /// End offset in `window` of the earliest separator match, given the
    /// bytes already collected for the current line in `line`. A match may
    /// begin inside `line` and finish inside `window`.
    pub(crate) fn find_end(&self, line: &[u8], window: &[u8]) -> Option<usize> {
        let sep = self.as_bytes().filter(|s| !s.is_empty())?;

        // Longest head first: it starts earliest.
        let max_head = (sep.len() - 1).min(line.len());
        for head in (1..=max_head).rev() {
            let rest = &sep[head..];
            if line.ends_with(&sep[..head]) && window.starts_with(rest) {
                return Some(rest.len());
            }
        }

        match sep {
            [byte] => memchr::memchr(*byte, window).map(|i| i + 1),
            _ => memchr::memmem::find(window, sep).map(|i| i + sep.len()),
        }
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self::Bytes(bytes) = self else {
            return f.write_str("<none>");
        };
        for &b in bytes {
            match b {
                b'\n' => f.write_str("\\n")?,
                b'\r' => f.write_str("\\r")?,
                b'\t' => f.write_str("\\t")?,
                0 => f.write_str("\\0")?,
                b'\\' => f.write_str("\\\\")?,
                0x20..=0x7e => f.write_char(b as char)?,
                _ => write!(f, "\\x{b:02x}")?,
            }
        }
        Ok(())
    }
}
