use std::collections::HashMap;

use super::ParseError;

const CRLF: &[u8] = b"\r\n";

/// Case-insensitive header store.
///
/// Names are lowercased on insertion and lookup. Setting a name that is
/// already present joins the values with a single `,`, preserving the order
/// they arrived in. Serialization uses the stored (lowercased) names, which
/// is observable on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Append-join semantics: an existing value becomes `old,new`.
    pub fn set(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.inner.get_mut(&name) {
            Some(existing) => {
                existing.push(',');
                existing.push_str(value);
            }
            None => {
                self.inner.insert(name, value.to_string());
            }
        }
    }

    /// Unconditional overwrite.
    pub fn replace(&mut self, name: &str, value: &str) {
        self.inner.insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn remove(&mut self, name: &str) {
        self.inner.remove(&name.to_ascii_lowercase());
    }

    /// Visits `(name, value)` pairs in unspecified order.
    pub fn for_each<F>(&self, mut callback: F)
    where
        F: FnMut(&str, &str),
    {
        for (name, value) in &self.inner {
            callback(name, value);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Consumes complete `name: value` lines from `data`.
    ///
    /// Returns `(consumed, done)` where `done` flags the empty line that
    /// terminates the block. `(0, false)` means no CRLF is visible yet and
    /// the caller should read more bytes.
    pub fn parse(&mut self, data: &[u8]) -> Result<(usize, bool), ParseError> {
        let mut read = 0;

        loop {
            let Some(idx) = find_crlf(&data[read..]) else {
                return Ok((read, false));
            };

            // empty line ends the header block
            if idx == 0 {
                return Ok((read + CRLF.len(), true));
            }

            let (name, value) = split_field_line(&data[read..read + idx])?;
            self.set(name, value);
            read += idx + CRLF.len();
        }
    }
}

pub(crate) fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(CRLF.len()).position(|window| window == CRLF)
}

fn split_field_line(line: &[u8]) -> Result<(&str, &str), ParseError> {
    let colon = line
        .iter()
        .position(|&b| b == b':')
        .ok_or(ParseError::MalformedHeader)?;
    let (name, rest) = line.split_at(colon);

    if name.first() == Some(&b' ') || name.last() == Some(&b' ') {
        return Err(ParseError::MalformedFieldLine);
    }
    if name.is_empty() || !name.iter().all(|&b| is_token_char(b)) {
        return Err(ParseError::MalformedHeaderName);
    }

    // token chars are ASCII, so this cannot fail after the check above
    let name = std::str::from_utf8(name).map_err(|_| ParseError::MalformedHeaderName)?;
    let value = std::str::from_utf8(trim_ows(&rest[1..]))
        .map_err(|_| ParseError::MalformedHeader)?;

    Ok((name, value))
}

fn trim_ows(mut value: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = value {
        value = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = value {
        value = rest;
    }
    value
}

/// RFC 7230 token grammar: ALPHA / DIGIT / "!#$%&'*+-.^_`|~".
fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~')
}
