#![expect(clippy::cast_possible_truncation)]
//! Module: identity
//! Responsibility: validated index naming.
//! Does not own: table naming or row identity.
//!
//! Invariants:
//! - Names are non-empty ASCII identifiers bounded by MAX_INDEX_NAME_LEN.
//! - All construction paths validate invariants.


use crate::MAX_INDEX_NAME_LEN;
use std::fmt::{self, Display};
use thiserror::Error as ThisError;

/// Separator used when composing a name from parts.
pub const INDEX_NAME_SEPARATOR: char = '.';

///
/// IndexNameError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum IndexNameError {
    #[error("index name is empty")]
    Empty,

    #[error("index name length {len} exceeds max {max}")]
    TooLong { len: usize, max: usize },

    #[error("index name must be ASCII")]
    NonAscii,

    #[error("index name contains invalid character '{ch}'")]
    InvalidChar { ch: char },
}

///
/// IndexName
///
/// Fixed-buffer index identity. `Copy`, so indices and errors can carry it
/// without allocating.
///

#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct IndexName {
    len: u8,
    bytes: [u8; MAX_INDEX_NAME_LEN],
}

impl IndexName {
    /// Validate and construct an index name from one ASCII string.
    pub fn try_from_str(name: &str) -> Result<Self, IndexNameError> {
        // Phase 1: validate user-visible identity constraints.
        let bytes = name.as_bytes();
        let len = bytes.len();

        if len == 0 {
            return Err(IndexNameError::Empty);
        }
        if !bytes.is_ascii() {
            return Err(IndexNameError::NonAscii);
        }
        if len > MAX_INDEX_NAME_LEN {
            return Err(IndexNameError::TooLong {
                len,
                max: MAX_INDEX_NAME_LEN,
            });
        }
        if let Some(&b) = bytes.iter().find(|&&b| !is_name_byte(b)) {
            return Err(IndexNameError::InvalidChar { ch: char::from(b) });
        }

        // Phase 2: write into fixed-size canonical storage.
        let mut out = [0u8; MAX_INDEX_NAME_LEN];
        out[..len].copy_from_slice(bytes);

        Ok(Self {
            len: len as u8,
            bytes: out,
        })
    }

    /// Compose a name such as `order.customer_id` from a table and its
    /// key columns.
    pub fn try_from_parts(table: &str, columns: &[&str]) -> Result<Self, IndexNameError> {
        let mut name = String::from(table);
        for column in columns {
            name.push(INDEX_NAME_SEPARATOR);
            name.push_str(column);
        }

        Self::try_from_str(&name)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Always `false`: construction rejects empty names. Present only to
    /// pair with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    /// Borrow raw identity bytes excluding trailing fixed-buffer padding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        // Invariant: construction enforces ASCII-only storage.
        std::str::from_utf8(self.as_bytes()).expect("IndexName invariant: ASCII-only storage")
    }
}

const fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b':' | b'.')
}

impl AsRef<str> for IndexName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndexName({})", self.as_str())
    }
}
