//! Row capability consumed by the indices.
//!
//! Indices never hold row references. They store `Row::Id` handles and read
//! keys from whichever row snapshot the caller hands them.

use std::{fmt::Debug, hash::Hash};

///
/// Row
///
/// Externally owned entity with a stable identity. The id is the only thing
/// an index retains after an operation returns.
///

pub trait Row {
    type Id: Copy + Debug + Eq + Hash + Ord;

    fn id(&self) -> Self::Id;
}

///
/// RecordVersion
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RecordVersion {
    Original,
    Previous,
    Current,
}

///
/// Versioned
///
/// Snapshot access implemented by the row's own history machinery. Rows with
/// no history for a version return `self`.
///

pub trait Versioned: Row {
    fn get_version(&self, version: RecordVersion) -> &Self;
}

///
/// RowChange
///
/// The `{previous, current}` pair handed to `update`. Identity is read from
/// `current`.
///

#[derive(Debug)]
pub struct RowChange<'a, R> {
    pub previous: &'a R,
    pub current: &'a R,
}

impl<'a, R> RowChange<'a, R> {
    #[must_use]
    pub const fn new(previous: &'a R, current: &'a R) -> Self {
        Self { previous, current }
    }

    /// The change that undoes this one.
    #[must_use]
    pub const fn reversed(&self) -> Self {
        Self {
            previous: self.current,
            current: self.previous,
        }
    }
}

impl<'a, R: Versioned> RowChange<'a, R> {
    /// Read the previous and current snapshots from a versioned row.
    #[must_use]
    pub fn from_versioned(row: &'a R) -> Self {
        Self {
            previous: row.get_version(RecordVersion::Previous),
            current: row.get_version(RecordVersion::Current),
        }
    }
}

impl<R: Row> RowChange<'_, R> {
    #[must_use]
    pub fn id(&self) -> R::Id {
        self.current.id()
    }
}

// Manual impls so `R` itself need not be `Clone`/`Copy`.
impl<R> Clone for RowChange<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for RowChange<'_, R> {}
