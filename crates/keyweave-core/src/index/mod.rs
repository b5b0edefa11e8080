//! Module: index
//! Responsibility: unique and foreign indices over externally owned rows.
//! Does not own: row storage, row versioning, or table orchestration.
//!
//! Invariants:
//! - A unique index maps each key to exactly one row id.
//! - Every foreign bucket key exists in the parent unique index.
//! - Foreign buckets are never empty.
//! - A unique key referenced by a child can be neither deleted nor re-keyed.

mod builder;
mod change;
mod foreign;
mod unique;

pub use builder::{ForeignIndexBuilder, UniqueIndexBuilder};
pub use change::{DataAction, IndexChange, IndexListener};
pub use foreign::ForeignIndex;
pub use unique::UniqueIndex;

use crate::{
    error::IndexError,
    row::{Row, RowChange},
};

/// Key extraction function fixed at build time.
pub type KeyFn<R, K> = Box<dyn Fn(&R) -> K>;

/// Membership predicate fixed at build time.
pub type FilterFn<R> = Box<dyn Fn(&R) -> bool>;

///
/// Applied
///
/// What one index operation actually did to the index. A successful call
/// may leave the index untouched, for example when the row is filtered out
/// or was never a member.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Applied {
    Unchanged,
    /// The current snapshot's key was inserted.
    Inserted,
    /// The previous snapshot's key was removed.
    Removed,
    /// The previous key was removed and the current key inserted.
    Rekeyed,
}

impl Applied {
    #[must_use]
    pub const fn is_changed(self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    pub(crate) const fn from_parts(removed: bool, inserted: bool) -> Self {
        match (removed, inserted) {
            (false, false) => Self::Unchanged,
            (false, true) => Self::Inserted,
            (true, false) => Self::Removed,
            (true, true) => Self::Rekeyed,
        }
    }
}

///
/// RowIndex
///
/// The per-row mutation surface shared by every index kind, so one row change
/// can be dispatched to all indices of a table.
///

pub trait RowIndex<R: Row> {
    fn index_name(&self) -> &str;

    fn add(&self, row: &R) -> Result<Applied, IndexError>;

    fn remove(&self, row: &R) -> Result<Applied, IndexError>;

    fn update(&self, change: RowChange<'_, R>) -> Result<Applied, IndexError>;
}
