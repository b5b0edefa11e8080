//! Module: mutation
//! Responsibility: apply one row mutation to every index of a table as a unit.
//! Does not own: index semantics or row storage.
//!
//! Each index operation is already all-or-nothing. This module adds the same
//! guarantee across sibling indices by compensating the indices that accepted
//! a mutation once a later one rejects it.

mod guard;


use guard::MutationGuard;

use crate::{
    error::IndexError,
    index::{Applied, RowIndex},
    row::{Row, RowChange},
};
use std::fmt::{self, Debug};
use tracing::trace;

///
/// RowMutation
///
/// One change to one row, in the shape every `RowIndex` accepts.
///

pub enum RowMutation<'a, R> {
    Add(&'a R),
    Remove(&'a R),
    Update(RowChange<'a, R>),
}

impl<'a, R> RowMutation<'a, R> {
    /// The mutation that undoes this one.
    #[must_use]
    pub const fn inverse(&self) -> Self {
        match self {
            Self::Add(row) => Self::Remove(*row),
            Self::Remove(row) => Self::Add(*row),
            Self::Update(change) => Self::Update(change.reversed()),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Remove(_) => "remove",
            Self::Update(_) => "update",
        }
    }

    /// Snapshot whose key leaves an index, if any.
    #[must_use]
    pub const fn previous(&self) -> Option<&'a R> {
        match self {
            Self::Add(_) => None,
            Self::Remove(row) => Some(*row),
            Self::Update(change) => Some(change.previous),
        }
    }

    /// Snapshot whose key enters an index, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&'a R> {
        match self {
            Self::Add(row) => Some(*row),
            Self::Remove(_) => None,
            Self::Update(change) => Some(change.current),
        }
    }

    /// The mutation that undoes exactly what one index reported doing.
    ///
    /// Unlike `inverse`, this never touches a key the index did not change.
    #[must_use]
    pub const fn compensation(&self, applied: Applied) -> Option<Self> {
        match (applied, self) {
            (Applied::Unchanged, _) => None,
            (Applied::Rekeyed, Self::Update(change)) => Some(Self::Update(change.reversed())),
            (Applied::Inserted | Applied::Rekeyed, _) => match self.current() {
                Some(row) => Some(Self::Remove(row)),
                None => None,
            },
            (Applied::Removed, _) => match self.previous() {
                Some(row) => Some(Self::Add(row)),
                None => None,
            },
        }
    }
}

impl<R: Row> RowMutation<'_, R> {
    /// Apply this mutation to a single index.
    pub fn apply_to(&self, index: &dyn RowIndex<R>) -> Result<Applied, IndexError> {
        match self {
            Self::Add(row) => index.add(row),
            Self::Remove(row) => index.remove(row),
            Self::Update(change) => index.update(*change),
        }
    }
}

// Manual impls so `R` itself need not be `Clone`/`Copy`/`Debug`.
impl<R> Clone for RowMutation<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for RowMutation<'_, R> {}

impl<R> Debug for RowMutation<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RowMutation::")?;
        f.write_str(self.kind())
    }
}

/// Apply `mutation` to every index in order.
///
/// On the first rejection every index that already changed is compensated in
/// reverse order and the original error is returned. Indices that accepted
/// the mutation without changing are left alone. A failed compensation step
/// never replaces that error.
pub fn apply<R: Row>(
    indexes: &[&dyn RowIndex<R>],
    mutation: RowMutation<'_, R>,
) -> Result<(), IndexError> {
    let mut guard = MutationGuard::new(mutation);

    for &index in indexes {
        guard.enter(index);
        match mutation.apply_to(index) {
            Ok(applied) => guard.accepted(applied),
            Err(err) => {
                guard.rollback();
                return Err(err);
            }
        }
    }

    trace!(kind = mutation.kind(), indexes = indexes.len(), "row mutation applied");
    guard.finish();

    Ok(())
}
