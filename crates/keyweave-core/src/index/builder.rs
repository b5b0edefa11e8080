//! Fluent, build-once configuration for both index kinds.
//!
//! Key and filter functions are fixed by `build`; an index never changes
//! them afterwards.

use super::{FilterFn, ForeignIndex, KeyFn, UniqueIndex};
use crate::{error::IndexConfigError, identity::IndexName, row::Row};
use std::{fmt::Debug, hash::Hash, rc::Rc};

// Resolve the shared parts every builder validates.
fn resolve<R: 'static, K>(
    name: &str,
    key_fn: Option<KeyFn<R, K>>,
    filter_fn: Option<FilterFn<R>>,
) -> Result<(IndexName, KeyFn<R, K>, FilterFn<R>), IndexConfigError> {
    let index_name = IndexName::try_from_str(name)?;
    let key_fn = key_fn.ok_or_else(|| IndexConfigError::MissingKeyFunction {
        index: name.to_string(),
    })?;
    let filter_fn = filter_fn.unwrap_or_else(|| Box::new(|_: &R| true));

    Ok((index_name, key_fn, filter_fn))
}

///
/// UniqueIndexBuilder
///

pub struct UniqueIndexBuilder<K, R> {
    name: String,
    key_fn: Option<KeyFn<R, K>>,
    filter_fn: Option<FilterFn<R>>,
}

impl<K, R> UniqueIndexBuilder<K, R>
where
    K: Clone + Debug + Eq + Hash,
    R: Row + 'static,
{
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_fn: None,
            filter_fn: None,
        }
    }

    /// Key extraction function.
    #[must_use]
    pub fn has_index(mut self, key_fn: impl Fn(&R) -> K + 'static) -> Self {
        self.key_fn = Some(Box::new(key_fn));
        self
    }

    /// Membership predicate; rows failing it are invisible to the index.
    #[must_use]
    pub fn has_filter(mut self, filter_fn: impl Fn(&R) -> bool + 'static) -> Self {
        self.filter_fn = Some(Box::new(filter_fn));
        self
    }

    pub fn build(self) -> Result<Rc<UniqueIndex<K, R>>, IndexConfigError> {
        let (name, key_fn, filter_fn) = resolve(&self.name, self.key_fn, self.filter_fn)?;

        Ok(Rc::new(UniqueIndex::from_parts(name, key_fn, filter_fn)))
    }
}

///
/// ForeignIndexBuilder
///

pub struct ForeignIndexBuilder<K, C, P: Row> {
    name: String,
    parent: Rc<UniqueIndex<K, P>>,
    key_fn: Option<KeyFn<C, K>>,
    filter_fn: Option<FilterFn<C>>,
}

impl<K, C, P> ForeignIndexBuilder<K, C, P>
where
    K: Clone + Debug + Eq + Hash + 'static,
    C: Row + 'static,
    P: Row + 'static,
{
    pub(crate) fn new(name: impl Into<String>, parent: Rc<UniqueIndex<K, P>>) -> Self {
        Self {
            name: name.into(),
            parent,
            key_fn: None,
            filter_fn: None,
        }
    }

    /// Function extracting the parent key from a child row.
    #[must_use]
    pub fn has_index(mut self, key_fn: impl Fn(&C) -> K + 'static) -> Self {
        self.key_fn = Some(Box::new(key_fn));
        self
    }

    /// Membership predicate; typically excludes rows with no parent
    /// reference at all.
    #[must_use]
    pub fn has_filter(mut self, filter_fn: impl Fn(&C) -> bool + 'static) -> Self {
        self.filter_fn = Some(Box::new(filter_fn));
        self
    }

    /// Build the index and subscribe it to its parent.
    pub fn build(self) -> Result<Rc<ForeignIndex<K, C, P>>, IndexConfigError> {
        let (name, key_fn, filter_fn) = resolve(&self.name, self.key_fn, self.filter_fn)?;

        Ok(ForeignIndex::bind(name, self.parent, key_fn, filter_fn))
    }
}
