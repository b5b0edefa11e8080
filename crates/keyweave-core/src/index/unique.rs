
use super::{
    Applied, FilterFn, KeyFn, RowIndex, UniqueIndexBuilder,
    change::{DataAction, IndexChange, IndexListener, Listeners},
};
use crate::{
    error::IndexError,
    identity::IndexName,
    obs::sink::{MetricsEvent, record},
    row::{Row, RowChange},
};
use std::{cell::RefCell, collections::HashMap, fmt::Debug, hash::Hash, rc::Weak};
use tracing::{debug, trace};

///
/// UniqueIndex
///
/// Key -> row id mapping with enforced uniqueness. Dependents subscribe as
/// listeners and may veto deletes and re-keys before they are committed.
///

pub struct UniqueIndex<K, R: Row> {
    name: IndexName,
    key_fn: KeyFn<R, K>,
    filter_fn: FilterFn<R>,
    map: RefCell<HashMap<K, R::Id>>,
    listeners: Listeners<K>,
}

impl<K, R: Row> UniqueIndex<K, R> {
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    #[must_use]
    pub const fn index_name(&self) -> IndexName {
        self.name
    }
}

impl<K, R> UniqueIndex<K, R>
where
    K: Clone + Debug + Eq + Hash,
    R: Row + 'static,
{
    /// Start configuring a unique index.
    pub fn builder(name: impl Into<String>) -> UniqueIndexBuilder<K, R> {
        UniqueIndexBuilder::new(name)
    }
}

impl<K, R> UniqueIndex<K, R>
where
    K: Clone + Debug + Eq + Hash,
    R: Row,
{
    pub(crate) fn from_parts(name: IndexName, key_fn: KeyFn<R, K>, filter_fn: FilterFn<R>) -> Self {
        Self {
            name,
            key_fn,
            filter_fn,
            map: RefCell::new(HashMap::new()),
            listeners: Listeners::new(),
        }
    }

    /// Whether the row participates in this index at all.
    pub fn filter(&self, row: &R) -> bool {
        (self.filter_fn)(row)
    }

    pub fn get_key(&self, row: &R) -> K {
        (self.key_fn)(row)
    }

    #[must_use]
    pub fn find(&self, key: &K) -> Option<R::Id> {
        self.map.borrow().get(key).copied()
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.borrow().contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }

    /// Snapshot of the indexed keys, in no particular order.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.map.borrow().keys().cloned().collect()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // Register a dependent; dispatch order is subscription order.
    pub(crate) fn subscribe(&self, listener: Weak<dyn IndexListener<K>>) {
        self.listeners.subscribe(listener);
    }

    /// Insert a row under its key.
    pub fn add(&self, row: &R) -> Result<Applied, IndexError> {
        if !self.filter(row) {
            return Ok(Applied::Unchanged);
        }

        let key = self.get_key(row);
        if self.contains_key(&key) {
            return Err(self.duplicate(&key));
        }

        self.notify(DataAction::Add, None, Some(&key))?;

        trace!(index = %self.name, key = ?key, "unique insert");
        self.map.borrow_mut().insert(key, row.id());
        record(MetricsEvent::UniqueInsert { index: self.name() });

        Ok(Applied::Inserted)
    }

    /// Remove a row's key. Rows that are not members are ignored.
    pub fn remove(&self, row: &R) -> Result<Applied, IndexError> {
        if !self.filter(row) {
            return Ok(Applied::Unchanged);
        }

        let key = self.get_key(row);
        if !self.owns(&key, row.id()) {
            return Ok(Applied::Unchanged);
        }

        self.notify(DataAction::Delete, Some(&key), None)?;

        trace!(index = %self.name, key = ?key, "unique remove");
        self.map.borrow_mut().remove(&key);
        record(MetricsEvent::UniqueRemove { index: self.name() });

        Ok(Applied::Removed)
    }

    /// Move a row from its previous key to its current key.
    pub fn update(&self, change: RowChange<'_, R>) -> Result<Applied, IndexError> {
        let previous_key = self.get_key(change.previous);
        let current_key = self.get_key(change.current);
        if previous_key == current_key {
            return Ok(Applied::Unchanged);
        }

        // Phase 1: validate the candidate change.
        let id = change.id();
        let previous_owned = self.filter(change.previous) && self.owns(&previous_key, id);
        let current_in = self.filter(change.current);
        if !previous_owned && !current_in {
            return Ok(Applied::Unchanged);
        }

        if current_in && self.contains_key(&current_key) {
            return Err(self.duplicate(&current_key));
        }

        // Phase 2: let dependents veto.
        self.notify(
            DataAction::Update,
            previous_owned.then_some(&previous_key),
            current_in.then_some(&current_key),
        )?;

        // Phase 3: commit.
        trace!(
            index = %self.name,
            previous = ?previous_key,
            current = ?current_key,
            "unique rekey"
        );
        let mut map = self.map.borrow_mut();
        if previous_owned {
            map.remove(&previous_key);
        }
        if current_in {
            map.insert(current_key, id);
        }
        drop(map);
        record(MetricsEvent::UniqueRekey { index: self.name() });

        Ok(Applied::from_parts(previous_owned, current_in))
    }

    fn owns(&self, key: &K, id: R::Id) -> bool {
        self.map.borrow().get(key) == Some(&id)
    }

    fn notify(
        &self,
        action: DataAction,
        previous: Option<&K>,
        current: Option<&K>,
    ) -> Result<(), IndexError> {
        self.listeners.dispatch(&IndexChange {
            index: self.name(),
            action,
            previous,
            current,
        })
    }

    fn duplicate(&self, key: &K) -> IndexError {
        debug!(index = %self.name, key = ?key, "duplicate unique key rejected");
        record(MetricsEvent::UniqueViolation { index: self.name() });

        IndexError::duplicate_key(self.name(), key)
    }
}

impl<K, R> RowIndex<R> for UniqueIndex<K, R>
where
    K: Clone + Debug + Eq + Hash,
    R: Row,
{
    fn index_name(&self) -> &str {
        self.name()
    }

    fn add(&self, row: &R) -> Result<Applied, IndexError> {
        Self::add(self, row)
    }

    fn remove(&self, row: &R) -> Result<Applied, IndexError> {
        Self::remove(self, row)
    }

    fn update(&self, change: RowChange<'_, R>) -> Result<Applied, IndexError> {
        Self::update(self, change)
    }
}

impl<K, R: Row> Debug for UniqueIndex<K, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniqueIndex")
            .field("name", &self.name)
            .field("len", &self.map.borrow().len())
            .finish_non_exhaustive()
    }
}
