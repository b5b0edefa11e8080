
use super::{
    Applied, FilterFn, ForeignIndexBuilder, KeyFn, RowIndex, UniqueIndex,
    change::{DataAction, IndexChange, IndexListener},
};
use crate::{
    error::IndexError,
    identity::IndexName,
    obs::sink::{MetricsEvent, record},
    row::{Row, RowChange},
};
use std::{
    cell::RefCell,
    collections::{BTreeSet, HashMap},
    fmt::Debug,
    hash::Hash,
    rc::{Rc, Weak},
};
use tracing::{debug, trace};

///
/// ForeignIndex
///
/// Parent key -> set of child row ids. Bound to one parent unique index for
/// its whole lifetime, and subscribed to it so that a referenced parent key
/// can be neither deleted nor re-keyed.
///

pub struct ForeignIndex<K, C: Row, P: Row> {
    name: IndexName,
    parent: Rc<UniqueIndex<K, P>>,
    key_fn: KeyFn<C, K>,
    filter_fn: FilterFn<C>,
    buckets: RefCell<HashMap<K, BTreeSet<C::Id>>>,
}

impl<K, C: Row, P: Row> ForeignIndex<K, C, P> {
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    #[must_use]
    pub const fn index_name(&self) -> IndexName {
        self.name
    }

    #[must_use]
    pub const fn parent(&self) -> &Rc<UniqueIndex<K, P>> {
        &self.parent
    }
}

impl<K, C, P> ForeignIndex<K, C, P>
where
    K: Clone + Debug + Eq + Hash + 'static,
    C: Row + 'static,
    P: Row + 'static,
{
    /// Start configuring a foreign index over `parent`.
    pub fn builder(
        name: impl Into<String>,
        parent: &Rc<UniqueIndex<K, P>>,
    ) -> ForeignIndexBuilder<K, C, P> {
        ForeignIndexBuilder::new(name, Rc::clone(parent))
    }

    // Construct and subscribe to the parent in one step, so no foreign index
    // can exist without listening.
    pub(crate) fn bind(
        name: IndexName,
        parent: Rc<UniqueIndex<K, P>>,
        key_fn: KeyFn<C, K>,
        filter_fn: FilterFn<C>,
    ) -> Rc<Self> {
        let index = Rc::new(Self {
            name,
            parent,
            key_fn,
            filter_fn,
            buckets: RefCell::new(HashMap::new()),
        });

        let weak = Rc::downgrade(&index);
        let listener: Weak<dyn IndexListener<K>> = weak;
        index.parent.subscribe(listener);

        index
    }
}

impl<K, C, P> ForeignIndex<K, C, P>
where
    K: Clone + Debug + Eq + Hash,
    C: Row,
    P: Row,
{
    /// Whether the row participates in this index at all.
    pub fn filter(&self, row: &C) -> bool {
        (self.filter_fn)(row)
    }

    pub fn get_key(&self, row: &C) -> K {
        (self.key_fn)(row)
    }

    /// Number of parent keys with at least one child.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.borrow().is_empty()
    }

    /// Total number of linked children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.buckets.borrow().values().map(BTreeSet::len).sum()
    }

    /// Whether this row is currently linked under its key.
    pub fn is_linked(&self, row: &C) -> bool {
        let key = self.get_key(row);

        self.buckets
            .borrow()
            .get(&key)
            .is_some_and(|bucket| bucket.contains(&row.id()))
    }

    /// Children of `parent_row`, in ascending id order.
    pub fn get_children(&self, parent_row: &P) -> Vec<C::Id> {
        let key = self.parent.get_key(parent_row);

        self.children_for_key(&key)
    }

    /// Children linked under `key`, in ascending id order.
    #[must_use]
    pub fn children_for_key(&self, key: &K) -> Vec<C::Id> {
        self.buckets
            .borrow()
            .get(key)
            .map(|bucket| bucket.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn get_parent(&self, child: &C) -> Option<P::Id> {
        if !self.filter(child) {
            return None;
        }

        self.parent.find(&self.get_key(child))
    }

    /// Filtered-out children count as having a parent.
    pub fn has_parent(&self, child: &C) -> bool {
        !self.filter(child) || self.parent.contains_key(&self.get_key(child))
    }

    /// Link a child under its parent key.
    pub fn add(&self, row: &C) -> Result<Applied, IndexError> {
        if !self.filter(row) {
            return Ok(Applied::Unchanged);
        }

        let key = self.get_key(row);
        if !self.parent.contains_key(&key) {
            return Err(self.missing_parent(&key));
        }

        let id = row.id();
        let mut buckets = self.buckets.borrow_mut();
        if buckets.get(&key).is_some_and(|bucket| bucket.contains(&id)) {
            drop(buckets);
            return Err(self.duplicate(&key));
        }

        trace!(index = %self.name, key = ?key, "foreign link");
        buckets.entry(key).or_default().insert(id);
        drop(buckets);
        record(MetricsEvent::ForeignLink { index: self.name() });

        Ok(Applied::Inserted)
    }

    /// Unlink a child. Children that are not linked are ignored.
    pub fn remove(&self, row: &C) -> Result<Applied, IndexError> {
        if !self.filter(row) {
            return Ok(Applied::Unchanged);
        }

        let key = self.get_key(row);
        let removed = unlink(&mut self.buckets.borrow_mut(), &key, row.id());
        if removed {
            trace!(index = %self.name, key = ?key, "foreign unlink");
            record(MetricsEvent::ForeignUnlink { index: self.name() });
        }

        Ok(Applied::from_parts(removed, false))
    }

    /// Move a child from its previous parent key to its current one.
    pub fn update(&self, change: RowChange<'_, C>) -> Result<Applied, IndexError> {
        let previous_key = self.get_key(change.previous);
        let current_key = self.get_key(change.current);
        if previous_key == current_key {
            return Ok(Applied::Unchanged);
        }

        let id = change.id();
        let previous_in = self.filter(change.previous);
        let current_in = self.filter(change.current);

        // Phase 1: validate both halves before touching any bucket.
        {
            let buckets = self.buckets.borrow();

            if previous_in && !buckets.contains_key(&previous_key) {
                drop(buckets);
                debug!(
                    index = %self.name,
                    key = ?previous_key,
                    "previous bucket missing during update"
                );
                return Err(IndexError::key_not_found(self.name(), &previous_key));
            }

            if current_in {
                if !self.parent.contains_key(&current_key) {
                    drop(buckets);
                    return Err(self.missing_parent(&current_key));
                }
                if buckets
                    .get(&current_key)
                    .is_some_and(|bucket| bucket.contains(&id))
                {
                    drop(buckets);
                    return Err(self.duplicate(&current_key));
                }
            }
        }

        // Phase 2: commit.
        trace!(
            index = %self.name,
            previous = ?previous_key,
            current = ?current_key,
            "foreign relink"
        );
        let mut buckets = self.buckets.borrow_mut();
        let removed = previous_in && unlink(&mut buckets, &previous_key, id);
        if current_in {
            buckets.entry(current_key).or_default().insert(id);
        }
        drop(buckets);
        let applied = Applied::from_parts(removed, current_in);
        if applied.is_changed() {
            record(MetricsEvent::ForeignRelink { index: self.name() });
        }

        Ok(applied)
    }

    fn missing_parent(&self, key: &K) -> IndexError {
        debug!(
            index = %self.name,
            parent = self.parent.name(),
            key = ?key,
            "parent key missing"
        );
        record(MetricsEvent::MissingParent { index: self.name() });

        IndexError::key_not_found(self.name(), key)
    }

    fn duplicate(&self, key: &K) -> IndexError {
        debug!(index = %self.name, key = ?key, "child already linked");
        record(MetricsEvent::ForeignDuplicate { index: self.name() });

        IndexError::duplicate_key(self.name(), key)
    }
}

// Remove one member, dropping the bucket once it is empty.
fn unlink<K, I>(buckets: &mut HashMap<K, BTreeSet<I>>, key: &K, id: I) -> bool
where
    K: Eq + Hash,
    I: Ord,
{
    let Some(bucket) = buckets.get_mut(key) else {
        return false;
    };

    let removed = bucket.remove(&id);
    if bucket.is_empty() {
        buckets.remove(key);
    }

    removed
}

impl<K, C, P> IndexListener<K> for ForeignIndex<K, C, P>
where
    K: Clone + Debug + Eq + Hash,
    C: Row,
    P: Row,
{
    fn listener_name(&self) -> &str {
        self.name()
    }

    fn on_index_changing(&self, change: &IndexChange<'_, K>) -> Result<(), IndexError> {
        // A brand-new parent key cannot have children yet.
        if change.action == DataAction::Add {
            return Ok(());
        }
        let Some(previous) = change.previous else {
            return Ok(());
        };

        let blocked = self.buckets.borrow().contains_key(previous);
        record(MetricsEvent::ConstraintCheck {
            index: self.name(),
            blocked,
        });

        if blocked {
            debug!(
                index = %self.name,
                parent = change.index,
                action = ?change.action,
                key = ?previous,
                "parent change vetoed: key still referenced"
            );
            return Err(IndexError::constraint_violation(self.name(), previous));
        }

        Ok(())
    }
}

impl<K, C, P> RowIndex<C> for ForeignIndex<K, C, P>
where
    K: Clone + Debug + Eq + Hash,
    C: Row,
    P: Row,
{
    fn index_name(&self) -> &str {
        self.name()
    }

    fn add(&self, row: &C) -> Result<Applied, IndexError> {
        Self::add(self, row)
    }

    fn remove(&self, row: &C) -> Result<Applied, IndexError> {
        Self::remove(self, row)
    }

    fn update(&self, change: RowChange<'_, C>) -> Result<Applied, IndexError> {
        Self::update(self, change)
    }
}

impl<K, C: Row, P: Row> Debug for ForeignIndex<K, C, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForeignIndex")
            .field("name", &self.name)
            .field("parent", &self.parent.index_name())
            .field("buckets", &self.buckets.borrow().len())
            .finish_non_exhaustive()
    }
}
