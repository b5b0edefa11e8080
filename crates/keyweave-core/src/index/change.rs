use crate::error::IndexError;
use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

///
/// DataAction
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DataAction {
    Add,
    Update,
    Delete,
}

///
/// IndexChange
///
/// Candidate structural change of a unique index, dispatched to listeners
/// before it is committed. `previous` is the key about to disappear and
/// `current` the key about to appear.
///

#[derive(Debug)]
pub struct IndexChange<'a, K> {
    pub index: &'a str,
    pub action: DataAction,
    pub previous: Option<&'a K>,
    pub current: Option<&'a K>,
}

///
/// IndexListener
///
/// Dependent of a unique index. Returning an error vetoes the change; the
/// unique index then leaves its state untouched and hands the error to its
/// caller.
///

pub trait IndexListener<K> {
    fn listener_name(&self) -> &str;

    fn on_index_changing(&self, change: &IndexChange<'_, K>) -> Result<(), IndexError>;
}

///
/// Listeners
///
/// Subscription-ordered set of weak listener handles owned by a unique index.
///

pub(crate) struct Listeners<K> {
    slots: RefCell<Vec<Weak<dyn IndexListener<K>>>>,
}

impl<K> Listeners<K> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(&self, listener: Weak<dyn IndexListener<K>>) {
        self.slots.borrow_mut().push(listener);
    }

    /// Number of live listeners.
    pub(crate) fn len(&self) -> usize {
        self.slots
            .borrow()
            .iter()
            .filter(|slot| slot.strong_count() > 0)
            .count()
    }

    /// Dispatch in subscription order, stopping at the first veto.
    pub(crate) fn dispatch(&self, change: &IndexChange<'_, K>) -> Result<(), IndexError> {
        // Upgrade first so no borrow is held while listeners run.
        let live: Vec<Rc<dyn IndexListener<K>>> = {
            let mut slots = self.slots.borrow_mut();
            slots.retain(|slot| slot.strong_count() > 0);
            slots.iter().filter_map(Weak::upgrade).collect()
        };

        for listener in live {
            listener.on_index_changing(change)?;
        }

        Ok(())
    }
}
