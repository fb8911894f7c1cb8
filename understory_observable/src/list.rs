// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observable list: a shared `Vec<T>` that reports structural changes.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, Ref, RefCell};
use core::cmp::Ordering;
use core::fmt;

use crate::listener::{ListenerSet, Subscription};

/// A structural change reported by an [`ObservableVec`].
///
/// Every mutation reports exactly one change, after the list contents have
/// been updated and all internal borrows released. Listeners are therefore
/// free to read the list (but see the borrow rules on [`ObservableVec`]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListChange {
    /// `count` items were inserted starting at `index`.
    Inserted {
        /// Index of the first inserted item.
        index: usize,
        /// Number of inserted items.
        count: usize,
    },
    /// `count` items were removed starting at `index`.
    Removed {
        /// Index of the first removed item, in pre-removal coordinates.
        index: usize,
        /// Number of removed items.
        count: usize,
    },
    /// `count` items starting at `index` were replaced in place.
    Replaced {
        /// Index of the first replaced item.
        index: usize,
        /// Number of replaced items.
        count: usize,
    },
    /// Items were reordered; `permutation[old] == new` for every index.
    Permuted {
        /// Old-to-new index map.
        permutation: Vec<usize>,
    },
    /// The contents changed in a way not described by the other variants.
    Reset {
        /// Length before the change.
        old_len: usize,
        /// Length after the change.
        new_len: usize,
    },
}

type ListListener = dyn Fn(&ListChange);

struct Shared<T> {
    items: RefCell<Vec<T>>,
    revision: Cell<u64>,
    listeners: Rc<ListenerSet<ListListener>>,
}

/// A shared, observable list.
///
/// `ObservableVec` is a cheap-to-clone handle: every clone refers to the same
/// contents. The owner mutates it through any handle; observers register
/// callbacks with [`ObservableVec::subscribe`] and receive a [`ListChange`]
/// synchronously after each mutation.
///
/// The list also keeps a **revision** counter that is bumped whenever a
/// mutation actually changes the contents. No-op calls (clearing an empty
/// list, swapping an index with itself, and so on) neither bump the revision
/// nor notify.
///
/// This type is single-threaded. Reads hand out [`Ref`] guards; mutating the
/// list while such a guard is alive panics, as with any `RefCell`.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use understory_observable::{ListChange, ObservableVec};
///
/// let list = ObservableVec::from(vec!["a", "b"]);
/// let changes = Rc::new(RefCell::new(Vec::new()));
///
/// let sink = changes.clone();
/// let _subscription = list.subscribe(move |change| sink.borrow_mut().push(change.clone()));
///
/// list.push("c");
/// list.remove(0);
///
/// assert_eq!(list.to_vec(), ["b", "c"]);
/// assert_eq!(
///     *changes.borrow(),
///     [
///         ListChange::Inserted { index: 2, count: 1 },
///         ListChange::Removed { index: 0, count: 1 },
///     ]
/// );
/// ```
pub struct ObservableVec<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for ObservableVec<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for ObservableVec<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            shared: Rc::new(Shared {
                items: RefCell::new(items),
                revision: Cell::new(0),
                listeners: Rc::new(ListenerSet::new()),
            }),
        }
    }
}

impl<T> FromIterator<T> for ObservableVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<T>>())
    }
}

impl<T> ObservableVec<T> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::from(Vec::new())
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.items.borrow().len()
    }

    /// Returns `true` if the list has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.items.borrow().is_empty()
    }

    /// Returns the current revision counter.
    ///
    /// The revision is bumped once per mutation that changes the contents.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.shared.revision.get()
    }

    /// Returns a guard to the item at `index`, or `None` if out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.shared.items.borrow(), |items| items.get(index)).ok()
    }

    /// Returns a guard over all items.
    #[must_use]
    pub fn items(&self) -> Ref<'_, [T]> {
        Ref::map(self.shared.items.borrow(), Vec::as_slice)
    }

    /// Returns `true` if both handles refer to the same list.
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Rc::ptr_eq(&this.shared, &other.shared)
    }

    /// Returns a weak handle that does not keep the list alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakObservableVec<T> {
        WeakObservableVec {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    /// Appends `value` to the end of the list.
    pub fn push(&self, value: T) {
        let index = {
            let mut items = self.shared.items.borrow_mut();
            items.push(value);
            items.len() - 1
        };
        self.commit(ListChange::Inserted { index, count: 1 });
    }

    /// Inserts `value` at `index`, shifting later items up.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&self, index: usize, value: T) {
        self.shared.items.borrow_mut().insert(index, value);
        self.commit(ListChange::Inserted { index, count: 1 });
    }

    /// Appends every item yielded by `iter`.
    pub fn extend<I: IntoIterator<Item = T>>(&self, iter: I) {
        let (index, count) = {
            let mut items = self.shared.items.borrow_mut();
            let index = items.len();
            items.extend(iter);
            (index, items.len() - index)
        };
        if count > 0 {
            self.commit(ListChange::Inserted { index, count });
        }
    }

    /// Removes and returns the item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&self, index: usize) -> T {
        let removed = self.shared.items.borrow_mut().remove(index);
        self.commit(ListChange::Removed { index, count: 1 });
        removed
    }

    /// Shortens the list to `len` items. Does nothing if it is already shorter.
    pub fn truncate(&self, len: usize) {
        let count = {
            let mut items = self.shared.items.borrow_mut();
            let count = items.len().saturating_sub(len);
            items.truncate(len);
            count
        };
        if count > 0 {
            self.commit(ListChange::Removed { index: len, count });
        }
    }

    /// Removes every item.
    pub fn clear(&self) {
        self.truncate(0);
    }

    /// Replaces the item at `index`, returning the previous one.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn set(&self, index: usize, value: T) -> T {
        let previous = core::mem::replace(&mut self.shared.items.borrow_mut()[index], value);
        self.commit(ListChange::Replaced { index, count: 1 });
        previous
    }

    /// Swaps the items at `a` and `b`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn swap(&self, a: usize, b: usize) {
        let len = {
            let mut items = self.shared.items.borrow_mut();
            items.swap(a, b);
            items.len()
        };
        if a != b {
            let mut permutation: Vec<usize> = (0..len).collect();
            permutation.swap(a, b);
            self.commit(ListChange::Permuted { permutation });
        }
    }

    /// Stable-sorts the list with `compare`.
    ///
    /// Reports a [`ListChange::Permuted`] only if some item moved. The
    /// comparator runs against a shared borrow of the list, so it may read it;
    /// if it panics, the list is left untouched.
    pub fn sort_by<F>(&self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        // `order[new] == old`
        let order: Vec<usize> = {
            let items = self.shared.items.borrow();
            let mut order: Vec<usize> = (0..items.len()).collect();
            order.sort_by(|&a, &b| compare(&items[a], &items[b]));
            order
        };
        if order.iter().enumerate().all(|(new, &old)| new == old) {
            return;
        }

        let mut permutation = alloc::vec![0; order.len()];
        {
            let mut items = self.shared.items.borrow_mut();
            let mut slots: Vec<Option<T>> =
                core::mem::take(&mut *items).into_iter().map(Some).collect();
            for (new, &old) in order.iter().enumerate() {
                permutation[old] = new;
            }
            items.extend(order.iter().filter_map(|&old| slots[old].take()));
        }
        self.commit(ListChange::Permuted { permutation });
    }

    /// Keeps only the items for which `keep` returns `true`.
    pub fn retain<F>(&self, keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        let (old_len, new_len) = {
            let mut items = self.shared.items.borrow_mut();
            let old_len = items.len();
            items.retain(keep);
            (old_len, items.len())
        };
        if old_len != new_len {
            self.commit(ListChange::Reset { old_len, new_len });
        }
    }

    /// Replaces the whole contents with the items yielded by `iter`.
    pub fn replace_all<I: IntoIterator<Item = T>>(&self, iter: I) {
        let (old_len, new_len) = {
            let mut items = self.shared.items.borrow_mut();
            let old_len = items.len();
            items.clear();
            items.extend(iter);
            (old_len, items.len())
        };
        if old_len != 0 || new_len != 0 {
            self.commit(ListChange::Reset { old_len, new_len });
        }
    }

    /// Registers `listener` for every subsequent change.
    ///
    /// Dropping the returned [`Subscription`] removes the listener.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ListChange) + 'static,
    {
        self.shared.listeners.subscribe(Rc::new(listener))
    }

    fn commit(&self, change: ListChange) {
        let revision = &self.shared.revision;
        revision.set(revision.get().wrapping_add(1));
        self.shared.listeners.notify(|listener| listener(&change));
    }
}

impl<T: Clone> ObservableVec<T> {
    /// Returns a copy of the current contents.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.shared.items.borrow().clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ObservableVec");
        match self.shared.items.try_borrow() {
            Ok(items) => s.field("items", &*items),
            Err(_) => s.field("items", &"<borrowed>"),
        };
        s.field("revision", &self.revision())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// A weak handle to an [`ObservableVec`].
pub struct WeakObservableVec<T> {
    shared: Weak<Shared<T>>,
}

impl<T> WeakObservableVec<T> {
    /// Creates a weak handle that never upgrades.
    #[must_use]
    pub fn new() -> Self {
        Self { shared: Weak::new() }
    }

    /// Returns a strong handle if the list is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<ObservableVec<T>> {
        self.shared.upgrade().map(|shared| ObservableVec { shared })
    }
}

impl<T> Clone for WeakObservableVec<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Default for WeakObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for WeakObservableVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObservableVec")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}
