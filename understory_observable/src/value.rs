// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observable value: a shared cell that reports `(old, new)` on change.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use crate::listener::{ListenerSet, Subscription};

pub(crate) type ValueListener<T> = dyn Fn(&T, &T);

struct Shared<T> {
    value: RefCell<T>,
    listeners: Rc<ListenerSet<ValueListener<T>>>,
}

/// A shared value that notifies listeners synchronously when it changes.
///
/// Like [`ObservableVec`](crate::ObservableVec), this is a handle: clones refer
/// to the same value. Listeners receive the previous and the new value.
///
/// There are two ways to write:
///
/// - [`ObservableValue::set`] skips the write (and the notification) when the
///   new value equals the current one.
/// - [`ObservableValue::replace`] always writes and notifies. It is the only
///   option for values without `PartialEq`, such as shared closures.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use understory_observable::ObservableValue;
///
/// let width = ObservableValue::new(10_u32);
/// let last_delta = Rc::new(Cell::new(0_i64));
///
/// let sink = last_delta.clone();
/// let _subscription = width.subscribe(move |old, new| {
///     sink.set(i64::from(*new) - i64::from(*old));
/// });
///
/// width.set(25);
/// assert_eq!(last_delta.get(), 15);
/// assert_eq!(width.get(), 25);
/// ```
pub struct ObservableValue<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for ObservableValue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Default + Clone + 'static> Default for ObservableValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + 'static> ObservableValue<T> {
    /// Creates a new observable holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            shared: Rc::new(Shared {
                value: RefCell::new(value),
                listeners: Rc::new(ListenerSet::new()),
            }),
        }
    }

    /// Returns a copy of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.shared.value.borrow().clone()
    }

    /// Calls `f` with a reference to the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.shared.value.borrow())
    }

    /// Writes `value` and notifies listeners, returning the previous value.
    pub fn replace(&self, value: T) -> T {
        let old = core::mem::replace(&mut *self.shared.value.borrow_mut(), value);
        let new = self.get();
        self.shared.listeners.notify(|listener| listener(&old, &new));
        old
    }

    /// Registers `listener`, called with `(old, new)` after every write.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T, &T) + 'static,
    {
        self.shared.listeners.subscribe(Rc::new(listener))
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    /// Returns `true` if both handles refer to the same value.
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Rc::ptr_eq(&this.shared, &other.shared)
    }

    pub(crate) fn listeners(&self) -> &Rc<ListenerSet<ValueListener<T>>> {
        &self.shared.listeners
    }
}

impl<T: Clone + PartialEq + 'static> ObservableValue<T> {
    /// Writes `value` if it differs from the current value.
    ///
    /// Returns `true` if the value changed (and listeners were notified).
    pub fn set(&self, value: T) -> bool {
        if *self.shared.value.borrow() == value {
            return false;
        }
        self.replace(value);
        true
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ObservableValue");
        match self.shared.value.try_borrow() {
            Ok(value) => s.field("value", &*value),
            Err(_) => s.field("value", &"<borrowed>"),
        };
        s.field("listeners", &self.shared.listeners.len()).finish()
    }
}
