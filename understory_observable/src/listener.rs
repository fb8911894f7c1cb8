// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener sets and RAII subscription handles.
//!
//! A [`ListenerSet`] owns shared callbacks and invokes them in registration
//! order. Registering through [`ListenerSet::subscribe`] hands back a
//! [`Subscription`] that removes the callback when dropped.

use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};
use core::fmt;

use smallvec::SmallVec;

/// Inline capacity for listener entries.
///
/// Most observables have one or two listeners (a view plus perhaps a
/// selection model), so this avoids heap allocation in the common case.
const INLINE_LISTENERS: usize = 2;

type Entries<F> = SmallVec<[(ListenerId, Rc<F>); INLINE_LISTENERS]>;

/// Identifier of a callback registered in a [`ListenerSet`].
///
/// Identifiers are unique within one set and never reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Returns the raw identifier value.
    #[must_use]
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// An ordered set of shared callbacks of type `F`.
///
/// `F` is usually a trait object such as `dyn Fn(&Event)`. Notification walks
/// a snapshot of the set, so callbacks may register or remove listeners
/// (themselves included) while being notified. A callback removed during a
/// notification pass is not invoked later in that pass; a callback added during
/// a pass is first invoked on the next one.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use understory_observable::ListenerSet;
///
/// let set: Rc<ListenerSet<dyn Fn(&u32)>> = Rc::new(ListenerSet::new());
/// let seen = Rc::new(Cell::new(0));
///
/// let seen_in = seen.clone();
/// let subscription = set.subscribe(Rc::new(move |value: &u32| seen_in.set(*value)));
///
/// set.notify(|callback| callback(&7));
/// assert_eq!(seen.get(), 7);
///
/// drop(subscription);
/// assert!(set.is_empty());
/// ```
pub struct ListenerSet<F: ?Sized> {
    next_id: Cell<u64>,
    entries: RefCell<Entries<F>>,
}

impl<F: ?Sized> Default for ListenerSet<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> ListenerSet<F> {
    /// Creates an empty listener set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            entries: RefCell::new(SmallVec::new()),
        }
    }

    /// Returns the number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns `true` if no callbacks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Returns `true` if `id` is still registered.
    #[must_use]
    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries.borrow().iter().any(|(entry, _)| *entry == id)
    }

    /// Registers `callback` without producing a [`Subscription`].
    ///
    /// The callback stays registered until [`ListenerSet::remove`] is called
    /// with the returned identifier.
    pub fn insert(&self, callback: Rc<F>) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(self.next_id.get().wrapping_add(1));
        self.entries.borrow_mut().push((id, callback));
        id
    }

    /// Removes the callback registered under `id`.
    ///
    /// Returns `true` if a callback was removed.
    pub fn remove(&self, id: ListenerId) -> bool {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            entries
                .iter()
                .position(|(entry, _)| *entry == id)
                .map(|pos| entries.remove(pos))
        };
        // The callback is dropped here, after the borrow ends: it may own a
        // `Subscription` into this very set.
        removed.is_some()
    }

    /// Invokes `call` once for every registered callback, in registration order.
    pub fn notify(&self, mut call: impl FnMut(&F)) {
        let snapshot: Entries<F> = self.entries.borrow().clone();
        for (id, callback) in &snapshot {
            if self.contains(*id) {
                call(callback.as_ref());
            }
        }
    }
}

impl<F: ?Sized + 'static> ListenerSet<F> {
    /// Registers `callback` and returns a handle that removes it on drop.
    ///
    /// The handle only holds a weak reference to the set, so it never keeps the
    /// set alive.
    pub fn subscribe(self: &Rc<Self>, callback: Rc<F>) -> Subscription {
        let id = self.insert(callback);
        let registry: Weak<Self> = Rc::downgrade(self);
        let registry: Weak<dyn Unsubscribe> = registry;
        Subscription {
            inner: Some((id, registry)),
        }
    }
}

impl<F: ?Sized> fmt::Debug for ListenerSet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.len())
            .field("next_id", &self.next_id.get())
            .finish()
    }
}

trait Unsubscribe {
    fn unsubscribe(&self, id: ListenerId) -> bool;
    fn is_registered(&self, id: ListenerId) -> bool;
}

impl<F: ?Sized> Unsubscribe for ListenerSet<F> {
    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.remove(id)
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.contains(id)
    }
}

/// Handle to a registered callback.
///
/// Dropping the handle removes the callback. Use [`Subscription::detach`] to
/// keep the callback registered for as long as its listener set lives.
#[must_use = "dropping a `Subscription` removes its listener immediately"]
pub struct Subscription {
    inner: Option<(ListenerId, Weak<dyn Unsubscribe>)>,
}

impl Subscription {
    /// Returns a handle that is not attached to any listener set.
    pub fn inactive() -> Self {
        Self { inner: None }
    }

    /// Returns the identifier of the registered callback, if any.
    #[must_use]
    pub fn id(&self) -> Option<ListenerId> {
        self.inner.as_ref().map(|(id, _)| *id)
    }

    /// Returns `true` if the callback is still registered in a live set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.as_ref().is_some_and(|(id, registry)| {
            registry
                .upgrade()
                .is_some_and(|registry| registry.is_registered(*id))
        })
    }

    /// Removes the callback now.
    ///
    /// Returns `true` if the callback was still registered.
    pub fn unsubscribe(mut self) -> bool {
        self.release()
    }

    /// Forgets the handle, leaving the callback registered.
    pub fn detach(mut self) {
        self.inner = None;
    }

    fn release(&mut self) -> bool {
        if let Some((id, registry)) = self.inner.take()
            && let Some(registry) = registry.upgrade()
        {
            return registry.unsubscribe(id);
        }
        false
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id())
            .field("active", &self.is_active())
            .finish()
    }
}
