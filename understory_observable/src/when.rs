// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conditional observers for [`ObservableValue`].

use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt;

use crate::listener::{ListenerId, Subscription};
use crate::value::ObservableValue;

type Condition<T> = Rc<dyn Fn(&T, &T) -> bool>;

/// Builder for an observer that runs an action only when a condition holds.
///
/// The condition and the action both receive `(old, new)`. The builder is
/// finished with [`When::then`], which registers the observer and returns its
/// [`Subscription`].
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use understory_observable::{ObservableValue, When};
///
/// let progress = ObservableValue::new(0_u32);
/// let finished = Rc::new(Cell::new(0));
///
/// let sink = finished.clone();
/// let subscription = When::on_changed(&progress)
///     .condition(|_, new| *new >= 100)
///     .one_shot(true)
///     .then(move |_, _| sink.set(sink.get() + 1));
///
/// progress.set(50);
/// progress.set(100);
/// progress.set(120);
///
/// // The action ran once, then the observer removed itself.
/// assert_eq!(finished.get(), 1);
/// assert!(!subscription.is_active());
/// ```
pub struct When<T> {
    value: ObservableValue<T>,
    condition: Option<Condition<T>>,
    one_shot: bool,
    execute_now: bool,
}

impl<T: Clone + 'static> When<T> {
    /// Starts building an observer of `value`.
    #[must_use]
    pub fn on_changed(value: &ObservableValue<T>) -> Self {
        Self {
            value: value.clone(),
            condition: None,
            one_shot: false,
            execute_now: false,
        }
    }

    /// Sets the condition gating the action. Without one, every change passes.
    #[must_use]
    pub fn condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&T, &T) -> bool + 'static,
    {
        self.condition = Some(Rc::new(condition));
        self
    }

    /// When `true`, the observer removes itself after the action first runs.
    #[must_use]
    pub fn one_shot(mut self, one_shot: bool) -> Self {
        self.one_shot = one_shot;
        self
    }

    /// When `true`, the condition is also evaluated once against the current
    /// value, passed as both old and new, before subscribing.
    #[must_use]
    pub fn execute_now(mut self, execute_now: bool) -> Self {
        self.execute_now = execute_now;
        self
    }

    /// Registers `action` and returns the observer's subscription.
    ///
    /// A one-shot observer whose action already ran during
    /// [`execute_now`](Self::execute_now) is never registered; the returned
    /// subscription is inactive.
    pub fn then<F>(self, action: F) -> Subscription
    where
        F: Fn(&T, &T) + 'static,
    {
        let condition = self.condition;
        let passes = move |old: &T, new: &T| condition.as_ref().is_none_or(|c| c(old, new));

        if self.execute_now {
            let current = self.value.get();
            if passes(&current, &current) {
                action(&current, &current);
                if self.one_shot {
                    tracing::debug!("one-shot observer satisfied immediately, not registering");
                    return Subscription::inactive();
                }
            }
        }

        if !self.one_shot {
            return self.value.subscribe(move |old, new| {
                if passes(old, new) {
                    action(old, new);
                }
            });
        }

        let own_id: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let listeners = Rc::downgrade(self.value.listeners());
        let id_slot = own_id.clone();
        let subscription = self.value.subscribe(move |old, new| {
            if !passes(old, new) {
                return;
            }
            // Leave before acting so writes made by the action cannot re-enter.
            if let (Some(listeners), Some(id)) = (listeners.upgrade(), id_slot.get()) {
                listeners.remove(id);
                tracing::debug!(id = id.get(), "one-shot observer removed");
            }
            action(old, new);
        });
        own_id.set(subscription.id());
        subscription
    }
}

impl<T: fmt::Debug> fmt::Debug for When<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("When")
            .field("value", &self.value)
            .field("has_condition", &self.condition.is_some())
            .field("one_shot", &self.one_shot)
            .field("execute_now", &self.execute_now)
            .finish()
    }
}
