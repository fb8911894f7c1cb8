// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_observable --heading-base-level=0

//! Understory Observable: single-threaded observable lists and values.
//!
//! This crate provides the small reactive layer that derived collections and
//! widgets need to stay in sync with application data, without tying either
//! side to a particular UI framework:
//!
//! - [`ObservableVec`]: a shared list that reports every structural change as a
//!   [`ListChange`] (insertion, removal, replacement, permutation, or reset).
//! - [`ObservableValue`]: a shared value that reports `(old, new)` on change.
//! - [`When`]: a builder for conditional, optionally one-shot observers of an
//!   [`ObservableValue`].
//! - [`ListenerSet`] and [`Subscription`]: the listener bookkeeping shared by the
//!   above, reusable by other observable types such as derived views.
//!
//! ## Model
//!
//! Everything here is single-threaded and synchronous. A mutation updates the
//! data, releases its internal borrows, and then calls every listener before
//! returning. Listeners may read the observable, mutate it again (which
//! notifies recursively), or add and remove listeners.
//!
//! Subscriptions are RAII handles: dropping a [`Subscription`] removes its
//! listener. Listeners are owned by the observable; a listener that needs to
//! refer back to its own observable should hold a weak handle (see
//! [`ObservableVec::downgrade`]) to avoid a reference cycle.
//!
//! ## Minimal example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use understory_observable::{ListChange, ObservableVec};
//!
//! let rows = ObservableVec::from(vec![1, 2, 3]);
//! let inserted = Rc::new(Cell::new(0));
//!
//! let sink = inserted.clone();
//! let subscription = rows.subscribe(move |change| {
//!     if let ListChange::Inserted { count, .. } = change {
//!         sink.set(sink.get() + count);
//!     }
//! });
//!
//! rows.extend([4, 5]);
//! assert_eq!(inserted.get(), 2);
//!
//! // Dropping the subscription stops notifications.
//! drop(subscription);
//! rows.push(6);
//! assert_eq!(inserted.get(), 2);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod list;
mod listener;
mod value;
mod when;

pub use list::{ListChange, ObservableVec, WeakObservableVec};
pub use listener::{ListenerId, ListenerSet, Subscription};
pub use value::ObservableValue;
pub use when::When;
