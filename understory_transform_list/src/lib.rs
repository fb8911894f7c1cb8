// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_transform_list --heading-base-level=0

//! Understory Transform List: filtered and sorted views over observable lists.
//!
//! This crate maintains a read-only projection of a mutable list: the items
//! accepted by a filter, ordered by a comparator. List widgets, selection
//! models, and virtualizers can work in **view coordinates** while the
//! application keeps editing the **source**, and indices can be translated in
//! both directions.
//!
//! The core types are:
//!
//! - [`IndexMapping`]: a pure, rebuild-from-scratch map between source indices
//!   and view indices, built from a slice plus an optional filter and
//!   comparator. It has no knowledge of observation and can be used on its own.
//! - [`IndexedView`]: a live view bound to an
//!   [`ObservableVec`](understory_observable::ObservableVec). It rebuilds its
//!   mapping whenever the source, the filter, or the comparator changes, and
//!   reports each rebuild to its own observers as a [`ViewChange`].
//! - [`IndexedViewBuilder`]: configures the initial filter and comparator so the
//!   view is built once.
//!
//! ## Semantics
//!
//! For a source `S`, the view contains exactly the items of `S` accepted by the
//! filter (all of them when no filter is set). They are ordered by the
//! comparator using a stable sort, so items that compare equal keep their
//! source order; without a comparator the view keeps source order.
//!
//! For every view index `i` and source index `j`:
//!
//! - `view[i] == S[view_to_source(i)]`
//! - `source_to_view(view_to_source(i)) == Some(i)`
//! - `source_to_view(j)` is `None` exactly when `S[j]` is filtered out.
//!
//! Lookups outside `0..len` in either coordinate space fail with
//! [`ViewError`]; nothing is clamped.
//!
//! ## Minimal example
//!
//! ```rust
//! use understory_observable::ObservableVec;
//! use understory_transform_list::IndexedView;
//!
//! let source = ObservableVec::from(vec!["A", "B", "C", "D", "E"]);
//! let mut view = IndexedView::new(&source);
//!
//! // Reverse alphabetical order.
//! view.set_comparator_fn(|a: &&str, b: &&str| b.cmp(a), false);
//!
//! assert_eq!(*view.get(4).unwrap(), "A");
//! assert_eq!(view.index_of(&"E"), Some(0));
//! assert_eq!(view.view_to_source(0), Ok(4));
//! assert_eq!(view.source_to_view(0), Ok(Some(4)));
//!
//! // Hide everything: every lookup is now out of range.
//! view.set_filter_fn(|_: &&str| false);
//! assert!(view.is_empty());
//! assert!(view.get(0).is_err());
//! ```
//!
//! ## Threading
//!
//! Views and their sources are single-threaded (`Rc` + `RefCell`). Every
//! rebuild runs to completion synchronously before the triggering call
//! returns. Hosts that touch a view from several threads must serialize all
//! access themselves.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod builder;
mod error;
mod mapping;
mod view;

pub use builder::IndexedViewBuilder;
pub use error::ViewError;
pub use mapping::IndexMapping;
pub use view::{ChangeCause, Comparator, IndexedView, Predicate, ViewChange};
