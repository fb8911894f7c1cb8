// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Builder for [`IndexedView`].

use alloc::rc::Rc;
use core::cmp::Ordering;
use core::fmt;

use understory_observable::ObservableVec;

use crate::view::{Comparator, IndexedView, Predicate};

/// Builder for [`IndexedView`].
///
/// Collects the initial filter, comparator, and pipeline order so that the
/// view is built exactly once, instead of once per setter call.
///
/// # Example
///
/// ```rust
/// use understory_observable::ObservableVec;
/// use understory_transform_list::IndexedView;
///
/// let source = ObservableVec::from(vec![5, 3, 8, 1, 9, 2]);
/// let view = IndexedView::builder(&source)
///     .filter(|v: &i32| v % 2 == 1)
///     .comparator(|a: &i32, b: &i32| a.cmp(b))
///     .build();
///
/// assert_eq!(view.to_vec(), [1, 3, 5, 9]);
/// assert_eq!(view.revision(), 0);
/// ```
pub struct IndexedViewBuilder<T> {
    source: ObservableVec<T>,
    filter: Option<Predicate<T>>,
    comparator: Option<Comparator<T>>,
    sort_first: bool,
}

impl<T: 'static> IndexedViewBuilder<T> {
    /// Creates a builder for an unfiltered, unsorted view over `source`.
    #[must_use]
    pub fn new(source: &ObservableVec<T>) -> Self {
        Self {
            source: source.clone(),
            filter: None,
            comparator: None,
            sort_first: false,
        }
    }

    /// Sets the initial filter.
    #[must_use]
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&T) -> bool + 'static,
    {
        self.filter = Some(Rc::new(filter));
        self
    }

    /// Sets the initial filter from a shared predicate, or clears it.
    #[must_use]
    pub fn predicate(mut self, filter: Option<Predicate<T>>) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the initial comparator.
    #[must_use]
    pub fn comparator<F>(mut self, comparator: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + 'static,
    {
        self.comparator = Some(Rc::new(comparator));
        self
    }

    /// Sets the initial comparator from a shared comparator, or clears it.
    #[must_use]
    pub fn shared_comparator(mut self, comparator: Option<Comparator<T>>) -> Self {
        self.comparator = comparator;
        self
    }

    /// Sets the pipeline-order flag (see [`IndexedView::sort_first`]).
    #[must_use]
    pub fn sort_first(mut self, sort_first: bool) -> Self {
        self.sort_first = sort_first;
        self
    }

    /// Builds the view and subscribes it to the source.
    #[must_use]
    pub fn build(self) -> IndexedView<T> {
        IndexedView::from_parts(self.source, self.filter, self.comparator, self.sort_first)
    }
}

impl<T> fmt::Debug for IndexedViewBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedViewBuilder")
            .field("source_len", &self.source.len())
            .field("has_filter", &self.filter.is_some())
            .field("has_comparator", &self.comparator.is_some())
            .field("sort_first", &self.sort_first)
            .finish()
    }
}
