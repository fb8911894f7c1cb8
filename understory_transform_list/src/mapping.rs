// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Index mapping between a source slice and its filtered, sorted view.

use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::error::ViewError;

/// Bidirectional index map between a source sequence and a derived view.
///
/// For a view of length `n` over a source of length `m`:
///
/// - `view_to_source` holds `n` distinct source indices in view order.
/// - `source_to_view` holds `m` entries; entry `j` is `Some(i)` exactly when
///   `view_to_source[i] == j`, and `None` for items rejected by the filter.
///
/// A mapping is always rebuilt from scratch by [`IndexMapping::build`]; it is
/// never patched in place, so it cannot drift from the data it was built from.
///
/// # Example
///
/// ```rust
/// use understory_transform_list::IndexMapping;
///
/// let items = ["A", "B", "C", "D", "E"];
/// let keep = |s: &&str| *s != "B";
/// let reverse = |a: &&str, b: &&str| b.cmp(a);
///
/// let mapping = IndexMapping::build(&items, Some(&keep), Some(&reverse), false);
///
/// assert_eq!(mapping.view_order(), &[4, 3, 2, 0]);
/// assert_eq!(mapping.view_to_source(0), Ok(4));
/// assert_eq!(mapping.source_to_view(1), Ok(None));
/// assert_eq!(mapping.source_to_view(0), Ok(Some(3)));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexMapping {
    view_to_source: Vec<usize>,
    source_to_view: Vec<Option<usize>>,
}

impl IndexMapping {
    /// Returns the mapping of an unfiltered, unsorted view over `len` items.
    #[must_use]
    pub fn identity(len: usize) -> Self {
        Self {
            view_to_source: (0..len).collect(),
            source_to_view: (0..len).map(Some).collect(),
        }
    }

    /// Builds the mapping for `items` under an optional filter and comparator.
    ///
    /// Items rejected by `filter` are left out of the view. The remaining items
    /// are ordered by `comparator` with a stable sort, so ties keep their source
    /// order; without a comparator the view keeps source order.
    ///
    /// `sort_first` picks the pipeline order: sort every index and then drop
    /// rejected ones, or filter first and sort the survivors. Because the sort
    /// is stable both pipelines produce the same mapping; filtering first does
    /// less comparison work when the filter is selective.
    pub fn build<T>(
        items: &[T],
        filter: Option<&dyn Fn(&T) -> bool>,
        comparator: Option<&dyn Fn(&T, &T) -> Ordering>,
        sort_first: bool,
    ) -> Self {
        let mut order: Vec<usize> = (0..items.len()).collect();
        if sort_first {
            sort_indices(&mut order, items, comparator);
            retain_accepted(&mut order, items, filter);
        } else {
            retain_accepted(&mut order, items, filter);
            sort_indices(&mut order, items, comparator);
        }
        Self::from_view_order(order, items.len())
    }

    fn from_view_order(view_to_source: Vec<usize>, source_len: usize) -> Self {
        let mut source_to_view = vec![None; source_len];
        for (view_index, &source_index) in view_to_source.iter().enumerate() {
            source_to_view[source_index] = Some(view_index);
        }
        Self {
            view_to_source,
            source_to_view,
        }
    }

    /// Returns the number of items in the view.
    #[must_use]
    #[inline]
    pub fn view_len(&self) -> usize {
        self.view_to_source.len()
    }

    /// Returns the number of items in the source the mapping was built from.
    #[must_use]
    #[inline]
    pub fn source_len(&self) -> usize {
        self.source_to_view.len()
    }

    /// Returns `true` if the view is empty.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.view_to_source.is_empty()
    }

    /// Translates a view index into a source index.
    pub fn view_to_source(&self, index: usize) -> Result<usize, ViewError> {
        self.view_to_source
            .get(index)
            .copied()
            .ok_or(ViewError::ViewIndexOutOfRange {
                index,
                len: self.view_len(),
            })
    }

    /// Translates a source index into a view index.
    ///
    /// Returns `Ok(None)` when the source item is filtered out of the view.
    pub fn source_to_view(&self, index: usize) -> Result<Option<usize>, ViewError> {
        self.source_to_view
            .get(index)
            .copied()
            .ok_or(ViewError::SourceIndexOutOfRange {
                index,
                len: self.source_len(),
            })
    }

    /// Returns the source index of every view position, in view order.
    #[must_use]
    pub fn view_order(&self) -> &[usize] {
        &self.view_to_source
    }

    /// Returns the view position of every source index, in source order.
    #[must_use]
    pub fn source_positions(&self) -> &[Option<usize>] {
        &self.source_to_view
    }
}

fn retain_accepted<T>(order: &mut Vec<usize>, items: &[T], filter: Option<&dyn Fn(&T) -> bool>) {
    if let Some(filter) = filter {
        order.retain(|&index| filter(&items[index]));
    }
}

fn sort_indices<T>(
    order: &mut [usize],
    items: &[T],
    comparator: Option<&dyn Fn(&T, &T) -> Ordering>,
) {
    if let Some(comparator) = comparator {
        // `sort_by` is stable: equal items keep their relative source order.
        order.sort_by(|&a, &b| comparator(&items[a], &items[b]));
    }
}
