// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Live filtered and sorted view over an [`ObservableVec`].

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, Ref, RefCell};
use core::cmp::Ordering;
use core::fmt;

use understory_observable::{
    ListenerSet, ObservableValue, ObservableVec, Subscription, WeakObservableVec,
};

use crate::builder::IndexedViewBuilder;
use crate::error::ViewError;
use crate::mapping::IndexMapping;

/// Shared filter predicate: `true` keeps the item in the view.
pub type Predicate<T> = Rc<dyn Fn(&T) -> bool>;

/// Shared comparator ordering the items of a view.
pub type Comparator<T> = Rc<dyn Fn(&T, &T) -> Ordering>;

/// What triggered a view rebuild.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChangeCause {
    /// The source list changed.
    Source,
    /// The filter was replaced or cleared.
    Filter,
    /// The comparator (or the `sort_first` flag) was replaced or cleared.
    Comparator,
}

/// Notification sent to view observers after a rebuild.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ViewChange {
    /// View revision after the rebuild.
    pub revision: u64,
    /// What triggered the rebuild.
    pub cause: ChangeCause,
    /// View length after the rebuild.
    pub len: usize,
}

type ViewListener = dyn Fn(&ViewChange);

struct ViewState<T> {
    filter: Option<Predicate<T>>,
    comparator: Option<Comparator<T>>,
    sort_first: bool,
    /// Bumped whenever `filter`, `comparator`, or `sort_first` is written.
    settings_revision: u64,
    mapping: IndexMapping,
    /// Revision of the source the mapping was built from.
    source_revision: u64,
    revision: u64,
}

struct Core<T> {
    state: RefCell<ViewState<T>>,
    rebuilding: Cell<bool>,
    observers: Rc<ListenerSet<ViewListener>>,
}

/// How many times a rebuild restarts because its own filter or comparator
/// replaced the settings before the last built mapping is kept anyway.
const MAX_SETTINGS_RESTARTS: u32 = 4;

/// Resets the rebuild flag even if a filter or comparator panics.
struct RebuildGuard<'a>(&'a Cell<bool>);

impl Drop for RebuildGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<T> Core<T> {
    /// Rebuilds the mapping from the current source contents and settings.
    ///
    /// Returns `false` without doing anything when called from inside a
    /// filter or comparator of a rebuild already in progress.
    fn rebuild(&self, source: &ObservableVec<T>, cause: ChangeCause) -> bool {
        if self.rebuilding.get() {
            return false;
        }
        self.rebuilding.set(true);
        let _guard = RebuildGuard(&self.rebuilding);

        let mut restarts = 0;
        loop {
            let (filter, comparator, sort_first, settings_revision) = {
                let state = self.state.borrow();
                (
                    state.filter.clone(),
                    state.comparator.clone(),
                    state.sort_first,
                    state.settings_revision,
                )
            };

            let source_revision = source.revision();
            let mapping = {
                let items = source.items();
                IndexMapping::build(&items, filter.as_deref(), comparator.as_deref(), sort_first)
            };

            let mut state = self.state.borrow_mut();
            // A filter or comparator replaced the settings while we were
            // building; the mapping is already stale.
            if state.settings_revision != settings_revision {
                if restarts < MAX_SETTINGS_RESTARTS {
                    restarts += 1;
                    continue;
                }
                tracing::warn!(
                    restarts,
                    "view settings keep changing during rebuild; keeping last mapping"
                );
            }
            state.mapping = mapping;
            state.source_revision = source_revision;
            state.revision = state.revision.wrapping_add(1);
            tracing::trace!(
                ?cause,
                source_len = state.mapping.source_len(),
                view_len = state.mapping.view_len(),
                revision = state.revision,
                "rebuilt indexed view"
            );
            return true;
        }
    }

    fn ensure_current(&self, source: &ObservableVec<T>) {
        let stale = self.state.borrow().source_revision != source.revision();
        if stale {
            self.rebuild(source, ChangeCause::Source);
        }
    }

    fn update_settings(
        &self,
        source: &ObservableVec<T>,
        cause: ChangeCause,
        write: impl FnOnce(&mut ViewState<T>),
    ) {
        {
            let mut state = self.state.borrow_mut();
            write(&mut *state);
            state.settings_revision = state.settings_revision.wrapping_add(1);
        }
        if self.rebuild(source, cause) {
            self.notify(cause);
        }
    }

    fn notify(&self, cause: ChangeCause) {
        let change = {
            let state = self.state.borrow();
            ViewChange {
                revision: state.revision,
                cause,
                len: state.mapping.view_len(),
            }
        };
        self.observers.notify(|observer| observer(&change));
    }
}

/// A filtered, sorted, read-only view over an [`ObservableVec`].
///
/// The view contains exactly the source items accepted by its filter, ordered
/// by its comparator with a stable sort (source order when no comparator is
/// set). It translates indices in both directions between view and source
/// coordinates.
///
/// # Keeping up with the source
///
/// The view subscribes to its source and rebuilds its [`IndexMapping`] after
/// every change, then notifies its own observers (see
/// [`IndexedView::subscribe`]). Reads additionally compare the mapping against
/// the source revision and rebuild first if it is stale, so even a source
/// listener that runs before the view's own listener observes a consistent
/// view.
///
/// Source and view are single-threaded. A [`Ref`] returned by
/// [`IndexedView::get`] borrows the source; mutating the source while such a
/// guard is alive panics. Filters and comparators must not mutate the source.
/// A filter or comparator that writes the [`ObservableValue`] it is bound to
/// restarts the rebuild; after a few restarts the view keeps the mapping it
/// last built and logs a warning.
///
/// # Example
///
/// ```rust
/// use understory_observable::ObservableVec;
/// use understory_transform_list::IndexedView;
///
/// let source = ObservableVec::from(vec!["A", "B", "C", "D", "E"]);
/// let mut view = IndexedView::new(&source);
///
/// view.set_comparator_fn(|a: &&str, b: &&str| b.cmp(a), false);
/// view.set_filter_fn(|s: &&str| matches!(*s, "A" | "C" | "E"));
///
/// assert_eq!(view.to_vec(), ["E", "C", "A"]);
/// assert_eq!(view.view_to_source(1), Ok(2));
/// assert_eq!(view.source_to_view(1), Ok(None));
/// assert!(view.get(4).is_err());
///
/// // Source edits show up immediately.
/// source.remove(0);
/// assert_eq!(view.to_vec(), ["E", "C"]);
/// ```
pub struct IndexedView<T> {
    source: ObservableVec<T>,
    core: Rc<Core<T>>,
    _source_subscription: Subscription,
    filter_binding: Option<Subscription>,
    comparator_binding: Option<Subscription>,
}

impl<T: 'static> IndexedView<T> {
    /// Creates an unfiltered, unsorted view over `source`.
    #[must_use]
    pub fn new(source: &ObservableVec<T>) -> Self {
        Self::builder(source).build()
    }

    /// Creates a view over the list behind a weak handle.
    ///
    /// Fails with [`ViewError::SourceDropped`] if the list no longer exists.
    pub fn try_new(source: &WeakObservableVec<T>) -> Result<Self, ViewError> {
        source
            .upgrade()
            .map(|source| Self::new(&source))
            .ok_or(ViewError::SourceDropped)
    }

    /// Starts configuring a view over `source`.
    #[must_use]
    pub fn builder(source: &ObservableVec<T>) -> IndexedViewBuilder<T> {
        IndexedViewBuilder::new(source)
    }

    pub(crate) fn from_parts(
        source: ObservableVec<T>,
        filter: Option<Predicate<T>>,
        comparator: Option<Comparator<T>>,
        sort_first: bool,
    ) -> Self {
        let mapping = IndexMapping::build(
            &source.items(),
            filter.as_deref(),
            comparator.as_deref(),
            sort_first,
        );
        tracing::debug!(
            source_len = mapping.source_len(),
            view_len = mapping.view_len(),
            "indexed view created"
        );
        let core = Rc::new(Core {
            state: RefCell::new(ViewState {
                filter,
                comparator,
                sort_first,
                settings_revision: 0,
                mapping,
                source_revision: source.revision(),
                revision: 0,
            }),
            rebuilding: Cell::new(false),
            observers: Rc::new(ListenerSet::new()),
        });
        let source_subscription = watch_source(&core, &source);
        Self {
            source,
            core,
            _source_subscription: source_subscription,
            filter_binding: None,
            comparator_binding: None,
        }
    }

    /// Returns the source list.
    #[must_use]
    pub fn source(&self) -> &ObservableVec<T> {
        &self.source
    }

    /// Returns the number of items in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state().mapping.view_len()
    }

    /// Returns `true` if the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a guard to the item at `index` in view order.
    pub fn get(&self, index: usize) -> Result<Ref<'_, T>, ViewError> {
        let source_index = self.view_to_source(index)?;
        Ref::filter_map(self.source.items(), |items| items.get(source_index)).map_err(|_| {
            // Only reachable when read from inside a filter or comparator,
            // where the mapping may trail the source.
            ViewError::ViewIndexOutOfRange {
                index,
                len: self.len(),
            }
        })
    }

    /// Translates a view index into a source index.
    pub fn view_to_source(&self, index: usize) -> Result<usize, ViewError> {
        self.state().mapping.view_to_source(index)
    }

    /// Translates a source index into a view index.
    ///
    /// Returns `Ok(None)` when the source item is filtered out.
    pub fn source_to_view(&self, index: usize) -> Result<Option<usize>, ViewError> {
        self.state().mapping.source_to_view(index)
    }

    /// Returns a copy of the current index mapping.
    #[must_use]
    pub fn mapping(&self) -> IndexMapping {
        self.state().mapping.clone()
    }

    /// Returns the view revision, bumped on every rebuild.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.state().revision
    }

    /// Returns `true` if a filter is set.
    #[must_use]
    pub fn has_filter(&self) -> bool {
        self.core.state.borrow().filter.is_some()
    }

    /// Returns `true` if a comparator is set.
    #[must_use]
    pub fn has_comparator(&self) -> bool {
        self.core.state.borrow().comparator.is_some()
    }

    /// Returns the pipeline-order flag last passed with a comparator.
    ///
    /// The flag only selects whether sorting runs before filtering; it never
    /// changes the contents or order of the view.
    #[must_use]
    pub fn sort_first(&self) -> bool {
        self.core.state.borrow().sort_first
    }

    /// Calls `f` with each view index and item, in view order.
    ///
    /// `f` may change the view's settings, for example by writing a bound
    /// filter; the walk continues over the order captured at the start.
    pub fn for_each(&self, mut f: impl FnMut(usize, &T)) {
        let order = self.view_order();
        let items = self.source.items();
        for (view_index, &source_index) in order.iter().enumerate() {
            if let Some(item) = items.get(source_index) {
                f(view_index, item);
            }
        }
    }

    /// Replaces the filter. `None` accepts every item.
    ///
    /// Removes any binding installed with [`IndexedView::bind_filter`].
    pub fn set_filter(&mut self, filter: Option<Predicate<T>>) {
        self.drop_filter_binding();
        self.core
            .update_settings(&self.source, ChangeCause::Filter, |state| {
                state.filter = filter;
            });
    }

    /// Sets `filter` as the filter.
    pub fn set_filter_fn<F>(&mut self, filter: F)
    where
        F: Fn(&T) -> bool + 'static,
    {
        self.set_filter(Some(Rc::new(filter)));
    }

    /// Removes the filter so that every item is shown.
    pub fn clear_filter(&mut self) {
        self.set_filter(None);
    }

    /// Replaces the comparator. `None` keeps source order.
    ///
    /// `sort_first` selects whether sorting runs before filtering during
    /// rebuilds; see [`IndexMapping::build`]. Removes any binding installed
    /// with [`IndexedView::bind_comparator`].
    pub fn set_comparator(&mut self, comparator: Option<Comparator<T>>, sort_first: bool) {
        self.drop_comparator_binding();
        self.core
            .update_settings(&self.source, ChangeCause::Comparator, |state| {
                state.comparator = comparator;
                state.sort_first = sort_first;
            });
    }

    /// Sets `comparator` as the comparator.
    pub fn set_comparator_fn<F>(&mut self, comparator: F, sort_first: bool)
    where
        F: Fn(&T, &T) -> Ordering + 'static,
    {
        self.set_comparator(Some(Rc::new(comparator)), sort_first);
    }

    /// Removes the comparator so that the view keeps source order.
    pub fn clear_comparator(&mut self) {
        let sort_first = self.sort_first();
        self.set_comparator(None, sort_first);
    }

    /// Makes the view follow `filter`: its current value is applied now and
    /// every later write to it is applied as it happens.
    ///
    /// Replaces a previous filter binding. A later call to
    /// [`IndexedView::set_filter`] removes the binding.
    pub fn bind_filter(&mut self, filter: &ObservableValue<Option<Predicate<T>>>) {
        self.drop_filter_binding();
        let current = filter.get();
        self.core
            .update_settings(&self.source, ChangeCause::Filter, |state| {
                state.filter = current;
            });

        let (core, source) = self.weak_parts();
        self.filter_binding = Some(filter.subscribe(move |_, new| {
            if let (Some(core), Some(source)) = (core.upgrade(), source.upgrade()) {
                let new = new.clone();
                core.update_settings(&source, ChangeCause::Filter, |state| {
                    state.filter = new;
                });
            }
        }));
        tracing::debug!("filter bound to observable value");
    }

    /// Makes the view follow `comparator`, like [`IndexedView::bind_filter`].
    ///
    /// `sort_first` applies to every comparator the binding delivers.
    pub fn bind_comparator(
        &mut self,
        comparator: &ObservableValue<Option<Comparator<T>>>,
        sort_first: bool,
    ) {
        self.drop_comparator_binding();
        let current = comparator.get();
        self.core
            .update_settings(&self.source, ChangeCause::Comparator, |state| {
                state.comparator = current;
                state.sort_first = sort_first;
            });

        let (core, source) = self.weak_parts();
        self.comparator_binding = Some(comparator.subscribe(move |_, new| {
            if let (Some(core), Some(source)) = (core.upgrade(), source.upgrade()) {
                let new = new.clone();
                core.update_settings(&source, ChangeCause::Comparator, |state| {
                    state.comparator = new;
                    state.sort_first = sort_first;
                });
            }
        }));
        tracing::debug!(sort_first, "comparator bound to observable value");
    }

    /// Returns `true` if the filter follows an [`ObservableValue`].
    #[must_use]
    pub fn is_filter_bound(&self) -> bool {
        self.filter_binding.is_some()
    }

    /// Returns `true` if the comparator follows an [`ObservableValue`].
    #[must_use]
    pub fn is_comparator_bound(&self) -> bool {
        self.comparator_binding.is_some()
    }

    /// Registers `observer`, called after every rebuild with a [`ViewChange`].
    ///
    /// Rebuilds performed lazily by a read are reported when the source
    /// notification that caused them reaches the view.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&ViewChange) + 'static,
    {
        self.core.observers.subscribe(Rc::new(observer))
    }

    /// Releases the source subscription and any bindings.
    ///
    /// Dropping the view has the same effect.
    pub fn dispose(self) {
        tracing::debug!(
            source_listeners = self.source.listener_count(),
            "disposing indexed view"
        );
    }

    fn state(&self) -> Ref<'_, ViewState<T>> {
        self.core.ensure_current(&self.source);
        self.core.state.borrow()
    }

    /// Snapshot of the view order, so that no state borrow outlives the call.
    fn view_order(&self) -> Vec<usize> {
        self.state().mapping.view_order().to_vec()
    }

    fn weak_parts(&self) -> (Weak<Core<T>>, WeakObservableVec<T>) {
        (Rc::downgrade(&self.core), self.source.downgrade())
    }

    fn drop_filter_binding(&mut self) {
        if self.filter_binding.take().is_some() {
            tracing::debug!("filter binding removed");
        }
    }

    fn drop_comparator_binding(&mut self) {
        if self.comparator_binding.take().is_some() {
            tracing::debug!("comparator binding removed");
        }
    }
}

impl<T: PartialEq + 'static> IndexedView<T> {
    /// Returns the view index of the first item equal to `element`.
    ///
    /// Returns `None` if no such item is in the view, whether it is missing
    /// from the source or filtered out.
    #[must_use]
    pub fn index_of(&self, element: &T) -> Option<usize> {
        let order = self.view_order();
        let items = self.source.items();
        order
            .iter()
            .position(|&source_index| items.get(source_index) == Some(element))
    }

    /// Returns `true` if an item equal to `element` is in the view.
    #[must_use]
    pub fn contains(&self, element: &T) -> bool {
        self.index_of(element).is_some()
    }
}

impl<T: Clone + 'static> IndexedView<T> {
    /// Returns a copy of the item at `index` in view order.
    pub fn get_cloned(&self, index: usize) -> Result<T, ViewError> {
        self.get(index).map(|item| item.clone())
    }

    /// Returns a copy of the view contents, in view order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len());
        self.for_each(|_, item| out.push(item.clone()));
        out
    }
}

impl<T: 'static> fmt::Debug for IndexedView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("IndexedView")
            .field("source_len", &state.mapping.source_len())
            .field("view_len", &state.mapping.view_len())
            .field("has_filter", &state.filter.is_some())
            .field("has_comparator", &state.comparator.is_some())
            .field("sort_first", &state.sort_first)
            .field("revision", &state.revision)
            .finish_non_exhaustive()
    }
}

/// Subscribes `core` to `source`, holding both weakly.
fn watch_source<T: 'static>(core: &Rc<Core<T>>, source: &ObservableVec<T>) -> Subscription {
    let core = Rc::downgrade(core);
    let weak_source = source.downgrade();
    source.subscribe(move |change| {
        let (Some(core), Some(source)) = (core.upgrade(), weak_source.upgrade()) else {
            return;
        };
        tracing::trace!(?change, "source changed");
        core.ensure_current(&source);
        core.notify(ChangeCause::Source);
    })
}
