// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `understory_transform_list` crate.
//!
//! These exercise `IndexedView` end to end: the index translation contract,
//! how the view follows source edits, filter and comparator changes, and the
//! notifications it sends to its own observers.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::rc::Rc;

use understory_observable::{ObservableValue, ObservableVec};
use understory_transform_list::{
    ChangeCause, Comparator, IndexedView, Predicate, ViewChange, ViewError,
};

fn letters() -> ObservableVec<&'static str> {
    ObservableVec::from(vec!["A", "B", "C", "D", "E"])
}

fn reverse(a: &&'static str, b: &&'static str) -> Ordering {
    b.cmp(a)
}

/// Checks every invariant linking the view, its mapping, and the source.
fn assert_invariants<T: PartialEq + Clone + std::fmt::Debug + 'static>(view: &IndexedView<T>) {
    let source = view.source().to_vec();
    for i in 0..view.len() {
        let j = view.view_to_source(i).unwrap();
        assert_eq!(view.get_cloned(i).unwrap(), source[j]);
        assert_eq!(view.source_to_view(j), Ok(Some(i)));
    }
    let mut present = 0;
    for j in 0..source.len() {
        if let Some(i) = view.source_to_view(j).unwrap() {
            assert_eq!(view.view_to_source(i), Ok(j));
            present += 1;
        }
    }
    assert_eq!(present, view.len());
    assert_eq!(
        view.source_to_view(source.len()),
        Err(ViewError::SourceIndexOutOfRange {
            index: source.len(),
            len: source.len()
        })
    );
}

#[test]
fn reverse_order_without_filter() {
    let source = letters();
    let mut view = IndexedView::new(&source);
    view.set_comparator_fn(reverse, false);

    assert_eq!(view.to_vec(), ["E", "D", "C", "B", "A"]);
    assert_eq!(*view.get(4).unwrap(), "A");
    assert_eq!(view.index_of(&"E"), Some(0));
    assert_eq!(view.view_to_source(0), Ok(4));
    assert_eq!(view.source_to_view(0), Ok(Some(4)));
    assert_invariants(&view);
}

#[test]
fn reverse_order_with_filter() {
    let source = letters();
    let mut view = IndexedView::new(&source);
    view.set_comparator_fn(reverse, false);
    view.set_filter_fn(|s: &&str| matches!(*s, "A" | "C" | "E"));

    assert_eq!(view.to_vec(), ["E", "C", "A"]);
    assert_eq!(view.len(), 3);
    assert_eq!(*view.get(1).unwrap(), "C");
    assert_eq!(view.index_of(&"E"), Some(0));
    assert_eq!(view.index_of(&"B"), None);
    assert_eq!(view.index_of(&"Z"), None);
    assert_eq!(view.view_to_source(1), Ok(2));
    assert_eq!(view.source_to_view(1), Ok(None));
    assert_eq!(
        view.get(4).err(),
        Some(ViewError::ViewIndexOutOfRange { index: 4, len: 3 })
    );
    assert_invariants(&view);
}

#[test]
fn reject_all_filter_empties_the_view() {
    let source = letters();
    let mut view = IndexedView::new(&source);
    view.set_filter_fn(|_: &&str| false);

    assert_eq!(view.len(), 0);
    assert!(view.is_empty());
    for i in 0..5 {
        let err = view.get(i).err().unwrap();
        assert!(err.is_out_of_range());
        assert_eq!(view.source_to_view(i), Ok(None));
    }
    assert!(view.view_to_source(0).is_err());
}

#[test]
fn source_removal_rebuilds_before_next_read() {
    let source = letters();
    let mut view = IndexedView::new(&source);
    view.set_comparator_fn(reverse, false);
    view.set_filter_fn(|s: &&str| matches!(*s, "A" | "C" | "E"));

    // Remove "B": every later source index shifts down by one.
    assert_eq!(source.remove(1), "B");

    assert_eq!(view.to_vec(), ["E", "C", "A"]);
    assert_eq!(view.view_to_source(0), Ok(3));
    assert_eq!(view.view_to_source(1), Ok(1));
    assert_eq!(view.source_to_view(1), Ok(Some(1)));
    assert_eq!(view.source_to_view(2), Ok(None));
    assert!(view.source_to_view(4).is_err());
    assert_invariants(&view);

    // Remove a visible item.
    source.remove(0);
    assert_eq!(view.to_vec(), ["E", "C"]);
    assert_invariants(&view);
}

#[test]
fn every_source_mutation_kind_keeps_invariants() {
    let source: ObservableVec<u32> = (0..20).map(|i| (i * 13) % 17).collect();
    let view = IndexedView::builder(&source)
        .filter(|v: &u32| v % 3 != 0)
        .comparator(|a: &u32, b: &u32| b.cmp(a))
        .build();
    assert_invariants(&view);

    source.push(4);
    assert_invariants(&view);
    source.insert(0, 30);
    assert_invariants(&view);
    source.set(5, 1);
    assert_invariants(&view);
    source.swap(2, 9);
    assert_invariants(&view);
    source.sort_by(Ord::cmp);
    assert_invariants(&view);
    source.retain(|v| *v != 1);
    assert_invariants(&view);
    source.extend([7, 8, 9]);
    assert_invariants(&view);
    source.truncate(6);
    assert_invariants(&view);
    source.replace_all([2, 5, 3, 11]);
    assert_eq!(view.to_vec(), [11, 5, 2]);
    assert_invariants(&view);
    source.clear();
    assert!(view.is_empty());
    assert_invariants(&view);
}

#[test]
fn size_matches_filter_count() {
    let values: Vec<u32> = (0..50).map(|i| (i * 31) % 23).collect();
    let source = ObservableVec::from(values.clone());
    let mut view = IndexedView::new(&source);

    for modulus in 1..6 {
        view.set_filter_fn(move |v: &u32| v % modulus == 0);
        let expected = values.iter().filter(|v| *v % modulus == 0).count();
        assert_eq!(view.len(), expected);
        assert_invariants(&view);
    }
}

#[test]
fn order_law_with_comparator() {
    let source: ObservableVec<i32> = [9, -3, 4, 4, 0, 12, -7, 4].into_iter().collect();
    let cmp = |a: &i32, b: &i32| a.abs().cmp(&b.abs());
    let mut view = IndexedView::new(&source);
    view.set_comparator_fn(cmp, false);

    let items = view.to_vec();
    for pair in items.windows(2) {
        assert_ne!(cmp(&pair[0], &pair[1]), Ordering::Greater);
    }
}

#[test]
fn stability_law_for_ties_and_no_comparator() {
    let source = ObservableVec::from(vec![(1, 'a'), (0, 'b'), (1, 'c'), (0, 'd'), (1, 'e')]);
    let mut view = IndexedView::new(&source);

    // No comparator: view order is filtered source order.
    view.set_filter_fn(|item: &(i32, char)| item.1 != 'c');
    assert_eq!(view.to_vec(), [(1, 'a'), (0, 'b'), (0, 'd'), (1, 'e')]);

    // Equal keys keep their source order.
    view.set_comparator_fn(|a: &(i32, char), b: &(i32, char)| a.0.cmp(&b.0), false);
    assert_eq!(view.to_vec(), [(0, 'b'), (0, 'd'), (1, 'a'), (1, 'e')]);
}

#[test]
fn setting_the_same_transform_twice_is_idempotent() {
    let source: ObservableVec<u32> = (0..30).map(|i| (i * 7) % 10).collect();
    let mut view = IndexedView::new(&source);
    let filter: Predicate<u32> = Rc::new(|v: &u32| v % 2 == 1);
    let comparator: Comparator<u32> = Rc::new(|a: &u32, b: &u32| a.cmp(b));

    view.set_filter(Some(filter.clone()));
    let once = view.mapping();
    view.set_filter(Some(filter));
    assert_eq!(view.mapping(), once);

    view.set_comparator(Some(comparator.clone()), false);
    let once = view.mapping();
    view.set_comparator(Some(comparator), false);
    assert_eq!(view.mapping(), once);
}

#[test]
fn sort_first_flag_never_changes_contents() {
    let source: ObservableVec<u32> = (0..40).map(|i| (i * 11) % 9).collect();
    let mut view = IndexedView::builder(&source)
        .filter(|v: &u32| *v != 4)
        .build();

    view.set_comparator_fn(|a: &u32, b: &u32| (a % 3).cmp(&(b % 3)), false);
    let filter_first = view.mapping();
    assert!(!view.sort_first());

    view.set_comparator_fn(|a: &u32, b: &u32| (a % 3).cmp(&(b % 3)), true);
    assert!(view.sort_first());
    assert_eq!(view.mapping(), filter_first);

    view.clear_comparator();
    assert!(view.sort_first());
    assert!(!view.has_comparator());
}

#[test]
fn clearing_transforms_restores_identity() {
    let source = letters();
    let mut view = IndexedView::builder(&source)
        .filter(|s: &&str| *s != "C")
        .comparator(reverse)
        .build();
    assert!(view.has_filter());
    assert!(view.has_comparator());

    view.clear_filter();
    view.clear_comparator();
    assert_eq!(view.to_vec(), source.to_vec());
    assert_eq!(view.mapping(), understory_transform_list::IndexMapping::identity(5));
}

#[test]
fn observers_get_one_change_per_rebuild() {
    let source = letters();
    let mut view = IndexedView::new(&source);
    let log: Rc<RefCell<Vec<ViewChange>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    let _sub = view.subscribe(move |change| sink.borrow_mut().push(*change));

    view.set_filter_fn(|s: &&str| *s != "A");
    view.set_comparator_fn(reverse, false);
    source.push("F");

    let log = log.borrow();
    let causes: Vec<_> = log.iter().map(|c| (c.cause, c.len)).collect();
    assert_eq!(
        causes,
        [
            (ChangeCause::Filter, 4),
            (ChangeCause::Comparator, 4),
            (ChangeCause::Source, 5),
        ]
    );
    assert!(log.windows(2).all(|w| w[0].revision < w[1].revision));
    assert_eq!(log.last().map(|c| c.revision), Some(view.revision()));
}

#[test]
fn earlier_source_listener_sees_consistent_view() {
    let source = letters();
    let seen: Rc<RefCell<Vec<Vec<&'static str>>>> = Rc::new(RefCell::new(Vec::new()));

    // Registered before the view exists, so it runs before the view's listener.
    let view_slot: Rc<RefCell<Option<IndexedView<&'static str>>>> = Rc::new(RefCell::new(None));
    let reader = view_slot.clone();
    let sink = seen.clone();
    let _early = source.subscribe(move |_| {
        if let Some(view) = reader.borrow().as_ref() {
            sink.borrow_mut().push(view.to_vec());
        }
    });

    let mut view = IndexedView::new(&source);
    view.set_filter_fn(|s: &&str| *s != "B");
    *view_slot.borrow_mut() = Some(view);

    source.remove(0);
    source.push("B");
    source.push("F");

    assert_eq!(
        *seen.borrow(),
        [
            vec!["C", "D", "E"],
            vec!["C", "D", "E"],
            vec!["C", "D", "E", "F"],
        ]
    );
}

#[test]
fn bound_filter_follows_observable_value() {
    let source = letters();
    let mut view = IndexedView::new(&source);
    let filter: ObservableValue<Option<Predicate<&'static str>>> = ObservableValue::new(None);

    view.bind_filter(&filter);
    assert!(view.is_filter_bound());
    assert_eq!(view.len(), 5);

    filter.replace(Some(Rc::new(|s: &&str| *s > "B")));
    assert_eq!(view.to_vec(), ["C", "D", "E"]);

    filter.replace(None);
    assert_eq!(view.len(), 5);

    // An explicit set takes over and detaches the binding.
    view.set_filter_fn(|s: &&str| *s == "A");
    assert!(!view.is_filter_bound());
    assert_eq!(filter.listener_count(), 0);
    filter.replace(None);
    assert_eq!(view.to_vec(), ["A"]);
}

#[test]
fn bound_comparator_follows_observable_value() {
    let source = letters();
    let mut view = IndexedView::new(&source);
    let initial: Comparator<&'static str> = Rc::new(reverse);
    let comparator = ObservableValue::new(Some(initial));

    view.bind_comparator(&comparator, true);
    assert!(view.is_comparator_bound());
    assert!(view.sort_first());
    assert_eq!(view.to_vec(), ["E", "D", "C", "B", "A"]);

    comparator.replace(None);
    assert_eq!(view.to_vec(), ["A", "B", "C", "D", "E"]);
}

#[test]
fn dropping_the_view_releases_the_source() {
    let source = letters();
    let values = ObservableValue::new(None::<Predicate<&'static str>>);
    assert_eq!(source.listener_count(), 0);

    let mut view = IndexedView::new(&source);
    view.bind_filter(&values);
    assert_eq!(source.listener_count(), 1);
    assert_eq!(values.listener_count(), 1);

    view.dispose();
    assert_eq!(source.listener_count(), 0);
    assert_eq!(values.listener_count(), 0);

    // The source keeps working on its own.
    source.push("F");
    assert_eq!(source.len(), 6);
}

#[test]
fn view_outlives_the_owners_handle() {
    let view = {
        let source = letters();
        IndexedView::builder(&source).comparator(reverse).build()
    };
    assert_eq!(view.len(), 5);
    view.source().push("Z");
    assert_eq!(view.get_cloned(0), Ok("Z"));
}

#[test]
fn try_new_rejects_a_dropped_source() {
    let weak = {
        let source = letters();
        let weak = source.downgrade();
        let view = IndexedView::try_new(&weak).unwrap();
        assert_eq!(view.len(), 5);
        weak
    };
    assert_eq!(
        IndexedView::try_new(&weak).err(),
        Some(ViewError::SourceDropped)
    );
}

#[test]
fn filter_reading_the_view_does_not_recurse() {
    let source = letters();
    let slot: Rc<RefCell<Option<IndexedView<&'static str>>>> = Rc::new(RefCell::new(None));
    let calls = Rc::new(Cell::new(0));

    let mut view = IndexedView::new(&source);
    let reader = slot.clone();
    let counter = calls.clone();
    view.set_filter_fn(move |s: &&str| {
        counter.set(counter.get() + 1);
        // Reading the view mid-rebuild returns the previous mapping.
        if let Ok(guard) = reader.try_borrow()
            && let Some(view) = guard.as_ref()
        {
            let _ = view.len();
        }
        *s != "D"
    });
    *slot.borrow_mut() = Some(view);

    calls.set(0);
    source.push("F");
    // One filter call per source item: the nested reads never rebuilt.
    assert_eq!(calls.get(), 6);
    let view = slot.borrow_mut().take().unwrap();
    assert_eq!(view.to_vec(), ["A", "B", "C", "E", "F"]);
}

#[test]
fn panicking_source_sort_keeps_view_consistent() {
    let source = letters();
    let view = IndexedView::builder(&source).comparator(reverse).build();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        source.sort_by(|_, _| panic!("comparator failed"));
    }));

    assert!(result.is_err());
    assert_eq!(source.len(), 5);
    assert_eq!(view.to_vec(), ["E", "D", "C", "B", "A"]);
    assert_invariants(&view);
}

#[test]
fn for_each_may_write_a_bound_filter() {
    let source: ObservableVec<u32> = (1..=4).collect();
    let mut view = IndexedView::new(&source);
    let filter: ObservableValue<Option<Predicate<u32>>> = ObservableValue::new(None);
    view.bind_filter(&filter);

    let mut visited = Vec::new();
    view.for_each(|_, v| {
        visited.push(*v);
        if *v == 2 {
            filter.replace(Some(Rc::new(|v: &u32| v % 2 == 0)));
        }
    });

    // The walk finishes over the order it started with.
    assert_eq!(visited, [1, 2, 3, 4]);
    assert_eq!(view.to_vec(), [2, 4]);
    assert_invariants(&view);
}

/// Item whose equality runs a hook, so that `index_of` calls back out.
#[derive(Clone)]
struct Hooked {
    key: u32,
    on_eq: Rc<dyn Fn()>,
}

impl PartialEq for Hooked {
    fn eq(&self, other: &Self) -> bool {
        (self.on_eq)();
        self.key == other.key
    }
}

#[test]
fn equality_may_write_a_bound_filter() {
    let filter: ObservableValue<Option<Predicate<Hooked>>> = ObservableValue::new(None);
    let writer = filter.clone();
    let hook: Rc<dyn Fn()> = Rc::new(move || {
        writer.replace(Some(Rc::new(|item: &Hooked| item.key != 1)));
    });
    let source: ObservableVec<Hooked> = (1..=4)
        .map(|key| Hooked {
            key,
            on_eq: hook.clone(),
        })
        .collect();
    let mut view = IndexedView::new(&source);
    view.bind_filter(&filter);

    let needle = Hooked {
        key: 3,
        on_eq: Rc::new(|| {}),
    };
    assert!(view.index_of(&needle).is_some());
    assert_eq!(view.len(), 3);
    assert_eq!(view.index_of(&needle), Some(1));
}

#[test]
fn filter_writing_its_own_binding_settles() {
    let source = letters();
    let mut view = IndexedView::new(&source);
    let binding: ObservableValue<Option<Predicate<&'static str>>> = ObservableValue::new(None);
    let calls = Rc::new(Cell::new(0));

    let writer = binding.clone();
    let counter = calls.clone();
    let filter: Predicate<&'static str> = Rc::new(move |s: &&str| {
        counter.set(counter.get() + 1);
        writer.replace(writer.get());
        *s != "C"
    });
    binding.replace(Some(filter));
    view.bind_filter(&binding);

    calls.set(0);
    source.push("F");

    // One pass over six items, then four restarts before the view settles.
    assert_eq!(calls.get(), 30);
    assert_eq!(view.to_vec(), ["A", "B", "D", "E", "F"]);
    assert_invariants(&view);
}

#[test]
fn debug_output_is_current_inside_earlier_source_listeners() {
    let source = letters();
    let slot: Rc<RefCell<Option<IndexedView<&'static str>>>> = Rc::new(RefCell::new(None));
    let printed = Rc::new(RefCell::new(String::new()));

    let reader = slot.clone();
    let sink = printed.clone();
    let _early = source.subscribe(move |_| {
        if let Some(view) = reader.borrow().as_ref() {
            *sink.borrow_mut() = format!("{view:?}");
        }
    });
    *slot.borrow_mut() = Some(IndexedView::new(&source));

    source.push("F");
    assert!(printed.borrow().contains("source_len: 6, view_len: 6"));
}
