//! Order reconciliation for dense, zero-based item sequences.
//!
//! Every function here keeps the invariant that a settled collection of N
//! items carries the orders `0..N-1` exactly once each, and leaves the slice
//! sorted by order ascending. They are pure so the optimistic local path and
//! the rollback path share one implementation; a rejected move is undone by
//! moving the item back.

#[cfg(test)]
#[path = "order_test.rs"]
mod order_test;

use crate::item::{ItemId, OrderedItem};

/// Move `id` to `new_order`, shifting every sibling in the crossed interval by one.
///
/// Returns the previous order, or `None` if `id` is not present. The caller is
/// responsible for bounds-checking `new_order` against `items.len()`.
pub fn move_item<T: OrderedItem>(items: &mut [T], id: ItemId, new_order: usize) -> Option<usize> {
    let old_order = items.iter().find(|item| item.id() == id)?.order();

    for item in items.iter_mut() {
        if item.id() == id {
            item.set_order(new_order);
            continue;
        }
        let order = item.order();
        if new_order > old_order && order > old_order && order <= new_order {
            item.set_order(order - 1);
        } else if new_order < old_order && order >= new_order && order < old_order {
            item.set_order(order + 1);
        }
    }

    sort(items);
    Some(old_order)
}

/// Remove `id` and close the gap it leaves. Returns the removed item.
pub fn remove_item<T: OrderedItem>(items: &mut Vec<T>, id: ItemId) -> Option<T> {
    let index = items.iter().position(|item| item.id() == id)?;
    let removed = items.remove(index);
    let removed_order = removed.order();

    for item in items.iter_mut() {
        if item.order() > removed_order {
            item.set_order(item.order() - 1);
        }
    }

    sort(items);
    Some(removed)
}

/// Insert `item` at its own order, opening a slot by shifting later siblings.
///
/// Orders past the end are clamped to `items.len()` so the sequence stays dense.
/// Returns the order the item was placed at.
pub fn insert_item<T: OrderedItem>(items: &mut Vec<T>, mut item: T) -> usize {
    let at = item.order().min(items.len());
    item.set_order(at);

    for sibling in items.iter_mut() {
        if sibling.order() >= at {
            sibling.set_order(sibling.order() + 1);
        }
    }

    items.push(item);
    sort(items);
    at
}

/// Sort ascending by order. Stable, so ties keep their relative position.
pub fn sort<T: OrderedItem>(items: &mut [T]) {
    items.sort_by_key(OrderedItem::order);
}

/// `true` if the orders are exactly `0..N-1`.
#[must_use]
pub fn is_dense<T: OrderedItem>(items: &[T]) -> bool {
    let mut seen = vec![false; items.len()];
    for item in items {
        match seen.get_mut(item.order()) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}
