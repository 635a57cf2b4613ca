//! Order-preserving de-duplication used when merging per-participant lists.

use std::collections::HashSet;
use std::hash::Hash;

/// Returns `items` with later duplicates removed, keeping first-occurrence order.
pub fn uniqify<T>(items: impl IntoIterator<Item = T>) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            unique.push(item);
        }
    }
    unique
}
