use crate::index::SearchResult;
use std::cmp::Ordering;

/// Orders two scored results. Must be a total order; a comparator that is
/// not leaves rankings unspecified (never unsafe).
pub trait Sorter: Send + Sync {
    fn compare(&self, a: &SearchResult, b: &SearchResult) -> Ordering;
}

impl<F> Sorter for F
where
    F: Fn(&SearchResult, &SearchResult) -> Ordering + Send + Sync,
{
    fn compare(&self, a: &SearchResult, b: &SearchResult) -> Ordering { self(a, b) }
}

/// Highest score first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByScoreSorter;

impl Sorter for ByScoreSorter {
    fn compare(&self, a: &SearchResult, b: &SearchResult) -> Ordering { b.score.cmp(&a.score) }
}

/// Inserts `value` into the already sorted `list`, after every entry that does
/// not compare greater than it, so equal entries keep insertion order.
/// Returns the position the value landed at.
pub fn ordered_insert<T, F>(list: &mut Vec<T>, value: T, mut compare: F) -> usize
where
    F: FnMut(&T, &T) -> Ordering,
{
    let idx = list.partition_point(|existing| compare(existing, &value) != Ordering::Greater);
    list.insert(idx, value);
    idx
}
