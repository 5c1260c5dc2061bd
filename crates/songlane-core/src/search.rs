//! Binary-search primitives over slices sorted ascending by a key.
//!
//! Every ordered container in the crate inserts at [`first_ge`] and looks up
//! neighbours with the `last_*` variants, so equal keys always form a
//! contiguous run.

/// Index of the first item whose key is `>= value`, or `items.len()`.
pub fn first_ge<T, K, F>(items: &[T], value: &K, key: F) -> usize
where
    K: PartialOrd,
    F: Fn(&T) -> K,
{
    items.partition_point(|item| key(item) < *value)
}

/// Index of the first item whose key is `> value`, or `items.len()`.
pub fn first_gt<T, K, F>(items: &[T], value: &K, key: F) -> usize
where
    K: PartialOrd,
    F: Fn(&T) -> K,
{
    items.partition_point(|item| key(item) <= *value)
}

/// Index of the last item whose key is `< value`.
pub fn last_lt<T, K, F>(items: &[T], value: &K, key: F) -> Option<usize>
where
    K: PartialOrd,
    F: Fn(&T) -> K,
{
    first_ge(items, value, key).checked_sub(1)
}

/// Index of the last item whose key is `<= value`.
pub fn last_le<T, K, F>(items: &[T], value: &K, key: F) -> Option<usize>
where
    K: PartialOrd,
    F: Fn(&T) -> K,
{
    first_gt(items, value, key).checked_sub(1)
}

/// Index of the first item whose key equals `value`.
pub fn exact<T, K, F>(items: &[T], value: &K, key: F) -> Option<usize>
where
    K: PartialOrd,
    F: Fn(&T) -> K,
{
    let index = first_ge(items, value, &key);
    items
        .get(index)
        .filter(|item| key(item) == *value)
        .map(|_| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SORTED: [i64; 6] = [1, 2, 3, 3, 4, 5];

    fn identity(value: &i64) -> i64 {
        *value
    }

    #[test]
    fn finds_successors() {
        assert_eq!(first_ge(&SORTED, &3, identity), 2);
        assert_eq!(first_gt(&SORTED, &3, identity), 4);
        assert_eq!(first_ge(&SORTED, &6, identity), 6);
        assert_eq!(first_ge(&SORTED, &0, identity), 0);
        assert_eq!(first_gt(&SORTED, &5, identity), 6);
    }

    #[test]
    fn finds_predecessors() {
        assert_eq!(last_le(&SORTED, &3, identity), Some(3));
        assert_eq!(last_lt(&SORTED, &3, identity), Some(1));
        assert_eq!(last_le(&SORTED, &0, identity), None);
        assert_eq!(last_lt(&SORTED, &1, identity), None);
        assert_eq!(last_le(&SORTED, &99, identity), Some(5));
    }

    #[test]
    fn exact_match_reports_first_of_run() {
        assert_eq!(exact(&SORTED, &3, identity), Some(2));
        assert_eq!(exact(&SORTED, &6, identity), None);
        assert_eq!(exact::<i64, i64, _>(&[], &1, identity), None);
    }

    #[test]
    fn search_by_projected_key() {
        let events = [(0_i64, "a"), (480, "b"), (960, "c")];
        assert_eq!(first_ge(&events, &500, |event| event.0), 2);
        assert_eq!(last_le(&events, &480, |event| event.0), Some(1));
    }
}
