use core::{cmp::Ordering, fmt};

/// A three-way order over keys.
///
/// Implementations must be a strict weak order that stays consistent for as long as a tree uses
/// them. Any state the comparison needs travels inside the comparator value itself.
pub trait Compare<K: ?Sized> {
    /// Compares `a` against `b`.
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> Compare<K> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// Orders keys with a closure, which may capture whatever context it needs.
///
/// ```
/// use wavl_engine::{HandleMap, OrderBy};
///
/// let mut map = HandleMap::with_compare(OrderBy(|a: &i32, b: &i32| b.cmp(a)));
/// let _ = map.insert(1, "one");
/// let _ = map.insert(2, "two");
///
/// let keys: Vec<i32> = map.iter().map(|(k, _)| *k).collect();
/// assert_eq!(keys, [2, 1]);
/// ```
#[derive(Copy, Clone, Default)]
pub struct OrderBy<F>(pub F);

impl<K, F> Compare<K> for OrderBy<F>
where
    K: ?Sized,
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        (self.0)(a, b)
    }
}

impl<F> fmt::Debug for OrderBy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OrderBy(..)")
    }
}

impl<K: ?Sized, C: Compare<K> + ?Sized> Compare<K> for &C {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        (**self).compare(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_order_matches_ord() {
        assert_eq!(NaturalOrder.compare(&1, &2), Ordering::Less);
        assert_eq!(NaturalOrder.compare("b", "a"), Ordering::Greater);
        assert_eq!(NaturalOrder.compare(&7u8, &7u8), Ordering::Equal);
    }

    #[test]
    fn order_by_uses_captured_context() {
        let modulus = 10;
        let by_last_digit = OrderBy(move |a: &u32, b: &u32| (a % modulus).cmp(&(b % modulus)));

        assert_eq!(by_last_digit.compare(&19, &21), Ordering::Greater);
        assert_eq!(by_last_digit.compare(&13, &3), Ordering::Equal);
        assert_eq!((&by_last_digit).compare(&0, &9), Ordering::Less);
    }
}
