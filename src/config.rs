/// How an arena obtains slots once its free list runs dry.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Growth {
    /// Never allocate after construction. Inserting into a full arena fails with
    /// [`Error::Insert`](crate::Error::Insert), which keeps every operation allocation-free.
    Fixed,

    /// Double the capacity (starting from [`ArenaConfig::MIN_GROWTH`] slots) through fallible
    /// reservation.
    #[default]
    Double,
}

/// Capacity settings for arena-backed containers.
///
/// ```
/// use wavl_engine::{ArenaConfig, Growth, HandleMap};
///
/// let config = ArenaConfig::new().initial_capacity(2).growth(Growth::Fixed);
/// let mut map: HandleMap<u32, &str> = HandleMap::with_config(config);
///
/// assert!(map.insert(1, "a").is_vacant());
/// assert!(map.insert(2, "b").is_vacant());
/// assert!(map.insert(3, "c").is_insert_error());
/// assert_eq!(map.len(), 2);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    pub(crate) initial_capacity: usize,
    pub(crate) growth: Growth,
    pub(crate) max_capacity: Option<usize>,
}

impl ArenaConfig {
    /// The capacity a growable arena jumps to from zero.
    pub const MIN_GROWTH: usize = 8;

    /// The largest capacity any arena supports; slot indices are 32 bits wide and slot 0 is
    /// reserved.
    pub const MAX_CAPACITY: usize = u32::MAX as usize - 1;

    pub const fn new() -> Self {
        ArenaConfig {
            initial_capacity: 0,
            growth: Growth::Double,
            max_capacity: None,
        }
    }

    /// Sets the number of slots reserved at construction.
    #[must_use]
    pub const fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    #[must_use]
    pub const fn growth(mut self, growth: Growth) -> Self {
        self.growth = growth;
        self
    }

    /// Caps the capacity the arena may grow to.
    #[must_use]
    pub const fn max_capacity(mut self, max: usize) -> Self {
        self.max_capacity = Some(max);
        self
    }

    /// Returns the capacity limit in effect.
    pub(crate) fn limit(&self) -> usize {
        match self.max_capacity {
            Some(max) if max < Self::MAX_CAPACITY => max,
            _ => Self::MAX_CAPACITY,
        }
    }

    /// Returns the capacity to grow to from `current`, or `None` if no growth is allowed.
    pub(crate) fn next_capacity(&self, current: usize) -> Option<usize> {
        if self.growth == Growth::Fixed || current >= self.limit() {
            return None;
        }

        let doubled = current.saturating_mul(2).max(Self::MIN_GROWTH);
        Some(doubled.min(self.limit()))
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubling_starts_at_minimum() {
        let config = ArenaConfig::new();
        assert_eq!(config.next_capacity(0), Some(ArenaConfig::MIN_GROWTH));
        assert_eq!(config.next_capacity(8), Some(16));
        assert_eq!(config.next_capacity(1000), Some(2000));
    }

    #[test]
    fn fixed_never_grows() {
        let config = ArenaConfig::new().growth(Growth::Fixed).initial_capacity(4);
        assert_eq!(config.next_capacity(4), None);
        assert_eq!(config.next_capacity(0), None);
    }

    #[test]
    fn growth_respects_limit() {
        let config = ArenaConfig::new().max_capacity(20);
        assert_eq!(config.next_capacity(8), Some(16));
        assert_eq!(config.next_capacity(16), Some(20));
        assert_eq!(config.next_capacity(20), None);
    }
}
