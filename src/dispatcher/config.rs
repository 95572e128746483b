use crate::record::Record;

/// Cost added when a trip is extended.
pub const DEFAULT_SURCHARGE: u64 = 10;

/// A trip may grow to at most this multiple of its current duration.
pub const DEFAULT_GROWTH_LIMIT: u64 = 2;

/// Tuning knobs for a [`Dispatcher`](super::Dispatcher).
///
/// # Examples
///
/// ```
/// use ride_dispatch::{DispatchConfig, Record};
///
/// let config = DispatchConfig::default();
/// let ride = Record::new(7, 10, 10);
///
/// // Shorter or equal trips keep their cost.
/// assert_eq!(config.reschedule(&ride, 8), Some(Record::new(7, 10, 8)));
/// // Longer trips pay the surcharge.
/// assert_eq!(config.reschedule(&ride, 15), Some(Record::new(7, 20, 15)));
/// // More than twice as long and the ride is dropped.
/// assert_eq!(config.reschedule(&ride, 21), None);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct DispatchConfig {
    /// Records to reserve room for up front.
    pub capacity: usize,
    /// Cost added when an update lengthens a trip.
    pub surcharge: u64,
    /// An update longer than `growth_limit` times the current duration drops the ride.
    pub growth_limit: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capacity: 0,
            surcharge: DEFAULT_SURCHARGE,
            growth_limit: DEFAULT_GROWTH_LIMIT,
        }
    }

    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use]
    pub const fn with_surcharge(mut self, surcharge: u64) -> Self {
        self.surcharge = surcharge;
        self
    }

    #[must_use]
    pub const fn with_growth_limit(mut self, growth_limit: u64) -> Self {
        self.growth_limit = growth_limit;
        self
    }

    /// Applies the trip-update rule to `record`.
    ///
    /// Returns `None` if `new_duration` exceeds `growth_limit` times the
    /// current duration. Otherwise returns the replacement record: same ride
    /// number, `new_duration`, and the current cost plus `surcharge` if the
    /// trip got longer.
    #[must_use]
    pub const fn reschedule(&self, record: &Record, new_duration: u64) -> Option<Record> {
        if new_duration > record.duration.saturating_mul(self.growth_limit) {
            return None;
        }
        let cost = if new_duration <= record.duration {
            record.cost
        } else {
            record.cost.saturating_add(self.surcharge)
        };
        Some(Record::new(record.id, cost, new_duration))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn boundary_of_the_growth_limit_is_kept() {
        let config = DispatchConfig::new();
        let ride = Record::new(1, 4, 15);
        assert_eq!(config.reschedule(&ride, 30), Some(Record::new(1, 14, 30)));
        assert_eq!(config.reschedule(&ride, 31), None);
    }

    #[test]
    fn unchanged_duration_keeps_cost() {
        let config = DispatchConfig::new();
        assert_eq!(config.reschedule(&Record::new(1, 4, 15), 15), Some(Record::new(1, 4, 15)));
    }

    #[test]
    fn zero_duration_only_allows_zero() {
        let config = DispatchConfig::new();
        let ride = Record::new(1, 4, 0);
        assert_eq!(config.reschedule(&ride, 0), Some(ride));
        assert_eq!(config.reschedule(&ride, 1), None);
    }

    #[test]
    fn knobs_are_applied() {
        let config = DispatchConfig::new().with_surcharge(3).with_growth_limit(5).with_capacity(64);
        assert_eq!(config.capacity, 64);
        let ride = Record::new(2, 10, 10);
        assert_eq!(config.reschedule(&ride, 50), Some(Record::new(2, 13, 50)));
        assert_eq!(config.reschedule(&ride, 51), None);
    }

    #[test]
    fn arithmetic_saturates() {
        let config = DispatchConfig::new();
        let ride = Record::new(3, u64::MAX, u64::MAX / 2 + 1);
        assert_eq!(config.reschedule(&ride, u64::MAX), Some(Record::new(3, u64::MAX, u64::MAX)));
    }
}
