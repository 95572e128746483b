//! Ride records and their dispatch priority.

use core::fmt;

/// A ride request: a unique ride number, its cost, and its trip duration.
///
/// Records display as `(id,cost,duration)`. The default record displays as
/// `(0,0,0)`, which is what a lookup that finds nothing reports.
///
/// # Examples
///
/// ```
/// use ride_dispatch::Record;
///
/// let ride = Record::new(7, 10, 25);
/// assert_eq!(ride.to_string(), "(7,10,25)");
/// assert_eq!(Record::default().to_string(), "(0,0,0)");
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Record {
    /// The ride number. Unique among live records.
    pub id: u64,
    /// The ride cost; the major priority component.
    pub cost: u64,
    /// The trip duration; breaks ties between equal costs.
    pub duration: u64,
}

impl Record {
    #[must_use]
    pub const fn new(id: u64, cost: u64, duration: u64) -> Self {
        Self { id, cost, duration }
    }

    /// Returns the dispatch priority of this record.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        Priority {
            cost: self.cost,
            duration: self.duration,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.id, self.cost, self.duration)
    }
}

impl From<(u64, u64, u64)> for Record {
    fn from((id, cost, duration): (u64, u64, u64)) -> Self {
        Self::new(id, cost, duration)
    }
}

/// The ordering key of the priority store.
///
/// Smaller is dispatched first: the cheaper ride wins, and between equally
/// cheap rides the shorter trip wins. The derived [`Ord`] compares `cost`
/// before `duration`.
///
/// # Examples
///
/// ```
/// use ride_dispatch::Record;
///
/// let short = Record::new(3, 3, 5).priority();
/// let long = Record::new(2, 3, 20).priority();
/// let pricey = Record::new(1, 5, 1).priority();
/// assert!(short < long);
/// assert!(long < pricey);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Priority {
    pub cost: u64,
    pub duration: u64,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use proptest::prelude::*;

    #[test]
    fn cost_dominates_duration() {
        assert!(Record::new(1, 4, 1_000).priority() < Record::new(2, 5, 0).priority());
    }

    #[test]
    fn equal_priorities_compare_equal() {
        assert_eq!(Record::new(1, 4, 9).priority(), Record::new(2, 4, 9).priority());
    }

    #[test]
    fn display_has_no_spaces() {
        assert_eq!(Record::new(12, 0, 345).to_string(), "(12,0,345)");
    }

    proptest! {
        #[test]
        fn priority_is_lexicographic(a in any::<(u64, u64)>(), b in any::<(u64, u64)>()) {
            let left = Record::new(1, a.0, a.1).priority();
            let right = Record::new(2, b.0, b.1).priority();
            prop_assert_eq!(left.cmp(&right), a.cmp(&b));
        }
    }
}
