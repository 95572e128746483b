//! The operation surface that drives the ordered index and the priority store together.

use alloc::vec::Vec;

use tracing::debug;

use crate::error::Error;
use crate::ordered_index::{self, NodeHandle, OrderedIndex};
use crate::priority_store::PriorityStore;
use crate::record::Record;

mod config;

pub use config::{DEFAULT_GROWTH_LIMIT, DEFAULT_SURCHARGE, DispatchConfig};

/// What [`Dispatcher::update_priority`] did with the ride.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Update {
    /// No live ride had that number.
    Missing,
    /// The new duration broke the growth limit; the ride is gone.
    Dropped(Record),
    /// The ride was reinserted with this record.
    Rescheduled(Record),
}

/// A set of pending rides indexed both by ride number and by priority.
///
/// Every live ride has exactly one node in an [`OrderedIndex`] and exactly
/// one slot in a [`PriorityStore`], and each side holds the handle of the
/// other. Every operation leaves both structures and both back-references
/// consistent before it returns.
///
/// # Examples
///
/// ```
/// use ride_dispatch::{Dispatcher, Error, Record};
///
/// let mut rides = Dispatcher::new();
/// rides.insert(Record::new(1, 5, 10)).unwrap();
/// rides.insert(Record::new(2, 3, 20)).unwrap();
/// rides.insert(Record::new(3, 3, 5)).unwrap();
///
/// assert_eq!(rides.lookup(2), Some(Record::new(2, 3, 20)));
/// assert_eq!(rides.extract_next(), Ok(Record::new(3, 3, 5)));
/// assert_eq!(rides.extract_next(), Ok(Record::new(2, 3, 20)));
/// assert_eq!(rides.extract_next(), Ok(Record::new(1, 5, 10)));
/// assert_eq!(rides.extract_next(), Err(Error::EmptyStore));
/// ```
///
/// The dispatcher is single-writer: it is `Send` but every operation takes
/// `&mut self`, so a shared instance has to be serialized externally.
#[derive(Clone, Debug, Default)]
pub struct Dispatcher {
    index: OrderedIndex,
    store: PriorityStore,
    config: DispatchConfig,
}

impl Dispatcher {
    /// Creates an empty dispatcher with the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            index: OrderedIndex::new(),
            store: PriorityStore::new(),
            config: DispatchConfig::new(),
        }
    }

    /// Creates an empty dispatcher tuned by `config`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ride_dispatch::{DispatchConfig, Dispatcher};
    ///
    /// let rides = Dispatcher::with_config(DispatchConfig::new().with_capacity(2_005));
    /// assert!(rides.capacity() >= 2_005);
    /// ```
    #[must_use]
    pub fn with_config(config: DispatchConfig) -> Self {
        Self {
            index: OrderedIndex::with_capacity(config.capacity),
            store: PriorityStore::with_capacity(config.capacity),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Returns the number of rides both structures can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.index.capacity().min(self.store.capacity())
    }

    /// Returns the number of pending rides.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no rides are pending.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Drops every pending ride.
    pub fn clear(&mut self) {
        self.index.clear();
        self.store.clear();
    }

    /// Returns the ride [`extract_next`](Self::extract_next) would hand out.
    #[must_use]
    pub fn peek_next(&self) -> Option<Record> {
        self.store.peek().copied()
    }

    /// Adds a ride.
    ///
    /// The ordered index is updated first, so a duplicate ride number is
    /// rejected before the priority store is touched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if the ride number is already pending.
    /// Both structures are unchanged in that case.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, record: Record) -> Result<(), Error> {
        let slot = self.store.next_handle();
        let node = self.index.insert(record, slot)?;
        let placed = self.store.insert(record, node);
        debug_assert_eq!(placed, slot, "priority store handed out an unexpected slot");

        debug!(ride = %record, "inserted");
        Ok(())
    }

    /// Removes and returns the cheapest pending ride (shortest trip on ties).
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyStore`] if no rides are pending.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn extract_next(&mut self) -> Result<Record, Error> {
        let (record, node) = self.store.extract_min()?;
        self.index.delete(node)?;

        debug!(ride = %record, "dispatched");
        Ok(record)
    }

    /// Returns the pending ride numbered `id`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn lookup(&self, id: u64) -> Option<Record> {
        let node = self.index.search(id)?;
        self.index.get(node).copied()
    }

    /// Returns the pending rides numbered `lo..=hi`, in ascending order.
    ///
    /// # Complexity
    ///
    /// O(log n + k) for k matching rides.
    #[must_use]
    pub fn lookup_range(&self, lo: u64, hi: u64) -> Vec<Record> {
        self.index.search_range(lo, hi)
    }

    /// Cancels the pending ride numbered `id` and returns it.
    ///
    /// An unknown ride number is not an error: nothing happens and `Ok(None)`
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandle`] or [`Error::InvalidPosition`] only if
    /// the two structures have fallen out of step.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn cancel(&mut self, id: u64) -> Result<Option<Record>, Error> {
        let Some(node) = self.index.search(id) else {
            return Ok(None);
        };
        let record = self.detach(node)?;

        debug!(ride = %record, "cancelled");
        Ok(Some(record))
    }

    /// Changes the trip duration of the pending ride numbered `id`.
    ///
    /// The ride is removed from both structures. If `new_duration` is beyond
    /// the configured growth limit the ride stays removed; otherwise it is
    /// reinserted under the same number with the repriced record (see
    /// [`DispatchConfig::reschedule`]).
    ///
    /// # Examples
    ///
    /// ```
    /// use ride_dispatch::{Dispatcher, Record, Update};
    ///
    /// let mut rides = Dispatcher::new();
    /// rides.insert(Record::new(7, 10, 10)).unwrap();
    ///
    /// assert_eq!(rides.update_priority(7, 15), Ok(Update::Rescheduled(Record::new(7, 20, 15))));
    /// assert_eq!(rides.update_priority(7, 31), Ok(Update::Dropped(Record::new(7, 20, 15))));
    /// assert_eq!(rides.lookup(7), None);
    /// assert_eq!(rides.update_priority(7, 1), Ok(Update::Missing));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandle`] or [`Error::InvalidPosition`] only if
    /// the two structures have fallen out of step.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn update_priority(&mut self, id: u64, new_duration: u64) -> Result<Update, Error> {
        let Some(node) = self.index.search(id) else {
            return Ok(Update::Missing);
        };
        let current = self.detach(node)?;

        let Some(next) = self.config.reschedule(&current, new_duration) else {
            debug!(ride = %current, new_duration, "dropped: trip grew past the limit");
            return Ok(Update::Dropped(current));
        };
        self.insert(next)?;

        debug!(from = %current, to = %next, "rescheduled");
        Ok(Update::Rescheduled(next))
    }

    /// Returns an iterator over the pending rides in ascending ride-number order.
    pub fn iter(&self) -> ordered_index::Iter<'_> {
        self.index.iter()
    }

    // Removes `node` from both structures. The heap position is read before
    // either side changes.
    fn detach(&mut self, node: NodeHandle) -> Result<Record, Error> {
        let slot = self.index.slot(node).ok_or(Error::InvalidHandle)?;
        let position = self.store.position(slot).ok_or(Error::InvalidHandle)?;

        let record = self.index.delete(node)?;
        self.store.remove_at(position)?;
        Ok(record)
    }
}

impl<'a> IntoIterator for &'a Dispatcher {
    type Item = &'a Record;
    type IntoIter = ordered_index::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::manual_assert, clippy::uninlined_format_args)]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use alloc::vec;
    use proptest::prelude::*;

    impl Dispatcher {
        /// Validates both structures and the cross-references between them.
        pub(crate) fn validate_invariants(&self) {
            self.index.validate_invariants();
            self.store.validate_positions();
            assert_eq!(self.index.len(), self.store.len(), "index and store sizes differ");

            for record in &self.index {
                let node = self.index.search(record.id).expect("walked record must be searchable");
                let slot = self.index.slot(node).expect("live node must have a slot");
                assert_eq!(self.store.get(slot), Some(record), "slot of ride {} holds another record", record.id);
                assert_eq!(self.store.node(slot), Some(node), "slot of ride {} points at another node", record.id);
            }
        }
    }

    #[test]
    fn extraction_breaks_cost_ties_on_duration() {
        let mut rides = Dispatcher::new();
        for ride in [(1u64, 5u64, 10u64), (2, 3, 20), (3, 3, 5)] {
            rides.insert(ride.into()).unwrap();
            rides.validate_invariants();
        }

        assert_eq!(rides.extract_next(), Ok(Record::new(3, 3, 5)));
        rides.validate_invariants();
        assert_eq!(rides.extract_next(), Ok(Record::new(2, 3, 20)));
        assert_eq!(rides.extract_next(), Ok(Record::new(1, 5, 10)));
        rides.validate_invariants();
        assert_eq!(rides.extract_next(), Err(Error::EmptyStore));
        assert!(rides.is_empty());
    }

    #[test]
    fn insert_lookup_cancel_round_trip() {
        let mut rides = Dispatcher::new();
        rides.insert(Record::new(42, 8, 16)).unwrap();
        assert_eq!(rides.lookup(42), Some(Record::new(42, 8, 16)));

        assert_eq!(rides.cancel(42), Ok(Some(Record::new(42, 8, 16))));
        rides.validate_invariants();
        assert_eq!(rides.lookup(42), None);
        assert_eq!(rides.cancel(42), Ok(None));
    }

    #[test]
    fn duplicate_insert_leaves_both_structures_alone() {
        let mut rides = Dispatcher::new();
        rides.insert(Record::new(1, 5, 5)).unwrap();
        assert_eq!(rides.insert(Record::new(1, 0, 0)), Err(Error::DuplicateKey { id: 1 }));
        rides.validate_invariants();

        assert_eq!(rides.len(), 1);
        assert_eq!(rides.lookup(1), Some(Record::new(1, 5, 5)));
        assert_eq!(rides.peek_next(), Some(Record::new(1, 5, 5)));
    }

    #[test]
    fn update_reprices_then_drops() {
        let mut rides = Dispatcher::new();
        rides.insert(Record::new(7, 10, 10)).unwrap();

        assert_eq!(rides.update_priority(7, 15), Ok(Update::Rescheduled(Record::new(7, 20, 15))));
        rides.validate_invariants();
        assert_eq!(rides.lookup(7), Some(Record::new(7, 20, 15)));

        // 25 is within twice 15, so the ride survives with another surcharge.
        assert_eq!(rides.update_priority(7, 25), Ok(Update::Rescheduled(Record::new(7, 30, 25))));

        assert_eq!(rides.update_priority(7, 51), Ok(Update::Dropped(Record::new(7, 30, 25))));
        rides.validate_invariants();
        assert_eq!(rides.lookup(7), None);
        assert!(rides.is_empty());
    }

    #[test]
    fn shorter_trip_keeps_cost_and_moves_up() {
        let mut rides = Dispatcher::new();
        rides.insert(Record::new(1, 10, 30)).unwrap();
        rides.insert(Record::new(2, 10, 20)).unwrap();
        assert_eq!(rides.peek_next(), Some(Record::new(2, 10, 20)));

        rides.update_priority(1, 5).unwrap();
        rides.validate_invariants();
        assert_eq!(rides.peek_next(), Some(Record::new(1, 10, 5)));
    }

    #[test]
    fn unknown_ids_are_silent() {
        let mut rides = Dispatcher::new();
        rides.insert(Record::new(1, 1, 1)).unwrap();
        assert_eq!(rides.cancel(2), Ok(None));
        assert_eq!(rides.update_priority(2, 10), Ok(Update::Missing));
        rides.validate_invariants();
        assert_eq!(rides.len(), 1);
    }

    #[test]
    fn range_lookup_is_ascending() {
        let mut rides = Dispatcher::new();
        for id in [5, 1, 9, 3, 7] {
            rides.insert(Record::new(id, id, id)).unwrap();
        }
        let ids: Vec<u64> = rides.lookup_range(2, 8).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 5, 7]);
        assert!(rides.lookup_range(10, 20).is_empty());
    }

    #[test]
    fn custom_surcharge_and_limit() {
        let mut rides = Dispatcher::with_config(DispatchConfig::new().with_surcharge(1).with_growth_limit(3));
        rides.insert(Record::new(1, 0, 10)).unwrap();
        assert_eq!(rides.update_priority(1, 30), Ok(Update::Rescheduled(Record::new(1, 1, 30))));
        assert_eq!(rides.update_priority(1, 91), Ok(Update::Dropped(Record::new(1, 1, 30))));
        assert_eq!(rides.config().surcharge, 1);
    }

    #[test]
    fn clear_resets_both_sides() {
        let mut rides = Dispatcher::new();
        for id in 0..10 {
            rides.insert(Record::new(id, id, id)).unwrap();
        }
        rides.clear();
        rides.validate_invariants();
        assert!(rides.is_empty());
        assert_eq!(rides.extract_next(), Err(Error::EmptyStore));
        rides.insert(Record::new(3, 3, 3)).unwrap();
        rides.validate_invariants();
    }

    #[derive(Clone, Debug)]
    enum Mutation {
        Insert(u64, u64, u64),
        Cancel(u64),
        Update(u64, u64),
    }

    #[derive(Clone, Debug)]
    enum Op {
        Mutate(Mutation),
        Extract,
    }

    fn mutation_strategy() -> impl Strategy<Value = Mutation> {
        prop_oneof![
            5 => (1u64..300, 0u64..100, 1u64..100).prop_map(|(id, cost, duration)| Mutation::Insert(id, cost, duration)),
            2 => (1u64..300).prop_map(Mutation::Cancel),
            2 => (1u64..300, 0u64..250).prop_map(|(id, duration)| Mutation::Update(id, duration)),
        ]
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            9 => mutation_strategy().prop_map(Op::Mutate),
            1 => Just(Op::Extract),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn structures_stay_in_lockstep(ops in prop::collection::vec(mutation_strategy(), 1_000)) {
            let mut rides = Dispatcher::new();
            let mut model: BTreeMap<u64, Record> = BTreeMap::new();
            let config = DispatchConfig::new();

            for op in ops {
                match op {
                    Mutation::Insert(id, cost, duration) => {
                        let record = Record::new(id, cost, duration);
                        let result = rides.insert(record);
                        if model.contains_key(&id) {
                            prop_assert_eq!(result, Err(Error::DuplicateKey { id }));
                        } else {
                            prop_assert_eq!(result, Ok(()));
                            model.insert(id, record);
                        }
                    }
                    Mutation::Cancel(id) => {
                        prop_assert_eq!(rides.cancel(id), Ok(model.remove(&id)));
                    }
                    Mutation::Update(id, duration) => {
                        let expected = match model.remove(&id) {
                            None => Update::Missing,
                            Some(current) => match config.reschedule(&current, duration) {
                                None => Update::Dropped(current),
                                Some(next) => {
                                    model.insert(id, next);
                                    Update::Rescheduled(next)
                                }
                            },
                        };
                        prop_assert_eq!(rides.update_priority(id, duration), Ok(expected));
                    }
                }

                rides.validate_invariants();
                prop_assert_eq!(rides.len(), model.len());
            }

            let walked: Vec<Record> = rides.iter().copied().collect();
            let expected: Vec<Record> = model.values().copied().collect();
            prop_assert_eq!(walked, expected);
        }

        #[test]
        fn every_operation_keeps_cross_references(ops in prop::collection::vec(op_strategy(), 0..400)) {
            let mut rides = Dispatcher::new();
            let mut model: BTreeMap<u64, Record> = BTreeMap::new();

            for op in ops {
                match op {
                    Op::Mutate(Mutation::Insert(id, cost, duration)) => {
                        if rides.insert(Record::new(id, cost, duration)).is_ok() {
                            model.insert(id, Record::new(id, cost, duration));
                        }
                    }
                    Op::Mutate(Mutation::Cancel(id)) => {
                        rides.cancel(id).unwrap();
                        model.remove(&id);
                    }
                    Op::Mutate(Mutation::Update(id, duration)) => {
                        match rides.update_priority(id, duration).unwrap() {
                            Update::Rescheduled(next) => {
                                model.insert(id, next);
                            }
                            Update::Dropped(_) | Update::Missing => {
                                model.remove(&id);
                            }
                        }
                    }
                    Op::Extract => match rides.extract_next() {
                        Ok(record) => prop_assert_eq!(model.remove(&record.id), Some(record)),
                        Err(err) => {
                            prop_assert_eq!(err, Error::EmptyStore);
                            prop_assert!(model.is_empty());
                        }
                    },
                }

                rides.validate_invariants();
                for (&id, record) in &model {
                    prop_assert_eq!(rides.lookup(id), Some(*record));
                }
            }
        }

        #[test]
        fn insert_only_states_drain_in_priority_order(
            rides_in in prop::collection::btree_map(1u64..10_000, (0u64..50, 0u64..50), 0..300),
        ) {
            let mut rides = Dispatcher::new();
            for (&id, &(cost, duration)) in &rides_in {
                rides.insert(Record::new(id, cost, duration)).unwrap();
            }
            rides.store.validate_invariants();

            let mut previous = None;
            while let Ok(record) = rides.extract_next() {
                rides.validate_invariants();
                rides.store.validate_invariants();
                if let Some(previous) = previous {
                    prop_assert!(previous <= record.priority());
                }
                previous = Some(record.priority());
            }
            prop_assert!(rides.is_empty());
        }
    }
}
