//! A binary min-heap of ride records in which every slot knows its own position.

use alloc::vec::Vec;
use core::fmt;
use core::num::NonZero;

use crate::error::Error;
use crate::ordered_index::NodeHandle;
use crate::raw::{Arena, Handle};
use crate::record::{Priority, Record};

/// A stable reference to a slot of a [`PriorityStore`].
///
/// Sifting moves slots between heap positions but never changes their
/// handles, so an [`OrderedIndex`](crate::OrderedIndex) node can hold on to
/// one for as long as the record is live.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SlotHandle(pub(crate) Handle);

const TWO: NonZero<usize> = NonZero::<usize>::MIN.saturating_add(1);

/// A 1-based position in the heap array.
///
/// Position 1 is the root; the parent of `p` is `p / 2` and its children
/// are `2p` and `2p + 1`. There is no position 0.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Position(NonZero<usize>);

impl Position {
    /// The root of the heap.
    pub const ROOT: Self = Self(NonZero::<usize>::MIN);

    /// Returns the position `n`, or `None` for zero.
    #[must_use]
    pub const fn new(n: usize) -> Option<Self> {
        match NonZero::new(n) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// Returns the position as a 1-based number.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }

    #[inline]
    const fn index(self) -> usize {
        self.0.get() - 1
    }

    #[inline]
    fn parent(self) -> Option<Self> {
        Self::new(self.get() / 2)
    }

    #[inline]
    fn left(self) -> Self {
        Self(self.0.saturating_mul(TWO))
    }

    #[inline]
    fn right(self) -> Self {
        Self(self.left().0.saturating_add(1))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Clone, Debug)]
struct Slot {
    record: Record,
    // Always equal to the slot's current place in `heap`.
    position: Position,
    node: NodeHandle,
}

/// A min-heap ordered by [`Priority`], with O(1) position lookup per slot.
///
/// Slots are kept in an arena and the heap array holds their handles. Each
/// slot stores its current [`Position`] and a [`NodeHandle`] back to the
/// ordered index. A swap exchanges two handles in the heap array and
/// rewrites both stored positions; the handles themselves never change, so
/// the ordered index's back-references stay valid across every sift.
///
/// # Examples
///
/// ```
/// use ride_dispatch::{OrderedIndex, PriorityStore, Record};
///
/// let mut index = OrderedIndex::new();
/// let mut store = PriorityStore::new();
/// for ride in [Record::new(1, 5, 10), Record::new(2, 3, 20), Record::new(3, 3, 5)] {
///     let node = index.insert(ride, store.next_handle()).unwrap();
///     store.insert(ride, node);
/// }
///
/// let (next, node) = store.extract_min().unwrap();
/// assert_eq!(next, Record::new(3, 3, 5));
/// assert_eq!(index.get(node), Some(&next));
/// ```
#[derive(Clone, Debug)]
pub struct PriorityStore {
    slots: Arena<Slot>,
    // `heap[p.index()]` is the slot at position `p`.
    heap: Vec<Handle>,
}

impl Default for PriorityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Arena::new(),
            heap: Vec::new(),
        }
    }

    /// Creates an empty store with room for at least `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Arena::with_capacity(capacity),
            heap: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of records the store can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.heap.capacity()
    }

    /// Returns the number of occupied positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if no records are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Removes every record. All outstanding handles become stale.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.heap.clear();
    }

    /// Returns the handle the next [`insert`](Self::insert) will return.
    ///
    /// This lets a caller link the ordered index to a slot before the slot exists.
    #[must_use]
    pub fn next_handle(&self) -> SlotHandle {
        SlotHandle(self.slots.next_handle())
    }

    /// Returns the highest-priority record without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&Record> {
        self.heap.first().map(|&h| &self.slots.get(h).record)
    }

    /// Returns the record behind `slot`, or `None` if the handle is stale.
    #[must_use]
    pub fn get(&self, slot: SlotHandle) -> Option<&Record> {
        self.slots.try_get(slot.0).map(|s| &s.record)
    }

    /// Returns the current heap position of `slot`, or `None` if the handle is stale.
    #[must_use]
    pub fn position(&self, slot: SlotHandle) -> Option<Position> {
        self.slots.try_get(slot.0).map(|s| s.position)
    }

    /// Returns the ordered-index node linked to `slot`, or `None` if the handle is stale.
    #[must_use]
    pub fn node(&self, slot: SlotHandle) -> Option<NodeHandle> {
        self.slots.try_get(slot.0).map(|s| s.node)
    }

    /// Appends `record` at the next free position and sifts it up.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, record: Record, node: NodeHandle) -> SlotHandle {
        let position = Position(NonZero::<usize>::MIN.saturating_add(self.heap.len()));
        let handle = self.slots.alloc(Slot { record, position, node });
        self.heap.push(handle);
        self.sift_up(position);
        SlotHandle(handle)
    }

    /// Removes the highest-priority record and returns it with its ordered-index node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyStore`] if nothing is pending.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn extract_min(&mut self) -> Result<(Record, NodeHandle), Error> {
        if self.heap.is_empty() {
            return Err(Error::EmptyStore);
        }
        self.remove_at(Position::ROOT)
    }

    /// Removes the record at `position` and returns it with its ordered-index node.
    ///
    /// The last slot is swapped into `position` and then sifted down only.
    /// It is never sifted up, so a displaced slot that outranks its new
    /// parent stays below it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPosition`] if `position` is past the last occupied one.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn remove_at(&mut self, position: Position) -> Result<(Record, NodeHandle), Error> {
        let len = self.heap.len();
        if position.get() > len {
            return Err(Error::InvalidPosition { position, len });
        }

        let last = Position(NonZero::<usize>::MIN.saturating_add(len - 1));
        self.swap(position, last);

        let Some(handle) = self.heap.pop() else {
            return Err(Error::InvalidPosition { position, len });
        };
        let slot = self.slots.take(handle);

        if position.get() <= self.heap.len() {
            self.sift_down(position);
        }

        Ok((slot.record, slot.node))
    }

    #[inline]
    fn priority(&self, position: Position) -> Priority {
        self.slots.get(self.heap[position.index()]).record.priority()
    }

    /// Exchanges the slots at `a` and `b` and rewrites both stored positions.
    fn swap(&mut self, a: Position, b: Position) {
        if a == b {
            return;
        }
        self.heap.swap(a.index(), b.index());
        self.slots.get_mut(self.heap[a.index()]).position = a;
        self.slots.get_mut(self.heap[b.index()]).position = b;
    }

    fn sift_up(&mut self, mut position: Position) {
        while let Some(parent) = position.parent() {
            if self.priority(position) >= self.priority(parent) {
                break;
            }
            self.swap(position, parent);
            position = parent;
        }
    }

    fn sift_down(&mut self, mut position: Position) {
        let len = self.heap.len();
        loop {
            let left = position.left();
            if left.get() > len {
                break;
            }
            // A missing right child compares as the left one. Equal children resolve to the right.
            let right = position.right();
            let right = if right.get() > len { left } else { right };
            let smaller = if self.priority(left) < self.priority(right) { left } else { right };

            if self.priority(smaller) >= self.priority(position) {
                break;
            }
            self.swap(position, smaller);
            position = smaller;
        }
    }
}
