//! A red-black tree of ride records keyed by ride number.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::iter::FusedIterator;

use smallvec::SmallVec;

use crate::error::Error;
use crate::priority_store::SlotHandle;
use crate::raw::{Arena, Handle};
use crate::record::Record;

mod node;
mod rebalance;

use node::{Color, Node};

/// Stack depth that covers any red-black tree addressable by a 32-bit handle.
const STACK_DEPTH: usize = 64;

/// A stable reference to a node of an [`OrderedIndex`].
///
/// The handle stays valid while its node is live, regardless of how many
/// rotations move the node around the tree. Once the node is deleted the
/// handle is stale and the index rejects it with [`Error::InvalidHandle`]
/// (until the slot is reused by a later insertion).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NodeHandle(pub(crate) Handle);

/// A balanced ordered index over ride numbers.
///
/// Each node carries a full [`Record`] and a [`SlotHandle`] naming where the
/// same record sits in the [`PriorityStore`](crate::PriorityStore). The index
/// stores that back-reference but never follows it: keeping the two
/// structures in step is the [`Dispatcher`](crate::Dispatcher)'s job.
///
/// The tree follows the red-black discipline: the root is black, a red node
/// has no red child, and every root-to-leaf path crosses the same number of
/// black nodes. An absent child reads as black.
///
/// # Examples
///
/// ```
/// use ride_dispatch::{OrderedIndex, PriorityStore, Record};
///
/// let store = PriorityStore::new();
/// let slot = store.next_handle();
///
/// let mut index = OrderedIndex::new();
/// let node = index.insert(Record::new(5, 10, 20), slot).unwrap();
/// assert_eq!(index.search(5), Some(node));
/// assert_eq!(index.slot(node), Some(slot));
/// assert_eq!(index.delete(node), Ok(Record::new(5, 10, 20)));
/// assert!(index.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct OrderedIndex {
    nodes: Arena<Node>,
    root: Option<Handle>,
}

impl Default for OrderedIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderedIndex {
    /// Creates an empty index.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
        }
    }

    /// Creates an empty index with room for at least `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
        }
    }

    /// Returns the number of records the index can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Returns the number of live records.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the index holds no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Removes every record. All outstanding handles become stale.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Inserts `record`, linking it to `slot` in the priority store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if a record with the same ride number
    /// is already present. The index is left untouched in that case.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, record: Record, slot: SlotHandle) -> Result<NodeHandle, Error> {
        let mut parent = None;
        let mut goes_left = false;
        let mut current = self.root;

        while let Some(h) = current {
            let node = self.nodes.get(h);
            parent = Some(h);
            match record.id.cmp(&node.id()) {
                Ordering::Less => {
                    goes_left = true;
                    current = node.left;
                }
                Ordering::Greater => {
                    goes_left = false;
                    current = node.right;
                }
                Ordering::Equal => return Err(Error::DuplicateKey { id: record.id }),
            }
        }

        let mut node = Node::new(record, slot);
        node.parent = parent;
        let handle = self.nodes.alloc(node);

        match parent {
            None => self.root = Some(handle),
            Some(p) if goes_left => self.nodes.get_mut(p).left = Some(handle),
            Some(p) => self.nodes.get_mut(p).right = Some(handle),
        }

        self.insert_fixup(handle);
        Ok(NodeHandle(handle))
    }

    /// Unlinks the node behind `handle` and returns its record.
    ///
    /// A node with two children is replaced by its in-order successor, which
    /// is relinked into place together with its own slot back-reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandle`] if `handle` does not refer to a live node.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn delete(&mut self, handle: NodeHandle) -> Result<Record, Error> {
        let target = handle.0;
        if !self.nodes.contains(target) {
            return Err(Error::InvalidHandle);
        }

        let (left, right) = {
            let node = self.nodes.get(target);
            (node.left, node.right)
        };
        let mut removed_color = self.color(Some(target));
        let replacement;
        let replacement_parent;

        match (left, right) {
            (None, _) => {
                replacement = right;
                replacement_parent = self.parent(target);
                self.transplant(target, right);
            }
            (Some(_), None) => {
                replacement = left;
                replacement_parent = self.parent(target);
                self.transplant(target, left);
            }
            (Some(left), Some(right)) => {
                let successor = self.minimum(right);
                removed_color = self.color(Some(successor));
                replacement = self.nodes.get(successor).right;

                if self.parent(successor) == Some(target) {
                    replacement_parent = Some(successor);
                } else {
                    replacement_parent = self.parent(successor);
                    self.transplant(successor, replacement);
                    self.nodes.get_mut(successor).right = Some(right);
                    self.nodes.get_mut(right).parent = Some(successor);
                }

                self.transplant(target, Some(successor));
                self.nodes.get_mut(successor).left = Some(left);
                self.nodes.get_mut(left).parent = Some(successor);
                let target_color = self.color(Some(target));
                self.paint(Some(successor), target_color);
            }
        }

        if removed_color == Color::Black {
            self.delete_fixup(replacement, replacement_parent);
        }

        Ok(self.nodes.take(target).record)
    }

    /// Finds the node holding ride number `id`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn search(&self, id: u64) -> Option<NodeHandle> {
        let mut current = self.root;
        while let Some(h) = current {
            let node = self.nodes.get(h);
            current = match id.cmp(&node.id()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(NodeHandle(h)),
            };
        }
        None
    }

    /// Returns the record behind `handle`, or `None` if the handle is stale.
    #[must_use]
    pub fn get(&self, handle: NodeHandle) -> Option<&Record> {
        self.nodes.try_get(handle.0).map(|node| &node.record)
    }

    /// Returns the priority-store slot linked to `handle`, or `None` if the handle is stale.
    #[must_use]
    pub fn slot(&self, handle: NodeHandle) -> Option<SlotHandle> {
        self.nodes.try_get(handle.0).map(|node| node.slot)
    }

    /// Collects every record whose ride number lies in `lo..=hi`, in ascending order.
    ///
    /// The walk only enters a left subtree while the current ride number is
    /// above `lo`, and only enters a right subtree while it is below `hi`.
    /// An inverted range yields nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use ride_dispatch::{OrderedIndex, PriorityStore, Record};
    ///
    /// let store = PriorityStore::new();
    /// let mut index = OrderedIndex::new();
    /// for id in [5, 1, 9, 3, 7] {
    ///     index.insert(Record::new(id, 0, 0), store.next_handle()).unwrap();
    /// }
    ///
    /// let ids: Vec<u64> = index.search_range(2, 8).iter().map(|r| r.id).collect();
    /// assert_eq!(ids, [3, 5, 7]);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n + k) for k matching records.
    #[must_use]
    pub fn search_range(&self, lo: u64, hi: u64) -> Vec<Record> {
        let mut found = Vec::new();
        let mut stack: SmallVec<[Handle; STACK_DEPTH]> = SmallVec::new();
        let mut current = self.root;

        loop {
            while let Some(h) = current {
                stack.push(h);
                let node = self.nodes.get(h);
                current = if node.id() > lo { node.left } else { None };
            }

            let Some(h) = stack.pop() else {
                break;
            };
            let node = self.nodes.get(h);
            if (lo..=hi).contains(&node.id()) {
                found.push(node.record);
            }
            current = if node.id() < hi { node.right } else { None };
        }

        found
    }

    /// Returns an iterator over all records in ascending ride-number order.
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter {
            index: self,
            stack: SmallVec::new(),
            remaining: self.len(),
        };
        iter.descend(self.root);
        iter
    }
}

impl<'a> IntoIterator for &'a OrderedIndex {
    type Item = &'a Record;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An in-order iterator over the records of an [`OrderedIndex`].
///
/// This `struct` is created by [`OrderedIndex::iter`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a> {
    index: &'a OrderedIndex,
    stack: SmallVec<[Handle; STACK_DEPTH]>,
    remaining: usize,
}

impl Iter<'_> {
    fn descend(&mut self, mut current: Option<Handle>) {
        while let Some(h) = current {
            self.stack.push(h);
            current = self.index.nodes.get(h).left;
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<Self::Item> {
        let h = self.stack.pop()?;
        let node = self.index.nodes.get(h);
        self.descend(node.right);
        self.remaining -= 1;
        Some(&node.record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}
