use crate::priority_store::SlotHandle;
use crate::raw::Handle;
use crate::record::Record;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Color {
    Red,
    Black,
}

// Red-black tree node. A missing child or parent is `None`, which reads as Black.
#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(super) record: Record,
    pub(super) color: Color,
    pub(super) parent: Option<Handle>,
    pub(super) left: Option<Handle>,
    pub(super) right: Option<Handle>,
    // Where the same record lives in the priority store. Never touched by rebalancing.
    pub(super) slot: SlotHandle,
}

impl Node {
    /// Creates a detached red node.
    pub(super) const fn new(record: Record, slot: SlotHandle) -> Self {
        Self {
            record,
            color: Color::Red,
            parent: None,
            left: None,
            right: None,
            slot,
        }
    }

    #[inline]
    pub(super) const fn id(&self) -> u64 {
        self.record.id
    }
}
