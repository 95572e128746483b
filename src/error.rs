use thiserror::Error;

use crate::priority_store::Position;

/// Errors raised by the ordered index, the priority store, and the dispatcher.
///
/// The structures report these unchanged. For a command run,
/// [`EmptyStore`](Error::EmptyStore) is reported and the run continues, and
/// [`DuplicateKey`](Error::DuplicateKey) ends the run. The handle and
/// position variants are contract violations that only a bug in the
/// dispatcher can produce.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum Error {
    /// A record with this ride number is already live.
    #[error("Duplicate RideNumber")]
    DuplicateKey {
        /// The ride number that was already present.
        id: u64,
    },

    /// An extraction was attempted with no pending records.
    #[error("No active ride requests")]
    EmptyStore,

    /// A node handle no longer refers to a live node.
    #[error("the node isn't a valid node")]
    InvalidHandle,

    /// A heap position lies outside the occupied part of the heap.
    #[error("heap position {position} is out of bounds (len {len})")]
    InvalidPosition {
        /// The rejected position.
        position: Position,
        /// The number of occupied positions at the time.
        len: usize,
    },
}

impl Error {
    /// Returns `true` if a run must stop after reporting this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use ride_dispatch::Error;
    ///
    /// assert!(Error::DuplicateKey { id: 4 }.is_fatal());
    /// assert!(!Error::EmptyStore.is_fatal());
    /// ```
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Error::EmptyStore)
    }
}
