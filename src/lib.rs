//! Ride dispatch built on two cross-linked collections.
//!
//! A [`Dispatcher`] keeps every pending ride in two places at once:
//!
//! - an [`OrderedIndex`], a red-black tree keyed by ride number, answering
//!   point and range lookups;
//! - a [`PriorityStore`], a binary min-heap ordered by `(cost, duration)`,
//!   answering "which ride goes next".
//!
//! Each tree node holds a [`SlotHandle`] naming its heap slot, and each heap
//! slot holds a [`NodeHandle`] naming its tree node. Both handles are stable
//! for the life of the entry, so cancelling or rescheduling a ride by number
//! takes O(log n) in both structures.
//!
//! # Example
//!
//! ```
//! use ride_dispatch::{Dispatcher, Record, Update};
//!
//! let mut rides = Dispatcher::new();
//! rides.insert(Record::new(1, 5, 10)).unwrap();
//! rides.insert(Record::new(2, 3, 20)).unwrap();
//! rides.insert(Record::new(3, 3, 5)).unwrap();
//!
//! // Cheapest first, shorter trip breaks the tie.
//! assert_eq!(rides.extract_next(), Ok(Record::new(3, 3, 5)));
//!
//! // A longer trip pays a surcharge of 10.
//! assert_eq!(rides.update_priority(1, 15), Ok(Update::Rescheduled(Record::new(1, 15, 15))));
//! assert_eq!(rides.lookup_range(0, 10), vec![Record::new(1, 15, 15), Record::new(2, 3, 20)]);
//! ```
//!
//! # Features
//!
//! - **`std`** - Enables the [`command`] module and the standard library
//!   builds of `thiserror` and `tracing`. Without it the collections only
//!   require `alloc`.
//! - **`cli`** (default) - Builds the `ride_dispatch` binary, which replays a
//!   command file through a [`Dispatcher`].

#![cfg_attr(not(feature = "std"), no_std)]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod error;
mod raw;

#[cfg(feature = "std")]
pub mod command;
pub mod dispatcher;
pub mod ordered_index;
pub mod priority_store;
pub mod record;

pub use dispatcher::{DEFAULT_GROWTH_LIMIT, DEFAULT_SURCHARGE, DispatchConfig, Dispatcher, Update};
pub use error::Error;
pub use ordered_index::{NodeHandle, OrderedIndex};
pub use priority_store::{Position, PriorityStore, SlotHandle};
pub use record::{Priority, Record};
