//! The arena: self-describing, aligned, variable-length records packed
//! into contiguous buffers.
//!
//! A decoded OSM entity (its fixed fields, its user name, its tag list
//! and reference lists) lives as one contiguous record, so a buffer full
//! of heterogeneous objects is scanned with offset arithmetic and zero
//! further allocation. See [`item`] for the record framing, [`buffer`] for
//! the arena itself and [`builder`] for the scoped constructors that are
//! the only way records come into existence.

/// The arena byte region and its iteration.
pub mod buffer;
/// Scoped record constructors.
pub mod builder;
/// Record framing: header codec, type tags, alignment.
pub mod item;

pub use buffer::{Buffer, GrowthPolicy, ItemIter};
pub use builder::{
    NodeBuilder, RelationBuilder, RelationMemberListBuilder, TagListBuilder, WayBuilder,
    WayNodeListBuilder,
};
pub use item::{padded_size, Item, ItemType, ALIGNMENT, ITEM_HEADER_SIZE};
