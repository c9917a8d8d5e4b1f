//! # osmarena
//!
//! The ingestion core of an OpenStreetMap data-processing stack: a
//! streaming reader for the binary OSM PBF format that decodes nodes,
//! ways and relations into contiguous, cache-friendly arena buffers.
//!
//! ## Overview
//!
//! Most OSM tooling burns its time allocating one small object per
//! entity. osmarena takes the opposite approach: a decoded entity, with
//! its fixed fields, user name, tags and reference lists, is laid out as one
//! self-describing, aligned, variable-length record in a [`Buffer`], so a
//! whole blob's worth of heterogeneous objects is scanned with pointer
//! arithmetic and zero further allocation or copying.
//!
//! Three subsystems make that work:
//!
//! *   **The arena** ([`arena`]): tagged, sized, 8-byte-aligned records
//!     appended through scoped builders that patch their size headers on
//!     drop, and typed views ([`Node`], [`Way`], [`Relation`]) that
//!     resolve every field by offset.
//! *   **The decoder** ([`pbf::block`]): a two-level parser for the PBF
//!     blob stream, handling delta-encoded dense nodes, per-block string
//!     tables and fixed-point coordinate rescaling to 1e-7 degrees.
//! *   **The pipeline** ([`pbf::reader`]): a dedicated reader thread
//!     frames blobs in file order and fans the CPU-bound decodes out to a
//!     rayon pool; futures are queued at submit time, so the consumer
//!     sees buffers in file order with bounded memory no matter how the
//!     workers interleave.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use osmarena::{EntityKinds, PbfReader, ReadOptions};
//!
//! let file = std::fs::File::open("planet.osm.pbf")?;
//! let mut reader = PbfReader::from_read(
//!     std::io::BufReader::new(file),
//!     ReadOptions::new().kinds(EntityKinds::NODES | EntityKinds::WAYS),
//! )?;
//!
//! loop {
//!     let buffer = reader.read()?;
//!     if buffer.is_empty() {
//!         break;
//!     }
//!     for item in buffer.iter() {
//!         if let Some(node) = item.as_node() {
//!             println!("node {} at {:?}", node.id(), node.location());
//!         }
//!     }
//! }
//! ```
//!
//! ## Guarantees
//!
//! *   Buffers arrive in exactly the blob order of the source file.
//!     Within a buffer, objects are in block order.
//! *   Every record boundary is 8-byte aligned and record sizes sum to
//!     the buffer's committed size.
//! *   All failures surface as [`OsmarenaError`] values; malformed input
//!     never panics. Errors are fatal at stream level; there is no
//!     skip-blob mode.
//! *   Strings handed out by views borrow the buffer and live exactly as
//!     long as it does.
//!
//! ## Not covered
//!
//! XML input, output formats, writing PBF, random access and LZMA blobs
//! are out of scope; LZMA is rejected with a typed error.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

// --- PUBLIC API MODULES ---
pub mod arena;
pub mod error;
pub mod geom;
pub mod osm;
pub mod pbf;
pub mod types;

// --- SCHEMA DEFINITIONS (hidden from docs, stable for tests/tools) ---
#[doc(hidden)]
pub mod proto;

// --- RE-EXPORTS ---

pub use arena::{Buffer, GrowthPolicy, Item, ItemType};
pub use error::{OsmarenaError, Result};
pub use osm::{EntityKinds, Header, Node, Relation, Way};
pub use pbf::{PbfReader, ReadOptions};
pub use types::{BoundingBox, Location, Timestamp, COORDINATE_PRECISION};

/// Constants used throughout the library.
pub mod constants {
    /// Initial allocation of the buffer a block decodes into.
    pub const DEFAULT_BUFFER_CAPACITY: usize = 10 * 1024 * 1024;
}
