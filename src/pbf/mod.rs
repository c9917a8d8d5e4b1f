//! The PBF streaming decoder: framing, blob decompression, block decode
//! and the concurrent pipeline that ties them together.
//!
//! A PBF file is a sequence of `<length><BlobHeader><Blob>` frames. The
//! first blob is the `OSMHeader`; every later one is `OSMData` and
//! decompresses to a PrimitiveBlock of entities. [`reader::PbfReader`]
//! drives the whole thing: a dedicated thread frames blobs off the input
//! queue and fans the CPU-bound decodes out to a worker pool, while the
//! consumer receives finished buffers in file order.

/// Blob framing and payload decompression.
pub mod blob;
/// PrimitiveBlock decoding into arena buffers.
pub mod block;
/// HeaderBlock decoding.
pub mod header;
/// Byte-queue adaptation.
pub mod input;
/// The pipeline coordinator.
pub mod reader;

pub use blob::{MAX_BLOB_HEADER_SIZE, MAX_UNCOMPRESSED_BLOB_SIZE};
pub use input::{spawn_feeder, InputQueueReader};
pub use reader::{PbfReader, ReadOptions};

/// Nanodegree resolution of raw PBF coordinates.
pub(crate) const LONLAT_RESOLUTION: i64 = 1_000_000_000;

/// Factor between raw PBF nanodegrees and the arena's 1e-7 degree units.
pub(crate) const COORDINATE_RESCALE: i64 =
    LONLAT_RESOLUTION / crate::types::COORDINATE_PRECISION as i64;
