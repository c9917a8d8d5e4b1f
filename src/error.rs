//! Centralized error handling for osmarena.
//!
//! Every failure in the crate is represented as a value of [`OsmarenaError`];
//! the library never panics on malformed input. Errors are `Clone` so the
//! decode pipeline can surface the same error to several waiting consumers
//! (I/O errors are wrapped in `Arc` to keep cloning cheap).
//!
//! All errors are fatal at the stream level: the reader thread surfaces the
//! error into the next future it enqueues and exits. There is no skip-blob
//! or resync mode; a corrupt byte stream terminates the scan.

use std::fmt;
use std::io;
use std::sync::Arc;

/// A specialized `Result` type for osmarena operations.
pub type Result<T> = std::result::Result<T, OsmarenaError>;

/// The master error enum covering all failure domains in osmarena.
///
/// ## Variants
///
/// - **Io:** Byte-stream failures, including EOF in the middle of a frame.
/// - **Framing:** BlobHeader length/type violations and size-cap violations.
/// - **Protobuf:** A protobuf message failed to parse.
/// - **UnsupportedCompression:** A blob uses a compression scheme this
///   crate rejects (LZMA).
/// - **UnsupportedFeature:** The file declares a required feature this
///   crate does not implement.
/// - **MalformedBlock:** A PrimitiveBlock violates the OSM PBF structure
///   (unknown group kind, inconsistent dense arrays, bad string index...).
/// - **BufferFull:** An arena with growth disabled ran out of space.
/// - **SizeOverflow:** A record (or the arena itself) would exceed the
///   32-bit size field.
/// - **UndefinedLocation:** Geometry was requested for a location that is
///   still the undefined sentinel.
/// - **Internal:** Logic errors in the pipeline. These indicate bugs.
#[derive(Debug, Clone)]
pub enum OsmarenaError {
    /// Low-level I/O failure or EOF inside a frame.
    ///
    /// The underlying `io::Error` is wrapped in an `Arc` to make the error
    /// `Clone` without expensive copying.
    Io(Arc<io::Error>),

    /// The blob framing is invalid: wrong BlobHeader type, a length prefix
    /// or blob size over its cap, or a decompressed size mismatch.
    Framing(String),

    /// A protobuf message failed to decode.
    Protobuf(String),

    /// The blob carries a compression scheme that is not supported.
    UnsupportedCompression(&'static str),

    /// The HeaderBlock declares a required feature this crate does not
    /// implement. The payload is the feature name as found in the file.
    UnsupportedFeature(String),

    /// A PrimitiveBlock is structurally invalid.
    MalformedBlock(String),

    /// The arena is full and its growth policy forbids reallocation.
    BufferFull,

    /// A record size would no longer fit in the item header's `u32`.
    SizeOverflow,

    /// A geometry operation hit the undefined-location sentinel.
    UndefinedLocation,

    /// Logic error in the pipeline. Should not occur; please report.
    Internal(String),
}

impl fmt::Display for OsmarenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Framing(s) => write!(f, "framing error: {s}"),
            Self::Protobuf(s) => write!(f, "protobuf error: {s}"),
            Self::UnsupportedCompression(s) => {
                write!(f, "unsupported compression: {s}")
            }
            Self::UnsupportedFeature(s) => {
                write!(f, "required feature not supported: {s}")
            }
            Self::MalformedBlock(s) => write!(f, "malformed block: {s}"),
            Self::BufferFull => write!(f, "out of buffer space"),
            Self::SizeOverflow => write!(f, "record size exceeds 32 bits"),
            Self::UndefinedLocation => write!(f, "location is undefined"),
            Self::Internal(s) => write!(f, "internal error: {s}"),
        }
    }
}

impl std::error::Error for OsmarenaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for OsmarenaError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<prost::DecodeError> for OsmarenaError {
    fn from(err: prost::DecodeError) -> Self {
        Self::Protobuf(err.to_string())
    }
}
