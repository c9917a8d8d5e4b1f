//! Blob framing and payload decompression.
//!
//! The outer structure of a PBF file, bit-exact:
//!
//! ```text
//! <BlobHeader length: u32 big-endian>
//! <BlobHeader bytes>              (≤ 64 KiB)
//! <Blob bytes>                    (length from BlobHeader.datasize)
//! ... repeated ...
//! ```
//!
//! Both size caps are checked before anything is allocated, so a corrupt
//! length prefix cannot drive memory use.

use std::io::{self, Read};

use flate2::read::ZlibDecoder;
use prost::Message;
use tracing::trace;

use crate::error::{OsmarenaError, Result};
use crate::pbf::input::InputQueueReader;
use crate::proto;

/// Maximum encoded size of a BlobHeader.
pub const MAX_BLOB_HEADER_SIZE: u32 = 64 * 1024;

/// Maximum size of a blob, compressed or decompressed.
pub const MAX_UNCOMPRESSED_BLOB_SIZE: u64 = 32 * 1024 * 1024;

/// BlobHeader type of the first blob in a file.
pub(crate) const OSM_HEADER_TYPE: &str = "OSMHeader";

/// BlobHeader type of every blob after the first.
pub(crate) const OSM_DATA_TYPE: &str = "OSMData";

fn eof_mid_frame(what: &str) -> OsmarenaError {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("EOF in the middle of a {what}"),
    )
    .into()
}

/// Reads one BlobHeader: the big-endian length prefix, then the message.
///
/// Returns `Ok(None)` on clean EOF at a frame boundary, otherwise the
/// byte length of the Blob that follows. The header's type must equal
/// `expected_type` (`OSMHeader` only for the first blob, `OSMData` for
/// all others).
pub fn read_blob_header(
    input: &mut InputQueueReader,
    expected_type: &str,
) -> Result<Option<u32>> {
    let mut prefix = [0u8; 4];
    if !input.read_exact(&mut prefix) {
        return Ok(None);
    }
    let size = u32::from_be_bytes(prefix);
    if size > MAX_BLOB_HEADER_SIZE {
        return Err(OsmarenaError::Framing(format!(
            "BlobHeader size {size} exceeds {MAX_BLOB_HEADER_SIZE}"
        )));
    }

    let mut raw = vec![0u8; size as usize];
    if !input.read_exact(&mut raw) {
        return Err(eof_mid_frame("BlobHeader"));
    }
    let header = proto::BlobHeader::decode(raw.as_slice())?;
    trace!(blob_type = %header.r#type, datasize = header.datasize, "blob header");

    if header.r#type != expected_type {
        return Err(OsmarenaError::Framing(format!(
            "expected {expected_type:?} blob, found {:?}",
            header.r#type
        )));
    }
    let datasize = u64::try_from(header.datasize)
        .map_err(|_| OsmarenaError::Framing("negative blob size".into()))?;
    if datasize > MAX_UNCOMPRESSED_BLOB_SIZE {
        return Err(OsmarenaError::Framing(format!(
            "blob size {datasize} exceeds {MAX_UNCOMPRESSED_BLOB_SIZE}"
        )));
    }
    // Bounded by the 32 MiB cap, so the cast cannot truncate.
    Ok(Some(datasize as u32))
}

/// Reads the blob bytes announced by a header.
pub fn read_blob(input: &mut InputQueueReader, size: u32) -> Result<Vec<u8>> {
    let mut raw = vec![0u8; size as usize];
    if !input.read_exact(&mut raw) {
        return Err(eof_mid_frame("Blob"));
    }
    Ok(raw)
}

/// Decodes one Blob message and returns its decompressed payload.
///
/// Dispatch: `raw` is returned as is; `zlib_data` is inflated and must
/// come out exactly `raw_size` bytes long; `lzma_data` is rejected; a
/// blob with no payload field at all is a framing error.
pub fn parse_blob_payload(raw: &[u8]) -> Result<Vec<u8>> {
    let blob = proto::Blob::decode(raw)?;

    if let Some(payload) = blob.raw {
        return Ok(payload);
    }

    if let Some(compressed) = blob.zlib_data {
        let raw_size = blob
            .raw_size
            .ok_or_else(|| OsmarenaError::Framing("zlib blob without raw_size".into()))?;
        let raw_size = u64::try_from(raw_size)
            .map_err(|_| OsmarenaError::Framing("negative raw_size".into()))?;
        if raw_size > MAX_UNCOMPRESSED_BLOB_SIZE {
            return Err(OsmarenaError::Framing(format!(
                "raw_size {raw_size} exceeds {MAX_UNCOMPRESSED_BLOB_SIZE}"
            )));
        }
        let expected = raw_size as usize;
        let mut payload = Vec::with_capacity(expected);
        let mut decoder = ZlibDecoder::new(compressed.as_slice());
        decoder
            .read_to_end(&mut payload)
            .map_err(|e| OsmarenaError::Framing(format!("zlib inflate failed: {e}")))?;
        if payload.len() != expected {
            return Err(OsmarenaError::Framing(format!(
                "inflated {} bytes, raw_size says {expected}",
                payload.len()
            )));
        }
        return Ok(payload);
    }

    if blob.lzma_data.is_some() {
        return Err(OsmarenaError::UnsupportedCompression("lzma"));
    }

    Err(OsmarenaError::Framing("blob contains no data".into()))
}
