//! Decodes the OSMHeader blob into a [`Header`].

use prost::Message;

use crate::error::{OsmarenaError, Result};
use crate::osm::Header;
use crate::pbf::COORDINATE_RESCALE;
use crate::proto;
use crate::types::{BoundingBox, Location, Timestamp};

const FEATURE_OSM_SCHEMA: &str = "OsmSchema-V0.6";
const FEATURE_DENSE_NODES: &str = "DenseNodes";
const FEATURE_HISTORICAL: &str = "HistoricalInformation";

#[allow(clippy::cast_possible_truncation)]
fn rescale(nano: i64) -> i32 {
    (nano / COORDINATE_RESCALE) as i32
}

/// Parses a decompressed HeaderBlock payload.
///
/// Required features gate the whole file: anything beyond the 0.6 schema,
/// dense nodes and historical information makes the open fail. Everything
/// else in the block is metadata mapped onto the [`Header`].
pub fn parse_header_block(payload: &[u8]) -> Result<Header> {
    let block = proto::HeaderBlock::decode(payload)?;
    let mut header = Header::default();

    for feature in &block.required_features {
        match feature.as_str() {
            FEATURE_OSM_SCHEMA => {}
            FEATURE_DENSE_NODES => header.set_has_dense_nodes(true),
            FEATURE_HISTORICAL => header.set_multiple_object_versions(true),
            other => {
                return Err(OsmarenaError::UnsupportedFeature(other.to_owned()));
            }
        }
    }

    for feature in &block.optional_features {
        header.add_optional_feature(feature.clone());
    }

    if let Some(program) = block.writingprogram {
        header.set_generator(program);
    }

    if let Some(source) = block.source {
        header.set("source", source);
    }

    if let Some(bbox) = block.bbox {
        let mut boxed = BoundingBox::new();
        boxed.extend(Location::new(rescale(bbox.left), rescale(bbox.bottom)));
        boxed.extend(Location::new(rescale(bbox.right), rescale(bbox.top)));
        header.add_bounding_box(boxed);
    }

    if let Some(ts) = block.osmosis_replication_timestamp {
        let ts = u32::try_from(ts).unwrap_or(0);
        header.set(
            "osmosis_replication_timestamp",
            Timestamp::new(ts).to_iso(),
        );
    }

    if let Some(seq) = block.osmosis_replication_sequence_number {
        header.set("osmosis_replication_sequence_number", seq.to_string());
    }

    if let Some(url) = block.osmosis_replication_base_url {
        header.set("osmosis_replication_base_url", url);
    }

    Ok(header)
}
