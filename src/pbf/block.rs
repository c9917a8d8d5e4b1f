//! Decodes one PrimitiveBlock into a buffer of arena records.
//!
//! This is the CPU-bound heart of the pipeline and runs on worker
//! threads: each invocation owns its decompressed payload and produces
//! one owned [`Buffer`], so no synchronization is needed on the decode
//! path. Objects land in the buffer in block order.
//!
//! Delta decoding: dense nodes carry seven running accumulators (id,
//! lat, lon, uid, user_sid, changeset, timestamp) plus a cursor into the
//! shared `keys_vals` array; way refs and relation memids each carry one.
//! All coordinate math happens in 64 bits with the division last.

use prost::Message;
use tracing::trace;

use crate::arena::{Buffer, GrowthPolicy, ItemType, NodeBuilder, RelationBuilder, WayBuilder};
use crate::constants::DEFAULT_BUFFER_CAPACITY;
use crate::error::{OsmarenaError, Result};
use crate::osm::EntityKinds;
use crate::pbf::COORDINATE_RESCALE;
use crate::proto;
use crate::types::{Location, Timestamp};

fn table_str(table: &proto::StringTable, index: i64) -> Result<&str> {
    let entry = usize::try_from(index)
        .ok()
        .and_then(|i| table.s.get(i))
        .ok_or_else(|| {
            OsmarenaError::MalformedBlock(format!("string table index {index} out of range"))
        })?;
    std::str::from_utf8(entry).map_err(|_| {
        OsmarenaError::MalformedBlock(format!("string table entry {index} is not UTF-8"))
    })
}

fn member_type(value: i32) -> Result<ItemType> {
    match value {
        0 => Ok(ItemType::Node),
        1 => Ok(ItemType::Way),
        2 => Ok(ItemType::Relation),
        other => Err(OsmarenaError::MalformedBlock(format!(
            "unknown relation member type {other}"
        ))),
    }
}

/// Decodes a decompressed PrimitiveBlock payload into one buffer holding
/// all requested entity kinds in block order.
pub fn parse_primitive_block(payload: &[u8], kinds: EntityKinds) -> Result<Buffer> {
    let block = proto::PrimitiveBlock::decode(payload)?;
    trace!(groups = block.primitivegroup.len(), "primitive block");

    let mut decoder = BlockDecoder {
        table: &block.stringtable,
        granularity: i64::from(block.granularity()),
        lat_offset: block.lat_offset(),
        lon_offset: block.lon_offset(),
        date_factor: i64::from(block.date_granularity() / 1000),
        kinds,
        buffer: Buffer::with_capacity(DEFAULT_BUFFER_CAPACITY, GrowthPolicy::Grow),
    };

    for group in &block.primitivegroup {
        decoder.parse_group(group)?;
    }

    Ok(decoder.buffer)
}

struct BlockDecoder<'a> {
    table: &'a proto::StringTable,
    granularity: i64,
    lat_offset: i64,
    lon_offset: i64,
    date_factor: i64,
    kinds: EntityKinds,
    buffer: Buffer,
}

impl<'a> BlockDecoder<'a> {
    fn parse_group(&mut self, group: &proto::PrimitiveGroup) -> Result<()> {
        if let Some(dense) = &group.dense {
            if self.kinds.contains(EntityKinds::NODES) {
                self.parse_dense_nodes(dense)?;
            }
        } else if !group.ways.is_empty() {
            if self.kinds.contains(EntityKinds::WAYS) {
                self.parse_ways(&group.ways)?;
            }
        } else if !group.relations.is_empty() {
            if self.kinds.contains(EntityKinds::RELATIONS) {
                self.parse_relations(&group.relations)?;
            }
        } else if !group.nodes.is_empty() {
            if self.kinds.contains(EntityKinds::NODES) {
                self.parse_plain_nodes(&group.nodes)?;
            }
        } else {
            return Err(OsmarenaError::MalformedBlock(
                "primitive group of unknown type".into(),
            ));
        }
        Ok(())
    }

    fn location_for(&self, raw_lon: i64, raw_lat: i64) -> Result<Location> {
        let x = (raw_lon * self.granularity + self.lon_offset) / COORDINATE_RESCALE;
        let y = (raw_lat * self.granularity + self.lat_offset) / COORDINATE_RESCALE;
        let x = i32::try_from(x).map_err(|_| {
            OsmarenaError::MalformedBlock(format!("longitude {x} out of range"))
        })?;
        let y = i32::try_from(y).map_err(|_| {
            OsmarenaError::MalformedBlock(format!("latitude {y} out of range"))
        })?;
        Ok(Location::new(x, y))
    }

    fn timestamp_for(&self, raw: i64) -> Timestamp {
        Timestamp::new(u32::try_from(raw * self.date_factor).unwrap_or(0))
    }

    fn parse_plain_nodes(&mut self, nodes: &[proto::Node]) -> Result<()> {
        let table = self.table;
        for pbf_node in nodes {
            if pbf_node.keys.len() != pbf_node.vals.len() {
                return Err(OsmarenaError::MalformedBlock(
                    "node keys and vals differ in length".into(),
                ));
            }
            let user = match &pbf_node.info {
                Some(info) => table_str(table, i64::from(info.user_sid()))?,
                None => "",
            };
            let visible = pbf_node
                .info
                .as_ref()
                .map_or(true, |info| info.visible.unwrap_or(true));
            let location = if visible {
                Some(self.location_for(pbf_node.lon, pbf_node.lat)?)
            } else {
                None
            };
            let timestamp = pbf_node
                .info
                .as_ref()
                .map(|info| self.timestamp_for(info.timestamp()))
                .unwrap_or_default();

            let mut builder = NodeBuilder::new(&mut self.buffer)?;
            builder.id(pbf_node.id).visible(visible);
            if let Some(info) = &pbf_node.info {
                builder
                    .version(u32::try_from(info.version()).unwrap_or(0))
                    .changeset(u32::try_from(info.changeset()).unwrap_or(0))
                    .timestamp(timestamp)
                    .uid_from_signed(info.uid());
            }
            builder.add_user(user)?;
            if let Some(location) = location {
                builder.location(location);
            }
            if !pbf_node.keys.is_empty() {
                let mut tags = builder.tags()?;
                for (key, value) in pbf_node.keys.iter().zip(&pbf_node.vals) {
                    tags.add_tag(
                        table_str(table, i64::from(*key))?,
                        table_str(table, i64::from(*value))?,
                    )?;
                }
            }
            drop(builder);
            self.buffer.commit();
        }
        Ok(())
    }

    fn parse_dense_nodes(&mut self, dense: &proto::DenseNodes) -> Result<()> {
        let table = self.table;
        let count = dense.id.len();
        if dense.lat.len() != count || dense.lon.len() != count {
            return Err(OsmarenaError::MalformedBlock(
                "dense node arrays differ in length".into(),
            ));
        }
        if let Some(info) = &dense.denseinfo {
            let parallel = info.version.len() == count
                && info.timestamp.len() == count
                && info.changeset.len() == count
                && info.uid.len() == count
                && info.user_sid.len() == count
                && (info.visible.is_empty() || info.visible.len() == count);
            if !parallel {
                return Err(OsmarenaError::MalformedBlock(
                    "dense info arrays differ in length".into(),
                ));
            }
        }

        let mut id = 0i64;
        let mut lat = 0i64;
        let mut lon = 0i64;
        let mut uid = 0i64;
        let mut user_sid = 0i64;
        let mut changeset = 0i64;
        let mut timestamp = 0i64;
        let mut tag_cursor = 0usize;

        for i in 0..count {
            id += dense.id[i];
            lat += dense.lat[i];
            lon += dense.lon[i];

            let mut visible = true;
            let mut version = 0u32;
            if let Some(info) = &dense.denseinfo {
                changeset += info.changeset[i];
                timestamp += info.timestamp[i];
                uid += i64::from(info.uid[i]);
                user_sid += i64::from(info.user_sid[i]);
                version = u32::try_from(info.version[i]).unwrap_or(0);
                if !info.visible.is_empty() {
                    visible = info.visible[i];
                }
            }

            let user = if dense.denseinfo.is_some() {
                table_str(table, user_sid)?
            } else {
                ""
            };
            let location = if visible {
                Some(self.location_for(lon, lat)?)
            } else {
                None
            };
            let ts = self.timestamp_for(timestamp);

            let mut builder = NodeBuilder::new(&mut self.buffer)?;
            builder.id(id).visible(visible);
            if dense.denseinfo.is_some() {
                builder
                    .version(version)
                    .changeset(u32::try_from(changeset).unwrap_or(0))
                    .timestamp(ts)
                    .uid_from_signed(i32::try_from(uid).unwrap_or(0));
            }
            builder.add_user(user)?;
            if let Some(location) = location {
                builder.location(location);
            }
            tag_cursor = add_dense_tags(&mut builder, table, &dense.keys_vals, tag_cursor)?;
            drop(builder);
            self.buffer.commit();
        }
        Ok(())
    }

    fn parse_ways(&mut self, ways: &[proto::Way]) -> Result<()> {
        let table = self.table;
        for pbf_way in ways {
            if pbf_way.keys.len() != pbf_way.vals.len() {
                return Err(OsmarenaError::MalformedBlock(
                    "way keys and vals differ in length".into(),
                ));
            }
            let user = match &pbf_way.info {
                Some(info) => table_str(table, i64::from(info.user_sid()))?,
                None => "",
            };
            let timestamp = pbf_way
                .info
                .as_ref()
                .map(|info| self.timestamp_for(info.timestamp()))
                .unwrap_or_default();

            let mut builder = WayBuilder::new(&mut self.buffer)?;
            builder.id(pbf_way.id);
            if let Some(info) = &pbf_way.info {
                builder
                    .version(u32::try_from(info.version()).unwrap_or(0))
                    .changeset(u32::try_from(info.changeset()).unwrap_or(0))
                    .timestamp(timestamp)
                    .uid_from_signed(info.uid())
                    .visible(info.visible.unwrap_or(true));
            }
            builder.add_user(user)?;
            if !pbf_way.refs.is_empty() {
                let mut nodes = builder.way_nodes()?;
                let mut node_ref = 0i64;
                for delta in &pbf_way.refs {
                    node_ref += delta;
                    nodes.add_way_node(node_ref)?;
                }
            }
            if !pbf_way.keys.is_empty() {
                let mut tags = builder.tags()?;
                for (key, value) in pbf_way.keys.iter().zip(&pbf_way.vals) {
                    tags.add_tag(
                        table_str(table, i64::from(*key))?,
                        table_str(table, i64::from(*value))?,
                    )?;
                }
            }
            drop(builder);
            self.buffer.commit();
        }
        Ok(())
    }

    fn parse_relations(&mut self, relations: &[proto::Relation]) -> Result<()> {
        let table = self.table;
        for pbf_relation in relations {
            if pbf_relation.keys.len() != pbf_relation.vals.len() {
                return Err(OsmarenaError::MalformedBlock(
                    "relation keys and vals differ in length".into(),
                ));
            }
            let member_count = pbf_relation.types.len();
            if pbf_relation.memids.len() != member_count
                || pbf_relation.roles_sid.len() != member_count
            {
                return Err(OsmarenaError::MalformedBlock(
                    "relation member arrays differ in length".into(),
                ));
            }
            let user = match &pbf_relation.info {
                Some(info) => table_str(table, i64::from(info.user_sid()))?,
                None => "",
            };
            let timestamp = pbf_relation
                .info
                .as_ref()
                .map(|info| self.timestamp_for(info.timestamp()))
                .unwrap_or_default();

            let mut builder = RelationBuilder::new(&mut self.buffer)?;
            builder.id(pbf_relation.id);
            if let Some(info) = &pbf_relation.info {
                builder
                    .version(u32::try_from(info.version()).unwrap_or(0))
                    .changeset(u32::try_from(info.changeset()).unwrap_or(0))
                    .timestamp(timestamp)
                    .uid_from_signed(info.uid())
                    .visible(info.visible.unwrap_or(true));
            }
            builder.add_user(user)?;
            if member_count > 0 {
                let mut members = builder.members()?;
                let mut member_ref = 0i64;
                for i in 0..member_count {
                    member_ref += pbf_relation.memids[i];
                    members.add_member(
                        member_type(pbf_relation.types[i])?,
                        member_ref,
                        table_str(table, i64::from(pbf_relation.roles_sid[i]))?,
                    )?;
                }
            }
            if !pbf_relation.keys.is_empty() {
                let mut tags = builder.tags()?;
                for (key, value) in pbf_relation.keys.iter().zip(&pbf_relation.vals) {
                    tags.add_tag(
                        table_str(table, i64::from(*key))?,
                        table_str(table, i64::from(*value))?,
                    )?;
                }
            }
            drop(builder);
            self.buffer.commit();
        }
        Ok(())
    }
}

/// Consumes one tag run from the shared `keys_vals` array.
///
/// The array concatenates per-node runs, each terminated by a 0 entry. A
/// missing terminator after the last node is tolerated; a key with no
/// value is not.
fn add_dense_tags(
    builder: &mut NodeBuilder<'_>,
    table: &proto::StringTable,
    keys_vals: &[i32],
    mut cursor: usize,
) -> Result<usize> {
    if cursor >= keys_vals.len() {
        return Ok(cursor);
    }
    if keys_vals[cursor] == 0 {
        return Ok(cursor + 1);
    }
    let mut tags = builder.tags()?;
    while cursor < keys_vals.len() {
        let key = keys_vals[cursor];
        cursor += 1;
        if key == 0 {
            break;
        }
        let Some(&value) = keys_vals.get(cursor) else {
            return Err(OsmarenaError::MalformedBlock(
                "dense tag key without value".into(),
            ));
        };
        cursor += 1;
        tags.add_tag(
            table_str(table, i64::from(key))?,
            table_str(table, i64::from(value))?,
        )?;
    }
    Ok(cursor)
}
