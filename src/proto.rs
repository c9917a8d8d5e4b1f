//! Protobuf message definitions for the OSM PBF format.
//!
//! Hand-maintained `prost` definitions of the proto2 `fileformat` and
//! `osmformat` schemas, kept in-tree so no protoc step is needed at build
//! time. Field numbers and defaults follow the published OSMPBF schemas;
//! in particular `granularity`, `date_granularity` and the offsets carry
//! their protobuf defaults, so the prost getters already yield the values
//! the decoder must assume when a writer omits them.

// ---- fileformat.proto ----

/// Outer framing header; one per blob, length-prefixed in the file.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlobHeader {
    /// `"OSMHeader"` for the first blob, `"OSMData"` for the rest.
    #[prost(string, required, tag = "1")]
    pub r#type: ::prost::alloc::string::String,
    /// Opaque index payload some writers attach.
    #[prost(bytes = "vec", optional, tag = "2")]
    pub indexdata: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    /// Byte length of the Blob message that follows.
    #[prost(int32, required, tag = "3")]
    pub datasize: i32,
}

/// One blob: exactly one payload field is set.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Blob {
    /// Uncompressed payload.
    #[prost(bytes = "vec", optional, tag = "1")]
    pub raw: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    /// Uncompressed size of a compressed payload.
    #[prost(int32, optional, tag = "2")]
    pub raw_size: ::core::option::Option<i32>,
    /// zlib-compressed payload.
    #[prost(bytes = "vec", optional, tag = "3")]
    pub zlib_data: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    /// LZMA-compressed payload. Rejected by this crate.
    #[prost(bytes = "vec", optional, tag = "4")]
    pub lzma_data: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

// ---- osmformat.proto ----

/// Contents of the OSMHeader blob.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HeaderBlock {
    /// Bounding box declared by the writer, in nanodegrees.
    #[prost(message, optional, tag = "1")]
    pub bbox: ::core::option::Option<HeaderBBox>,
    /// Features a reader must understand to parse the file.
    #[prost(string, repeated, tag = "4")]
    pub required_features: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    /// Features a reader may exploit but can ignore.
    #[prost(string, repeated, tag = "5")]
    pub optional_features: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    /// The program that wrote the file.
    #[prost(string, optional, tag = "16")]
    pub writingprogram: ::core::option::Option<::prost::alloc::string::String>,
    /// Where the data came from.
    #[prost(string, optional, tag = "17")]
    pub source: ::core::option::Option<::prost::alloc::string::String>,
    /// Replication state: timestamp of the last contained edit.
    #[prost(int64, optional, tag = "32")]
    pub osmosis_replication_timestamp: ::core::option::Option<i64>,
    /// Replication state: sequence number.
    #[prost(int64, optional, tag = "33")]
    pub osmosis_replication_sequence_number: ::core::option::Option<i64>,
    /// Replication state: server base URL.
    #[prost(string, optional, tag = "34")]
    pub osmosis_replication_base_url: ::core::option::Option<::prost::alloc::string::String>,
}

/// Header bounding box, in nanodegrees.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct HeaderBBox {
    /// West edge.
    #[prost(sint64, required, tag = "1")]
    pub left: i64,
    /// East edge.
    #[prost(sint64, required, tag = "2")]
    pub right: i64,
    /// North edge.
    #[prost(sint64, required, tag = "3")]
    pub top: i64,
    /// South edge.
    #[prost(sint64, required, tag = "4")]
    pub bottom: i64,
}

/// Contents of one OSMData blob.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PrimitiveBlock {
    /// The block's string table; index 0 is always the empty string.
    #[prost(message, required, tag = "1")]
    pub stringtable: StringTable,
    /// The entity groups of this block.
    #[prost(message, repeated, tag = "2")]
    pub primitivegroup: ::prost::alloc::vec::Vec<PrimitiveGroup>,
    /// Units of one raw coordinate step, in nanodegrees.
    #[prost(int32, optional, tag = "17", default = "100")]
    pub granularity: ::core::option::Option<i32>,
    /// Units of one raw timestamp step, in milliseconds.
    #[prost(int32, optional, tag = "18", default = "1000")]
    pub date_granularity: ::core::option::Option<i32>,
    /// Offset added to every raw latitude, in nanodegrees.
    #[prost(int64, optional, tag = "19", default = "0")]
    pub lat_offset: ::core::option::Option<i64>,
    /// Offset added to every raw longitude, in nanodegrees.
    #[prost(int64, optional, tag = "20", default = "0")]
    pub lon_offset: ::core::option::Option<i64>,
}

/// One group of entities; exactly one kind is populated.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PrimitiveGroup {
    /// Plain (non-dense) nodes.
    #[prost(message, repeated, tag = "1")]
    pub nodes: ::prost::alloc::vec::Vec<Node>,
    /// Delta-encoded node batch.
    #[prost(message, optional, tag = "2")]
    pub dense: ::core::option::Option<DenseNodes>,
    /// Ways.
    #[prost(message, repeated, tag = "3")]
    pub ways: ::prost::alloc::vec::Vec<Way>,
    /// Relations.
    #[prost(message, repeated, tag = "4")]
    pub relations: ::prost::alloc::vec::Vec<Relation>,
    /// Changesets. Not decoded by this crate.
    #[prost(message, repeated, tag = "5")]
    pub changesets: ::prost::alloc::vec::Vec<ChangeSet>,
}

/// Per-block string table; entities reference strings by index.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StringTable {
    /// The strings, as raw bytes (UTF-8 by convention).
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub s: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
}

/// Non-dense metadata attached to a single entity.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Info {
    /// Object version.
    #[prost(int32, optional, tag = "1", default = "-1")]
    pub version: ::core::option::Option<i32>,
    /// Raw timestamp, in `date_granularity` units.
    #[prost(int64, optional, tag = "2")]
    pub timestamp: ::core::option::Option<i64>,
    /// Changeset id.
    #[prost(int64, optional, tag = "3")]
    pub changeset: ::core::option::Option<i64>,
    /// User id; negative means anonymous.
    #[prost(int32, optional, tag = "4")]
    pub uid: ::core::option::Option<i32>,
    /// String-table index of the user name.
    #[prost(uint32, optional, tag = "5")]
    pub user_sid: ::core::option::Option<u32>,
    /// Visibility for history files; absent means visible.
    #[prost(bool, optional, tag = "6")]
    pub visible: ::core::option::Option<bool>,
}

/// Delta-encoded metadata arrays parallel to [`DenseNodes`].
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DenseInfo {
    /// Versions, not delta-encoded.
    #[prost(int32, repeated, tag = "1")]
    pub version: ::prost::alloc::vec::Vec<i32>,
    /// Timestamp deltas, in `date_granularity` units.
    #[prost(sint64, repeated, tag = "2")]
    pub timestamp: ::prost::alloc::vec::Vec<i64>,
    /// Changeset deltas.
    #[prost(sint64, repeated, tag = "3")]
    pub changeset: ::prost::alloc::vec::Vec<i64>,
    /// User id deltas.
    #[prost(sint32, repeated, tag = "4")]
    pub uid: ::prost::alloc::vec::Vec<i32>,
    /// User name string-table index deltas.
    #[prost(sint32, repeated, tag = "5")]
    pub user_sid: ::prost::alloc::vec::Vec<i32>,
    /// Visibility flags for history files; empty means all visible.
    #[prost(bool, repeated, tag = "6")]
    pub visible: ::prost::alloc::vec::Vec<bool>,
}

/// A plain node.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Node {
    /// Node id.
    #[prost(sint64, required, tag = "1")]
    pub id: i64,
    /// String-table indices of tag keys, parallel to `vals`.
    #[prost(uint32, repeated, tag = "2")]
    pub keys: ::prost::alloc::vec::Vec<u32>,
    /// String-table indices of tag values, parallel to `keys`.
    #[prost(uint32, repeated, tag = "3")]
    pub vals: ::prost::alloc::vec::Vec<u32>,
    /// Metadata.
    #[prost(message, optional, tag = "4")]
    pub info: ::core::option::Option<Info>,
    /// Raw latitude, in `granularity` units.
    #[prost(sint64, required, tag = "8")]
    pub lat: i64,
    /// Raw longitude, in `granularity` units.
    #[prost(sint64, required, tag = "9")]
    pub lon: i64,
}

/// A batch of delta-encoded nodes sharing the block's string table.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DenseNodes {
    /// Id deltas.
    #[prost(sint64, repeated, tag = "1")]
    pub id: ::prost::alloc::vec::Vec<i64>,
    /// Metadata arrays, parallel to `id`.
    #[prost(message, optional, tag = "5")]
    pub denseinfo: ::core::option::Option<DenseInfo>,
    /// Raw latitude deltas.
    #[prost(sint64, repeated, tag = "8")]
    pub lat: ::prost::alloc::vec::Vec<i64>,
    /// Raw longitude deltas.
    #[prost(sint64, repeated, tag = "9")]
    pub lon: ::prost::alloc::vec::Vec<i64>,
    /// Concatenated per-node tag runs, each `k v k v ... 0`.
    #[prost(int32, repeated, tag = "10")]
    pub keys_vals: ::prost::alloc::vec::Vec<i32>,
}

/// A way.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Way {
    /// Way id.
    #[prost(int64, required, tag = "1")]
    pub id: i64,
    /// String-table indices of tag keys.
    #[prost(uint32, repeated, tag = "2")]
    pub keys: ::prost::alloc::vec::Vec<u32>,
    /// String-table indices of tag values.
    #[prost(uint32, repeated, tag = "3")]
    pub vals: ::prost::alloc::vec::Vec<u32>,
    /// Metadata.
    #[prost(message, optional, tag = "4")]
    pub info: ::core::option::Option<Info>,
    /// Delta-encoded node references.
    #[prost(sint64, repeated, tag = "8")]
    pub refs: ::prost::alloc::vec::Vec<i64>,
}

/// A relation.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Relation {
    /// Relation id.
    #[prost(int64, required, tag = "1")]
    pub id: i64,
    /// String-table indices of tag keys.
    #[prost(uint32, repeated, tag = "2")]
    pub keys: ::prost::alloc::vec::Vec<u32>,
    /// String-table indices of tag values.
    #[prost(uint32, repeated, tag = "3")]
    pub vals: ::prost::alloc::vec::Vec<u32>,
    /// Metadata.
    #[prost(message, optional, tag = "4")]
    pub info: ::core::option::Option<Info>,
    /// String-table indices of member roles, parallel to `memids`.
    #[prost(sint32, repeated, tag = "8")]
    pub roles_sid: ::prost::alloc::vec::Vec<i32>,
    /// Delta-encoded member ids.
    #[prost(sint64, repeated, tag = "9")]
    pub memids: ::prost::alloc::vec::Vec<i64>,
    /// Member kinds, parallel to `memids`.
    #[prost(enumeration = "relation::MemberType", repeated, tag = "10")]
    pub types: ::prost::alloc::vec::Vec<i32>,
}

/// Nested definitions of [`Relation`].
pub mod relation {
    /// Kind of a relation member.
    #[derive(
        Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
    )]
    #[repr(i32)]
    pub enum MemberType {
        /// The member is a node.
        Node = 0,
        /// The member is a way.
        Way = 1,
        /// The member is a relation.
        Relation = 2,
    }

    impl MemberType {
        /// String name, as used by protobuf reflection.
        pub fn as_str_name(&self) -> &'static str {
            match self {
                Self::Node => "NODE",
                Self::Way => "WAY",
                Self::Relation => "RELATION",
            }
        }

        /// Parses a protobuf enum name.
        pub fn from_str_name(value: &str) -> ::core::option::Option<Self> {
            match value {
                "NODE" => Some(Self::Node),
                "WAY" => Some(Self::Way),
                "RELATION" => Some(Self::Relation),
                _ => None,
            }
        }
    }
}

/// A changeset. Present in the schema; not decoded by this crate.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ChangeSet {
    /// Changeset id.
    #[prost(int64, required, tag = "1")]
    pub id: i64,
}
