#![allow(missing_docs)]

use std::io::Write;
use std::sync::Arc;

use crossbeam_channel::unbounded;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use osmarena::pbf::{MAX_BLOB_HEADER_SIZE, MAX_UNCOMPRESSED_BLOB_SIZE};
use osmarena::proto;
use osmarena::{
    EntityKinds, Location, OsmarenaError, PbfReader, ReadOptions, Timestamp,
};
use prost::Message;

// ---- file synthesis helpers ----

fn frame(file: &mut Vec<u8>, blob_type: &str, blob: &[u8]) {
    let header = proto::BlobHeader {
        r#type: blob_type.to_owned(),
        indexdata: None,
        datasize: i32::try_from(blob.len()).expect("blob fits"),
    }
    .encode_to_vec();
    file.extend_from_slice(&u32::try_from(header.len()).expect("len").to_be_bytes());
    file.extend_from_slice(&header);
    file.extend_from_slice(blob);
}

fn raw_blob(payload: &[u8]) -> Vec<u8> {
    proto::Blob {
        raw: Some(payload.to_vec()),
        ..Default::default()
    }
    .encode_to_vec()
}

fn zlib_blob(payload: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload).expect("deflate write");
    let compressed = encoder.finish().expect("deflate finish");
    proto::Blob {
        raw_size: Some(i32::try_from(payload.len()).expect("raw_size fits")),
        zlib_data: Some(compressed),
        ..Default::default()
    }
    .encode_to_vec()
}

fn header_block(required_features: &[&str]) -> proto::HeaderBlock {
    proto::HeaderBlock {
        required_features: required_features.iter().map(|s| (*s).to_owned()).collect(),
        ..Default::default()
    }
}

fn string_table(strings: &[&str]) -> proto::StringTable {
    proto::StringTable {
        s: strings.iter().map(|s| s.as_bytes().to_vec()).collect(),
    }
}

fn single_dense_node_block(id: i64) -> proto::PrimitiveBlock {
    proto::PrimitiveBlock {
        stringtable: string_table(&[""]),
        primitivegroup: vec![proto::PrimitiveGroup {
            dense: Some(proto::DenseNodes {
                id: vec![id],
                lat: vec![1000],
                lon: vec![2000],
                ..Default::default()
            }),
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn build_file(header: &proto::HeaderBlock, blocks: &[proto::PrimitiveBlock]) -> Vec<u8> {
    let mut file = Vec::new();
    frame(&mut file, "OSMHeader", &raw_blob(&header.encode_to_vec()));
    for block in blocks {
        frame(&mut file, "OSMData", &raw_blob(&block.encode_to_vec()));
    }
    file
}

fn open_bytes(bytes: Vec<u8>, options: ReadOptions) -> osmarena::Result<PbfReader> {
    let (tx, rx) = unbounded();
    tx.send(bytes).expect("send file");
    tx.send(Vec::new()).expect("send EOF");
    drop(tx);
    PbfReader::open(rx, options)
}

/// Drains the reader, returning the ids of every object in arrival order.
fn collect_ids(reader: &mut PbfReader) -> Vec<i64> {
    let mut ids = Vec::new();
    loop {
        let buffer = reader.read().expect("read");
        if buffer.is_empty() {
            return ids;
        }
        for item in buffer.iter() {
            if let Some(node) = item.as_node() {
                ids.push(node.id());
            } else if let Some(way) = item.as_way() {
                ids.push(way.id());
            } else if let Some(relation) = item.as_relation() {
                ids.push(relation.id());
            }
        }
    }
}

// ---- end-to-end scenarios ----

#[test]
fn single_raw_node_end_to_end() {
    let block = proto::PrimitiveBlock {
        stringtable: string_table(&["", "alice"]),
        primitivegroup: vec![proto::PrimitiveGroup {
            nodes: vec![proto::Node {
                id: 42,
                lat: 535_000_000,
                lon: -10_000_000,
                info: Some(proto::Info {
                    version: Some(1),
                    timestamp: Some(1_000_000_000),
                    uid: Some(7),
                    user_sid: Some(1),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        }],
        granularity: Some(10),
        ..Default::default()
    };
    let file = build_file(&header_block(&[]), &[block]);

    let mut reader = open_bytes(file, ReadOptions::new()).expect("open");
    assert!(reader.header().generator().is_none());

    let buffer = reader.read().expect("read");
    let node = buffer
        .iter()
        .next()
        .and_then(|i| i.as_node())
        .expect("one node");
    assert_eq!(node.id(), 42);
    assert_eq!(node.version(), 1);
    assert_eq!(node.uid(), 7);
    assert_eq!(node.user(), "alice");
    assert_eq!(node.timestamp(), Timestamp::new(1_000_000_000));
    assert_eq!(node.location(), Location::new(-1_000_000, 53_500_000));
    assert_eq!(buffer.iter().count(), 1);

    assert!(reader.read().expect("EOS").is_empty());
}

#[test]
fn zlib_blob_decodes_identically() {
    let block = proto::PrimitiveBlock {
        stringtable: string_table(&["", "alice"]),
        primitivegroup: vec![proto::PrimitiveGroup {
            nodes: vec![proto::Node {
                id: 42,
                lat: 535_000_000,
                lon: -10_000_000,
                info: Some(proto::Info {
                    version: Some(1),
                    timestamp: Some(1_000_000_000),
                    uid: Some(7),
                    user_sid: Some(1),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        }],
        granularity: Some(10),
        ..Default::default()
    };

    let mut file = Vec::new();
    frame(
        &mut file,
        "OSMHeader",
        &raw_blob(&header_block(&[]).encode_to_vec()),
    );
    frame(&mut file, "OSMData", &zlib_blob(&block.encode_to_vec()));

    let mut reader = open_bytes(file, ReadOptions::new()).expect("open");
    let buffer = reader.read().expect("read");
    let node = buffer
        .iter()
        .next()
        .and_then(|i| i.as_node())
        .expect("one node");
    assert_eq!(node.id(), 42);
    assert_eq!(node.user(), "alice");
    assert_eq!(node.location(), Location::new(-1_000_000, 53_500_000));
}

#[test]
fn unknown_required_feature_fails_open() {
    let file = build_file(&header_block(&["OsmSchema-V0.6", "Sorting"]), &[]);
    let err = open_bytes(file, ReadOptions::new()).expect_err("must fail");
    match err {
        OsmarenaError::UnsupportedFeature(name) => assert_eq!(name, "Sorting"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn known_required_features_set_header_flags() {
    let file = build_file(
        &header_block(&["OsmSchema-V0.6", "DenseNodes", "HistoricalInformation"]),
        &[],
    );
    let reader = open_bytes(file, ReadOptions::new()).expect("open");
    assert!(reader.header().has_dense_nodes());
    assert!(reader.header().multiple_object_versions());
}

#[test]
fn header_metadata_is_mapped() {
    let block = proto::HeaderBlock {
        required_features: vec!["OsmSchema-V0.6".to_owned()],
        optional_features: vec!["Sort.Type_then_ID".to_owned()],
        writingprogram: Some("pbf-writer-test".to_owned()),
        source: Some("test-suite".to_owned()),
        bbox: Some(proto::HeaderBBox {
            left: -1_000_000_000,
            right: 2_000_000_000,
            top: 500_000_000,
            bottom: -500_000_000,
        }),
        osmosis_replication_timestamp: Some(1_000_000_000),
        osmosis_replication_sequence_number: Some(123),
        osmosis_replication_base_url: Some("https://example.org/replication".to_owned()),
    };
    let file = build_file(&block, &[]);

    let reader = open_bytes(file, ReadOptions::new()).expect("open");
    let header = reader.header();
    assert_eq!(header.generator(), Some("pbf-writer-test"));
    assert_eq!(header.get("source"), Some("test-suite"));
    assert_eq!(header.optional_features(), ["Sort.Type_then_ID"]);
    assert_eq!(
        header.get("osmosis_replication_timestamp"),
        Some("2001-09-09T01:46:40Z")
    );
    assert_eq!(header.get("osmosis_replication_sequence_number"), Some("123"));
    assert_eq!(
        header.get("osmosis_replication_base_url"),
        Some("https://example.org/replication")
    );

    let bbox = header.bounding_boxes().first().expect("one box");
    assert_eq!(bbox.bottom_left(), Location::new(-10_000_000, -5_000_000));
    assert_eq!(bbox.top_right(), Location::new(20_000_000, 5_000_000));
}

// ---- boundary behaviors ----

#[test]
fn empty_file_yields_empty_stream() {
    let mut reader = open_bytes(Vec::new(), ReadOptions::new()).expect("open");
    assert!(reader.header().generator().is_none());
    assert!(reader.read().expect("EOS").is_empty());
    // And stays that way.
    assert!(reader.read().expect("EOS again").is_empty());
}

#[test]
fn header_only_file_yields_empty_stream() {
    let file = build_file(&header_block(&[]), &[]);
    let mut reader = open_bytes(file, ReadOptions::new()).expect("open");
    assert!(reader.read().expect("EOS").is_empty());
}

#[test]
fn nothing_requested_reads_nothing() {
    let file = build_file(&header_block(&[]), &[single_dense_node_block(1)]);
    let mut reader = open_bytes(
        file,
        ReadOptions::new().kinds(EntityKinds::NOTHING),
    )
    .expect("open");
    assert!(reader.read().expect("EOS").is_empty());
}

#[test]
fn blob_header_at_size_cap_succeeds_and_over_fails() {
    // Pad the OSMHeader's BlobHeader with indexdata until its encoding is
    // exactly the cap.
    let header_payload = raw_blob(&header_block(&[]).encode_to_vec());
    let mut padding = MAX_BLOB_HEADER_SIZE as usize - 64;
    let header_bytes = loop {
        let bytes = proto::BlobHeader {
            r#type: "OSMHeader".to_owned(),
            indexdata: Some(vec![0; padding]),
            datasize: i32::try_from(header_payload.len()).expect("fits"),
        }
        .encode_to_vec();
        if bytes.len() == MAX_BLOB_HEADER_SIZE as usize {
            break bytes;
        }
        let diff = MAX_BLOB_HEADER_SIZE as i64 - bytes.len() as i64;
        padding = usize::try_from(padding as i64 + diff).expect("padding stays positive");
    };

    let mut file = Vec::new();
    file.extend_from_slice(
        &u32::try_from(header_bytes.len()).expect("len").to_be_bytes(),
    );
    file.extend_from_slice(&header_bytes);
    file.extend_from_slice(&header_payload);
    assert!(open_bytes(file, ReadOptions::new()).is_ok());

    // One byte over the cap fails before the header is even read.
    let mut over = Vec::new();
    over.extend_from_slice(&(MAX_BLOB_HEADER_SIZE + 1).to_be_bytes());
    over.extend_from_slice(&vec![0; MAX_BLOB_HEADER_SIZE as usize + 1]);
    assert!(matches!(
        open_bytes(over, ReadOptions::new()),
        Err(OsmarenaError::Framing(_))
    ));
}

#[test]
fn blob_at_raw_size_cap_succeeds_and_over_fails() {
    // A primitive block padded (via a fat string table entry) to exactly
    // the 32 MiB cap.
    let mut padding = MAX_UNCOMPRESSED_BLOB_SIZE as usize - 1024;
    let payload = loop {
        let mut block = single_dense_node_block(1);
        block.stringtable.s.push(vec![b'x'; padding]);
        let bytes = block.encode_to_vec();
        if bytes.len() == MAX_UNCOMPRESSED_BLOB_SIZE as usize {
            break bytes;
        }
        let diff = MAX_UNCOMPRESSED_BLOB_SIZE as i64 - bytes.len() as i64;
        padding = usize::try_from(padding as i64 + diff).expect("padding stays positive");
    };

    let mut file = Vec::new();
    frame(
        &mut file,
        "OSMHeader",
        &raw_blob(&header_block(&[]).encode_to_vec()),
    );
    frame(&mut file, "OSMData", &zlib_blob(&payload));
    let mut reader = open_bytes(file, ReadOptions::new()).expect("open");
    assert_eq!(collect_ids(&mut reader), vec![1]);

    // raw_size one over the cap is refused without inflating.
    let oversized = proto::Blob {
        raw_size: Some(i32::try_from(MAX_UNCOMPRESSED_BLOB_SIZE + 1).expect("fits")),
        zlib_data: Some(vec![0; 16]),
        ..Default::default()
    }
    .encode_to_vec();
    let mut file = Vec::new();
    frame(
        &mut file,
        "OSMHeader",
        &raw_blob(&header_block(&[]).encode_to_vec()),
    );
    frame(&mut file, "OSMData", &oversized);
    let mut reader = open_bytes(file, ReadOptions::new()).expect("open");
    assert!(matches!(
        reader.read(),
        Err(OsmarenaError::Framing(_))
    ));
}

#[test]
fn zlib_length_mismatch_is_a_framing_error() {
    let payload = single_dense_node_block(1).encode_to_vec();
    let mut blob = proto::Blob::decode(zlib_blob(&payload).as_slice()).expect("re-decode");
    blob.raw_size = Some(blob.raw_size.expect("raw_size") + 1);

    let mut file = Vec::new();
    frame(
        &mut file,
        "OSMHeader",
        &raw_blob(&header_block(&[]).encode_to_vec()),
    );
    frame(&mut file, "OSMData", &blob.encode_to_vec());
    let mut reader = open_bytes(file, ReadOptions::new()).expect("open");
    assert!(matches!(reader.read(), Err(OsmarenaError::Framing(_))));
}

#[test]
fn lzma_blob_is_rejected() {
    let blob = proto::Blob {
        raw_size: Some(16),
        lzma_data: Some(vec![0; 16]),
        ..Default::default()
    }
    .encode_to_vec();
    let mut file = Vec::new();
    frame(
        &mut file,
        "OSMHeader",
        &raw_blob(&header_block(&[]).encode_to_vec()),
    );
    frame(&mut file, "OSMData", &blob);
    let mut reader = open_bytes(file, ReadOptions::new()).expect("open");
    assert!(matches!(
        reader.read(),
        Err(OsmarenaError::UnsupportedCompression("lzma"))
    ));
}

#[test]
fn wrong_blob_type_mid_stream_fails() {
    let mut file = Vec::new();
    frame(
        &mut file,
        "OSMHeader",
        &raw_blob(&header_block(&[]).encode_to_vec()),
    );
    // A second OSMHeader where OSMData is required.
    frame(
        &mut file,
        "OSMHeader",
        &raw_blob(&header_block(&[]).encode_to_vec()),
    );
    let mut reader = open_bytes(file, ReadOptions::new()).expect("open");
    assert!(matches!(reader.read(), Err(OsmarenaError::Framing(_))));
}

#[test]
fn truncated_blob_is_an_io_error() {
    let block = single_dense_node_block(1);
    let mut file = build_file(&header_block(&[]), &[block]);
    file.truncate(file.len() - 3);
    let mut reader = open_bytes(file, ReadOptions::new()).expect("open");
    assert!(matches!(reader.read(), Err(OsmarenaError::Io(_))));
}

// ---- ordering and concurrency ----

#[test]
fn buffers_arrive_in_file_order_with_pool() {
    let blocks: Vec<_> = (1..=40).map(single_dense_node_block).collect();
    let file = build_file(&header_block(&[]), &blocks);

    let pool = Arc::new(
        rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .expect("pool"),
    );
    let mut reader =
        open_bytes(file, ReadOptions::new().pool(pool)).expect("open");
    let ids = collect_ids(&mut reader);
    assert_eq!(ids, (1..=40).collect::<Vec<i64>>());
}

#[test]
fn serial_mode_produces_the_same_stream() {
    let blocks: Vec<_> = (1..=10).map(single_dense_node_block).collect();
    let file = build_file(&header_block(&[]), &blocks);
    let mut reader =
        open_bytes(file, ReadOptions::new().serial(true)).expect("open");
    assert_eq!(collect_ids(&mut reader), (1..=10).collect::<Vec<i64>>());
}

#[test]
fn tight_queue_limits_still_deliver_everything() {
    let blocks: Vec<_> = (1..=30).map(single_dense_node_block).collect();
    let file = build_file(&header_block(&[]), &blocks);
    let mut reader = open_bytes(
        file,
        ReadOptions::new().queue_limits(1, 1),
    )
    .expect("open");
    assert_eq!(collect_ids(&mut reader), (1..=30).collect::<Vec<i64>>());
}

#[test]
fn from_read_streams_a_file_on_disk() {
    let blocks: Vec<_> = (1..=8).map(single_dense_node_block).collect();
    let bytes = build_file(&header_block(&[]), &blocks);

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(&bytes).expect("write file");
    let reopened = std::fs::File::open(file.path()).expect("reopen");

    let mut reader = PbfReader::from_read(
        std::io::BufReader::new(reopened),
        ReadOptions::new(),
    )
    .expect("open");
    assert_eq!(collect_ids(&mut reader), (1..=8).collect::<Vec<i64>>());
}

#[test]
fn chunked_delivery_does_not_change_the_stream() {
    let blocks: Vec<_> = (1..=5).map(single_dense_node_block).collect();
    let file = build_file(&header_block(&[]), &blocks);

    // Deliver the file in awkward 7-byte chunks.
    let (tx, rx) = unbounded();
    for chunk in file.chunks(7) {
        tx.send(chunk.to_vec()).expect("send chunk");
    }
    tx.send(Vec::new()).expect("send EOF");
    drop(tx);

    let mut reader = PbfReader::open(rx, ReadOptions::new()).expect("open");
    assert_eq!(collect_ids(&mut reader), (1..=5).collect::<Vec<i64>>());
}

#[test]
fn dropping_the_reader_mid_stream_shuts_down() {
    let blocks: Vec<_> = (1..=100).map(single_dense_node_block).collect();
    let file = build_file(&header_block(&[]), &blocks);
    let mut reader = open_bytes(
        file,
        ReadOptions::new().queue_limits(2, 2),
    )
    .expect("open");
    let first = reader.read().expect("first buffer");
    assert!(!first.is_empty());
    // Drop joins the reader thread; this must not hang.
    drop(reader);
}

#[test]
fn mixed_entity_file_keeps_block_order() {
    let node_block = single_dense_node_block(1);
    let way_block = proto::PrimitiveBlock {
        stringtable: string_table(&[""]),
        primitivegroup: vec![proto::PrimitiveGroup {
            ways: vec![proto::Way {
                id: 2,
                refs: vec![1],
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    };
    let relation_block = proto::PrimitiveBlock {
        stringtable: string_table(&[""]),
        primitivegroup: vec![proto::PrimitiveGroup {
            relations: vec![proto::Relation {
                id: 3,
                types: vec![0],
                memids: vec![1],
                roles_sid: vec![0],
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    };
    let file = build_file(
        &header_block(&[]),
        &[node_block, way_block, relation_block],
    );

    let mut reader = open_bytes(file, ReadOptions::new()).expect("open");
    assert_eq!(collect_ids(&mut reader), vec![1, 2, 3]);

    // Only ways requested: the node and relation blocks decode to empty
    // buffers, but the way still arrives.
    let blocks = [
        single_dense_node_block(1),
        proto::PrimitiveBlock {
            stringtable: string_table(&[""]),
            primitivegroup: vec![proto::PrimitiveGroup {
                ways: vec![proto::Way {
                    id: 2,
                    refs: vec![1],
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        },
    ];
    let file = build_file(&header_block(&[]), &blocks);
    let mut ways_only = open_bytes(
        file,
        ReadOptions::new().kinds(EntityKinds::WAYS),
    )
    .expect("open");
    assert_eq!(collect_ids(&mut ways_only), vec![2]);
}
