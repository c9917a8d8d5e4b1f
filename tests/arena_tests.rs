#![allow(missing_docs)]

use osmarena::arena::{
    Buffer, GrowthPolicy, NodeBuilder, RelationBuilder, WayBuilder, ALIGNMENT,
};
use osmarena::{ItemType, Location, OsmarenaError, Timestamp};

fn build_sample_node(buffer: &mut Buffer, id: i64) {
    let mut builder = NodeBuilder::new(buffer).expect("open node");
    builder
        .id(id)
        .version(3)
        .timestamp(Timestamp::new(1_600_000_000))
        .uid(42)
        .changeset(77);
    builder.add_user("mapper").expect("add user");
    builder.location(Location::new(134_000_000, 525_000_000));
    let mut tags = builder.tags().expect("open tags");
    tags.add_tag("amenity", "bench").expect("tag 1");
    tags.add_tag("backrest", "yes").expect("tag 2");
    drop(tags);
    drop(builder);
    buffer.commit();
}

#[test]
fn node_field_roundtrip() {
    let mut buffer = Buffer::new();
    build_sample_node(&mut buffer, 123);

    let item = buffer.iter().next().expect("one item");
    assert_eq!(item.item_type(), Some(ItemType::Node));
    let node = item.as_node().expect("node view");
    assert_eq!(node.id(), 123);
    assert_eq!(node.version(), 3);
    assert!(node.visible());
    assert_eq!(node.timestamp(), Timestamp::new(1_600_000_000));
    assert_eq!(node.uid(), 42);
    assert_eq!(node.changeset(), 77);
    assert_eq!(node.user(), "mapper");
    assert_eq!(node.location(), Location::new(134_000_000, 525_000_000));

    let tags: Vec<_> = node.tags().iter().collect();
    assert_eq!(tags, vec![("amenity", "bench"), ("backrest", "yes")]);
    assert_eq!(node.tags().get("backrest"), Some("yes"));
    assert_eq!(node.tags().get("highway"), None);
}

#[test]
fn sizes_sum_to_committed_and_boundaries_align() {
    let mut buffer = Buffer::new();
    for id in 0..10 {
        build_sample_node(&mut buffer, id);
    }

    let mut total = 0usize;
    for item in buffer.iter() {
        assert_eq!(item.offset() % ALIGNMENT, 0, "misaligned at {}", item.offset());
        assert_eq!(item.size() as usize % ALIGNMENT, 0);
        total += item.size() as usize;
    }
    assert_eq!(total, buffer.committed_size());
    assert_eq!(buffer.iter().count(), 10);
}

#[test]
fn iteration_is_restartable() {
    let mut buffer = Buffer::new();
    build_sample_node(&mut buffer, 1);
    build_sample_node(&mut buffer, 2);

    let first: Vec<i64> = buffer
        .iter()
        .filter_map(|i| i.as_node())
        .map(|n| n.id())
        .collect();
    let second: Vec<i64> = buffer
        .iter()
        .filter_map(|i| i.as_node())
        .map(|n| n.id())
        .collect();
    assert_eq!(first, vec![1, 2]);
    assert_eq!(first, second);
}

#[test]
fn rollback_discards_partial_record() {
    let mut buffer = Buffer::new();
    build_sample_node(&mut buffer, 1);
    let committed = buffer.committed_size();

    {
        let mut builder = NodeBuilder::new(&mut buffer).expect("open node");
        builder.id(999);
        builder.add_user("half-finished").expect("add user");
    }
    buffer.rollback();

    assert_eq!(buffer.committed_size(), committed);
    let ids: Vec<i64> = buffer
        .iter()
        .filter_map(|i| i.as_node())
        .map(|n| n.id())
        .collect();
    assert_eq!(ids, vec![1]);
}

#[test]
fn removed_flag_is_honored_on_opt_in() {
    let mut buffer = Buffer::new();
    build_sample_node(&mut buffer, 1);
    build_sample_node(&mut buffer, 2);
    build_sample_node(&mut buffer, 3);

    let second_offset = buffer.iter().nth(1).expect("second item").offset();
    buffer.set_removed(second_offset, true).expect("flag");

    // Plain iteration still sees everything, in order.
    let all: Vec<i64> = buffer
        .iter()
        .filter_map(|i| i.as_node())
        .map(|n| n.id())
        .collect();
    assert_eq!(all, vec![1, 2, 3]);

    let live: Vec<i64> = buffer
        .iter_live()
        .filter_map(|i| i.as_node())
        .map(|n| n.id())
        .collect();
    assert_eq!(live, vec![1, 3]);

    buffer.set_removed(second_offset, false).expect("unflag");
    assert_eq!(buffer.iter_live().count(), 3);
}

#[test]
fn set_removed_rejects_bogus_offsets() {
    let mut buffer = Buffer::new();
    build_sample_node(&mut buffer, 1);
    assert!(buffer.set_removed(3, true).is_err());
    assert!(buffer.set_removed(1 << 20, true).is_err());
}

#[test]
fn fixed_policy_refuses_to_grow() {
    let mut buffer = Buffer::with_capacity(64, GrowthPolicy::Fixed);
    let mut builder = NodeBuilder::new(&mut buffer).expect("node header fits");
    let err = builder
        .add_user("a user name that clearly does not fit in what is left")
        .expect_err("should refuse");
    assert!(matches!(err, OsmarenaError::BufferFull));
}

#[test]
fn clear_keeps_the_allocation() {
    let mut buffer = Buffer::with_capacity(4096, GrowthPolicy::Grow);
    build_sample_node(&mut buffer, 1);
    let capacity = buffer.capacity();
    buffer.clear();
    assert!(buffer.is_empty());
    assert_eq!(buffer.committed_size(), 0);
    assert_eq!(buffer.capacity(), capacity);
    assert_eq!(buffer.iter().count(), 0);
}

#[test]
fn way_nodes_keep_order_and_start_undefined() {
    let mut buffer = Buffer::new();
    let mut builder = WayBuilder::new(&mut buffer).expect("open way");
    builder.id(7);
    builder.add_user("").expect("user");
    let mut nodes = builder.way_nodes().expect("open list");
    for node_ref in [100, 105, 102] {
        nodes.add_way_node(node_ref).expect("add ref");
    }
    drop(nodes);
    drop(builder);
    buffer.commit();

    let way = buffer
        .iter()
        .next()
        .and_then(|i| i.as_way())
        .expect("way view");
    let list = way.nodes();
    assert_eq!(list.len(), 3);
    let refs: Vec<i64> = list.iter().map(|wn| wn.node_ref).collect();
    assert_eq!(refs, vec![100, 105, 102]);
    assert!(list.iter().all(|wn| !wn.location.is_defined()));
    assert!(list.get(3).is_none());
}

#[test]
fn relation_members_roundtrip() {
    let mut buffer = Buffer::new();
    let mut builder = RelationBuilder::new(&mut buffer).expect("open relation");
    builder.id(1);
    builder.add_user("").expect("user");
    let mut members = builder.members().expect("open list");
    members
        .add_member(ItemType::Node, 10, "inner")
        .expect("member 1");
    members.add_member(ItemType::Way, 15, "").expect("member 2");
    members
        .add_member(ItemType::Relation, 11, "outer")
        .expect("member 3");
    drop(members);
    drop(builder);
    buffer.commit();

    let relation = buffer
        .iter()
        .next()
        .and_then(|i| i.as_relation())
        .expect("relation view");
    let members: Vec<_> = relation
        .members()
        .iter()
        .map(|m| (m.member_type, m.member_ref, m.role))
        .collect();
    assert_eq!(
        members,
        vec![
            (ItemType::Node, 10, "inner"),
            (ItemType::Way, 15, ""),
            (ItemType::Relation, 11, "outer"),
        ]
    );
}

#[test]
fn strings_with_nul_are_rejected() {
    let mut buffer = Buffer::new();
    let mut builder = NodeBuilder::new(&mut buffer).expect("open node");
    let mut tags = builder.tags().expect("open tags");
    let err = tags.add_tag("key\0with nul", "value").expect_err("reject");
    assert!(matches!(err, OsmarenaError::MalformedBlock(_)));
}

#[test]
fn builder_without_user_gets_an_empty_one() {
    let mut buffer = Buffer::new();
    let mut builder = NodeBuilder::new(&mut buffer).expect("open node");
    builder.id(5);
    let mut tags = builder.tags().expect("tags without explicit user");
    tags.add_tag("natural", "tree").expect("tag");
    drop(tags);
    drop(builder);
    buffer.commit();

    let node = buffer
        .iter()
        .next()
        .and_then(|i| i.as_node())
        .expect("node view");
    assert_eq!(node.user(), "");
    assert_eq!(node.tags().get("natural"), Some("tree"));
}
