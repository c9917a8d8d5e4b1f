//! Scoped builders: the only way records are written into a buffer.
//!
//! A builder reserves its record's fixed part on construction and patches
//! the final size into the item header when it is dropped, so the fix-up
//! runs on every exit path, including early error returns. Nested list
//! builders mutably borrow their parent, which gives the completion order
//! the layout needs for free: a child must be dropped before the parent
//! can be touched again, and a parent dropped later re-derives its own
//! size from the write frontier, which by then includes all children.
//!
//! After the outermost builder is dropped the caller publishes the record
//! with [`Buffer::commit`] or discards it with [`Buffer::rollback`]. A
//! record that was rolled back never becomes visible to iterators.
//!
//! Builders are neither `Copy` nor `Clone`, and holding one mutably
//! borrows the buffer, so record views can never observe a half-written
//! record.

use crate::arena::buffer::Buffer;
use crate::arena::item::{padded_size, ItemType, ALIGNMENT, ITEM_HEADER_SIZE};
use crate::error::{OsmarenaError, Result};
use crate::osm::object::{
    DELETED_FLAG, NODE_FIXED_SIZE, OBJECT_FIXED_SIZE, OFF_CHANGESET, OFF_ID, OFF_LOCATION,
    OFF_TIMESTAMP, OFF_UID, OFF_VERSION_FLAGS,
};
use crate::osm::lists::{MEMBER_FIXED_SIZE, WAY_NODE_SIZE};
use crate::types::{Location, Timestamp};

fn check_cstr(what: &str, s: &str) -> Result<()> {
    if s.as_bytes().contains(&0) {
        return Err(OsmarenaError::MalformedBlock(format!(
            "{what} contains a NUL byte"
        )));
    }
    Ok(())
}

/// Shared machinery of the three object builders.
#[derive(Debug)]
struct ObjectCore<'b> {
    buffer: &'b mut Buffer,
    offset: usize,
    user_added: bool,
}

impl<'b> ObjectCore<'b> {
    fn open(buffer: &'b mut Buffer, item_type: ItemType, fixed_size: usize) -> Result<Self> {
        let offset = buffer.reserve(fixed_size)?;
        buffer.put_u32(offset, fixed_size as u32);
        buffer.put_u16(offset + 4, item_type.as_u16());
        Ok(Self {
            buffer,
            offset,
            user_added: false,
        })
    }

    fn set_id(&mut self, id: i64) {
        self.buffer.put_i64(self.offset + OFF_ID, id);
    }

    fn set_version(&mut self, version: u32) {
        let off = self.offset + OFF_VERSION_FLAGS;
        let deleted = self.buffer.get_u32(off) & DELETED_FLAG;
        self.buffer.put_u32(off, (version & !DELETED_FLAG) | deleted);
    }

    fn set_deleted(&mut self, deleted: bool) {
        let off = self.offset + OFF_VERSION_FLAGS;
        let version = self.buffer.get_u32(off) & !DELETED_FLAG;
        let flag = if deleted { DELETED_FLAG } else { 0 };
        self.buffer.put_u32(off, version | flag);
    }

    fn set_timestamp(&mut self, timestamp: Timestamp) {
        self.buffer
            .put_u32(self.offset + OFF_TIMESTAMP, timestamp.seconds());
    }

    fn set_uid(&mut self, uid: u32) {
        self.buffer.put_u32(self.offset + OFF_UID, uid);
    }

    fn set_changeset(&mut self, changeset: u32) {
        self.buffer.put_u32(self.offset + OFF_CHANGESET, changeset);
    }

    fn add_user(&mut self, user: &str) -> Result<()> {
        debug_assert!(!self.user_added, "user name can only be added once");
        let len =
            u16::try_from(user.len()).map_err(|_| OsmarenaError::SizeOverflow)?;
        let off = self.buffer.reserve(padded_size(2 + user.len()))?;
        self.buffer.put_u16(off, len);
        self.buffer.put_bytes(off + 2, user.as_bytes());
        self.user_added = true;
        Ok(())
    }

    /// Sub-items live after the user name region; writing an empty name
    /// keeps the layout well-formed when the caller never set one.
    fn close_user_region(&mut self) -> Result<()> {
        if self.user_added {
            Ok(())
        } else {
            self.add_user("")
        }
    }
}

impl Drop for ObjectCore<'_> {
    fn drop(&mut self) {
        let size = self.buffer.write_position() - self.offset;
        debug_assert_eq!(size % ALIGNMENT, 0);
        self.buffer.put_u32(self.offset, size as u32);
    }
}

macro_rules! object_builder_methods {
    () => {
        /// Sets the object id.
        pub fn id(&mut self, id: i64) -> &mut Self {
            self.core.set_id(id);
            self
        }

        /// Sets the object version (31 bits).
        pub fn version(&mut self, version: u32) -> &mut Self {
            self.core.set_version(version);
            self
        }

        /// Marks the object deleted (or not).
        pub fn deleted(&mut self, deleted: bool) -> &mut Self {
            self.core.set_deleted(deleted);
            self
        }

        /// Marks the object visible, the inverse of deleted.
        pub fn visible(&mut self, visible: bool) -> &mut Self {
            self.core.set_deleted(!visible);
            self
        }

        /// Sets the last-modified timestamp.
        pub fn timestamp(&mut self, timestamp: Timestamp) -> &mut Self {
            self.core.set_timestamp(timestamp);
            self
        }

        /// Sets the user id.
        pub fn uid(&mut self, uid: u32) -> &mut Self {
            self.core.set_uid(uid);
            self
        }

        /// Sets the user id from a signed value; negative means anonymous
        /// and maps to 0.
        pub fn uid_from_signed(&mut self, uid: i32) -> &mut Self {
            self.core.set_uid(u32::try_from(uid).unwrap_or(0));
            self
        }

        /// Sets the changeset id.
        pub fn changeset(&mut self, changeset: u32) -> &mut Self {
            self.core.set_changeset(changeset);
            self
        }

        /// Appends the user name. Must come before any sub-list; a list
        /// opened without a user name gets an empty one.
        pub fn add_user(&mut self, user: &str) -> Result<&mut Self> {
            self.core.add_user(user)?;
            Ok(self)
        }

        /// Opens the tag list for this object.
        pub fn tags(&mut self) -> Result<TagListBuilder<'_>> {
            self.core.close_user_region()?;
            TagListBuilder::open(self.core.buffer)
        }
    };
}

/// Builds one node record.
#[derive(Debug)]
pub struct NodeBuilder<'b> {
    core: ObjectCore<'b>,
}

impl<'b> NodeBuilder<'b> {
    /// Reserves a node record at the buffer's write frontier.
    pub fn new(buffer: &'b mut Buffer) -> Result<Self> {
        let core = ObjectCore::open(buffer, ItemType::Node, NODE_FIXED_SIZE)?;
        // The zero fill would read as a valid (0, 0); start undefined.
        core.buffer.put_i32(core.offset + OFF_LOCATION, i32::MIN);
        core.buffer.put_i32(core.offset + OFF_LOCATION + 4, i32::MIN);
        Ok(Self { core })
    }

    object_builder_methods!();

    /// Sets the node's location.
    pub fn location(&mut self, location: Location) -> &mut Self {
        let off = self.core.offset + OFF_LOCATION;
        self.core.buffer.put_i32(off, location.x());
        self.core.buffer.put_i32(off + 4, location.y());
        self
    }
}

/// Builds one way record.
#[derive(Debug)]
pub struct WayBuilder<'b> {
    core: ObjectCore<'b>,
}

impl<'b> WayBuilder<'b> {
    /// Reserves a way record at the buffer's write frontier.
    pub fn new(buffer: &'b mut Buffer) -> Result<Self> {
        let core = ObjectCore::open(buffer, ItemType::Way, OBJECT_FIXED_SIZE)?;
        Ok(Self { core })
    }

    object_builder_methods!();

    /// Opens the way node list for this way.
    pub fn way_nodes(&mut self) -> Result<WayNodeListBuilder<'_>> {
        self.core.close_user_region()?;
        WayNodeListBuilder::open(self.core.buffer)
    }
}

/// Builds one relation record.
#[derive(Debug)]
pub struct RelationBuilder<'b> {
    core: ObjectCore<'b>,
}

impl<'b> RelationBuilder<'b> {
    /// Reserves a relation record at the buffer's write frontier.
    pub fn new(buffer: &'b mut Buffer) -> Result<Self> {
        let core = ObjectCore::open(buffer, ItemType::Relation, OBJECT_FIXED_SIZE)?;
        Ok(Self { core })
    }

    object_builder_methods!();

    /// Opens the member list for this relation.
    pub fn members(&mut self) -> Result<RelationMemberListBuilder<'_>> {
        self.core.close_user_region()?;
        RelationMemberListBuilder::open(self.core.buffer)
    }
}

/// Shared machinery of the three list builders.
#[derive(Debug)]
struct ListCore<'s> {
    buffer: &'s mut Buffer,
    offset: usize,
}

impl<'s> ListCore<'s> {
    fn open(buffer: &'s mut Buffer, item_type: ItemType) -> Result<Self> {
        let offset = buffer.reserve(ITEM_HEADER_SIZE)?;
        buffer.put_u32(offset, ITEM_HEADER_SIZE as u32);
        buffer.put_u16(offset + 4, item_type.as_u16());
        Ok(Self { buffer, offset })
    }
}

impl Drop for ListCore<'_> {
    fn drop(&mut self) {
        let size = self.buffer.write_position() - self.offset;
        debug_assert_eq!(size % ALIGNMENT, 0);
        self.buffer.put_u32(self.offset, size as u32);
    }
}

/// Builds a tag list as a sub-item of an object.
///
/// Each tag is stored as a `key\0value\0` pair, zero-padded so the next
/// pair starts aligned.
#[derive(Debug)]
pub struct TagListBuilder<'s> {
    core: ListCore<'s>,
}

impl<'s> TagListBuilder<'s> {
    fn open(buffer: &'s mut Buffer) -> Result<Self> {
        Ok(Self {
            core: ListCore::open(buffer, ItemType::TagList)?,
        })
    }

    /// Appends one key/value pair. Neither string may contain NUL.
    pub fn add_tag(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        check_cstr("tag key", key)?;
        check_cstr("tag value", value)?;
        let pair_len = key.len() + 1 + value.len() + 1;
        let off = self.core.buffer.reserve(padded_size(pair_len))?;
        self.core.buffer.put_bytes(off, key.as_bytes());
        self.core
            .buffer
            .put_bytes(off + key.len() + 1, value.as_bytes());
        Ok(self)
    }
}

/// Builds a way node list as a sub-item of a way.
#[derive(Debug)]
pub struct WayNodeListBuilder<'s> {
    core: ListCore<'s>,
}

impl<'s> WayNodeListBuilder<'s> {
    fn open(buffer: &'s mut Buffer) -> Result<Self> {
        Ok(Self {
            core: ListCore::open(buffer, ItemType::WayNodeList)?,
        })
    }

    /// Appends one node reference. The location starts undefined; a later
    /// cache-lookup stage fills it in.
    pub fn add_way_node(&mut self, node_ref: i64) -> Result<&mut Self> {
        self.add_way_node_at(node_ref, Location::undefined())
    }

    /// Appends one node reference with a known location, for writers that
    /// carry locations on ways.
    pub fn add_way_node_at(&mut self, node_ref: i64, location: Location) -> Result<&mut Self> {
        let off = self.core.buffer.reserve(WAY_NODE_SIZE)?;
        self.core.buffer.put_i64(off, node_ref);
        self.core.buffer.put_i32(off + 8, location.x());
        self.core.buffer.put_i32(off + 12, location.y());
        Ok(self)
    }
}

/// Builds a relation member list as a sub-item of a relation.
#[derive(Debug)]
pub struct RelationMemberListBuilder<'s> {
    core: ListCore<'s>,
}

impl<'s> RelationMemberListBuilder<'s> {
    fn open(buffer: &'s mut Buffer) -> Result<Self> {
        Ok(Self {
            core: ListCore::open(buffer, ItemType::RelationMemberList)?,
        })
    }

    /// Appends one member. `member_type` must be node, way or relation;
    /// the role may not contain NUL.
    pub fn add_member(
        &mut self,
        member_type: ItemType,
        member_ref: i64,
        role: &str,
    ) -> Result<&mut Self> {
        debug_assert!(matches!(
            member_type,
            ItemType::Node | ItemType::Way | ItemType::Relation
        ));
        check_cstr("member role", role)?;
        let role_len =
            u16::try_from(role.len()).map_err(|_| OsmarenaError::SizeOverflow)?;
        let off = self
            .core
            .buffer
            .reserve(padded_size(MEMBER_FIXED_SIZE + role.len() + 1))?;
        self.core.buffer.put_i64(off, member_ref);
        self.core.buffer.put_u16(off + 8, member_type.as_u16());
        self.core.buffer.put_u16(off + 10, role_len);
        self.core.buffer.put_bytes(off + 12, role.as_bytes());
        Ok(self)
    }
}
