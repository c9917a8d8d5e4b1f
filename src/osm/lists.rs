//! Views over the list sub-items attached to objects.
//!
//! Each list is an item whose payload is a packed sequence; the views
//! here wrap just the payload (the part after the item header) and
//! iterate it. All returned strings borrow the buffer.

use crate::arena::item::{padded_size, read_i32, read_i64, read_u16, read_u32, ItemType};
use crate::types::Location;

/// Bytes of one way-node entry: `ref: i64, x: i32, y: i32`.
pub(crate) const WAY_NODE_SIZE: usize = 16;

/// Fixed bytes of one relation member before the role string:
/// `ref: i64, type: u16, role_len: u16`.
pub(crate) const MEMBER_FIXED_SIZE: usize = 12;

/// Bit of the member type word marking an inlined full-member record.
pub(crate) const FULL_MEMBER_FLAG: u16 = 0x8000;

/// A key/value tag list.
///
/// The payload is a sequence of `key\0value\0` pairs, each padded so the
/// next pair starts aligned.
#[derive(Debug, Clone, Copy)]
pub struct TagList<'a> {
    payload: &'a [u8],
}

impl<'a> TagList<'a> {
    pub(crate) fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub(crate) fn empty() -> Self {
        Self { payload: &[] }
    }

    /// True if there are no tags.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Iterates `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> TagIter<'a> {
        TagIter {
            payload: self.payload,
            pos: 0,
        }
    }

    /// Looks up the value for `key`, linearly.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

impl<'a> IntoIterator for TagList<'a> {
    type Item = (&'a str, &'a str);
    type IntoIter = TagIter<'a>;

    fn into_iter(self) -> TagIter<'a> {
        self.iter()
    }
}

/// Iterator over the pairs of a [`TagList`].
#[derive(Debug, Clone)]
pub struct TagIter<'a> {
    payload: &'a [u8],
    pos: usize,
}

fn cstr_at(payload: &[u8], pos: usize) -> Option<(&str, usize)> {
    let rest = payload.get(pos..)?;
    let nul = rest.iter().position(|&b| b == 0)?;
    let s = std::str::from_utf8(&rest[..nul]).ok()?;
    Some((s, pos + nul + 1))
}

impl<'a> Iterator for TagIter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<(&'a str, &'a str)> {
        if self.pos >= self.payload.len() {
            return None;
        }
        let start = self.pos;
        let (key, after_key) = cstr_at(self.payload, start)?;
        let (value, after_value) = cstr_at(self.payload, after_key)?;
        self.pos = start + padded_size(after_value - start);
        Some((key, value))
    }
}

/// One entry of a [`WayNodeList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WayNode {
    /// Id of the referenced node.
    pub node_ref: i64,
    /// The node's location; undefined until a location cache fills it in.
    pub location: Location,
}

/// A way's list of node references.
#[derive(Debug, Clone, Copy)]
pub struct WayNodeList<'a> {
    payload: &'a [u8],
}

impl<'a> WayNodeList<'a> {
    pub(crate) fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub(crate) fn empty() -> Self {
        Self { payload: &[] }
    }

    /// Number of node references.
    pub fn len(&self) -> usize {
        self.payload.len() / WAY_NODE_SIZE
    }

    /// True if the way has no node references.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// The `index`-th entry, if in range.
    pub fn get(&self, index: usize) -> Option<WayNode> {
        let off = index.checked_mul(WAY_NODE_SIZE)?;
        if off + WAY_NODE_SIZE > self.payload.len() {
            return None;
        }
        Some(WayNode {
            node_ref: read_i64(self.payload, off),
            location: Location::new(
                read_i32(self.payload, off + 8),
                read_i32(self.payload, off + 12),
            ),
        })
    }

    /// Iterates entries in way order.
    pub fn iter(&self) -> impl Iterator<Item = WayNode> + 'a {
        let list = *self;
        (0..list.len()).filter_map(move |i| list.get(i))
    }
}

/// One entry of a [`RelationMemberList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationMember<'a> {
    /// Kind of the referenced object.
    pub member_type: ItemType,
    /// Id of the referenced object.
    pub member_ref: i64,
    /// The member's role; often empty.
    pub role: &'a str,
}

/// A relation's member list. Members are variable-length because of the
/// role string, so access is sequential.
#[derive(Debug, Clone, Copy)]
pub struct RelationMemberList<'a> {
    payload: &'a [u8],
}

impl<'a> RelationMemberList<'a> {
    pub(crate) fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub(crate) fn empty() -> Self {
        Self { payload: &[] }
    }

    /// True if the relation has no members.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Iterates members in relation order.
    pub fn iter(&self) -> RelationMemberIter<'a> {
        RelationMemberIter {
            payload: self.payload,
            pos: 0,
        }
    }
}

impl<'a> IntoIterator for RelationMemberList<'a> {
    type Item = RelationMember<'a>;
    type IntoIter = RelationMemberIter<'a>;

    fn into_iter(self) -> RelationMemberIter<'a> {
        self.iter()
    }
}

/// Iterator over the members of a [`RelationMemberList`].
#[derive(Debug, Clone)]
pub struct RelationMemberIter<'a> {
    payload: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for RelationMemberIter<'a> {
    type Item = RelationMember<'a>;

    fn next(&mut self) -> Option<RelationMember<'a>> {
        if self.pos + MEMBER_FIXED_SIZE > self.payload.len() {
            return None;
        }
        let member_ref = read_i64(self.payload, self.pos);
        let type_word = read_u16(self.payload, self.pos + 8);
        let member_type = ItemType::from_u16(type_word & !FULL_MEMBER_FLAG)?;
        let role_len = read_u16(self.payload, self.pos + 10) as usize;
        let role_start = self.pos + MEMBER_FIXED_SIZE;
        let role = self
            .payload
            .get(role_start..role_start + role_len)
            .and_then(|b| std::str::from_utf8(b).ok())?;
        self.pos += padded_size(MEMBER_FIXED_SIZE + role_len + 1);
        // An inlined full-member record follows its member entry; skip it.
        if type_word & FULL_MEMBER_FLAG != 0 && self.pos + 4 <= self.payload.len() {
            self.pos += padded_size(read_u32(self.payload, self.pos) as usize);
        }
        Some(RelationMember {
            member_type,
            member_ref,
            role,
        })
    }
}
