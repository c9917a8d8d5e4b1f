//! File-level header metadata decoded from the OSMHeader blob.

use std::collections::BTreeMap;

use crate::types::BoundingBox;

/// Metadata from a PBF file's header block.
///
/// Beyond the typed fields, writers attach free-form attributes (the
/// osmosis replication triple, the source string); those are kept as a
/// string map.
#[derive(Debug, Clone, Default)]
pub struct Header {
    generator: Option<String>,
    multiple_object_versions: bool,
    has_dense_nodes: bool,
    bounding_boxes: Vec<BoundingBox>,
    optional_features: Vec<String>,
    attributes: BTreeMap<String, String>,
}

impl Header {
    /// The program that wrote the file, if recorded.
    pub fn generator(&self) -> Option<&str> {
        self.generator.as_deref()
    }

    /// True for history files carrying several versions per object.
    pub fn multiple_object_versions(&self) -> bool {
        self.multiple_object_versions
    }

    /// True if the file declares the DenseNodes feature.
    pub fn has_dense_nodes(&self) -> bool {
        self.has_dense_nodes
    }

    /// Bounding boxes declared by the writer.
    pub fn bounding_boxes(&self) -> &[BoundingBox] {
        &self.bounding_boxes
    }

    /// Optional feature strings, verbatim.
    pub fn optional_features(&self) -> &[String] {
        &self.optional_features
    }

    /// Looks up a free-form attribute.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// All free-form attributes.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub(crate) fn set_generator(&mut self, generator: String) {
        self.generator = Some(generator);
    }

    pub(crate) fn set_multiple_object_versions(&mut self, value: bool) {
        self.multiple_object_versions = value;
    }

    pub(crate) fn set_has_dense_nodes(&mut self, value: bool) {
        self.has_dense_nodes = value;
    }

    pub(crate) fn add_bounding_box(&mut self, bbox: BoundingBox) {
        self.bounding_boxes.push(bbox);
    }

    pub(crate) fn add_optional_feature(&mut self, feature: String) {
        self.optional_features.push(feature);
    }

    pub(crate) fn set(&mut self, key: &str, value: String) {
        self.attributes.insert(key.to_owned(), value);
    }
}
