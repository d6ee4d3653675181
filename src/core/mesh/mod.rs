pub mod builder;

use indexmap::IndexMap;

use super::attribute::{Attribute, AttributeType};
use super::shared::{Face, Group};

/// Represents a triangle mesh, or a point cloud when it has no faces.
/// It consists of a list of faces, where each face is defined by three vertex indices,
/// the per-vertex [Attribute]s keyed by name in insertion order, the face groups,
/// and free-form string metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub(crate) faces: Vec<Face>,
    pub(crate) attributes: IndexMap<String, Attribute>,
    pub(crate) groups: Vec<Group>,
    pub(crate) metadata: IndexMap<String, String>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn get_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    pub fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// returns the first attribute of the given type.
    pub fn get_attribute_by_type(&self, ty: AttributeType) -> Option<&Attribute> {
        self.attributes.values().find(|att| att.get_attribute_type() == ty)
    }

    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn get_groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn get_metadata(&self) -> &IndexMap<String, String> {
        &self.metadata
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// number of vertices; attributes all share it. Without attributes it is
    /// one past the largest index referenced by a face.
    pub fn num_vertices(&self) -> usize {
        match self.attributes.values().next() {
            Some(att) => att.len(),
            None => self.faces.iter()
                .flat_map(|f| f.iter())
                .map(|&v| v as usize + 1)
                .max()
                .unwrap_or(0),
        }
    }
}
