use indexmap::IndexMap;
use thiserror::Error;

use crate::core::attribute::{self, Attribute, AttributeType, Scalar};
use crate::core::shared::{Face, Group};
use super::Mesh;

#[remain::sorted]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Err {
    #[error("Attribute error: {0}")]
    AttributeError(#[from] attribute::Err),
    #[error("Attribute {name} has {len} vertices, expected {expected}")]
    AttributeLengthMismatch { name: String, len: usize, expected: usize },
    #[error("Attribute {0} is registered twice")]
    DuplicateAttribute(String),
    #[error("Face {face} references vertex {vertex}, but the mesh has {num_vertices} vertices")]
    FaceOutOfRange { face: usize, vertex: u32, num_vertices: usize },
    #[error("Group ends must be non-decreasing and the last one must equal the face count {num_faces}")]
    InvalidGroups { num_faces: usize },
}

/// Collects faces, attributes, groups and metadata, and validates them into a [Mesh].
#[derive(Debug, Default)]
pub struct MeshBuilder {
    faces: Vec<Face>,
    attributes: IndexMap<String, Attribute>,
    groups: Vec<Group>,
    metadata: IndexMap<String, String>,
    duplicate: Option<String>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_faces(&mut self, faces: Vec<Face>) -> &mut Self {
        self.faces = faces;
        self
    }

    /// registers an attribute under its own name.
    pub fn add_attribute(&mut self, att: Attribute) -> &mut Self {
        let name = att.get_name().to_owned();
        if self.attributes.insert(name.clone(), att).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(name);
        }
        self
    }

    fn add_typed<T: Scalar>(&mut self, ty: AttributeType, data: Vec<T>, num_components: usize) -> Result<&mut Self, Err> {
        // every type but Custom has a default name
        let name = ty.default_name().unwrap_or("custom");
        let att = Attribute::new(name, ty, data, num_components)?;
        Ok(self.add_attribute(att))
    }

    pub fn add_positions<T: Scalar>(&mut self, data: Vec<T>) -> Result<&mut Self, Err> {
        self.add_typed(AttributeType::Position, data, 3)
    }

    /// normals are `f32` unit vectors or `i16` vectors scaled by 32767.
    pub fn add_normals<T: Scalar>(&mut self, data: Vec<T>) -> Result<&mut Self, Err> {
        self.add_typed(AttributeType::Normal, data, 3)
    }

    /// colors are `u8` in 0..=255 or floats in 0..=1, with 3 or 4 components.
    pub fn add_colors<T: Scalar>(&mut self, data: Vec<T>, num_components: usize) -> Result<&mut Self, Err> {
        self.add_typed(AttributeType::Color, data, num_components)
    }

    pub fn add_uvs<T: Scalar>(&mut self, data: Vec<T>) -> Result<&mut Self, Err> {
        self.add_typed(AttributeType::TextureCoordinate, data, 2)
    }

    pub fn add_custom<T: Scalar>(&mut self, name: &str, data: Vec<T>, num_components: usize) -> Result<&mut Self, Err> {
        let att = Attribute::new(name, AttributeType::Custom, data, num_components)?;
        Ok(self.add_attribute(att))
    }

    pub fn add_group(&mut self, group: Group) -> &mut Self {
        self.groups.push(group);
        self
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<Mesh, Err> {
        if let Some(name) = self.duplicate {
            return Err(Err::DuplicateAttribute(name));
        }
        let mesh = Mesh {
            faces: self.faces,
            attributes: self.attributes,
            groups: self.groups,
            metadata: self.metadata,
        };

        let num_vertices = mesh.num_vertices();
        for att in mesh.attributes.values() {
            if att.len() != num_vertices {
                return Err(Err::AttributeLengthMismatch {
                    name: att.get_name().to_owned(),
                    len: att.len(),
                    expected: num_vertices,
                });
            }
        }

        for (i, face) in mesh.faces.iter().enumerate() {
            if let Some(&v) = face.iter().find(|&&v| v as usize >= num_vertices) {
                return Err(Err::FaceOutOfRange { face: i, vertex: v, num_vertices });
            }
        }

        Self::check_groups(&mesh.groups, mesh.faces.len())?;
        Ok(mesh)
    }

    fn check_groups(groups: &[Group], num_faces: usize) -> Result<(), Err> {
        if groups.is_empty() {
            return Ok(());
        }
        let sorted = groups.windows(2).all(|w| w[0].end <= w[1].end);
        let covers = groups.last().map(|g| g.end as usize) == Some(num_faces);
        if sorted && covers {
            Ok(())
        } else {
            Err(Err::InvalidGroups { num_faces })
        }
    }
}
