use std::fmt::Debug;
use std::path::Path;

use crate::core::mesh::builder::{self, MeshBuilder};
use crate::core::shared::{Face, Group};
use crate::core::mesh::Mesh;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Err {
    #[error("Failed to load obj file: {0}")]
    LoadError(String),
    #[error("Mesh builder error: {0}")]
    MeshBuilderError(#[from] builder::Err),
    #[error("Obj file has no models")]
    NoModels,
    #[error("Model {0} has only some of the vertex attributes of the other models")]
    PartialAttributes(String),
}

/// Loads an obj file into a [Mesh]. Polygons are triangulated and every model becomes
/// a group named after it. Normals, texture coordinates and vertex colors are kept when
/// every model has them.
pub fn load_obj<P: AsRef<Path> + Debug>(path: P) -> Result<Mesh, Err> {
    let op = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, _materials) = tobj::load_obj(&path, &op).map_err(|e| Err::LoadError(e.to_string()))?;
    if models.is_empty() {
        return Err(Err::NoModels);
    }

    let has_normals = has_all(&models, |m| &m.normals)?;
    let has_uvs = has_all(&models, |m| &m.texcoords)?;
    let has_colors = has_all(&models, |m| &m.vertex_color)?;

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut colors = Vec::new();
    let mut faces: Vec<Face> = Vec::new();
    let mut builder = MeshBuilder::new();
    for model in &models {
        let m = &model.mesh;
        let offset = (positions.len() / 3) as u32;
        faces.extend(m.indices.chunks_exact(3).map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]));
        positions.extend_from_slice(&m.positions);
        if has_normals {
            normals.extend_from_slice(&m.normals);
        }
        if has_uvs {
            uvs.extend_from_slice(&m.texcoords);
        }
        if has_colors {
            colors.extend_from_slice(&m.vertex_color);
        }
        if models.len() > 1 {
            builder.add_group(Group::new(faces.len() as u32).with_property("name", model.name.as_str()));
        }
    }
    tracing::debug!(
        models = models.len(),
        vertices = positions.len() / 3,
        faces = faces.len(),
        "loaded obj file"
    );

    builder.set_faces(faces);
    builder.add_positions(positions)?;
    if has_normals {
        builder.add_normals(normals)?;
    }
    if has_uvs {
        builder.add_uvs(uvs)?;
    }
    if has_colors {
        builder.add_colors(colors, 3)?;
    }
    Ok(builder.build()?)
}

/// whether every model carries the given attribute; a mix of models with and without it is an error.
fn has_all<F>(models: &[tobj::Model], field: F) -> Result<bool, Err>
    where F: Fn(&tobj::Mesh) -> &Vec<f32>
{
    let present = models.iter().filter(|m| !field(&m.mesh).is_empty()).count();
    if present == 0 || present == models.len() {
        return Ok(present > 0);
    }
    let missing = models.iter().find(|m| field(&m.mesh).is_empty()).map_or_else(String::new, |m| m.name.clone());
    Err(Err::PartialAttributes(missing))
}
