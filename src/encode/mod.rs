pub mod attribute;
pub(crate) mod connectivity;
pub(crate) mod entropy;
pub(crate) mod frame;
pub(crate) mod header;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::core::bit_coder::ByteWriter;
use crate::core::mesh::Mesh;
use crate::debug_write;
use crate::prelude::ConfigType;
use crate::shared::entropy::EntropyMode;
use crate::shared::header::Header;
use crate::shared::attribute::Geometry;
use attribute::{AttributeEncoder, AttributeEncoderImpl};
use connectivity::{point_cloud, ConnectivityOutput};

pub use attribute::{Config as AttributeConfig, Quantization};
pub use connectivity::SymbolCounts;

/// name of the attribute other attributes take geometry from.
pub(crate) const POSITION: &str = "position";

pub struct Config {
    pub entropy: EntropyMode,
    /// settings by attribute name; the others get [attribute::Config::default_for] their type.
    pub attributes: IndexMap<String, attribute::Config>,
    /// sort point clouds along a z-order curve of their positions.
    pub point_cloud_order: bool,
}

impl ConfigType for Config {
    fn default() -> Self {
        Self {
            entropy: EntropyMode::Tunstall,
            attributes: IndexMap::new(),
            point_cloud_order: true,
        }
    }
}

impl Config {
    pub fn with_attribute(mut self, name: impl Into<String>, cfg: attribute::Config) -> Self {
        self.attributes.insert(name.into(), cfg);
        self
    }
}

#[remain::sorted]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Err {
    #[error("Attribute encoding error: {0}")]
    AttributeError(#[from] attribute::Err),
    #[error("Connectivity encoding error: {0}")]
    ConnectivityError(#[from] connectivity::Err),
    #[error("Header encoding error: {0}")]
    HeaderError(#[from] header::Err),
    #[error("Too many {what}: {count}")]
    TooLarge { what: &'static str, count: usize },
}

/// Compressed size of one attribute stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttributeSize {
    pub name: String,
    pub bytes: usize,
}

/// What [encode] did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EncodeReport {
    /// `vertex_order[original] = decoded index`.
    pub vertex_order: Vec<u32>,
    pub symbols: SymbolCounts,
    pub num_faces: usize,
    pub header_bytes: usize,
    pub connectivity_bytes: usize,
    pub attributes: Vec<AttributeSize>,
    pub total_bytes: usize,
}

/// Compresses 'mesh' into one container written to 'writer'.
///
/// Faces that repeat a vertex are dropped. The decoder returns the vertices in traversal
/// order; the report maps every original vertex to its decoded index.
pub fn encode<W>(mesh: &Mesh, writer: &mut W, cfg: Config) -> Result<EncodeReport, Err>
    where W: ByteWriter
{
    let num_vertices = mesh.num_vertices();
    if num_vertices > crate::shared::connectivity::MAX_VERTICES {
        return Err(Err::TooLarge { what: "vertices", count: num_vertices });
    }
    let (faces, groups) = connectivity::remove_degenerate_faces(&mesh.faces, &mesh.groups);
    if faces.len() > u32::MAX as usize {
        return Err(Err::TooLarge { what: "faces", count: faces.len() });
    }
    let has_faces = !faces.is_empty();

    let mut encoders = mesh.attributes.values()
        .map(|att| {
            let att_cfg = cfg.attributes.get(att.get_name())
                .copied()
                .unwrap_or_else(|| attribute::Config::default_for(att.get_attribute_type()));
            AttributeEncoder::new(att, &att_cfg, has_faces)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let header = Header {
        entropy: cfg.entropy,
        exif: mesh.metadata.clone(),
        attributes: encoders.iter().map(|e| e.header()).collect(),
        num_vertices: num_vertices as u32,
        num_faces: faces.len() as u32,
        groups,
    };

    let mut buffer = Vec::new();
    header::encode_header(&header, &mut buffer)?;
    debug_write!("header", buffer);
    let header_bytes = buffer.len();
    tracing::debug!(bytes = header_bytes, attributes = encoders.len(), "encoded header");

    let ConnectivityOutput { order, context, faces: traversal_faces, counts } = if has_faces {
        connectivity::encode_connectivity(&faces, &header.group_ends(), num_vertices, cfg.entropy, &mut buffer)?
    } else {
        point_cloud_order(mesh, &encoders, num_vertices, cfg.point_cloud_order)
    };
    let connectivity_bytes = buffer.len() - header_bytes;
    tracing::debug!(bytes = connectivity_bytes, faces = faces.len(), "encoded connectivity");

    for e in encoders.iter_mut() {
        e.reorder(&order);
    }

    let positions = position_values(mesh, &encoders)?;
    let geometry = Geometry {
        positions: positions.as_deref(),
        faces: &traversal_faces,
        num_vertices,
    };
    for e in encoders.iter_mut() {
        e.pre_delta(&geometry)?;
    }

    let mut sizes = Vec::with_capacity(encoders.len());
    for (e, att) in encoders.iter_mut().zip(mesh.attributes.values()) {
        let start = buffer.len();
        e.delta_encode(&context);
        e.encode(cfg.entropy, &mut buffer)?;
        debug_write!("attribute", buffer);
        let bytes = buffer.len() - start;
        tracing::debug!(name = att.get_name(), bytes, "encoded attribute");
        sizes.push(AttributeSize { name: att.get_name().to_owned(), bytes });
    }

    writer.write_bytes(&buffer);
    tracing::debug!(bytes = buffer.len(), "encoded container");
    Ok(EncodeReport {
        vertex_order: order,
        symbols: counts,
        num_faces: faces.len(),
        header_bytes,
        connectivity_bytes,
        attributes: sizes,
        total_bytes: buffer.len(),
    })
}

fn point_cloud_order(mesh: &Mesh, encoders: &[AttributeEncoder], num_vertices: usize, sort: bool) -> ConnectivityOutput {
    let positions = mesh.attributes.get_index_of(POSITION)
        .and_then(|i| encoders.get(i))
        .and_then(|e| match e {
            AttributeEncoder::Generic(g) => Some(g),
            _ => None,
        });
    match positions {
        Some(g) if sort => point_cloud::morton_order(g.values(), g.num_components()),
        _ => point_cloud::identity_order(num_vertices),
    }
}

/// Quantized positions in traversal order, when some attribute predicts from them.
fn position_values(mesh: &Mesh, encoders: &[AttributeEncoder]) -> Result<Option<Vec<i32>>, attribute::Err> {
    if !encoders.iter().any(|e| matches!(e, AttributeEncoder::Normal(n) if n.needs_positions())) {
        return Ok(None);
    }
    let Some(i) = mesh.attributes.get_index_of(POSITION) else {
        return Ok(None);
    };
    let mismatch = || attribute::Err::AttributeTypeMismatch {
        name: POSITION.to_owned(),
        expected: "a generic attribute of 3 components",
    };
    match encoders.get(i) {
        Some(AttributeEncoder::Generic(g)) if g.num_components() == 3 => Ok(Some(g.values().to_vec())),
        _ => Err(mismatch()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attribute::AttributeType;
    use crate::core::mesh::builder::MeshBuilder;
    use crate::shared::header::MAGIC;

    #[test]
    fn report_adds_up() {
        let mut builder = MeshBuilder::new();
        builder.set_faces(vec![[0, 1, 2], [2, 1, 3]]);
        builder.add_positions(vec![0.0_f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0]).unwrap();
        let mesh = builder.build().unwrap();

        let mut out = Vec::new();
        let report = encode(&mesh, &mut out, Config::default()).unwrap();
        assert_eq!(&out[..4], &MAGIC.to_le_bytes());
        assert_eq!(report.total_bytes, out.len());
        let parts = report.header_bytes + report.connectivity_bytes
            + report.attributes.iter().map(|a| a.bytes).sum::<usize>();
        assert_eq!(parts, out.len());
        assert_eq!(report.vertex_order, vec![0, 1, 2, 3]);
        assert_eq!(report.symbols.vertex, 2);
    }

    #[test]
    fn normals_need_a_generic_position() {
        let mut builder = MeshBuilder::new();
        builder.set_faces(vec![[0, 1, 2]]);
        builder.add_positions(vec![0.0_f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]).unwrap();
        builder.add_normals(vec![0.0_f32, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]).unwrap();
        let mesh = builder.build().unwrap();

        let cfg = Config::default().with_attribute(POSITION, attribute::Config::Color { bits: [8; 4] });
        let mut out = Vec::new();
        assert!(matches!(
            encode(&mesh, &mut out, cfg),
            Err(Err::AttributeError(attribute::Err::AttributeTypeMismatch { .. }))
        ));

        let mut builder = MeshBuilder::new();
        builder.set_faces(vec![[0, 1, 2]]);
        builder.add_normals(vec![0.0_f32, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]).unwrap();
        let mesh = builder.build().unwrap();
        let mut out = Vec::new();
        assert!(matches!(
            encode(&mesh, &mut out, Config::default()),
            Err(Err::AttributeError(attribute::Err::MissingAttribute { .. }))
        ));
        let cfg = Config::default().with_attribute(
            "normal",
            attribute::Config::Normal { bits: 10, prediction: Some(crate::shared::attribute::NormalPrediction::Diff) },
        );
        assert!(encode(&mesh, &mut out, cfg).is_ok());
        assert_eq!(mesh.get_attribute("normal").map(|a| a.get_attribute_type()), Some(AttributeType::Normal));
    }
}
