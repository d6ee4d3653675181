pub mod attribute;
pub(crate) mod connectivity;
pub(crate) mod entropy;
pub(crate) mod frame;
pub(crate) mod header;

use indexmap::IndexMap;
use thiserror::Error;

use crate::core::bit_coder::{ByteReader, SliceReader};
use crate::core::mesh::Mesh;
use crate::core::shared::Quad;
use crate::debug_expect;
use crate::encode::POSITION;
use crate::prelude::ConfigType;
use crate::shared::attribute::Geometry;
use crate::shared::connectivity::MAX_VERTICES;
use crate::shared::header::Header;
use attribute::{AttributeDecoder, AttributeDecoderImpl};
use connectivity::ConnectivityOutput;

pub use attribute::OutputFormat;

pub struct Config {
    /// output buffers by attribute name; the others keep their stored format.
    pub outputs: IndexMap<String, OutputFormat>,
}

impl ConfigType for Config {
    fn default() -> Self {
        Self { outputs: IndexMap::new() }
    }
}

impl Config {
    pub fn with_output(mut self, name: impl Into<String>, output: OutputFormat) -> Self {
        self.outputs.insert(name.into(), output);
        self
    }
}

#[remain::sorted]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Err {
    #[error("Attribute decoding error: {0}")]
    AttributeError(#[from] attribute::Err),
    #[error("Connectivity decoding error: {0}")]
    ConnectivityError(#[from] connectivity::Err),
    #[error("Header decoding error: {0}")]
    HeaderError(#[from] header::Err),
    #[error("{count} {what} cannot come from {bytes} bytes")]
    ImplausibleCount { what: &'static str, count: u32, bytes: usize },
}

/// most items a byte of the container may account for. A Tunstall index byte expands to at
/// most one dictionary word, and no word is longer than the dictionary.
const MAX_ITEMS_PER_BYTE: usize = 256;

/// Rejects vertex and face counts the container is too small to carry, before anything is
/// sized from them.
fn check_counts(header: &Header, container_len: usize) -> Result<(), Err> {
    if header.num_vertices as usize > MAX_VERTICES {
        return Err(connectivity::Err::TooManyVertices(MAX_VERTICES).into());
    }
    let limit = container_len.saturating_mul(MAX_ITEMS_PER_BYTE);
    for (what, count) in [("vertices", header.num_vertices), ("faces", header.num_faces)] {
        if count as usize > limit {
            return Err(Err::ImplausibleCount { what, count, bytes: container_len });
        }
    }
    // without faces or attributes nothing is left to carry the vertices.
    if header.num_faces == 0 && header.attributes.is_empty() && header.num_vertices > 0 {
        return Err(Err::ImplausibleCount { what: "vertices", count: header.num_vertices, bytes: container_len });
    }
    Ok(())
}

/// Reads the header of a container without decoding the rest.
pub fn read_header(data: &[u8]) -> Result<Header, Err> {
    let mut reader = SliceReader::new(data);
    Ok(header::decode_header(&mut reader)?)
}

/// Decompresses a container written by [crate::encode::encode]. Vertices come out in
/// traversal order.
pub fn decode(data: &[u8], cfg: Config) -> Result<Mesh, Err> {
    let mut reader = SliceReader::new(data);
    let header = header::decode_header(&mut reader)?;
    check_counts(&header, data.len())?;
    debug_expect!("header", reader);

    let num_vertices = header.num_vertices as usize;
    let ConnectivityOutput { faces, context } = if header.num_faces > 0 {
        connectivity::decode_connectivity(&mut reader, &header)?
    } else {
        ConnectivityOutput {
            faces: Vec::new(),
            context: (0..header.num_vertices).map(Quad::chain).collect(),
        }
    };

    let mut decoders = header.attributes.iter()
        .cloned()
        .map(AttributeDecoder::new)
        .collect::<Vec<_>>();
    let geometry = Geometry { positions: None, faces: &faces, num_vertices };
    for d in decoders.iter_mut() {
        let start = reader.bytes_read();
        d.decode(header.entropy, &geometry, &mut reader)?;
        debug_expect!("attribute", reader);
        d.delta_decode(&context);
        tracing::debug!(name = d.header().name.as_str(), bytes = reader.bytes_read() - start, "decoded attribute");
    }

    let positions = position_values(&decoders)?;
    let geometry = Geometry { positions: positions.as_deref(), faces: &faces, num_vertices };
    for d in decoders.iter_mut() {
        d.post_delta(&geometry)?;
    }

    let mut attributes = IndexMap::with_capacity(decoders.len());
    for d in &decoders {
        let name = d.header().name.clone();
        let att = d.dequantize(cfg.outputs.get(&name))?;
        attributes.insert(name, att);
    }
    tracing::debug!(
        vertices = num_vertices,
        faces = faces.len(),
        attributes = attributes.len(),
        bytes = reader.bytes_read(),
        "decoded container"
    );

    Ok(Mesh {
        faces,
        attributes,
        groups: header.groups,
        metadata: header.exif,
    })
}

/// Decoded positions, when some attribute predicts from them.
fn position_values(decoders: &[AttributeDecoder]) -> Result<Option<Vec<i32>>, attribute::Err> {
    if !decoders.iter().any(|d| matches!(d, AttributeDecoder::Normal(n) if n.needs_positions())) {
        return Ok(None);
    }
    let Some(position) = decoders.iter().find(|d| d.header().name == POSITION) else {
        return Ok(None);
    };
    match position {
        AttributeDecoder::Generic(g) if g.header().num_components == 3 => Ok(Some(g.values().to_vec())),
        _ => Err(attribute::Err::AttributeTypeMismatch {
            name: POSITION.to_owned(),
            expected: "a generic attribute of 3 components",
        }),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::builder::MeshBuilder;
    use crate::core::attribute::ComponentDataType;
    use crate::encode::{self, encode};
    use crate::encode::header::encode_header;
    use crate::shared::attribute::{CodecKind, Strategy};
    use crate::shared::entropy::EntropyMode;
    use crate::shared::header::AttributeHeader;

    #[test]
    fn header_is_readable_on_its_own() {
        let mut builder = MeshBuilder::new();
        builder.add_positions(vec![0.0_f32, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        builder.add_metadata("source", "unit test");
        let mesh = builder.build().unwrap();
        let mut out = Vec::new();
        encode(&mesh, &mut out, encode::Config::default()).unwrap();

        let header = read_header(&out).unwrap();
        assert_eq!(header.num_vertices, 2);
        assert_eq!(header.num_faces, 0);
        assert_eq!(header.exif["source"], "unit test");
        assert_eq!(header.attributes[0].name, "position");
    }

    fn bare_header(num_vertices: u32, num_faces: u32, attributes: Vec<AttributeHeader>) -> Vec<u8> {
        let header = Header {
            entropy: EntropyMode::Tunstall,
            exif: IndexMap::new(),
            attributes,
            num_vertices,
            num_faces,
            groups: Vec::new(),
        };
        let mut out = Vec::new();
        encode_header(&header, &mut out).unwrap();
        out
    }

    #[test]
    fn counts_must_fit_the_container() {
        let data = bare_header(1 << 27, 0, Vec::new());
        assert!(matches!(
            decode(&data, Config::default()),
            Err(Err::ImplausibleCount { what: "vertices", count: 134217728, .. })
        ));
        let data = bare_header(3, 0, Vec::new());
        assert!(matches!(decode(&data, Config::default()), Err(Err::ImplausibleCount { count: 3, .. })));
        let data = bare_header(u32::MAX, 0, Vec::new());
        assert!(matches!(decode(&data, Config::default()), Err(Err::ConnectivityError(_))));

        let position = AttributeHeader {
            name: "position".to_owned(),
            kind: CodecKind::Generic,
            q: 0.5,
            num_components: 3,
            format: ComponentDataType::F32,
            strategy: Strategy::PARALLEL,
        };
        let data = bare_header(1 << 24, 0, vec![position.clone()]);
        assert!(matches!(decode(&data, Config::default()), Err(Err::ImplausibleCount { what: "vertices", .. })));
        let data = bare_header(3, 1 << 24, vec![position]);
        assert!(matches!(decode(&data, Config::default()), Err(Err::ImplausibleCount { what: "faces", .. })));
    }

    #[test]
    fn empty_container_decodes() {
        let data = bare_header(0, 0, Vec::new());
        #[cfg(feature = "debug_format")]
        let data = [data, b"header".to_vec()].concat();
        let mesh = decode(&data, Config::default()).unwrap();
        assert_eq!(mesh.num_vertices(), 0);
        assert_eq!(mesh.num_faces(), 0);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(decode(&[], Config::default()), Err(Err::HeaderError(_))));
        assert!(matches!(decode(&[1, 2, 3, 4, 5, 6, 7, 8], Config::default()), Err(Err::HeaderError(_))));
    }
}
