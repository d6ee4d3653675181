use indexmap::IndexMap;

use crate::core::attribute::{self, ComponentDataType};
use crate::core::bit_coder::{ByteReader, ReaderErr};
use crate::core::shared::Group;
use crate::shared::attribute::{CodecKind, Strategy};
use crate::shared::entropy::{self, EntropyMode};
use crate::shared::header::{AttributeHeader, Header, MAGIC, VERSION};
use super::frame::{self, read_string};

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Err {
    #[error("Frame error: {0}")]
    FrameError(#[from] frame::Err),
    #[error("Invalid codec kind {0}")]
    InvalidCodecKind(u32),
    #[error("Invalid component count {0}")]
    InvalidComponentCount(u8),
    #[error("Invalid entropy mode: {0}")]
    InvalidEntropyMode(#[from] entropy::Err),
    #[error("Invalid storage format: {0}")]
    InvalidFormat(#[from] attribute::Err),
    #[error("Group ends must be non-decreasing and end at face {num_faces}")]
    InvalidGroups { num_faces: u32 },
    #[error("Not a corto file: magic is {0:#x}")]
    NotACortoFile(u32),
    #[error("Not enough data: {0}")]
    NotEnoughData(#[from] ReaderErr),
    #[error("Unsupported version {0}")]
    UnsupportedVersion(u32),
}

pub fn decode_header<R>(reader: &mut R) -> Result<Header, Err>
    where R: ByteReader
{
    let magic = reader.read_u32()?;
    if magic != MAGIC {
        return Err(Err::NotACortoFile(magic));
    }
    let version = reader.read_u32()?;
    if version != VERSION {
        return Err(Err::UnsupportedVersion(version));
    }
    let entropy = EntropyMode::read_from(reader)?;

    let num_exif = reader.read_u32()?;
    let mut exif = IndexMap::new();
    for _ in 0..num_exif {
        let key = read_string(reader)?;
        let value = read_string(reader)?;
        exif.insert(key, value);
    }

    let num_attributes = reader.read_u32()?;
    let mut attributes = Vec::new();
    for _ in 0..num_attributes {
        let name = read_string(reader)?;
        let kind_id = reader.read_u32()?;
        let kind = CodecKind::from_id(kind_id).ok_or(Err::InvalidCodecKind(kind_id))?;
        let q = reader.read_f32()?;
        let num_components = reader.read_u8()?;
        if !(1..=4).contains(&num_components) {
            return Err(Err::InvalidComponentCount(num_components));
        }
        let format = ComponentDataType::read_from(reader)?;
        let strategy = Strategy::from_bits(reader.read_u8()?);
        attributes.push(AttributeHeader { name, kind, q, num_components, format, strategy });
    }

    let num_vertices = reader.read_u32()?;
    let num_faces = reader.read_u32()?;

    let num_groups = reader.read_u32()?;
    let mut groups = Vec::new();
    for _ in 0..num_groups {
        let mut group = Group::new(reader.read_u32()?);
        let num_properties = reader.read_u8()?;
        for _ in 0..num_properties {
            let key = read_string(reader)?;
            let value = read_string(reader)?;
            group.properties.insert(key, value);
        }
        groups.push(group);
    }
    let sorted = groups.windows(2).all(|w| w[0].end <= w[1].end);
    if !sorted || groups.last().is_some_and(|g| g.end != num_faces) {
        return Err(Err::InvalidGroups { num_faces });
    }

    tracing::debug!(
        attributes = attributes.len(),
        num_vertices,
        num_faces,
        groups = groups.len(),
        "decoded header"
    );
    Ok(Header { entropy, exif, attributes, num_vertices, num_faces, groups })
}
