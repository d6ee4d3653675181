use crate::core::bit_coder::ByteWriter;
use crate::shared::header::{Header, MAGIC, VERSION};
use super::frame::{self, write_string};

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Err {
    #[error("Frame error: {0}")]
    FrameError(#[from] frame::Err),
    #[error("Group {group} has {count} properties, at most 255 can be stored")]
    TooManyProperties { group: usize, count: usize },
}

/// Writes everything up to the connectivity block.
pub fn encode_header<W>(header: &Header, writer: &mut W) -> Result<(), Err>
    where W: ByteWriter
{
    writer.write_u32(MAGIC);
    writer.write_u32(VERSION);
    header.entropy.write_to(writer);

    writer.write_u32(header.exif.len() as u32);
    for (key, value) in &header.exif {
        write_string(key, writer)?;
        write_string(value, writer)?;
    }

    writer.write_u32(header.attributes.len() as u32);
    for att in &header.attributes {
        write_string(&att.name, writer)?;
        writer.write_u32(att.kind.get_id());
        writer.write_f32(att.q);
        writer.write_u8(att.num_components);
        att.format.write_to(writer);
        writer.write_u8(att.strategy.bits());
    }

    writer.write_u32(header.num_vertices);
    writer.write_u32(header.num_faces);

    writer.write_u32(header.groups.len() as u32);
    for (i, group) in header.groups.iter().enumerate() {
        let count = u8::try_from(group.properties.len())
            .map_err(|_| Err::TooManyProperties { group: i, count: group.properties.len() })?;
        writer.write_u32(group.end);
        writer.write_u8(count);
        for (key, value) in &group.properties {
            write_string(key, writer)?;
            write_string(value, writer)?;
        }
    }
    Ok(())
}
