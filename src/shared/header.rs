use indexmap::IndexMap;

use crate::core::attribute::ComponentDataType;
use crate::core::shared::Group;
use crate::shared::attribute::{CodecKind, Strategy};
use crate::shared::entropy::EntropyMode;

/// first word of every container.
pub const MAGIC: u32 = 0x0c07;

/// the only container version this crate reads and writes.
pub const VERSION: u32 = 1;

/// One entry of the attribute table.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeHeader {
    pub name: String,
    pub kind: CodecKind,
    /// the quantization step of generic attributes, `2^(bits-1)` for normals and 1 for colors.
    pub q: f32,
    pub num_components: u8,
    /// the format the attribute was registered with on the encoder side.
    pub format: ComponentDataType,
    pub strategy: Strategy,
}

/// Everything a container says before the connectivity block.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    pub entropy: EntropyMode,
    pub exif: IndexMap<String, String>,
    pub attributes: Vec<AttributeHeader>,
    pub num_vertices: u32,
    pub num_faces: u32,
    /// empty when every face belongs to one implicit group.
    pub groups: Vec<Group>,
}

impl Header {
    /// group ends, with the implicit group spelled out.
    pub(crate) fn group_ends(&self) -> Vec<u32> {
        if self.groups.is_empty() {
            vec![self.num_faces]
        } else {
            self.groups.iter().map(|g| g.end).collect()
        }
    }
}
