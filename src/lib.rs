// lib.rs

/// Contains the interface between obj files and the `Mesh` object.
pub mod io;

/// Contains the definitions shared by the encoder and the decoder.
pub mod shared;

/// Defines the mesh encoder.
pub mod encode;

/// Defines the mesh decoder.
pub mod decode;

/// Contains the native objects, the byte and bit coders, and the configuration trait.
pub mod core;

/// Contains the helpers and macros used by the encoder and the decoder.
pub(crate) mod utils;


/// Contains the most commonly used traits, types, and objects.
pub mod prelude {
    pub use crate::core::attribute::{
        Attribute,
        AttributeData,
        AttributeType,
        ComponentDataType,
        Scalar,
    };
    pub use crate::core::mesh::{Mesh, builder::MeshBuilder};
    pub use crate::core::shared::{ConfigType, Group, Quad};
    pub use crate::core::bit_coder::{ByteReader, ByteWriter, SliceReader};
    pub use crate::shared::entropy::EntropyMode;
    pub use crate::shared::attribute::{NormalPrediction, Strategy};
    pub use crate::encode::{self, encode, EncodeReport};
    pub use crate::decode::{self, decode};
}


/// Renders encoder reports as JSON for size evaluation.
#[cfg(any(test, feature = "evaluation"))]
pub mod eval;
