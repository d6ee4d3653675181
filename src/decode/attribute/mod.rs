pub(crate) mod color;
pub(crate) mod generic;
pub(crate) mod normal;

use crate::core::attribute::{self, Attribute, ComponentDataType};
use crate::core::bit_coder::{ByteReader, ReaderErr};
use crate::core::shared::Quad;
use crate::shared::attribute::{CodecKind, Geometry};
use crate::shared::entropy::EntropyMode;
use crate::shared::header::AttributeHeader;
use super::frame;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Err {
    #[error("Attribute error: {0}")]
    AttributeError(#[from] attribute::Err),
    #[error("Attribute {name} is expected to be {expected}")]
    AttributeTypeMismatch { name: String, expected: &'static str },
    #[error("Frame error: {0}")]
    FrameError(#[from] frame::Err),
    #[error("Attribute {name} has {found} components, expected {expected}")]
    InvalidComponentCount { name: String, found: usize, expected: &'static str },
    #[error("Invalid normal prediction {0}")]
    InvalidNormalPrediction(u8),
    #[error("Attribute {name} cannot be produced as {format:?} with {components} components")]
    InvalidOutput { name: String, format: ComponentDataType, components: usize },
    #[error("Invalid quantization step {step} for attribute {name}")]
    InvalidStep { name: String, step: f32 },
    #[error("Prediction of {name} needs the {missing} attribute")]
    MissingAttribute { name: String, missing: &'static str },
    #[error("Not enough data: {0}")]
    ReaderError(#[from] ReaderErr),
    #[error("Value {value} of attribute {name} is out of range")]
    ValueOutOfRange { name: String, value: u32 },
}

/// The buffer an attribute is decoded into: its storage format and, when set, its
/// component count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputFormat {
    pub format: ComponentDataType,
    pub components: Option<usize>,
}

impl OutputFormat {
    pub fn new(format: ComponentDataType) -> Self {
        Self { format, components: None }
    }

    pub fn with_components(mut self, components: usize) -> Self {
        self.components = Some(components);
        self
    }
}

#[enum_dispatch::enum_dispatch(AttributeDecoderImpl)]
pub(crate) enum AttributeDecoder {
    Generic(generic::GenericDecoder),
    Normal(normal::NormalDecoder),
    Color(color::ColorDecoder),
}

impl AttributeDecoder {
    pub(crate) fn new(header: AttributeHeader) -> Self {
        match header.kind {
            CodecKind::Generic => AttributeDecoder::Generic(generic::GenericDecoder::new(header)),
            CodecKind::Normal => AttributeDecoder::Normal(normal::NormalDecoder::new(header)),
            CodecKind::Color => AttributeDecoder::Color(color::ColorDecoder::new(header)),
        }
    }
}

#[enum_dispatch::enum_dispatch]
pub(crate) trait AttributeDecoderImpl {
    fn header(&self) -> &AttributeHeader;

    /// reads the residuals of every vertex, in traversal order.
    fn decode<R>(&mut self, mode: EntropyMode, geometry: &Geometry<'_>, reader: &mut R) -> Result<(), Err>
        where R: ByteReader;

    /// turns the residuals back into quantized values.
    fn delta_decode(&mut self, context: &[Quad]);

    /// applies predictions that depend on other attributes.
    fn post_delta(&mut self, geometry: &Geometry<'_>) -> Result<(), Err>;

    fn dequantize(&self, output: Option<&OutputFormat>) -> Result<Attribute, Err>;
}

/// The format and the component count an attribute is produced with.
pub(crate) fn resolve_output(header: &AttributeHeader, output: Option<&OutputFormat>) -> (ComponentDataType, usize) {
    let format = output.map_or(header.format, |o| o.format);
    let components = output.and_then(|o| o.components).unwrap_or(header.num_components as usize);
    (format, components)
}
