pub(crate) mod color;
pub(crate) mod generic;
pub(crate) mod normal;

use crate::core::attribute::{Attribute, AttributeType};
use crate::core::bit_coder::ByteWriter;
use crate::core::shared::Quad;
use crate::shared::attribute::{Geometry, NormalPrediction, Strategy};
use crate::shared::entropy::EntropyMode;
use crate::shared::header::AttributeHeader;
use super::frame;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Err {
    #[error("Attribute {name} is expected to be {expected}")]
    AttributeTypeMismatch { name: String, expected: &'static str },
    #[error("Frame error: {0}")]
    FrameError(#[from] frame::Err),
    #[error("Invalid bit budget {0}")]
    InvalidBits(u32),
    #[error("Attribute {name} has {found} components, expected {expected}")]
    InvalidComponentCount { name: String, found: usize, expected: &'static str },
    #[error("Invalid quantization step {0}")]
    InvalidQuantization(f32),
    #[error("Prediction of {name} needs the {missing} attribute")]
    MissingAttribute { name: String, missing: &'static str },
    #[error("Value {value} of attribute {name} does not fit a 32-bit integer once quantized")]
    QuantizationOverflow { name: String, value: f64 },
    #[error("Attribute {name} cannot be stored as {format}")]
    UnsupportedFormat { name: String, format: &'static str },
}

/// How a generic attribute picks its quantization step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Quantization {
    /// an explicit step.
    Step(f32),
    /// a power of two step leaving this many bits for the widest axis.
    Bits(u32),
}

/// Per-attribute encoder settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Config {
    Generic {
        quantization: Quantization,
        strategy: Strategy,
    },
    Normal {
        /// bits of each octahedral coordinate, sign included.
        bits: u32,
        /// `None` picks [NormalPrediction::Estimated] for meshes and
        /// [NormalPrediction::Diff] for point clouds.
        prediction: Option<NormalPrediction>,
    },
    Color {
        /// bits kept per channel, in RGBA order.
        bits: [u8; 4],
    },
}

impl Config {
    pub fn default_for(ty: AttributeType) -> Self {
        match ty {
            AttributeType::Position => Config::Generic {
                quantization: Quantization::Bits(12),
                strategy: Strategy::PARALLEL | Strategy::CORRELATED,
            },
            AttributeType::Normal => Config::Normal { bits: 10, prediction: None },
            AttributeType::Color => Config::Color { bits: [6, 7, 6, 5] },
            AttributeType::TextureCoordinate => Config::Generic {
                quantization: Quantization::Bits(12),
                strategy: Strategy::PARALLEL,
            },
            AttributeType::Custom => Config::Generic {
                quantization: Quantization::Step(1.0),
                strategy: Strategy::PARALLEL,
            },
        }
    }
}

#[enum_dispatch::enum_dispatch(AttributeEncoderImpl)]
pub(crate) enum AttributeEncoder {
    Generic(generic::GenericEncoder),
    Normal(normal::NormalEncoder),
    Color(color::ColorEncoder),
}

impl AttributeEncoder {
    /// Quantizes 'att' as configured. Values stay in the original vertex order.
    pub(crate) fn new(att: &Attribute, cfg: &Config, has_faces: bool) -> Result<Self, Err> {
        let out = match *cfg {
            Config::Generic { quantization, strategy } => {
                AttributeEncoder::Generic(generic::GenericEncoder::new(att, quantization, strategy)?)
            },
            Config::Normal { bits, prediction } => {
                let prediction = prediction.unwrap_or(if has_faces {
                    NormalPrediction::Estimated
                } else {
                    NormalPrediction::Diff
                });
                AttributeEncoder::Normal(normal::NormalEncoder::new(att, bits, prediction)?)
            },
            Config::Color { bits } => AttributeEncoder::Color(color::ColorEncoder::new(att, bits)?),
        };
        Ok(out)
    }
}

#[enum_dispatch::enum_dispatch]
pub(crate) trait AttributeEncoderImpl {
    fn header(&self) -> AttributeHeader;

    /// moves the value of every original vertex `i` to `order[i]`.
    fn reorder(&mut self, order: &[u32]);

    /// sets up predictions that depend on other attributes or on the faces.
    fn pre_delta(&mut self, geometry: &Geometry<'_>) -> Result<(), Err>;

    /// replaces the values with their prediction residuals.
    fn delta_encode(&mut self, context: &[Quad]);

    fn encode<W>(&self, mode: EntropyMode, writer: &mut W) -> Result<(), Err>
        where W: ByteWriter;
}

/// Permutes 'values' ('n' per vertex) so that the vertex `i` lands at `order[i]`.
pub(crate) fn permute(values: &[i32], n: usize, order: &[u32]) -> Vec<i32> {
    let mut out = vec![0; values.len()];
    for (i, &t) in order.iter().enumerate() {
        let (src, dst) = (i * n, t as usize * n);
        if let (Some(from), Some(to)) = (values.get(src..src + n), out.get_mut(dst..dst + n)) {
            to.copy_from_slice(from);
        }
    }
    out
}
