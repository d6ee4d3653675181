use crate::core::attribute::{Attribute, ComponentDataType};
use crate::core::bit_coder::ByteWriter;
use crate::core::shared::Quad;
use crate::shared::attribute::{delta_encode, CodecKind, Geometry, Strategy};
use crate::shared::entropy::EntropyMode;
use crate::shared::header::AttributeHeader;
use crate::encode::frame;
use super::{permute, AttributeEncoderImpl, Err, Quantization};

/// widest bit budget a generic attribute may ask for.
const MAX_BITS: u32 = 30;

/// Positions, texture coordinates and custom data: every component is divided by one step
/// and truncated toward zero.
pub(crate) struct GenericEncoder {
    name: String,
    format: ComponentDataType,
    num_components: usize,
    q: f32,
    strategy: Strategy,
    values: Vec<i32>,
}

impl GenericEncoder {
    pub fn new(att: &Attribute, quantization: Quantization, strategy: Strategy) -> Result<Self, Err> {
        let raw = att.get_data().to_f64_vec();
        let n = att.get_num_components();
        let q = match quantization {
            Quantization::Step(q) => {
                if !(q > 0.0 && q.is_finite()) {
                    return Err(Err::InvalidQuantization(q));
                }
                q
            },
            Quantization::Bits(bits) => step_for_bits(&raw, n, bits)?,
        };
        let values = quantize(att.get_name(), &raw, q)?;
        tracing::trace!(name = att.get_name(), q, "quantized generic attribute");
        Ok(Self {
            name: att.get_name().to_owned(),
            format: att.get_component_type(),
            num_components: n,
            q,
            strategy,
            values,
        })
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn num_components(&self) -> usize {
        self.num_components
    }
}

/// The smallest power of two step that fits the widest axis range into 'bits' bits.
/// A flat attribute gets the unit step.
fn step_for_bits(raw: &[f64], n: usize, bits: u32) -> Result<f32, Err> {
    if bits == 0 || bits > MAX_BITS {
        return Err(Err::InvalidBits(bits));
    }
    let mut range = 0.0_f64;
    for k in 0..n {
        let channel = raw.iter().skip(k).step_by(n);
        let min = channel.clone().copied().fold(f64::INFINITY, f64::min);
        let max = channel.copied().fold(f64::NEG_INFINITY, f64::max);
        if min <= max {
            range = range.max(max - min);
        }
    }
    if !range.is_finite() {
        return Err(Err::InvalidQuantization(f32::INFINITY));
    }
    if range == 0.0 {
        return Ok(1.0);
    }
    let exponent = range.log2().ceil() as i32 - bits as i32;
    let q = 2_f64.powi(exponent) as f32;
    if !(q > 0.0 && q.is_finite()) {
        return Err(Err::InvalidQuantization(q));
    }
    Ok(q)
}

pub(crate) fn quantize(name: &str, raw: &[f64], q: f32) -> Result<Vec<i32>, Err> {
    let q = q as f64;
    raw.iter()
        .map(|&x| {
            let v = (x / q).trunc();
            if v.is_finite() && v >= i32::MIN as f64 && v <= i32::MAX as f64 {
                Ok(v as i32)
            } else {
                Err(Err::QuantizationOverflow { name: name.to_owned(), value: x })
            }
        })
        .collect()
}

/// whether a plain sequence of this format is coded as non-negative indices. Quantized
/// unsigned data never goes below zero since the step is positive.
pub(crate) fn is_unsigned(format: ComponentDataType) -> bool {
    matches!(format, ComponentDataType::U8 | ComponentDataType::U16 | ComponentDataType::U32)
}

impl AttributeEncoderImpl for GenericEncoder {
    fn header(&self) -> AttributeHeader {
        AttributeHeader {
            name: self.name.clone(),
            kind: CodecKind::Generic,
            q: self.q,
            num_components: self.num_components as u8,
            format: self.format,
            strategy: self.strategy,
        }
    }

    fn reorder(&mut self, order: &[u32]) {
        self.values = permute(&self.values, self.num_components, order);
    }

    fn pre_delta(&mut self, _geometry: &Geometry<'_>) -> Result<(), Err> {
        Ok(())
    }

    fn delta_encode(&mut self, context: &[Quad]) {
        if self.strategy == Strategy::NONE {
            return;
        }
        let parallel = self.strategy.contains(Strategy::PARALLEL);
        delta_encode(&mut self.values, self.num_components, context, parallel);
    }

    fn encode<W>(&self, mode: EntropyMode, writer: &mut W) -> Result<(), Err>
        where W: ByteWriter
    {
        let n = self.num_components;
        if self.strategy == Strategy::NONE {
            // one plain sequence per channel
            for k in 0..n {
                let channel = self.values.iter().skip(k).step_by(n).copied();
                if is_unsigned(self.format) {
                    frame::encode_indices(&channel.map(|v| v as u32).collect::<Vec<_>>(), mode, writer)?;
                } else {
                    frame::encode_diffs(&channel.collect::<Vec<_>>(), mode, writer)?;
                }
            }
        } else if self.strategy.contains(Strategy::CORRELATED) {
            frame::encode_array(&self.values, n, mode, writer)?;
        } else {
            frame::encode_values(&self.values, n, mode, writer)?;
        }
        Ok(())
    }
}
