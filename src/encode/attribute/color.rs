use crate::core::attribute::{Attribute, ComponentDataType};
use crate::core::bit_coder::ByteWriter;
use crate::core::shared::Quad;
use crate::shared::attribute::{delta_encode, to_ycc, CodecKind, Geometry, Strategy, YCC_SOURCE_CHANNEL};
use crate::shared::entropy::EntropyMode;
use crate::shared::header::AttributeHeader;
use crate::encode::frame;
use super::{permute, AttributeEncoderImpl, Err};

/// 8-bit RGB or RGBA colors, decorrelated into YCoCg and quantized per channel.
pub(crate) struct ColorEncoder {
    name: String,
    format: ComponentDataType,
    num_components: usize,
    /// step of each YCoCg channel.
    steps: [u8; 4],
    values: Vec<i32>,
}

/// Reads colors as 0..=255 channels; float colors are scaled from 0..=1. A missing alpha is opaque.
pub(crate) fn read_colors(att: &Attribute) -> Result<Vec<[i32; 4]>, Err> {
    let scale = match att.get_component_type() {
        ComponentDataType::U8 => 1.0,
        ComponentDataType::F32 | ComponentDataType::F64 => 255.0,
        _ => return Err(Err::UnsupportedFormat { name: att.get_name().to_owned(), format: "a color" }),
    };
    let n = att.get_num_components();
    let raw = att.get_data().to_f64_vec();
    Ok(raw.chunks_exact(n)
        .map(|c| {
            let mut rgba = [255; 4];
            for (k, &x) in c.iter().enumerate() {
                rgba[k] = (x * scale).round().clamp(0.0, 255.0) as i32;
            }
            rgba
        })
        .collect())
}

impl ColorEncoder {
    pub fn new(att: &Attribute, bits: [u8; 4]) -> Result<Self, Err> {
        let n = att.get_num_components();
        if !(3..=4).contains(&n) {
            return Err(Err::InvalidComponentCount {
                name: att.get_name().to_owned(),
                found: n,
                expected: "3 or 4",
            });
        }
        if let Some(&b) = bits.iter().find(|&&b| !(1..=8).contains(&b)) {
            return Err(Err::InvalidBits(b as u32));
        }
        let steps = YCC_SOURCE_CHANNEL.map(|rgba| 1_u8 << (8 - bits[rgba]));

        let mut values = Vec::with_capacity(att.len() * n);
        for rgba in read_colors(att)? {
            let ycc = to_ycc(rgba);
            for k in 0..n {
                let q = steps[k] as i32;
                values.push((ycc[k] + q / 2).div_euclid(q));
            }
        }
        Ok(Self {
            name: att.get_name().to_owned(),
            format: att.get_component_type(),
            num_components: n,
            steps,
            values,
        })
    }
}

impl AttributeEncoderImpl for ColorEncoder {
    fn header(&self) -> AttributeHeader {
        AttributeHeader {
            name: self.name.clone(),
            kind: CodecKind::Color,
            q: 1.0,
            num_components: self.num_components as u8,
            format: self.format,
            strategy: Strategy::PARALLEL,
        }
    }

    fn reorder(&mut self, order: &[u32]) {
        self.values = permute(&self.values, self.num_components, order);
    }

    fn pre_delta(&mut self, _geometry: &Geometry<'_>) -> Result<(), Err> {
        Ok(())
    }

    fn delta_encode(&mut self, context: &[Quad]) {
        delta_encode(&mut self.values, self.num_components, context, true);
    }

    fn encode<W>(&self, mode: EntropyMode, writer: &mut W) -> Result<(), Err>
        where W: ByteWriter
    {
        for &q in &self.steps[..self.num_components] {
            writer.write_u8(q);
        }
        frame::encode_values(&self.values, self.num_components, mode, writer)?;
        Ok(())
    }
}
