use crate::core::attribute::{Attribute, AttributeData, AttributeType, ComponentDataType};
use crate::core::bit_coder::ByteReader;
use crate::core::shared::Quad;
use crate::shared::attribute::{delta_decode, to_rgb, Geometry};
use crate::shared::entropy::EntropyMode;
use crate::shared::header::AttributeHeader;
use crate::decode::frame;
use super::{resolve_output, AttributeDecoderImpl, Err, OutputFormat};

pub(crate) struct ColorDecoder {
    header: AttributeHeader,
    steps: Vec<i32>,
    /// quantized YCoCg channels.
    values: Vec<i32>,
}

impl ColorDecoder {
    pub fn new(header: AttributeHeader) -> Self {
        Self { header, steps: Vec::new(), values: Vec::new() }
    }

    fn num_components(&self) -> usize {
        self.header.num_components as usize
    }
}

impl AttributeDecoderImpl for ColorDecoder {
    fn header(&self) -> &AttributeHeader {
        &self.header
    }

    fn decode<R>(&mut self, mode: EntropyMode, geometry: &Geometry<'_>, reader: &mut R) -> Result<(), Err>
        where R: ByteReader
    {
        let n = self.num_components();
        if !(3..=4).contains(&n) {
            return Err(Err::InvalidComponentCount {
                name: self.header.name.clone(),
                found: n,
                expected: "3 or 4",
            });
        }
        self.steps = (0..n)
            .map(|_| match reader.read_u8()? {
                0 => Err(Err::InvalidStep { name: self.header.name.clone(), step: 0.0 }),
                q => Ok(q as i32),
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.values = frame::decode_values(reader, mode, geometry.num_vertices, n)?;
        Ok(())
    }

    fn delta_decode(&mut self, context: &[Quad]) {
        let n = self.num_components();
        delta_decode(&mut self.values, n, context, true);
    }

    fn post_delta(&mut self, _geometry: &Geometry<'_>) -> Result<(), Err> {
        Ok(())
    }

    fn dequantize(&self, output: Option<&OutputFormat>) -> Result<Attribute, Err> {
        let n = self.num_components();
        let (format, components) = resolve_output(&self.header, output);
        let scale = match format {
            ComponentDataType::U8 => 1.0,
            ComponentDataType::F32 | ComponentDataType::F64 => 1.0 / 255.0,
            _ => 0.0,
        };
        if scale == 0.0 || !(3..=4).contains(&components) {
            return Err(Err::InvalidOutput { name: self.header.name.clone(), format, components });
        }

        let mut raw = Vec::with_capacity(self.values.len() / n.max(1) * components);
        for c in self.values.chunks_exact(n) {
            let mut ycc = [0, 0, 0, 255];
            for k in 0..n {
                ycc[k] = c[k].wrapping_mul(self.steps[k]);
            }
            let rgba = to_rgb(ycc);
            raw.extend(rgba[..components].iter().map(|&x| x.clamp(0, 255) as f64 * scale));
        }
        let data = AttributeData::from_f64_slice(format, &raw);
        let name = self.header.name.as_str();
        Ok(Attribute::from_data(name, AttributeType::from_name(name), data, components)?)
    }
}
