use crate::core::attribute::{Attribute, AttributeData, AttributeType};
use crate::core::bit_coder::ByteReader;
use crate::core::shared::Quad;
use crate::encode::attribute::generic::is_unsigned;
use crate::shared::attribute::{delta_decode, Geometry, Strategy};
use crate::shared::entropy::EntropyMode;
use crate::shared::header::AttributeHeader;
use crate::decode::frame;
use super::{resolve_output, AttributeDecoderImpl, Err, OutputFormat};

pub(crate) struct GenericDecoder {
    header: AttributeHeader,
    values: Vec<i32>,
}

impl GenericDecoder {
    pub fn new(header: AttributeHeader) -> Self {
        Self { header, values: Vec::new() }
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    fn num_components(&self) -> usize {
        self.header.num_components as usize
    }
}

impl AttributeDecoderImpl for GenericDecoder {
    fn header(&self) -> &AttributeHeader {
        &self.header
    }

    fn decode<R>(&mut self, mode: EntropyMode, geometry: &Geometry<'_>, reader: &mut R) -> Result<(), Err>
        where R: ByteReader
    {
        let n = self.num_components();
        let count = geometry.num_vertices;
        self.values = if self.header.strategy == Strategy::NONE {
            let mut values = vec![0; count * n];
            for k in 0..n {
                let channel = if is_unsigned(self.header.format) {
                    frame::decode_indices(reader, mode, count)?
                        .into_iter()
                        .map(|u| i32::try_from(u).map_err(|_| Err::ValueOutOfRange {
                            name: self.header.name.clone(),
                            value: u,
                        }))
                        .collect::<Result<Vec<_>, _>>()?
                } else {
                    frame::decode_diffs(reader, mode, count)?
                };
                for (i, v) in channel.into_iter().enumerate() {
                    values[i * n + k] = v;
                }
            }
            values
        } else if self.header.strategy.contains(Strategy::CORRELATED) {
            frame::decode_array(reader, mode, count, n)?
        } else {
            frame::decode_values(reader, mode, count, n)?
        };
        Ok(())
    }

    fn delta_decode(&mut self, context: &[Quad]) {
        if self.header.strategy == Strategy::NONE {
            return;
        }
        let parallel = self.header.strategy.contains(Strategy::PARALLEL);
        let n = self.num_components();
        delta_decode(&mut self.values, n, context, parallel);
    }

    fn post_delta(&mut self, _geometry: &Geometry<'_>) -> Result<(), Err> {
        Ok(())
    }

    fn dequantize(&self, output: Option<&OutputFormat>) -> Result<Attribute, Err> {
        let q = self.header.q;
        if !(q > 0.0 && q.is_finite()) {
            return Err(Err::InvalidStep { name: self.header.name.clone(), step: q });
        }
        let (format, components) = resolve_output(&self.header, output);
        if components != self.num_components() {
            return Err(Err::InvalidOutput { name: self.header.name.clone(), format, components });
        }
        let q = q as f64;
        let raw = self.values.iter().map(|&v| v as f64 * q).collect::<Vec<_>>();
        let data = AttributeData::from_f64_slice(format, &raw);
        let name = self.header.name.as_str();
        Ok(Attribute::from_data(name, AttributeType::from_name(name), data, components)?)
    }
}
