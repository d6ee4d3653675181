use glam::Vec3;

use crate::core::attribute::{Attribute, ComponentDataType};
use crate::core::bit_coder::ByteWriter;
use crate::core::shared::Quad;
use crate::shared::attribute::{
    delta_encode, estimate_normals, mark_boundary, to_octa, CodecKind, Geometry, NormalPrediction,
    Strategy,
};
use crate::shared::entropy::EntropyMode;
use crate::shared::header::AttributeHeader;
use crate::encode::frame;
use super::{permute, AttributeEncoderImpl, Err};

/// widest octahedral coordinate, sign included.
pub(crate) const MAX_NORMAL_BITS: u32 = 16;

/// Unit vectors, stored as two octahedral coordinates in `[-unit, unit]`.
pub(crate) struct NormalEncoder {
    name: String,
    format: ComponentDataType,
    unit: i32,
    prediction: NormalPrediction,
    values: Vec<i32>,
    /// octahedral coordinates of the estimated normals, in traversal order.
    estimated: Vec<i32>,
    /// non zero for the vertices on a boundary.
    boundary: Vec<u32>,
}

/// Reads the directions of a normal attribute. `i16` normals are scaled by 32767.
pub(crate) fn read_normals(att: &Attribute) -> Result<Vec<Vec3>, Err> {
    let scale = match att.get_component_type() {
        ComponentDataType::F32 | ComponentDataType::F64 => 1.0,
        ComponentDataType::I16 => 1.0 / 32767.0,
        _ => return Err(Err::UnsupportedFormat { name: att.get_name().to_owned(), format: "a normal" }),
    };
    let raw = att.get_data().to_f64_vec();
    Ok(raw.chunks_exact(3)
        .map(|n| Vec3::new((n[0] * scale) as f32, (n[1] * scale) as f32, (n[2] * scale) as f32))
        .collect())
}

impl NormalEncoder {
    pub fn new(att: &Attribute, bits: u32, prediction: NormalPrediction) -> Result<Self, Err> {
        if !(2..=MAX_NORMAL_BITS).contains(&bits) {
            return Err(Err::InvalidBits(bits));
        }
        if att.get_num_components() != 3 {
            return Err(Err::InvalidComponentCount {
                name: att.get_name().to_owned(),
                found: att.get_num_components(),
                expected: "3",
            });
        }
        let unit = 1 << (bits - 1);
        let values = read_normals(att)?
            .into_iter()
            .flat_map(|n| to_octa(n, unit))
            .collect();
        Ok(Self {
            name: att.get_name().to_owned(),
            format: att.get_component_type(),
            unit,
            prediction,
            values,
            estimated: Vec::new(),
            boundary: Vec::new(),
        })
    }

    pub fn needs_positions(&self) -> bool {
        self.prediction != NormalPrediction::Diff
    }

    fn is_stored(&self, v: usize) -> bool {
        self.prediction != NormalPrediction::Border || self.boundary.get(v).is_some_and(|&m| m != 0)
    }
}

impl AttributeEncoderImpl for NormalEncoder {
    fn header(&self) -> AttributeHeader {
        AttributeHeader {
            name: self.name.clone(),
            kind: CodecKind::Normal,
            q: self.unit as f32,
            num_components: 3,
            format: self.format,
            strategy: Strategy::CORRELATED,
        }
    }

    fn reorder(&mut self, order: &[u32]) {
        self.values = permute(&self.values, 2, order);
    }

    fn pre_delta(&mut self, geometry: &Geometry<'_>) -> Result<(), Err> {
        if !self.needs_positions() {
            return Ok(());
        }
        let positions = geometry.positions.ok_or_else(|| Err::MissingAttribute {
            name: self.name.clone(),
            missing: "position",
        })?;
        self.estimated = estimate_normals(positions, geometry.faces, geometry.num_vertices)
            .into_iter()
            .flat_map(|n| to_octa(n, self.unit))
            .collect();
        if self.prediction == NormalPrediction::Border {
            self.boundary = mark_boundary(geometry.faces, geometry.num_vertices);
        }
        Ok(())
    }

    fn delta_encode(&mut self, context: &[Quad]) {
        match self.prediction {
            NormalPrediction::Diff => delta_encode(&mut self.values, 2, context, false),
            NormalPrediction::Estimated | NormalPrediction::Border => {
                for (v, e) in self.values.iter_mut().zip(&self.estimated) {
                    *v = v.wrapping_sub(*e);
                }
            },
        }
    }

    fn encode<W>(&self, mode: EntropyMode, writer: &mut W) -> Result<(), Err>
        where W: ByteWriter
    {
        writer.write_u8(self.prediction.get_id());
        let stored = self.values.chunks_exact(2)
            .enumerate()
            .filter(|&(v, _)| self.is_stored(v))
            .flat_map(|(_, p)| p.iter().copied())
            .collect::<Vec<_>>();
        tracing::trace!(
            name = self.name.as_str(),
            prediction = ?self.prediction,
            stored = stored.len() / 2,
            "encoding normals"
        );
        frame::encode_array(&stored, 2, mode, writer)?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attribute::AttributeType;

    fn normals<T: crate::core::attribute::Scalar>(data: Vec<T>) -> Attribute {
        Attribute::new("normal", AttributeType::Normal, data, 3).unwrap()
    }

    #[test]
    fn integer_normals_are_scaled() {
        let att = normals(vec![0_i16, 0, 32767, 0, -32767, 0]);
        let enc = NormalEncoder::new(&att, 10, NormalPrediction::Diff).unwrap();
        assert_eq!(enc.values, vec![0, 0, 0, -512]);
        assert!(matches!(
            NormalEncoder::new(&normals(vec![0_u8; 3]), 10, NormalPrediction::Diff),
            Err(Err::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn estimated_prediction_needs_positions() {
        let att = normals(vec![0.0_f32, 0.0, 1.0]);
        let mut enc = NormalEncoder::new(&att, 10, NormalPrediction::Estimated).unwrap();
        let geometry = Geometry { positions: None, faces: &[], num_vertices: 1 };
        assert!(matches!(enc.pre_delta(&geometry), Err(Err::MissingAttribute { .. })));
    }

    #[test]
    fn exact_estimates_leave_zero_residuals() {
        let att = normals(vec![0.0_f32, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        let positions = [0, 0, 0, 4, 0, 0, 0, 4, 0];
        let faces = [[0, 1, 2]];
        for prediction in [NormalPrediction::Estimated, NormalPrediction::Border] {
            let mut enc = NormalEncoder::new(&att, 8, prediction).unwrap();
            let geometry = Geometry { positions: Some(&positions), faces: &faces, num_vertices: 3 };
            enc.pre_delta(&geometry).unwrap();
            enc.delta_encode(&[Quad::chain(0), Quad::chain(1), Quad::chain(2)]);
            assert!(enc.values.iter().all(|&v| v == 0));
        }
    }

    #[test]
    fn bit_range_is_checked() {
        let att = normals(vec![0.0_f32, 0.0, 1.0]);
        assert!(matches!(NormalEncoder::new(&att, 1, NormalPrediction::Diff), Err(Err::InvalidBits(1))));
        assert!(matches!(NormalEncoder::new(&att, 17, NormalPrediction::Diff), Err(Err::InvalidBits(17))));
    }
}
