use crate::core::attribute::{Attribute, AttributeData, AttributeType, ComponentDataType};
use crate::core::bit_coder::ByteReader;
use crate::core::shared::Quad;
use glam::Vec3;
use crate::shared::attribute::{
    delta_decode, estimate_normals, from_octa, mark_boundary, to_octa, Geometry, NormalPrediction,
};
use crate::shared::entropy::EntropyMode;
use crate::shared::header::AttributeHeader;
use crate::decode::frame;
use super::{resolve_output, AttributeDecoderImpl, Err, OutputFormat};

/// largest octahedral unit a stream may declare.
const MAX_UNIT: f32 = 32768.0;

pub(crate) struct NormalDecoder {
    header: AttributeHeader,
    prediction: NormalPrediction,
    /// two octahedral coordinates per vertex.
    values: Vec<i32>,
    /// boundary marks, for border prediction.
    boundary: Vec<u32>,
    /// unit estimates of the interior vertices of a border prediction, used as they are.
    interior: Vec<Option<Vec3>>,
}

impl NormalDecoder {
    pub fn new(header: AttributeHeader) -> Self {
        Self {
            header,
            prediction: NormalPrediction::Diff,
            values: Vec::new(),
            boundary: Vec::new(),
            interior: Vec::new(),
        }
    }

    pub fn needs_positions(&self) -> bool {
        self.prediction != NormalPrediction::Diff
    }

    fn unit(&self) -> Result<i32, Err> {
        let q = self.header.q;
        if !(2.0..=MAX_UNIT).contains(&q) || q.fract() != 0.0 {
            return Err(Err::InvalidStep { name: self.header.name.clone(), step: q });
        }
        Ok(q as i32)
    }
}

impl AttributeDecoderImpl for NormalDecoder {
    fn header(&self) -> &AttributeHeader {
        &self.header
    }

    fn decode<R>(&mut self, mode: EntropyMode, geometry: &Geometry<'_>, reader: &mut R) -> Result<(), Err>
        where R: ByteReader
    {
        if self.header.num_components != 3 {
            return Err(Err::InvalidComponentCount {
                name: self.header.name.clone(),
                found: self.header.num_components as usize,
                expected: "3",
            });
        }
        let id = reader.read_u8()?;
        self.prediction = NormalPrediction::from_id(id).ok_or(Err::InvalidNormalPrediction(id))?;

        let num_vertices = geometry.num_vertices;
        if self.prediction == NormalPrediction::Border {
            let boundary = mark_boundary(geometry.faces, num_vertices);
            let count = boundary.iter().filter(|&&m| m != 0).count();
            let mut stored = frame::decode_array(reader, mode, count, 2)?.into_iter();
            self.values = vec![0; num_vertices * 2];
            for (v, _) in boundary.iter().enumerate().filter(|(_, &m)| m != 0) {
                for k in 0..2 {
                    self.values[v * 2 + k] = stored.next().unwrap_or(0);
                }
            }
            self.boundary = boundary;
        } else {
            self.values = frame::decode_array(reader, mode, num_vertices, 2)?;
        }
        tracing::trace!(name = self.header.name.as_str(), prediction = ?self.prediction, "decoded normals");
        Ok(())
    }

    fn delta_decode(&mut self, context: &[Quad]) {
        if self.prediction == NormalPrediction::Diff {
            delta_decode(&mut self.values, 2, context, false);
        }
    }

    fn post_delta(&mut self, geometry: &Geometry<'_>) -> Result<(), Err> {
        if !self.needs_positions() {
            return Ok(());
        }
        let positions = geometry.positions.ok_or_else(|| Err::MissingAttribute {
            name: self.header.name.clone(),
            missing: "position",
        })?;
        let unit = self.unit()?;
        let estimated = estimate_normals(positions, geometry.faces, geometry.num_vertices);
        let border = self.prediction == NormalPrediction::Border;
        if border {
            self.interior = self.boundary.iter()
                .zip(&estimated)
                .map(|(&mark, n)| (mark == 0).then(|| n.try_normalize().unwrap_or(Vec3::Z)))
                .collect();
        }
        for (i, (v, &n)) in self.values.chunks_exact_mut(2).zip(&estimated).enumerate() {
            if border && self.boundary.get(i) == Some(&0) {
                continue;
            }
            let e = to_octa(n, unit);
            v[0] = v[0].wrapping_add(e[0]);
            v[1] = v[1].wrapping_add(e[1]);
        }
        Ok(())
    }

    fn dequantize(&self, output: Option<&OutputFormat>) -> Result<Attribute, Err> {
        let unit = self.unit()?;
        let (format, components) = resolve_output(&self.header, output);
        let scale = match format {
            ComponentDataType::F32 | ComponentDataType::F64 => 1.0,
            ComponentDataType::I16 => 32767.0,
            ComponentDataType::I8 => 127.0,
            _ => 0.0,
        };
        if scale == 0.0 || components != 3 {
            return Err(Err::InvalidOutput { name: self.header.name.clone(), format, components });
        }
        let raw = self.values.chunks_exact(2)
            .enumerate()
            .flat_map(|(i, p)| {
                let n = self.interior.get(i).copied().flatten();
                n.unwrap_or_else(|| from_octa([p[0], p[1]], unit)).to_array()
            })
            .map(|x| x as f64 * scale)
            .collect::<Vec<_>>();
        let data = AttributeData::from_f64_slice(format, &raw);
        let name = self.header.name.as_str();
        Ok(Attribute::from_data(name, AttributeType::from_name(name), data, 3)?)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bit_coder::SliceReader;
    use crate::encode::attribute::normal::NormalEncoder;
    use crate::encode::attribute::AttributeEncoderImpl;

    /// a square pyramid without its base, so the apex is interior and the rim a boundary.
    fn pyramid() -> (Vec<i32>, Vec<[u32; 3]>) {
        let positions = vec![0, 0, 8, 8, 0, 0, 0, 8, 0, -8, 0, 0, 0, -8, 0];
        let faces = vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]];
        (positions, faces)
    }

    fn round_trip(prediction: NormalPrediction, normals: &[f32]) -> Vec<Vec3> {
        let (positions, faces) = pyramid();
        round_trip_on(&positions, &faces, prediction, normals)
    }

    fn round_trip_on(positions: &[i32], faces: &[[u32; 3]], prediction: NormalPrediction, normals: &[f32]) -> Vec<Vec3> {
        let att = Attribute::new("normal", AttributeType::Normal, normals.to_vec(), 3).unwrap();
        let geometry = Geometry { positions: Some(positions), faces, num_vertices: 5 };
        let context = (0..5).map(Quad::chain).collect::<Vec<_>>();

        let mut enc = NormalEncoder::new(&att, 12, prediction).unwrap();
        enc.pre_delta(&geometry).unwrap();
        enc.delta_encode(&context);
        let mut buffer = Vec::new();
        enc.encode(EntropyMode::Tunstall, &mut buffer).unwrap();

        let mut dec = NormalDecoder::new(enc.header());
        let mut reader = SliceReader::new(&buffer);
        dec.decode(EntropyMode::Tunstall, &geometry, &mut reader).unwrap();
        assert_eq!(reader.remaining(), 0);
        dec.delta_decode(&context);
        dec.post_delta(&geometry).unwrap();
        let out = dec.dequantize(None).unwrap();
        out.as_slice::<f32>().unwrap()
            .chunks_exact(3)
            .map(|n| Vec3::new(n[0], n[1], n[2]))
            .collect()
    }

    fn sample() -> Vec<f32> {
        [Vec3::Z, Vec3::new(1.0, 0.0, 1.0), Vec3::new(0.0, 1.0, 1.0), Vec3::new(-1.0, 0.2, 1.0), Vec3::new(0.1, -1.0, 0.5)]
            .iter()
            .flat_map(|n| n.normalize().to_array())
            .collect()
    }

    #[test]
    fn diff_and_estimated_keep_every_normal() {
        let normals = sample();
        for prediction in [NormalPrediction::Diff, NormalPrediction::Estimated] {
            let decoded = round_trip(prediction, &normals);
            for (d, n) in decoded.iter().zip(normals.chunks_exact(3)) {
                assert!(d.angle_between(Vec3::new(n[0], n[1], n[2])) < 0.01);
            }
        }
    }

    #[test]
    fn border_estimates_the_interior() {
        let normals = sample();
        let decoded = round_trip(NormalPrediction::Border, &normals);
        // the apex takes the estimate, which points straight up.
        assert!(decoded[0].angle_between(Vec3::Z) < 0.01);
        for (d, n) in decoded.iter().zip(normals.chunks_exact(3)).skip(1) {
            assert!(d.angle_between(Vec3::new(n[0], n[1], n[2])) < 0.01);
        }
    }

    #[test]
    fn border_interior_keeps_the_float_estimate() {
        // an apex off center, so its estimate is not on the octahedral grid.
        let positions = vec![3, 1, 8, 8, 0, 0, 0, 8, 0, -8, 0, 0, 0, -8, 0];
        let (_, faces) = pyramid();
        let decoded = round_trip_on(&positions, &faces, NormalPrediction::Border, &sample());
        let estimate = estimate_normals(&positions, &faces, 5)[0].normalize();
        assert_eq!(decoded[0], estimate);
        let snapped = from_octa(to_octa(estimate, 2048), 2048);
        assert_ne!(decoded[0], snapped);
    }

    #[test]
    fn integer_outputs() {
        let header = AttributeHeader {
            name: "normal".to_owned(),
            kind: crate::shared::attribute::CodecKind::Normal,
            q: 512.0,
            num_components: 3,
            format: ComponentDataType::F32,
            strategy: crate::shared::attribute::Strategy::CORRELATED,
        };
        let mut dec = NormalDecoder::new(header.clone());
        dec.values = vec![0, 0, 512, 0];
        let out = dec.dequantize(Some(&OutputFormat::new(ComponentDataType::I16))).unwrap();
        assert_eq!(out.as_slice::<i16>(), Some(&[0, 0, 32767, 32767, 0, 0][..]));
        assert!(matches!(
            dec.dequantize(Some(&OutputFormat::new(ComponentDataType::U8))),
            Err(Err::InvalidOutput { .. })
        ));
        let bad = NormalDecoder::new(AttributeHeader { q: 3.5, ..header });
        assert!(matches!(bad.dequantize(None), Err(Err::InvalidStep { .. })));
    }
}
