use std::ops::BitOr;

use glam::Vec3;

use crate::core::shared::{Face, Quad, VertexIdx};

/// How an attribute is quantized and predicted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodecKind {
    /// positions, texture coordinates and custom data.
    Generic,
    /// octahedral unit vectors.
    Normal,
    /// YCoCg colors.
    Color,
}

impl CodecKind {
    pub fn get_id(self) -> u32 {
        match self {
            CodecKind::Generic => 1,
            CodecKind::Normal => 2,
            CodecKind::Color => 3,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(CodecKind::Generic),
            2 => Some(CodecKind::Normal),
            3 => Some(CodecKind::Color),
            _ => None,
        }
    }
}

/// Prediction flags of an attribute.
/// `PARALLEL` enables the parallelogram rule, `CORRELATED` codes the components of a
/// vertex with one shared bit length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Strategy(u8);

impl Strategy {
    pub const NONE: Strategy = Strategy(0);
    pub const PARALLEL: Strategy = Strategy(1);
    pub const CORRELATED: Strategy = Strategy(2);

    pub fn bits(self) -> u8 {
        self.0
    }

    /// unknown bits are dropped.
    pub fn from_bits(bits: u8) -> Self {
        Strategy(bits & (Self::PARALLEL.0 | Self::CORRELATED.0))
    }

    pub fn contains(self, other: Strategy) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Strategy {
    type Output = Strategy;
    fn bitor(self, rhs: Strategy) -> Strategy {
        Strategy(self.0 | rhs.0)
    }
}

/// What a quantized normal is predicted from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NormalPrediction {
    /// the normal of the previous vertex in the prediction context.
    Diff,
    /// the area weighted average of the incident face normals.
    Estimated,
    /// like `Estimated`, but only boundary vertices store a correction.
    Border,
}

impl NormalPrediction {
    pub fn get_id(self) -> u8 {
        match self {
            NormalPrediction::Diff => 0,
            NormalPrediction::Estimated => 1,
            NormalPrediction::Border => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(NormalPrediction::Diff),
            1 => Some(NormalPrediction::Estimated),
            2 => Some(NormalPrediction::Border),
            _ => None,
        }
    }
}


/// What an attribute may look at besides its own values, in traversal order.
pub(crate) struct Geometry<'a> {
    /// quantized positions, three components per vertex.
    pub positions: Option<&'a [i32]>,
    /// faces in traversal indices; empty for point clouds.
    pub faces: &'a [Face],
    pub num_vertices: usize,
}


/// Predicted value of component `k` of the target of 'quad', from the values already known.
/// 'values' holds 'n' components per vertex. The origin is predicted as zero.
pub(crate) fn predict(values: &[i32], n: usize, quad: &Quad, parallel: bool, k: usize) -> i32 {
    if quad.target == 0 {
        return 0;
    }
    let at = |v: VertexIdx| values.get(v as usize * n + k).copied().unwrap_or(0);
    if parallel && quad.is_parallelogram() {
        at(quad.a).wrapping_sub(at(quad.b)).wrapping_add(at(quad.c))
    } else {
        at(quad.a)
    }
}

/// Replaces 'values', given in traversal order, by their prediction residuals.
/// Residuals are computed from the last vertex backwards so that every prediction
/// still sees the original values.
pub(crate) fn delta_encode(values: &mut [i32], n: usize, context: &[Quad], parallel: bool) {
    for quad in context.iter().rev() {
        for k in 0..n {
            let pred = predict(values, n, quad, parallel, k);
            if let Some(v) = values.get_mut(quad.target as usize * n + k) {
                *v = v.wrapping_sub(pred);
            }
        }
    }
}

/// Inverse of [delta_encode]: turns residuals back into values, in traversal order.
pub(crate) fn delta_decode(values: &mut [i32], n: usize, context: &[Quad], parallel: bool) {
    for quad in context {
        for k in 0..n {
            let pred = predict(values, n, quad, parallel, k);
            if let Some(v) = values.get_mut(quad.target as usize * n + k) {
                *v = v.wrapping_add(pred);
            }
        }
    }
}


/// Maps a direction onto the octahedron unfolded into the square `[-unit, unit]^2`.
/// The zero vector maps to the center.
pub(crate) fn to_octa(n: Vec3, unit: i32) -> [i32; 2] {
    let l1 = n.x.abs() + n.y.abs() + n.z.abs();
    if l1 == 0.0 || !l1.is_finite() {
        return [0, 0];
    }
    let mut u = n.x / l1;
    let mut v = n.y / l1;
    if n.z < 0.0 {
        let (pu, pv) = (u, v);
        u = (1.0 - pv.abs()) * sign(pu);
        v = (1.0 - pu.abs()) * sign(pv);
    }
    let unit = unit as f32;
    [(u * unit).round() as i32, (v * unit).round() as i32]
}

/// Inverse of [to_octa], as a unit vector.
pub(crate) fn from_octa(p: [i32; 2], unit: i32) -> Vec3 {
    let (u, v) = (p[0] as f32, p[1] as f32);
    let unit = unit as f32;
    let z = unit - u.abs() - v.abs();
    let (x, y) = if z < 0.0 {
        ((unit - v.abs()) * sign(u), (unit - u.abs()) * sign(v))
    } else {
        (u, v)
    };
    let n = Vec3::new(x, y, z).normalize_or_zero();
    if n == Vec3::ZERO { Vec3::Z } else { n }
}

#[inline]
fn sign(x: f32) -> f32 {
    if x < 0.0 { -1.0 } else { 1.0 }
}

/// Sums the cross products of the faces around each vertex. The result is the area
/// weighted vertex normal, not normalized. 'positions' holds three quantized
/// components per vertex; faces referencing missing vertices are skipped.
pub(crate) fn estimate_normals(positions: &[i32], faces: &[Face], num_vertices: usize) -> Vec<Vec3> {
    let mut estimated = vec![Vec3::ZERO; num_vertices];
    let point = |v: VertexIdx| {
        let i = v as usize * 3;
        positions.get(i..i + 3).map(|p| Vec3::new(p[0] as f32, p[1] as f32, p[2] as f32))
    };
    for f in faces {
        if f.iter().any(|&v| v as usize >= num_vertices) {
            continue;
        }
        let (Some(p0), Some(p1), Some(p2)) = (point(f[0]), point(f[1]), point(f[2])) else {
            continue;
        };
        let n = (p1 - p0).cross(p2 - p0);
        for &v in f {
            estimated[v as usize] += n;
        }
    }
    estimated
}

/// Marks the vertices on a mesh boundary. Each vertex accumulates the XOR of the
/// neighbors of its faces; around an interior vertex every neighbor shows up twice and
/// cancels out, so a nonzero mark means the vertex is on a boundary.
pub(crate) fn mark_boundary(faces: &[Face], num_vertices: usize) -> Vec<u32> {
    let mut boundary = vec![0_u32; num_vertices];
    for f in faces {
        if f.iter().any(|&v| v as usize >= num_vertices) {
            continue;
        }
        for k in 0..3 {
            boundary[f[k] as usize] ^= f[(k + 1) % 3] ^ f[(k + 2) % 3];
        }
    }
    boundary
}


/// For each YCoCg channel, the RGBA channel it is derived from and quantized like.
pub(crate) const YCC_SOURCE_CHANNEL: [usize; 4] = [1, 2, 0, 3];

/// Decorrelates an RGBA color: luma is green, the chroma channels are differences to it.
pub(crate) fn to_ycc([r, g, b, a]: [i32; 4]) -> [i32; 4] {
    [g, b - g, r - g, a]
}

pub(crate) fn to_rgb([y, cb, cr, a]: [i32; 4]) -> [i32; 4] {
    [cr + y, y, cb + y, a]
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_flags() {
        let s = Strategy::PARALLEL | Strategy::CORRELATED;
        assert_eq!(s.bits(), 3);
        assert!(s.contains(Strategy::PARALLEL));
        assert!(!Strategy::PARALLEL.contains(Strategy::CORRELATED));
        assert_eq!(Strategy::from_bits(0xff), s);
    }

    #[test]
    fn ids_round_trip() {
        for kind in [CodecKind::Generic, CodecKind::Normal, CodecKind::Color] {
            assert_eq!(CodecKind::from_id(kind.get_id()), Some(kind));
        }
        assert_eq!(CodecKind::from_id(0), None);
        for p in [NormalPrediction::Diff, NormalPrediction::Estimated, NormalPrediction::Border] {
            assert_eq!(NormalPrediction::from_id(p.get_id()), Some(p));
        }
        assert_eq!(NormalPrediction::from_id(3), None);
    }

    #[test]
    fn parallelogram_deltas_invert() {
        // a flat quad: the fourth corner is predicted exactly.
        let mut values = vec![0, 0, 10, 0, 0, 10, 10, 10];
        let context = [
            Quad::chain(0),
            Quad::chain(1),
            Quad::chain(2),
            Quad::new(3, 1, 0, 2),
        ];
        let original = values.clone();
        delta_encode(&mut values, 2, &context, true);
        assert_eq!(&values[..2], &[0, 0]);
        assert_eq!(&values[6..], &[0, 0]);
        delta_decode(&mut values, 2, &context, true);
        assert_eq!(values, original);
    }

    #[test]
    fn chain_deltas_ignore_parallelograms() {
        let mut values = vec![5, 7, 4, 9];
        let context = [Quad::chain(0), Quad::chain(1), Quad::chain(2), Quad::new(3, 1, 0, 2)];
        delta_encode(&mut values, 1, &context, false);
        assert_eq!(values, vec![5, 2, -3, 2]);
        delta_decode(&mut values, 1, &context, false);
        assert_eq!(values, vec![5, 7, 4, 9]);
    }

    #[test]
    fn octahedral_map_round_trips() {
        let unit = 1 << 9;
        let dirs = [
            Vec3::X, Vec3::Y, Vec3::Z, -Vec3::X, -Vec3::Y, -Vec3::Z,
            Vec3::new(1.0, -2.0, 3.0).normalize(),
            Vec3::new(-0.3, 0.4, -0.8).normalize(),
            Vec3::new(0.7, 0.7, -0.1).normalize(),
        ];
        for d in dirs {
            let p = to_octa(d, unit);
            assert!(p[0].abs() <= unit && p[1].abs() <= unit);
            let back = from_octa(p, unit);
            assert!(back.angle_between(d) < 0.01, "{d} came back as {back}");
        }
        assert_eq!(to_octa(Vec3::ZERO, unit), [0, 0]);
        // only the length matters
        assert_eq!(to_octa(Vec3::new(0.0, 3.0, 4.0), unit), to_octa(Vec3::new(0.0, 0.6, 0.8), unit));
    }

    #[test]
    fn estimated_normals_follow_winding() {
        let positions = [0, 0, 0, 10, 0, 0, 0, 10, 0, 0, 0, 10];
        let normals = estimate_normals(&positions, &[[0, 1, 2]], 4);
        assert!(normals[0].normalize().abs_diff_eq(Vec3::Z, 1e-6));
        assert_eq!(normals[3], Vec3::ZERO);
    }

    #[test]
    fn boundary_of_a_closed_fan() {
        // a tetrahedron is closed; removing one face opens three vertices.
        let tetra = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        assert!(mark_boundary(&tetra, 4).iter().all(|&m| m == 0));
        let open = mark_boundary(&tetra[1..], 4);
        assert_eq!(open[3], 0);
        assert!(open[..3].iter().all(|&m| m != 0));
    }

    #[test]
    fn ycc_inverts() {
        for rgba in [[0, 0, 0, 0], [255, 0, 128, 255], [12, 200, 99, 7]] {
            assert_eq!(to_rgb(to_ycc(rgba)), rgba);
        }
    }
}
