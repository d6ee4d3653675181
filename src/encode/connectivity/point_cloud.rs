use crate::core::shared::Quad;
use crate::utils::{bit_length, morton_code};
use super::ConnectivityOutput;

/// bits per axis of a Morton code.
const AXIS_BITS: u32 = 21;

/// Orders the points of a point cloud along a z-order curve of their quantized positions
/// ('n' components per point; at most three are used). Points sharing a cell keep their
/// relative order. Every point is predicted from the one before it.
pub(crate) fn morton_order(positions: &[i32], n: usize) -> ConnectivityOutput {
    let n = n.max(1);
    let num_points = positions.len() / n;
    let axes = n.min(3);

    let mut min = [i32::MAX; 3];
    let mut max = [i32::MIN; 3];
    for p in positions.chunks_exact(n) {
        for k in 0..axes {
            min[k] = min[k].min(p[k]);
            max[k] = max[k].max(p[k]);
        }
    }
    let range = (0..axes)
        .map(|k| (max[k] as i64 - min[k] as i64) as u64)
        .max()
        .unwrap_or(0);
    let shift = bit_length(range).saturating_sub(AXIS_BITS);

    let cell = |p: &[i32], k: usize| -> u32 {
        if k < axes {
            ((p[k] as i64 - min[k] as i64) as u64 >> shift) as u32
        } else {
            0
        }
    };
    let mut keyed = positions.chunks_exact(n)
        .enumerate()
        .map(|(i, p)| (morton_code(cell(p, 0), cell(p, 1), cell(p, 2)), i))
        .collect::<Vec<_>>();
    keyed.sort_unstable();

    let mut order = vec![0; num_points];
    for (rank, &(_, i)) in keyed.iter().enumerate() {
        order[i] = rank as u32;
    }
    tracing::debug!(num_points, shift, "sorted point cloud along a z-order curve");
    sequential(order)
}

/// A chain context over the given vertex order.
pub(crate) fn sequential(order: Vec<u32>) -> ConnectivityOutput {
    let context = (0..order.len() as u32).map(Quad::chain).collect();
    ConnectivityOutput { order, context, ..Default::default() }
}

/// Vertices in their original order.
pub(crate) fn identity_order(num_vertices: usize) -> ConnectivityOutput {
    sequential((0..num_vertices as u32).collect())
}
