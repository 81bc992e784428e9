//! Strided volume downsampling with adaptive factor selection.
//!
//! Full 3D scene construction is O(voxel count), so large volumes are
//! subsampled before rendering. This is a plain stride (every Nth voxel per
//! axis), not an averaging resize; it trades resolution for bounded memory
//! and render time.

use ndarray::{Array3, s};
use tracing::debug;

/// Voxel-count thresholds for a single full-volume render.
const SINGLE_FACTOR_4_ABOVE: usize = 50_000_000;
const SINGLE_FACTOR_3_ABOVE: usize = 10_000_000;

/// Hard budget after the initial stride; exceeding it forces one extra
/// stride-2 pass.
const RESIDUAL_VOXEL_BUDGET: usize = 8_000_000;

/// Stricter thresholds when two volumes are resident at once.
const COMPARE_FACTOR_5_ABOVE: usize = 30_000_000;
const COMPARE_FACTOR_4_ABOVE: usize = 10_000_000;
const COMPARE_BASE_FACTOR: usize = 3;

/// Take every `factor`-th voxel along each axis. A factor of 0 or 1 returns
/// an unchanged copy.
pub fn stride(data: &Array3<f32>, factor: usize) -> Array3<f32> {
    if factor <= 1 {
        return data.clone();
    }
    let step = factor as isize;
    data.slice(s![..;step, ..;step, ..;step]).to_owned()
}

/// Floor the requested factor by the single-volume schedule: volumes above
/// 50M voxels render at factor >= 4, above 10M at >= 3.
pub fn single_render_factor(voxel_count: usize, requested: usize) -> usize {
    if voxel_count > SINGLE_FACTOR_4_ABOVE {
        requested.max(4)
    } else if voxel_count > SINGLE_FACTOR_3_ABOVE {
        requested.max(3)
    } else {
        requested
    }
}

/// Shared factor for comparison renders, chosen from the larger of the two
/// volumes since both are held in memory simultaneously.
pub fn compare_render_factor(max_voxel_count: usize, requested: usize) -> usize {
    let requested = requested.max(COMPARE_BASE_FACTOR);
    if max_voxel_count > COMPARE_FACTOR_5_ABOVE {
        requested.max(5)
    } else if max_voxel_count > COMPARE_FACTOR_4_ABOVE {
        requested.max(4)
    } else {
        requested
    }
}

/// Stride `data` by the adaptive single-volume factor, then apply one extra
/// stride-2 pass if the result still exceeds the residual budget.
pub fn downsample_for_render(data: &Array3<f32>, requested: usize) -> Array3<f32> {
    let factor = single_render_factor(data.len(), requested);
    let mut reduced = stride(data, factor);
    if reduced.len() > RESIDUAL_VOXEL_BUDGET {
        reduced = stride(&reduced, 2);
    }
    debug!(
        input_voxels = data.len(),
        factor,
        output_voxels = reduced.len(),
        "downsampled volume for rendering"
    );
    reduced
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn stride_takes_every_nth_voxel() {
        let data = Array3::from_shape_fn((6, 6, 6), |(x, y, z)| (x * 100 + y * 10 + z) as f32);
        let reduced = stride(&data, 2);
        assert_eq!(reduced.dim(), (3, 3, 3));
        assert_eq!(reduced[[0, 0, 0]], 0.0);
        assert_eq!(reduced[[1, 1, 1]], 222.0);
        assert_eq!(reduced[[2, 2, 2]], 444.0);
    }

    #[test]
    fn stride_of_one_is_identity() {
        let data = Array3::from_elem((4, 5, 6), 1.0f32);
        assert_eq!(stride(&data, 1).dim(), (4, 5, 6));
        assert_eq!(stride(&data, 0).dim(), (4, 5, 6));
    }

    #[test]
    fn single_factor_thresholds_are_exact() {
        assert_eq!(single_render_factor(50_000_001, 2), 4);
        assert_eq!(single_render_factor(50_000_000, 2), 3);
        assert_eq!(single_render_factor(49_999_999, 2), 3);
        assert_eq!(single_render_factor(10_000_001, 1), 3);
        assert_eq!(single_render_factor(10_000_000, 2), 2);
        assert_eq!(single_render_factor(1_000, 1), 1);
        // A larger request is never reduced.
        assert_eq!(single_render_factor(60_000_000, 6), 6);
    }

    #[test]
    fn compare_factor_schedule_is_stricter() {
        assert_eq!(compare_render_factor(30_000_001, 3), 5);
        assert_eq!(compare_render_factor(30_000_000, 3), 4);
        assert_eq!(compare_render_factor(10_000_001, 3), 4);
        assert_eq!(compare_render_factor(10_000_000, 3), 3);
        // The base factor applies even when less is requested.
        assert_eq!(compare_render_factor(1_000, 1), 3);
    }

    #[test]
    fn residual_budget_forces_extra_pass() {
        // 256^3 = ~16.7M voxels: factor floors to 3 -> 86^3 = 636k, within
        // budget, so no extra pass.
        let data = Array3::zeros((64, 64, 64));
        let reduced = downsample_for_render(&data, 2);
        assert_eq!(reduced.dim(), (32, 32, 32));
    }
}
