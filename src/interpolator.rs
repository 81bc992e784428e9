use ndarray::{ArrayView2, ArrayView3};

pub(crate) struct Interpolator;

impl Interpolator {
    #[inline]
    pub(crate) fn bilinear_interpolate(slice: &ArrayView2<f32>, y: f32, x: f32) -> f32 {
        let (height, width) = slice.dim();

        let y0 = y.floor() as usize;
        let x0 = x.floor() as usize;
        let y1 = (y0 + 1).min(height - 1);
        let x1 = (x0 + 1).min(width - 1);

        let dy = y - y0 as f32;
        let dx = x - x0 as f32;
        let one_minus_dx = 1.0 - dx;
        let one_minus_dy = 1.0 - dy;

        let v00 = slice[[y0, x0]];
        let v01 = slice[[y0, x1]];
        let v10 = slice[[y1, x0]];
        let v11 = slice[[y1, x1]];

        let v0 = v00.mul_add(one_minus_dx, v01 * dx);
        let v1 = v10.mul_add(one_minus_dx, v11 * dx);

        v0.mul_add(one_minus_dy, v1 * dy)
    }

    /// Bilinear sample for panel pixel `(row, col)` of a `panel_h` x
    /// `panel_w` target mapped onto `slice`, using pixel-center alignment
    /// clamped to the source bounds.
    #[inline]
    pub(crate) fn bilinear_resample(
        slice: &ArrayView2<f32>,
        row: u32,
        col: u32,
        panel_h: u32,
        panel_w: u32,
    ) -> f32 {
        let (rows, cols) = slice.dim();
        let src_y = ((row as f32 + 0.5) / panel_h as f32 * rows as f32 - 0.5)
            .clamp(0.0, (rows - 1) as f32);
        let src_x = ((col as f32 + 0.5) / panel_w as f32 * cols as f32 - 0.5)
            .clamp(0.0, (cols - 1) as f32);
        Self::bilinear_interpolate(slice, src_y, src_x)
    }

    /// Trilinear sample at a fractional voxel coordinate. Coordinates outside
    /// the volume return `None` so ray marchers can skip empty space.
    #[inline]
    pub(crate) fn trilinear_interpolate(
        volume: &ArrayView3<f32>,
        x: f32,
        y: f32,
        z: f32,
    ) -> Option<f32> {
        let (nx, ny, nz) = volume.dim();
        if x < 0.0
            || y < 0.0
            || z < 0.0
            || x > (nx - 1) as f32
            || y > (ny - 1) as f32
            || z > (nz - 1) as f32
        {
            return None;
        }

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let z0 = z.floor() as usize;
        let x1 = (x0 + 1).min(nx - 1);
        let y1 = (y0 + 1).min(ny - 1);
        let z1 = (z0 + 1).min(nz - 1);

        let dx = x - x0 as f32;
        let dy = y - y0 as f32;
        let dz = z - z0 as f32;

        let c00 = volume[[x0, y0, z0]] * (1.0 - dx) + volume[[x1, y0, z0]] * dx;
        let c01 = volume[[x0, y0, z1]] * (1.0 - dx) + volume[[x1, y0, z1]] * dx;
        let c10 = volume[[x0, y1, z0]] * (1.0 - dx) + volume[[x1, y1, z0]] * dx;
        let c11 = volume[[x0, y1, z1]] * (1.0 - dx) + volume[[x1, y1, z1]] * dx;

        let c0 = c00 * (1.0 - dy) + c10 * dy;
        let c1 = c01 * (1.0 - dy) + c11 * dy;

        Some(c0 * (1.0 - dz) + c1 * dz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn bilinear_hits_grid_points_exactly() {
        let slice = Array2::from_shape_vec((2, 2), vec![0.0f32, 1.0, 2.0, 3.0]).unwrap();
        let view = slice.view();
        assert_eq!(Interpolator::bilinear_interpolate(&view, 0.0, 0.0), 0.0);
        assert_eq!(Interpolator::bilinear_interpolate(&view, 1.0, 1.0), 3.0);
        assert_eq!(Interpolator::bilinear_interpolate(&view, 0.5, 0.5), 1.5);
    }

    #[test]
    fn resample_at_native_size_is_identity() {
        let slice = Array2::from_shape_vec((2, 2), vec![0.0f32, 1.0, 2.0, 3.0]).unwrap();
        let view = slice.view();
        assert_eq!(Interpolator::bilinear_resample(&view, 0, 0, 2, 2), 0.0);
        assert_eq!(Interpolator::bilinear_resample(&view, 0, 1, 2, 2), 1.0);
        assert_eq!(Interpolator::bilinear_resample(&view, 1, 0, 2, 2), 2.0);
        assert_eq!(Interpolator::bilinear_resample(&view, 1, 1, 2, 2), 3.0);
    }

    #[test]
    fn resample_downscale_averages_pixel_centers() {
        let slice = Array2::from_shape_vec((2, 2), vec![0.0f32, 1.0, 2.0, 3.0]).unwrap();
        let view = slice.view();
        // A 1x1 panel samples the slice center: mean of all four values.
        assert_eq!(Interpolator::bilinear_resample(&view, 0, 0, 1, 1), 1.5);
    }

    #[test]
    fn trilinear_interpolates_between_corners() {
        let volume = Array3::from_shape_fn((2, 2, 2), |(x, _, _)| x as f32);
        let view = volume.view();
        assert_eq!(
            Interpolator::trilinear_interpolate(&view, 0.5, 0.5, 0.5),
            Some(0.5)
        );
        assert_eq!(
            Interpolator::trilinear_interpolate(&view, 1.0, 0.0, 0.0),
            Some(1.0)
        );
        assert_eq!(Interpolator::trilinear_interpolate(&view, -0.1, 0.0, 0.0), None);
        assert_eq!(Interpolator::trilinear_interpolate(&view, 0.0, 0.0, 1.5), None);
    }
}
