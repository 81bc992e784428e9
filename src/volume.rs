use crate::enums::{Orientation, SliceIndex};

use ndarray::Array2;
use ndarray::Array3;
use serde::Serialize;

/// Source format a volume was decoded from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeFormat {
    Nifti,
    Numpy,
}

impl VolumeFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            VolumeFormat::Nifti => "NIfTI",
            VolumeFormat::Numpy => "NumPy",
        }
    }
}

/// Descriptive metadata reported to the caller on load.
#[derive(Clone, Debug, Serialize)]
pub struct VolumeMetadata {
    pub format: &'static str,
    pub shape: [usize; 3],
    pub dtype: String,
    pub spacing: [f32; 3],
    pub value_range: [f32; 2],
    pub mean: f32,
    pub std: f32,
}

/// An immutable 3D array of scan intensities with physical spacing and
/// precomputed summary statistics. Always exactly three-dimensional; the
/// loader rejects any other rank.
pub struct Volume {
    data: Array3<f32>,
    spacing: (f32, f32, f32),
    format: VolumeFormat,
    dtype: String,
    value_range: (f32, f32),
    mean: f32,
    std: f32,
}

impl Volume {
    pub fn new(
        data: Array3<f32>,
        spacing: (f32, f32, f32),
        format: VolumeFormat,
        dtype: String,
    ) -> Self {
        let (value_range, mean, std) = Self::summarize(&data);
        Self {
            data,
            spacing,
            format,
            dtype,
            value_range,
            mean,
            std,
        }
    }

    /// Get the dimensions of the volume (nx, ny, nz)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Total number of voxels.
    pub fn voxel_count(&self) -> usize {
        self.data.len()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn spacing(&self) -> (f32, f32, f32) {
        self.spacing
    }

    pub fn format(&self) -> VolumeFormat {
        self.format
    }

    pub fn value_range(&self) -> (f32, f32) {
        self.value_range
    }

    /// Extent of the volume along a slicing axis.
    pub fn extent(&self, orientation: Orientation) -> usize {
        let (nx, ny, nz) = self.dim();
        match orientation {
            Orientation::Sagittal => nx,
            Orientation::Coronal => ny,
            Orientation::Axial => nz,
        }
    }

    /// Default slice position: the middle of the axis.
    pub fn mid_index(&self, orientation: Orientation) -> usize {
        self.extent(orientation) / 2
    }

    /// Clamp a requested index into the valid range for `orientation`.
    /// Out-of-range input selects the nearest valid slice, never an error.
    pub fn clamp_index(&self, index: impl Into<SliceIndex>, orientation: Orientation) -> usize {
        index.into().clamp(self.extent(orientation))
    }

    /// Extract the 2D plane at `index` along `orientation`, applying the
    /// anatomical display convention: sagittal and coronal planes are
    /// transposed relative to the raw array slice, axial is not. Resulting
    /// shapes are (nz, ny), (nz, nx) and (nx, ny) respectively.
    ///
    /// A zero extent along `orientation` has no plane to show; extraction
    /// yields an all-zero plane of the display shape rather than panicking.
    pub fn extract(&self, orientation: Orientation, index: impl Into<SliceIndex>) -> Array2<f32> {
        if self.extent(orientation) == 0 {
            let (nx, ny, nz) = self.dim();
            return match orientation {
                Orientation::Sagittal => Array2::zeros((nz, ny)),
                Orientation::Coronal => Array2::zeros((nz, nx)),
                Orientation::Axial => Array2::zeros((nx, ny)),
            };
        }
        let index = self.clamp_index(index, orientation);
        let plane = self
            .data
            .index_axis(ndarray::Axis(orientation.axis()), index);
        match orientation {
            Orientation::Sagittal | Orientation::Coronal => plane.t().to_owned(),
            Orientation::Axial => plane.to_owned(),
        }
    }

    pub fn metadata(&self) -> VolumeMetadata {
        let (nx, ny, nz) = self.dim();
        VolumeMetadata {
            format: self.format.as_str(),
            shape: [nx, ny, nz],
            dtype: self.dtype.clone(),
            spacing: [self.spacing.0, self.spacing.1, self.spacing.2],
            value_range: [self.value_range.0, self.value_range.1],
            mean: self.mean,
            std: self.std,
        }
    }

    fn summarize(data: &Array3<f32>) -> ((f32, f32), f32, f32) {
        if data.is_empty() {
            return ((0.0, 0.0), 0.0, 0.0);
        }
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        for &v in data.iter() {
            min = min.min(v);
            max = max.max(v);
            sum += v as f64;
        }
        let n = data.len() as f64;
        let mean = sum / n;
        let var = data
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        ((min, max), mean as f32, var.sqrt() as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn test_volume() -> Volume {
        let data = Array3::from_shape_fn((10, 12, 14), |(x, y, z)| (x * 1000 + y * 10 + z) as f32);
        Volume::new(data, (1.0, 1.0, 1.0), VolumeFormat::Numpy, "float32".into())
    }

    #[test]
    fn extraction_shapes_follow_display_convention() {
        let volume = test_volume();
        // Sagittal plane (ny, nz) transposed -> (nz, ny).
        assert_eq!(volume.extract(Orientation::Sagittal, 0).dim(), (14, 12));
        // Coronal plane (nx, nz) transposed -> (nz, nx).
        assert_eq!(volume.extract(Orientation::Coronal, 0).dim(), (14, 10));
        // Axial plane (nx, ny) untransposed.
        assert_eq!(volume.extract(Orientation::Axial, 0).dim(), (10, 12));
    }

    #[test]
    fn extraction_transposes_values() {
        let volume = test_volume();
        let sagittal = volume.extract(Orientation::Sagittal, 3);
        // Transposed: row = z, column = y.
        assert_eq!(sagittal[[5, 7]], (3 * 1000 + 7 * 10 + 5) as f32);
        let axial = volume.extract(Orientation::Axial, 4);
        assert_eq!(axial[[2, 9]], (2 * 1000 + 9 * 10 + 4) as f32);
    }

    #[test]
    fn out_of_range_indices_clamp_instead_of_panicking() {
        let volume = test_volume();
        let below = volume.extract(Orientation::Axial, -100);
        let first = volume.extract(Orientation::Axial, 0);
        assert_eq!(below, first);

        let above = volume.extract(Orientation::Axial, 10_000);
        let last = volume.extract(Orientation::Axial, 13);
        assert_eq!(above, last);
    }

    #[test]
    fn zero_extent_axis_yields_a_zero_plane() {
        let data = Array3::<f32>::zeros((0, 5, 6));
        let volume = Volume::new(data, (1.0, 1.0, 1.0), VolumeFormat::Numpy, "float32".into());

        let plane = volume.extract(Orientation::Sagittal, 0);
        assert_eq!(plane.dim(), (6, 5));
        assert!(plane.iter().all(|&v| v == 0.0));

        // The other axes slice normally; their planes are merely zero-width.
        assert_eq!(volume.extract(Orientation::Coronal, 2).dim(), (6, 0));
        assert_eq!(volume.extract(Orientation::Axial, 2).dim(), (0, 5));
    }

    #[test]
    fn summary_statistics_match_known_data() {
        let data = Array3::from_shape_vec((1, 2, 2), vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
        let volume = Volume::new(data, (1.0, 1.0, 1.0), VolumeFormat::Numpy, "float32".into());
        assert_eq!(volume.value_range(), (1.0, 4.0));
        let meta = volume.metadata();
        assert_eq!(meta.shape, [1, 2, 2]);
        assert!((meta.mean - 2.5).abs() < 1e-6);
        assert!((meta.std - 1.118034).abs() < 1e-5);
    }

    #[test]
    fn metadata_serializes_to_json() {
        let meta = test_volume().metadata();
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["format"], "NumPy");
        assert_eq!(json["shape"][2], 14);
    }
}
