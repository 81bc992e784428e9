use crate::volume::{Volume, VolumeFormat};

use ndarray::{Array3, ArrayD, Ix3};
use ndarray_npy::ReadNpyExt;
use nifti::volume::ndarray::IntoNdArray;
use nifti::{NiftiObject, ReaderOptions};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Unsupported file format: {0:?}. Supported: .nii, .nii.gz, .npy")]
    UnsupportedFormat(String),

    #[error("Expected 3D array, got {0}D array")]
    UnsupportedShape(usize),

    #[error("Volume has a zero-length axis: {0:?}")]
    EmptyVolume([usize; 3]),

    #[error("Failed to decode volume: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a 3D medical volume from a NIfTI (`.nii`, `.nii.gz`, or any
    /// `.gz` whose name contains "nii") or NumPy (`.npy`) file.
    ///
    /// # Errors
    ///
    /// Fails before decoding when the file is missing or the extension is
    /// unrecognized, and during decoding when the bytes are malformed or
    /// the array is not exactly three-dimensional.
    pub fn load(path: impl AsRef<Path>) -> Result<Volume, VolumeLoaderError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(VolumeLoaderError::FileNotFound(path.to_path_buf()));
        }

        let lowered = path.to_string_lossy().to_lowercase();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_lowercase();

        let volume = if lowered.ends_with(".nii")
            || lowered.ends_with(".nii.gz")
            || (extension == "gz" && lowered.contains("nii"))
        {
            Self::load_nifti(path)
        } else if extension == "npy" {
            Self::load_npy(path)
        } else {
            Err(VolumeLoaderError::UnsupportedFormat(extension))
        }?;

        debug!(
            path = %path.display(),
            format = volume.format().as_str(),
            shape = ?volume.dim(),
            "loaded volume"
        );
        Ok(volume)
    }

    fn load_nifti(path: &Path) -> Result<Volume, VolumeLoaderError> {
        let object = ReaderOptions::new()
            .read_file(path)
            .map_err(|e| VolumeLoaderError::Decode(e.to_string()))?;
        let header = object.header().clone();

        let data: ArrayD<f32> = object
            .into_volume()
            .into_ndarray::<f32>()
            .map_err(|e| VolumeLoaderError::Decode(e.to_string()))?;
        let data: Array3<f32> = Self::require_3d(data)?;

        // First three pixdims are the voxel spacing; headers reporting a
        // lower rank fall back to unit spacing.
        let spacing = if header.dim[0] >= 3 {
            (header.pixdim[1], header.pixdim[2], header.pixdim[3])
        } else {
            (1.0, 1.0, 1.0)
        };

        let dtype = header
            .data_type()
            .map(|t| format!("{t:?}").to_lowercase())
            .unwrap_or_else(|_| "unknown".to_string());

        Ok(Volume::new(data, spacing, VolumeFormat::Nifti, dtype))
    }

    fn load_npy(path: &Path) -> Result<Volume, VolumeLoaderError> {
        let (data, dtype) = Self::read_npy_any(path)?;
        let data = Self::require_3d(data)?;
        Ok(Volume::new(
            data,
            (1.0, 1.0, 1.0),
            VolumeFormat::Numpy,
            dtype.to_string(),
        ))
    }

    /// `.npy` files are typed on disk; try the common numeric element types
    /// in turn and convert to f32.
    fn read_npy_any(path: &Path) -> Result<(ArrayD<f32>, &'static str), VolumeLoaderError> {
        macro_rules! try_read {
            ($ty:ty, $name:expr) => {
                if let Ok(arr) = ArrayD::<$ty>::read_npy(BufReader::new(File::open(path)?)) {
                    return Ok((arr.mapv(|v| v as f32), $name));
                }
            };
        }

        try_read!(f64, "float64");
        try_read!(f32, "float32");
        try_read!(i64, "int64");
        try_read!(i32, "int32");
        try_read!(i16, "int16");
        try_read!(u16, "uint16");
        try_read!(u8, "uint8");

        Err(VolumeLoaderError::Decode(format!(
            "not a readable .npy array: {}",
            path.display()
        )))
    }

    fn require_3d(data: ArrayD<f32>) -> Result<Array3<f32>, VolumeLoaderError> {
        let ndim = data.ndim();
        let data = data
            .into_dimensionality::<Ix3>()
            .map_err(|_| VolumeLoaderError::UnsupportedShape(ndim))?;
        // Rank 3 with a zero extent is still unrenderable.
        if data.is_empty() {
            let (nx, ny, nz) = data.dim();
            return Err(VolumeLoaderError::EmptyVolume([nx, ny, nz]));
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};
    use ndarray_npy::WriteNpyExt;
    use std::io::BufWriter;

    fn write_npy<A, D>(dir: &tempfile::TempDir, name: &str, array: &ndarray::Array<A, D>) -> PathBuf
    where
        A: ndarray_npy::WritableElement,
        D: ndarray::Dimension,
    {
        let path = dir.path().join(name);
        let writer = BufWriter::new(File::create(&path).unwrap());
        array.write_npy(writer).unwrap();
        path
    }

    #[test]
    fn npy_round_trip_preserves_shape_and_range() {
        let dir = tempfile::tempdir().unwrap();
        let data = Array3::from_shape_fn((10, 12, 14), |(x, y, z)| (x + y + z) as f64);
        let path = write_npy(&dir, "vol.npy", &data);

        let volume = VolumeLoader::load(&path).unwrap();
        let meta = volume.metadata();
        assert_eq!(meta.format, "NumPy");
        assert_eq!(meta.shape, [10, 12, 14]);
        assert_eq!(meta.dtype, "float64");
        assert_eq!(meta.spacing, [1.0, 1.0, 1.0]);
        assert!((meta.value_range[0] - 0.0).abs() < 1e-6);
        assert!((meta.value_range[1] - 33.0).abs() < 1e-6);
    }

    #[test]
    fn non_3d_npy_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let data = Array2::<f32>::zeros((8, 8));
        let path = write_npy(&dir, "flat.npy", &data);

        let err = VolumeLoader::load(&path).err().expect("load should fail");
        assert!(matches!(err, VolumeLoaderError::UnsupportedShape(2)));
    }

    #[test]
    fn zero_extent_npy_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let data = Array3::<f32>::zeros((0, 5, 5));
        let path = write_npy(&dir, "empty.npy", &data);

        let err = VolumeLoader::load(&path).err().expect("load should fail");
        assert!(matches!(err, VolumeLoaderError::EmptyVolume([0, 5, 5])));
    }

    #[test]
    fn unknown_extension_is_rejected_before_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volume.txt");
        std::fs::write(&path, b"not a volume").unwrap();

        assert!(matches!(
            VolumeLoader::load(&path),
            Err(VolumeLoaderError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn missing_file_is_reported_as_not_found() {
        assert!(matches!(
            VolumeLoader::load("/does/not/exist.nii.gz"),
            Err(VolumeLoaderError::FileNotFound(_))
        ));
    }

    #[test]
    fn integer_npy_is_converted_to_f32() {
        let dir = tempfile::tempdir().unwrap();
        let data = Array3::from_shape_fn((4, 4, 4), |(x, _, _)| x as i16 * 100);
        let path = write_npy(&dir, "ints.npy", &data);

        let volume = VolumeLoader::load(&path).unwrap();
        assert_eq!(volume.metadata().dtype, "int16");
        assert_eq!(volume.value_range(), (0.0, 300.0));
    }
}
