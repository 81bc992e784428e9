//! # nifti-view
//!
//! Slice and scene rendering for 3D medical volumes.
//!
//! Volumes are loaded from NIfTI (`.nii` / `.nii.gz`) or NumPy (`.npy`)
//! files into an `ndarray` backed [`Volume`]. From there the crate renders:
//!
//!  - single 2D slices along the three medical axes (Sagittal, Coronal,
//!    Axial), with percentile-windowed contrast and a colorbar
//!  - a three-panel multiview with crosshairs marking the other two slice
//!    positions
//!  - side-by-side slice comparisons of two volumes under one shared
//!    intensity window
//!  - interactive 3D scenes (volumetric, isosurface, or orthogonal slice
//!    planes) exported as self-contained HTML
//!  - a static six-angle projection document when the interactive backend
//!    is unavailable
//!
//! Large volumes are strided down adaptively before 3D rendering so scene
//! size stays bounded; see [`downsample`].
//!
//! # Examples
//!
//! Load a volume and render the middle axial slice to a PNG:
//!
//! ```no_run
//! # use nifti_view::{VolumeLoader, Orientation, Colormap, render_2d};
//! # use std::path::PathBuf;
//! let volume = VolumeLoader::load(&PathBuf::from("scan.nii.gz"))
//!     .expect("should have loaded the volume");
//! let png = render_2d::render_slice(&volume, Orientation::Axial, None, Colormap::Gray)
//!     .expect("should have rendered the slice");
//! std::fs::write("slice.png", png).unwrap();
//! ```
//!
//! Render an interactive 3D document:
//!
//! ```no_run
//! # use nifti_view::{VolumeLoader, Renderer3D, RenderRequest};
//! # use std::path::PathBuf;
//! let volume = VolumeLoader::load(&PathBuf::from("scan.nii.gz")).unwrap();
//! let renderer = Renderer3D::with_detected_backend();
//! let html = renderer.render(&volume, &RenderRequest::default()).unwrap();
//! std::fs::write("scene.html", html).unwrap();
//! ```

mod canvas;
pub mod colormap;
pub mod downsample;
pub mod enums;
pub mod error;
mod interpolator;
pub mod render_2d;
pub mod render_3d;
pub mod scene_composer;
pub mod volume;
pub mod volume_loader;
pub mod window;

pub use enums::{Colormap, OpacityPreset, Orientation, RenderMode, RenderRequest, SliceIndex};
pub use error::RenderError;
pub use render_3d::{Backend, Renderer3D};
pub use volume::{Volume, VolumeFormat, VolumeMetadata};
pub use volume_loader::{VolumeLoader, VolumeLoaderError};
