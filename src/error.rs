use crate::volume_loader::VolumeLoaderError;

use thiserror::Error;

/// Failures raised by the 2D and 3D renderers.
///
/// `BackendUnavailable` and `ExportFailed` are recoverable: inside
/// [`crate::render_3d::Renderer3D`] they trigger the static multi-angle
/// fallback instead of surfacing to the caller. Everything else is fatal to
/// the single request.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Interactive 3D backend is not available")]
    BackendUnavailable,

    #[error("Interactive scene export failed: {0}")]
    ExportFailed(String),

    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error(transparent)]
    Loader(#[from] VolumeLoaderError),
}
