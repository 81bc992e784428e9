use std::path::PathBuf;
use std::process::ExitCode;

use nifti_view::{Orientation, RenderRequest, Renderer3D, VolumeLoader, render_2d};
use tracing::{error, info};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nifti_view=info".into()),
        )
        .init();

    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        eprintln!("usage: nifti-view <volume.nii[.gz] | volume.npy>");
        return ExitCode::FAILURE;
    };

    match run(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "rendering failed");
            ExitCode::FAILURE
        }
    }
}

fn run(path: &PathBuf) -> Result<(), nifti_view::RenderError> {
    let volume = VolumeLoader::load(path)?;
    info!(metadata = ?volume.metadata(), "loaded volume");

    let slice = render_2d::render_slice(&volume, Orientation::Axial, None, Default::default())?;
    std::fs::write("slice.png", slice).map_err(nifti_view::VolumeLoaderError::from)?;

    let multiview = render_2d::render_multiview(&volume, None, None, None, Default::default())?;
    std::fs::write("multiview.png", multiview).map_err(nifti_view::VolumeLoaderError::from)?;

    let renderer = Renderer3D::with_detected_backend();
    let scene = renderer.render(&volume, &RenderRequest::default())?;
    std::fs::write("scene.html", scene).map_err(nifti_view::VolumeLoaderError::from)?;

    info!("wrote slice.png, multiview.png and scene.html");
    Ok(())
}
