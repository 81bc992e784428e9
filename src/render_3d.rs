//! Interactive 3D scene construction.
//!
//! Scenes are built as plotly figure JSON and wrapped into a self-contained
//! HTML document referencing the plotly.js runtime from its CDN. When the
//! interactive backend is unavailable, or the scene export fails at runtime,
//! rendering silently degrades to the static multi-angle document produced
//! by [`crate::scene_composer`].

use crate::downsample;
use crate::enums::{RenderMode, RenderRequest};
use crate::error::RenderError;
use crate::scene_composer;
use crate::volume::Volume;
use crate::window;

use ndarray::Array3;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Default stride before the adaptive floors kick in, per render mode.
const VOLUME_MODE_DEFAULT_FACTOR: usize = 4;
const ISOSURFACE_DEFAULT_FACTOR: usize = 2;

/// Isosurface band half-width in normalized intensity space.
const ISOSURFACE_BAND: f64 = 0.1;
const ISOSURFACE_SURFACE_COUNT: u32 = 3;
const ISOSURFACE_THRESHOLD_PERCENTILE: f64 = 50.0;

/// Whether the interactive 3D backend can be used. Checked once at startup
/// and injected into [`Renderer3D`], so tests can force either path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Interactive,
    Unavailable,
}

impl Backend {
    /// Capability check at process start. The interactive path only emits a
    /// document, so it is available unless explicitly disabled for the
    /// deployment environment.
    pub fn detect() -> Self {
        if std::env::var_os("NIFTI_VIEW_STATIC_ONLY").is_some() {
            Backend::Unavailable
        } else {
            Backend::Interactive
        }
    }
}

/// Builds interactive 3D documents for one or two volumes.
pub struct Renderer3D {
    backend: Backend,
}

impl Renderer3D {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub fn with_detected_backend() -> Self {
        Self::new(Backend::detect())
    }

    /// Render one volume as an interactive HTML document in the requested
    /// mode. Backend absence and export failure both degrade to the static
    /// multi-angle document rather than erroring.
    pub fn render(&self, volume: &Volume, request: &RenderRequest) -> Result<String, RenderError> {
        if self.backend == Backend::Unavailable {
            debug!("interactive backend unavailable, using static fallback");
            return scene_composer::compose_single(volume, request);
        }
        recover_single(self.render_interactive(volume, request), volume, request)
    }

    /// Render two volumes side by side with linked panels. Falls back the
    /// same way as [`Renderer3D::render`], nesting two static documents.
    pub fn render_compare(
        &self,
        volume_a: &Volume,
        volume_b: &Volume,
        request: &RenderRequest,
    ) -> Result<String, RenderError> {
        if self.backend == Backend::Unavailable {
            debug!("interactive backend unavailable, using static comparison fallback");
            return scene_composer::compose_compare(volume_a, volume_b, request);
        }
        recover_compare(
            self.render_compare_interactive(volume_a, volume_b, request),
            volume_a,
            volume_b,
            request,
        )
    }

    fn render_interactive(
        &self,
        volume: &Volume,
        request: &RenderRequest,
    ) -> Result<String, RenderError> {
        let figure = match request.render_mode {
            RenderMode::Volume => volume_figure(volume, request),
            RenderMode::Isosurface => isosurface_figure(volume, request),
            RenderMode::Slices => slices_figure(volume, request),
        };
        scene_to_html(&figure)
    }

    fn render_compare_interactive(
        &self,
        volume_a: &Volume,
        volume_b: &Volume,
        request: &RenderRequest,
    ) -> Result<String, RenderError> {
        let figure = compare_figure(volume_a, volume_b, request);
        scene_to_html(&figure)
    }
}

/// Export failures degrade to the static document; any other error
/// propagates.
fn recover_single(
    result: Result<String, RenderError>,
    volume: &Volume,
    request: &RenderRequest,
) -> Result<String, RenderError> {
    match result {
        Ok(html) => Ok(html),
        Err(RenderError::ExportFailed(reason)) => {
            warn!(%reason, "interactive export failed, using static fallback");
            scene_composer::compose_single(volume, request)
        }
        Err(other) => Err(other),
    }
}

fn recover_compare(
    result: Result<String, RenderError>,
    volume_a: &Volume,
    volume_b: &Volume,
    request: &RenderRequest,
) -> Result<String, RenderError> {
    match result {
        Ok(html) => Ok(html),
        Err(RenderError::ExportFailed(reason)) => {
            warn!(%reason, "interactive export failed, using static comparison fallback");
            scene_composer::compose_compare(volume_a, volume_b, request)
        }
        Err(other) => Err(other),
    }
}

/// Adaptive isosurface-layer count for a full volumetric render: fewer
/// layers for larger volumes to bound scene cost, more for small ones for
/// smoother depth cueing.
pub(crate) fn single_surface_count(voxel_count: usize) -> u32 {
    if voxel_count > 5_000_000 {
        10
    } else if voxel_count > 2_000_000 {
        12
    } else {
        17
    }
}

/// Reduced layer schedule when two volumes share one document.
pub(crate) fn compare_surface_count(max_voxel_count: usize) -> u32 {
    if max_voxel_count > 2_000_000 {
        8
    } else if max_voxel_count > 1_000_000 {
        10
    } else {
        12
    }
}

/// Flattened C-order coordinate mesh matching `Array3::iter` order.
fn mesh_coords(dim: (usize, usize, usize)) -> (Vec<u32>, Vec<u32>, Vec<u32>) {
    let (nx, ny, nz) = dim;
    let n = nx * ny * nz;
    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);
    let mut zs = Vec::with_capacity(n);
    for x in 0..nx {
        for y in 0..ny {
            for z in 0..nz {
                xs.push(x as u32);
                ys.push(y as u32);
                zs.push(z as u32);
            }
        }
    }
    (xs, ys, zs)
}

fn flatten(data: &Array3<f32>) -> Vec<f32> {
    data.iter().copied().collect()
}

/// Normalize into [0, 1] under the volume's own 1-99th percentile window.
fn normalized(data: &Array3<f32>) -> Array3<f32> {
    let samples = flatten(data);
    window::normalize(data, window::window(&samples))
}

fn volume_trace(normalized: &Array3<f32>, opacity: f64, scale: &str, surface_count: u32) -> Value {
    let (xs, ys, zs) = mesh_coords(normalized.dim());
    let values = flatten(normalized);
    let isomin = values.iter().copied().fold(f32::INFINITY, f32::min);
    let isomax = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    json!({
        "type": "volume",
        "x": xs,
        "y": ys,
        "z": zs,
        "value": values,
        "opacity": opacity,
        "surface_count": surface_count,
        "colorscale": scale,
        "isomin": isomin,
        "isomax": isomax,
        "caps": {"x_show": false, "y_show": false, "z_show": false},
        "hoverinfo": "skip",
    })
}

fn dark_scene_layout(title: &str) -> Value {
    json!({
        "title": title,
        "scene": {
            "xaxis": {"title": "X", "backgroundcolor": "rgb(20, 20, 20)", "gridcolor": "gray", "showbackground": true},
            "yaxis": {"title": "Y", "backgroundcolor": "rgb(20, 20, 20)", "gridcolor": "gray", "showbackground": true},
            "zaxis": {"title": "Z", "backgroundcolor": "rgb(20, 20, 20)", "gridcolor": "gray", "showbackground": true},
            "bgcolor": "rgb(10, 10, 10)",
            "camera": {"eye": {"x": 1.5, "y": 1.5, "z": 1.5}},
            "aspectmode": "data",
        },
        "paper_bgcolor": "rgb(10, 10, 10)",
        "plot_bgcolor": "rgb(10, 10, 10)",
        "font": {"color": "white"},
        "margin": {"l": 0, "r": 0, "t": 40, "b": 0},
        "height": 800,
    })
}

/// Full volumetric render: translucent volume trace over the normalized,
/// adaptively downsampled intensities.
fn volume_figure(volume: &Volume, request: &RenderRequest) -> Value {
    let requested = request.downsample_factor.unwrap_or(VOLUME_MODE_DEFAULT_FACTOR);
    let reduced = downsample::downsample_for_render(volume.data(), requested);
    let normalized = normalized(&reduced);
    let surface_count = single_surface_count(normalized.len());
    debug!(voxels = normalized.len(), surface_count, "built volumetric scene");

    json!({
        "data": [volume_trace(
            &normalized,
            request.opacity.value(),
            request.colormap.scale_name(),
            surface_count,
        )],
        "layout": dark_scene_layout("Interactive 3D Medical Volume"),
    })
}

/// Lightweight single-threshold isosurface render: a thin band around the
/// median normalized intensity with a small fixed surface count.
fn isosurface_figure(volume: &Volume, request: &RenderRequest) -> Value {
    let requested = request.downsample_factor.unwrap_or(ISOSURFACE_DEFAULT_FACTOR);
    let reduced = downsample::stride(volume.data(), requested);
    let normalized = normalized(&reduced);

    let values = flatten(&normalized);
    let threshold = window::percentile(&values, ISOSURFACE_THRESHOLD_PERCENTILE) as f64;
    let (xs, ys, zs) = mesh_coords(normalized.dim());
    debug!(threshold, voxels = values.len(), "built isosurface scene");

    json!({
        "data": [{
            "type": "isosurface",
            "x": xs,
            "y": ys,
            "z": zs,
            "value": values,
            "isomin": threshold - ISOSURFACE_BAND,
            "isomax": threshold + ISOSURFACE_BAND,
            "surface_count": ISOSURFACE_SURFACE_COUNT,
            "colorscale": request.colormap.scale_name(),
            "caps": {"x_show": false, "y_show": false, "z_show": false},
            "hoverinfo": "skip",
        }],
        "layout": dark_scene_layout("Interactive 3D Medical Volume (Isosurface)"),
    })
}

/// The three orthogonal mid-volume planes as textured surfaces at their true
/// spatial positions. Only the last (axial) trace shows the color scale so
/// the document carries a single legend.
fn slices_figure(volume: &Volume, request: &RenderRequest) -> Value {
    let normalized = normalized(volume.data());
    let (nx, ny, nz) = normalized.dim();
    let (mid_x, mid_y, mid_z) = (nx / 2, ny / 2, nz / 2);
    let scale = request.colormap.scale_name();

    // Sagittal plane: rows run along Z, columns along Y.
    let sagittal_color: Vec<Vec<f32>> = (0..nz)
        .map(|z| (0..ny).map(|y| normalized[[mid_x, y, z]]).collect())
        .collect();
    let sagittal = surface_trace(
        grid_2d(nz, ny, |_, _| mid_x as u32),
        grid_2d(nz, ny, |_, c| c as u32),
        grid_2d(nz, ny, |r, _| r as u32),
        sagittal_color,
        scale,
        "Sagittal",
        false,
    );

    // Coronal plane: rows along Z, columns along X.
    let coronal_color: Vec<Vec<f32>> = (0..nz)
        .map(|z| (0..nx).map(|x| normalized[[x, mid_y, z]]).collect())
        .collect();
    let coronal = surface_trace(
        grid_2d(nz, nx, |_, c| c as u32),
        grid_2d(nz, nx, |_, _| mid_y as u32),
        grid_2d(nz, nx, |r, _| r as u32),
        coronal_color,
        scale,
        "Coronal",
        false,
    );

    // Axial plane: rows along Y, columns along X.
    let axial_color: Vec<Vec<f32>> = (0..ny)
        .map(|y| (0..nx).map(|x| normalized[[x, y, mid_z]]).collect())
        .collect();
    let axial = surface_trace(
        grid_2d(ny, nx, |_, c| c as u32),
        grid_2d(ny, nx, |r, _| r as u32),
        grid_2d(ny, nx, |_, _| mid_z as u32),
        axial_color,
        scale,
        "Axial",
        true,
    );

    debug!(mid_x, mid_y, mid_z, "built orthogonal slices scene");
    json!({
        "data": [sagittal, coronal, axial],
        "layout": dark_scene_layout("Interactive 3D Volume with Orthogonal Slices"),
    })
}

fn grid_2d(rows: usize, cols: usize, f: impl Fn(usize, usize) -> u32) -> Vec<Vec<u32>> {
    (0..rows)
        .map(|r| (0..cols).map(|c| f(r, c)).collect())
        .collect()
}

fn surface_trace(
    x: Vec<Vec<u32>>,
    y: Vec<Vec<u32>>,
    z: Vec<Vec<u32>>,
    surfacecolor: Vec<Vec<f32>>,
    scale: &str,
    name: &str,
    showscale: bool,
) -> Value {
    json!({
        "type": "surface",
        "x": x,
        "y": y,
        "z": z,
        "surfacecolor": surfacecolor,
        "colorscale": scale,
        "showscale": showscale,
        "opacity": 0.9,
        "name": name,
        "cmin": 0.0,
        "cmax": 1.0,
        "hovertemplate": "X: %{x}<br>Y: %{y}<br>Z: %{z}<br>Value: %{surfacecolor:.3f}<extra></extra>",
    })
}

/// Two volumes as linked-camera panels in one document. One shared stride
/// factor is picked from the larger volume (both are resident at once), but
/// each volume is normalized independently.
fn compare_figure(volume_a: &Volume, volume_b: &Volume, request: &RenderRequest) -> Value {
    let max_voxels = volume_a.voxel_count().max(volume_b.voxel_count());
    let factor = downsample::compare_render_factor(
        max_voxels,
        request.downsample_factor.unwrap_or(0),
    );
    let reduced_a = downsample::stride(volume_a.data(), factor);
    let reduced_b = downsample::stride(volume_b.data(), factor);
    let normalized_a = normalized(&reduced_a);
    let normalized_b = normalized(&reduced_b);

    let surface_count = compare_surface_count(normalized_a.len().max(normalized_b.len()));
    debug!(factor, surface_count, "built comparison scene");

    let opacity = request.opacity.value();
    let scale = request.colormap.scale_name();
    let mut trace_a = volume_trace(&normalized_a, opacity, scale, surface_count);
    let mut trace_b = volume_trace(&normalized_b, opacity, scale, surface_count);
    trace_a["scene"] = json!("scene");
    trace_b["scene"] = json!("scene2");

    let panel_axis = json!({"backgroundcolor": "rgb(20, 20, 20)", "gridcolor": "gray"});
    let panel_scene = |domain: [f64; 2]| {
        json!({
            "xaxis": panel_axis,
            "yaxis": panel_axis,
            "zaxis": panel_axis,
            "bgcolor": "rgb(10, 10, 10)",
            "camera": {"eye": {"x": 1.5, "y": 1.5, "z": 1.5}},
            "domain": {"x": domain, "y": [0.0, 1.0]},
        })
    };

    json!({
        "data": [trace_a, trace_b],
        "layout": {
            "title": "Interactive 3D Volume Comparison",
            "scene": panel_scene([0.0, 0.475]),
            "scene2": panel_scene([0.525, 1.0]),
            "annotations": [
                {"text": "Volume A", "x": 0.22, "y": 1.0, "xref": "paper", "yref": "paper", "showarrow": false},
                {"text": "Volume B", "x": 0.78, "y": 1.0, "xref": "paper", "yref": "paper", "showarrow": false},
            ],
            "paper_bgcolor": "rgb(10, 10, 10)",
            "plot_bgcolor": "rgb(10, 10, 10)",
            "font": {"color": "white"},
            "height": 800,
        },
    })
}

const SCENE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>__TITLE__</title>
    <script src="https://cdn.plot.ly/plotly-2.32.0.min.js"></script>
    <style>
        body { margin: 0; background: rgb(10, 10, 10); }
        #scene { width: 100vw; height: 100vh; }
    </style>
</head>
<body>
    <div id="scene"></div>
    <script>
        const figure = __FIGURE__;
        Plotly.newPlot("scene", figure.data, figure.layout,
            {displayModeBar: true, displaylogo: false, responsive: true});
    </script>
</body>
</html>
"#;

/// Serialize a figure into the self-contained interactive document.
fn scene_to_html(figure: &Value) -> Result<String, RenderError> {
    let payload =
        serde_json::to_string(figure).map_err(|e| RenderError::ExportFailed(e.to_string()))?;
    let title = figure["layout"]["title"].as_str().unwrap_or("3D Volume");
    Ok(SCENE_TEMPLATE
        .replace("__TITLE__", title)
        .replace("__FIGURE__", &payload))
}
