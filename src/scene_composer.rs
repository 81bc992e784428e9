//! Static multi-angle fallback documents.
//!
//! When the interactive 3D backend cannot be used, the volume is rendered
//! offline as six maximum-intensity projections around a fixed base camera
//! and packed into one self-contained HTML page (images inlined as base64
//! data URIs, no external assets). Navigation between angles is plain
//! client-side JS: buttons plus left/right arrow keys.

use crate::canvas::Canvas;
use crate::colormap;
use crate::downsample;
use crate::enums::{Colormap, RenderRequest};
use crate::error::RenderError;
use crate::interpolator::Interpolator;
use crate::volume::Volume;
use crate::window;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use ndarray::{Array3, ArrayView3};
use rayon::prelude::*;
use tracing::debug;

/// Base camera orientation, in degrees.
const BASE_ELEVATION: f32 = 30.0;
const BASE_AZIMUTH: f32 = 45.0;

/// The six captured viewpoints as (label, elevation offset, azimuth offset)
/// from the base camera.
const ANGLES: [(&str, f32, f32); 6] = [
    ("Front", 0.0, 0.0),
    ("Right", 0.0, 90.0),
    ("Top", 90.0, 0.0),
    ("Left", 0.0, -90.0),
    ("Bottom", -90.0, 0.0),
    ("Back", 0.0, 180.0),
];

const IMAGE_SIZE: u32 = 320;
const FALLBACK_DEFAULT_FACTOR: usize = 2;

const DARK_BACKGROUND: [u8; 3] = [26, 26, 26];
const LABEL_COLOR: [u8; 3] = [220, 220, 220];

/// Render one volume into the static six-angle document.
pub fn compose_single(volume: &Volume, request: &RenderRequest) -> Result<String, RenderError> {
    let requested = request.downsample_factor.unwrap_or(FALLBACK_DEFAULT_FACTOR);
    let reduced = downsample::downsample_for_render(volume.data(), requested);
    let samples: Vec<f32> = reduced.iter().copied().collect();
    let normalized = window::normalize(&reduced, window::window(&samples));

    let mut views = String::new();
    let mut buttons = String::new();
    for (i, &(label, d_elev, d_az)) in ANGLES.iter().enumerate() {
        let canvas = render_projection(
            &normalized,
            request.colormap,
            BASE_ELEVATION + d_elev,
            BASE_AZIMUTH + d_az,
            label,
        );
        let encoded = BASE64.encode(canvas.encode_png()?);
        if i > 0 {
            views.push_str(",\n            ");
        }
        views.push_str(&format!(
            "{{name: \"{label}\", src: \"data:image/png;base64,{encoded}\"}}"
        ));
        buttons.push_str(&format!(
            "<button id=\"btn{i}\" onclick=\"show({i})\">{label}</button>\n        "
        ));
    }
    debug!(voxels = normalized.len(), "composed static fallback document");

    Ok(FALLBACK_TEMPLATE
        .replace("__BUTTONS__", buttons.trim_end())
        .replace("__VIEWS__", &views))
}

/// Render two volumes into one document by nesting each volume's own static
/// document in an iframe via `srcdoc`.
pub fn compose_compare(
    volume_a: &Volume,
    volume_b: &Volume,
    request: &RenderRequest,
) -> Result<String, RenderError> {
    let doc_a = compose_single(volume_a, request)?;
    let doc_b = compose_single(volume_b, request)?;
    Ok(COMPARE_TEMPLATE
        .replace("__PANEL_A__", &escape_srcdoc(&doc_a))
        .replace("__PANEL_B__", &escape_srcdoc(&doc_b)))
}

/// `srcdoc` attributes here are single-quoted, so only embedded single
/// quotes need escaping.
fn escape_srcdoc(doc: &str) -> String {
    doc.replace('\'', "&#39;")
}

/// Maximum-intensity projection of a normalized volume from one camera
/// angle. Rays march front to back at one-voxel steps with trilinear
/// sampling; pixels whose rays miss the volume keep the page background.
pub(crate) fn render_projection(
    normalized: &Array3<f32>,
    map: Colormap,
    elev_deg: f32,
    az_deg: f32,
    label: &str,
) -> Canvas {
    let view = normalized.view();
    let (nx, ny, nz) = view.dim();
    let center = [
        (nx - 1) as f32 / 2.0,
        (ny - 1) as f32 / 2.0,
        (nz - 1) as f32 / 2.0,
    ];
    let radius = 0.5
        * (((nx * nx + ny * ny + nz * nz) as f32).sqrt()).max(2.0);

    let elev = elev_deg.to_radians();
    let az = az_deg.to_radians();
    let eye_dir = [elev.cos() * az.cos(), elev.cos() * az.sin(), elev.sin()];
    let forward = scale(eye_dir, -1.0);
    let mut right = cross(forward, [0.0, 0.0, 1.0]);
    if norm(right) < 1e-6 {
        right = [1.0, 0.0, 0.0];
    }
    let right = normalize(right);
    let up = normalize(cross(right, forward));

    // Frame spans the bounding sphere with a small margin.
    let span = 2.2 * radius;
    let steps = (2.0 * radius).ceil() as usize;

    let size = IMAGE_SIZE;
    let rows: Vec<Vec<[u8; 3]>> = (0..size)
        .into_par_iter()
        .map(|py| {
            let mut row = Vec::with_capacity(size as usize);
            let v = 0.5 - (py as f32 + 0.5) / size as f32;
            for px in 0..size {
                let u = (px as f32 + 0.5) / size as f32 - 0.5;
                let start = add(
                    add(center, scale(right, u * span)),
                    add(scale(up, v * span), scale(forward, -radius)),
                );
                row.push(cast_ray(&view, start, forward, steps, map));
            }
            row
        })
        .collect();

    let mut canvas = Canvas::new(size, size, DARK_BACKGROUND);
    for (py, row) in rows.iter().enumerate() {
        for (px, &color) in row.iter().enumerate() {
            canvas.set_pixel(px as u32, py as u32, color);
        }
    }
    canvas.draw_text(8, 8, label, LABEL_COLOR);
    canvas
}

fn cast_ray(
    view: &ArrayView3<f32>,
    start: [f32; 3],
    forward: [f32; 3],
    steps: usize,
    map: Colormap,
) -> [u8; 3] {
    let mut max: Option<f32> = None;
    for t in 0..=steps {
        let p = add(start, scale(forward, t as f32));
        if let Some(sample) = Interpolator::trilinear_interpolate(view, p[0], p[1], p[2]) {
            max = Some(max.map_or(sample, |m| m.max(sample)));
        }
    }
    match max {
        Some(intensity) => colormap::sample(map, intensity),
        None => DARK_BACKGROUND,
    }
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(a: [f32; 3]) -> f32 {
    (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt()
}

fn normalize(a: [f32; 3]) -> [f32; 3] {
    scale(a, 1.0 / norm(a))
}

fn scale(a: [f32; 3], s: f32) -> [f32; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

fn add(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

const FALLBACK_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>3D Volume Preview (Static)</title>
    <style>
        body { margin: 0; background: rgb(26, 26, 26); color: #ddd;
               font-family: sans-serif; text-align: center; }
        img { margin-top: 12px; border: 1px solid #444; }
        button { background: #333; color: #ddd; border: 1px solid #555;
                 padding: 6px 14px; margin: 2px; cursor: pointer; }
        button.active { background: #1f77b4; }
        .hint { color: #888; font-size: 0.85em; }
    </style>
</head>
<body>
    <h3>3D Volume Preview</h3>
    <p class="hint">Interactive rendering isn't available; showing pre-rendered views.
       Use the buttons or the left/right arrow keys.</p>
    <div>
        __BUTTONS__
    </div>
    <div><img id="view" alt="volume projection"></div>
    <p id="label"></p>
    <script>
        const views = [
            __VIEWS__
        ];
        let current = 0;
        function show(i) {
            current = ((i % views.length) + views.length) % views.length;
            document.getElementById("view").src = views[current].src;
            document.getElementById("label").textContent = views[current].name;
            for (let b = 0; b < views.length; b++) {
                document.getElementById("btn" + b)
                    .classList.toggle("active", b === current);
            }
        }
        document.addEventListener("keydown", (e) => {
            if (e.key === "ArrowRight") show(current + 1);
            if (e.key === "ArrowLeft") show(current - 1);
        });
        show(0);
    </script>
</body>
</html>
"#;

const COMPARE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>3D Volume Comparison (Static)</title>
    <style>
        body { margin: 0; background: rgb(26, 26, 26); color: #ddd;
               font-family: sans-serif; }
        .panels { display: flex; }
        .panel { flex: 1; }
        .panel h3 { text-align: center; }
        iframe { width: 100%; height: 90vh; border: none; }
    </style>
</head>
<body>
    <div class="panels">
        <div class="panel">
            <h3>Volume A</h3>
            <iframe srcdoc='__PANEL_A__'></iframe>
        </div>
        <div class="panel">
            <h3>Volume B</h3>
            <iframe srcdoc='__PANEL_B__'></iframe>
        </div>
    </div>
</body>
</html>
"#;
