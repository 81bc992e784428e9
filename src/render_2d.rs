//! Flat raster rendering: single annotated slices, three-axis multiview with
//! crosshairs, and side-by-side comparisons. All operations return PNG bytes
//! composed on an in-memory canvas.

use crate::canvas::{CHAR_H, CHAR_W, Canvas};
use crate::colormap;
use crate::enums::{Colormap, Orientation, SliceIndex};
use crate::error::RenderError;
use crate::interpolator::Interpolator;
use crate::volume::Volume;
use crate::window;

use ndarray::Array2;
use tracing::debug;

const BACKGROUND: [u8; 3] = [255, 255, 255];
const TEXT: [u8; 3] = [20, 20, 20];
const PANEL_BORDER: [u8; 3] = [180, 180, 180];

// Crosshair colors keyed by the referenced axis.
const X_REFERENCE: [u8; 3] = [44, 160, 44]; // green
const Y_REFERENCE: [u8; 3] = [214, 39, 40]; // red
const Z_REFERENCE: [u8; 3] = [31, 119, 180]; // blue

const MARGIN: u32 = 16;
const TITLE_H: u32 = CHAR_H + 15;
const COLORBAR_W: u32 = 18;
const COLORBAR_GAP: u32 = 12;
const COLORBAR_LABEL_W: u32 = 9 * CHAR_W;

/// Largest panel edge for a single-slice render.
const PANEL_MAX_SINGLE: u32 = 512;
/// Largest panel edge per multiview/compare panel.
const PANEL_MAX_MULTI: u32 = 320;
const PANEL_MAX_COMPARE: u32 = 420;

/// Render one slice as an annotated image: title, no axis ticks, colorbar.
/// The window is computed over this slice's own percentiles, not the whole
/// volume (an intentional asymmetry against the multiview below). A missing
/// index defaults to the mid-slice; any index clamps.
pub fn render_slice(
    volume: &Volume,
    orientation: Orientation,
    index: Option<i64>,
    colormap: Colormap,
) -> Result<Vec<u8>, RenderError> {
    let extent = volume.extent(orientation);
    let index = match index {
        Some(raw) => SliceIndex(raw).clamp(extent),
        None => volume.mid_index(orientation),
    };
    let slice = volume.extract(orientation, index as i64);
    let samples: Vec<f32> = slice.iter().copied().collect();
    let win = window::window(&samples);

    let (pw, ph) = panel_size(&slice, PANEL_MAX_SINGLE);
    let width = MARGIN + pw + COLORBAR_GAP + COLORBAR_W + COLORBAR_LABEL_W + MARGIN;
    let height = TITLE_H + ph + MARGIN;

    let mut canvas = Canvas::new(width, height, BACKGROUND);
    let title = format!(
        "{} - Slice {}/{}",
        orientation.label(),
        index,
        extent.saturating_sub(1)
    );
    canvas.draw_text(MARGIN, (TITLE_H - CHAR_H) / 2, &title, TEXT);

    // Single-slice panels render with the origin at the lower-left.
    draw_slice_panel(&mut canvas, MARGIN, TITLE_H, pw, ph, &slice, win, colormap, true);
    draw_colorbar(
        &mut canvas,
        MARGIN + pw + COLORBAR_GAP,
        TITLE_H,
        ph,
        win,
        colormap,
    );

    debug!(?orientation, index, "rendered single slice");
    Ok(canvas.encode_png()?)
}

/// Render sagittal, coronal and axial panels side by side, sharing one
/// window computed over the entire volume, with dashed crosshairs marking
/// the other two panels' indices (green = X, red = Y, blue = Z).
pub fn render_multiview(
    volume: &Volume,
    slice_x: Option<i64>,
    slice_y: Option<i64>,
    slice_z: Option<i64>,
    colormap: Colormap,
) -> Result<Vec<u8>, RenderError> {
    let sx = clamp_or_mid(volume, Orientation::Sagittal, slice_x);
    let sy = clamp_or_mid(volume, Orientation::Coronal, slice_y);
    let sz = clamp_or_mid(volume, Orientation::Axial, slice_z);

    let samples: Vec<f32> = volume.data().iter().copied().collect();
    let win = window::window(&samples);

    let slices = [
        volume.extract(Orientation::Sagittal, sx as i64),
        volume.extract(Orientation::Coronal, sy as i64),
        volume.extract(Orientation::Axial, sz as i64),
    ];
    let titles = [
        format!("Sagittal (X={sx})"),
        format!("Coronal (Y={sy})"),
        format!("Axial (Z={sz})"),
    ];
    // (horizontal line row, color), (vertical line column, color) per panel,
    // in the displayed (possibly transposed) coordinates.
    let crosshairs = [
        ((sz, Z_REFERENCE), (sy, Y_REFERENCE)),
        ((sz, Z_REFERENCE), (sx, X_REFERENCE)),
        ((sx, X_REFERENCE), (sy, Y_REFERENCE)),
    ];

    let sizes: Vec<(u32, u32)> = slices
        .iter()
        .map(|s| panel_size(s, PANEL_MAX_MULTI))
        .collect();
    let total_w: u32 =
        MARGIN + sizes.iter().map(|(w, _)| w + MARGIN).sum::<u32>();
    let max_h = sizes.iter().map(|&(_, h)| h).max().unwrap_or(0);
    let height = TITLE_H + max_h + MARGIN;

    let mut canvas = Canvas::new(total_w, height, BACKGROUND);
    let mut ox = MARGIN;
    for ((slice, title), (&(pw, ph), &((hrow, hcolor), (vcol, vcolor)))) in slices
        .iter()
        .zip(titles.iter())
        .zip(sizes.iter().zip(crosshairs.iter()))
    {
        canvas.draw_text(ox, (TITLE_H - CHAR_H) / 2, title, TEXT);
        draw_slice_panel(&mut canvas, ox, TITLE_H, pw, ph, slice, win, colormap, false);

        let (rows, cols) = slice.dim();
        let py = TITLE_H + to_panel_coord(hrow, rows, ph);
        canvas.dashed_hline(ox, py, pw, hcolor);
        let px = ox + to_panel_coord(vcol, cols, pw);
        canvas.dashed_vline(px, TITLE_H, ph, vcolor);

        ox += pw + MARGIN;
    }

    debug!(sx, sy, sz, "rendered multiview");
    Ok(canvas.encode_png()?)
}

/// Render the same slice index from two volumes side by side with one shared
/// percentile window and one shared colorbar. The index clamps to the
/// smaller of the two extents so both panels always show a valid plane.
pub fn render_compare_slices(
    volume_a: &Volume,
    volume_b: &Volume,
    orientation: Orientation,
    index: Option<i64>,
    colormap: Colormap,
) -> Result<Vec<u8>, RenderError> {
    let extent = volume_a
        .extent(orientation)
        .min(volume_b.extent(orientation));
    let index = match index {
        Some(raw) => SliceIndex(raw).clamp(extent),
        None => extent.saturating_sub(1) / 2,
    };

    let slice_a = volume_a.extract(orientation, index as i64);
    let slice_b = volume_b.extract(orientation, index as i64);

    let samples_a: Vec<f32> = slice_a.iter().copied().collect();
    let samples_b: Vec<f32> = slice_b.iter().copied().collect();
    // One window over the union of both slices, so the panels share a
    // contrast scale and remain visually comparable.
    let (win, _) = window::window_pair(&samples_a, &samples_b, true);

    let (wa, ha) = panel_size(&slice_a, PANEL_MAX_COMPARE);
    let (wb, hb) = panel_size(&slice_b, PANEL_MAX_COMPARE);
    let panel_h = ha.max(hb);
    let width =
        MARGIN + wa + MARGIN + wb + COLORBAR_GAP + COLORBAR_W + COLORBAR_LABEL_W + MARGIN;
    let height = TITLE_H + panel_h + MARGIN;

    let mut canvas = Canvas::new(width, height, BACKGROUND);
    canvas.draw_text(
        MARGIN,
        (TITLE_H - CHAR_H) / 2,
        &format!("Volume A - Slice {index}"),
        TEXT,
    );
    canvas.draw_text(
        MARGIN + wa + MARGIN,
        (TITLE_H - CHAR_H) / 2,
        &format!("Volume B - Slice {index}"),
        TEXT,
    );

    draw_slice_panel(&mut canvas, MARGIN, TITLE_H, wa, ha, &slice_a, win, colormap, false);
    draw_slice_panel(
        &mut canvas,
        MARGIN + wa + MARGIN,
        TITLE_H,
        wb,
        hb,
        &slice_b,
        win,
        colormap,
        false,
    );
    draw_colorbar(
        &mut canvas,
        MARGIN + wa + MARGIN + wb + COLORBAR_GAP,
        TITLE_H,
        panel_h,
        win,
        colormap,
    );

    debug!(?orientation, index, "rendered comparison slices");
    Ok(canvas.encode_png()?)
}

fn clamp_or_mid(volume: &Volume, orientation: Orientation, index: Option<i64>) -> usize {
    match index {
        Some(raw) => volume.clamp_index(raw, orientation),
        None => volume.mid_index(orientation),
    }
}

/// Panel pixel size preserving the slice aspect ratio, with the largest
/// edge never exceeding `max_edge`: small slices magnify by an integer
/// factor, oversize slices downscale fractionally to fit.
fn panel_size(slice: &Array2<f32>, max_edge: u32) -> (u32, u32) {
    let (rows, cols) = slice.dim();
    let longest = rows.max(cols).max(1) as u32;
    if longest > max_edge {
        return (
            (cols as u32 * max_edge / longest).max(1),
            (rows as u32 * max_edge / longest).max(1),
        );
    }
    let scale = (max_edge / longest).max(1);
    (cols as u32 * scale, rows as u32 * scale)
}

/// Map a slice coordinate to the center of its scaled panel pixel run.
fn to_panel_coord(index: usize, extent: usize, panel_edge: u32) -> u32 {
    if extent == 0 {
        return 0;
    }
    ((index as f32 + 0.5) * panel_edge as f32 / extent as f32) as u32
}

/// Resample a slice into a panel rectangle with bilinear interpolation,
/// window-normalize each sample and color it through the map.
#[allow(clippy::too_many_arguments)]
fn draw_slice_panel(
    canvas: &mut Canvas,
    ox: u32,
    oy: u32,
    pw: u32,
    ph: u32,
    slice: &Array2<f32>,
    win: (f32, f32),
    colormap: Colormap,
    flip_vertical: bool,
) {
    let (rows, cols) = slice.dim();
    if rows == 0 || cols == 0 {
        return;
    }
    let view = slice.view();

    for py in 0..ph {
        let row_pos = if flip_vertical { ph - 1 - py } else { py };
        for px in 0..pw {
            let value = Interpolator::bilinear_resample(&view, row_pos, px, ph, pw);
            let color = colormap::sample(colormap, window::normalize_value(value, win));
            canvas.set_pixel(ox + px, oy + py, color);
        }
    }

    // Thin border so panels read as separate images on the white page.
    canvas.hline(ox, oy, pw, PANEL_BORDER);
    canvas.hline(ox, oy + ph - 1, pw, PANEL_BORDER);
    canvas.vline(ox, oy, ph, PANEL_BORDER);
    canvas.vline(ox + pw - 1, oy, ph, PANEL_BORDER);
}

/// Vertical gradient bar with the window's bounds as labels; the top of the
/// bar is the upper bound.
fn draw_colorbar(
    canvas: &mut Canvas,
    x: u32,
    y: u32,
    h: u32,
    win: (f32, f32),
    colormap: Colormap,
) {
    for dy in 0..h {
        let t = 1.0 - dy as f32 / (h.saturating_sub(1)).max(1) as f32;
        let color = colormap::sample(colormap, t);
        canvas.hline(x, y + dy, COLORBAR_W, color);
    }
    canvas.vline(x, y, h, PANEL_BORDER);
    canvas.vline(x + COLORBAR_W - 1, y, h, PANEL_BORDER);

    let label_x = x + COLORBAR_W + CHAR_W / 2;
    canvas.draw_text(label_x, y, &format_bound(win.1), TEXT);
    canvas.draw_text(label_x, y + h - CHAR_H, &format_bound(win.0), TEXT);
}

fn format_bound(v: f32) -> String {
    if v.abs() >= 10_000.0 {
        format!("{v:.2e}")
    } else {
        format!("{v:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::VolumeFormat;
    use ndarray::Array3;

    fn volume_from(data: Array3<f32>) -> Volume {
        Volume::new(data, (1.0, 1.0, 1.0), VolumeFormat::Numpy, "float32".into())
    }

    /// 64^3 volume, zero everywhere except an 8^3 cube of 1000 centered at
    /// (32, 32, 32).
    fn cube_volume() -> Volume {
        let data = Array3::from_shape_fn((64, 64, 64), |(x, y, z)| {
            let inside = |v: usize| (28..36).contains(&v);
            if inside(x) && inside(y) && inside(z) { 1000.0 } else { 0.0 }
        });
        volume_from(data)
    }

    fn pixel(png: &[u8], x: u32, y: u32) -> [u8; 3] {
        let img = image::load_from_memory(png).unwrap().to_rgb8();
        img.get_pixel(x, y).0
    }

    #[test]
    fn axial_cube_slice_renders_bright_center() {
        let volume = cube_volume();
        // The extracted axial plane is square and untransposed.
        assert_eq!(volume.extract(Orientation::Axial, 32).dim(), (64, 64));

        let png = render_slice(&volume, Orientation::Axial, Some(32), Colormap::Gray).unwrap();

        // 64 -> scale 8 -> 512px panel at (MARGIN, TITLE_H).
        let center = pixel(&png, MARGIN + 256, TITLE_H + 256);
        let dark = pixel(&png, MARGIN + 20, TITLE_H + 20);
        // The cube occupies >1% of the slice, so the 99th percentile window
        // maps it to full intensity and the background to zero.
        assert!(center[0] > 240, "cube region should be near white: {center:?}");
        assert!(dark[0] < 15, "background should be near black: {dark:?}");
    }

    #[test]
    fn render_slice_defaults_to_mid_and_clamps() {
        let volume = cube_volume();
        // None, out-of-range and exact mid must all produce valid PNGs.
        for index in [None, Some(-50), Some(5_000), Some(32)] {
            let png = render_slice(&volume, Orientation::Coronal, index, Colormap::Viridis)
                .unwrap();
            assert!(image::load_from_memory(&png).is_ok());
        }
    }

    #[test]
    fn zero_extent_volume_renders_without_panicking() {
        let volume = volume_from(Array3::zeros((0, 5, 5)));
        for orientation in [Orientation::Sagittal, Orientation::Coronal, Orientation::Axial] {
            let png = render_slice(&volume, orientation, Some(0), Colormap::Gray).unwrap();
            assert!(image::load_from_memory(&png).is_ok());
        }
    }

    #[test]
    fn multiview_lays_out_three_panels() {
        let volume = cube_volume();
        let png = render_multiview(&volume, None, None, None, Colormap::Gray).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        // Three 320px panels plus margins.
        assert_eq!(img.width(), MARGIN + 3 * (320 + MARGIN));
        assert_eq!(img.height(), TITLE_H + 320 + MARGIN);
    }

    #[test]
    fn panel_size_never_exceeds_the_max_edge() {
        // Small slices magnify by an integer factor.
        assert_eq!(panel_size(&Array2::zeros((64, 64)), 512), (512, 512));
        assert_eq!(panel_size(&Array2::zeros((16, 16)), 420), (416, 416));
        // Oversize slices downscale fractionally instead of rendering 1:1.
        assert_eq!(panel_size(&Array2::zeros((1024, 1024)), 512), (512, 512));
        assert_eq!(panel_size(&Array2::zeros((1024, 256)), 512), (128, 512));
        assert_eq!(panel_size(&Array2::zeros((600, 800)), 512), (512, 384));
    }

    #[test]
    fn compare_uses_a_shared_window() {
        // A is uniformly 0, B uniformly 1000. Under a shared window B maps
        // to the top of the scale; under independent windows both panels
        // would collapse to the bottom.
        let a = volume_from(Array3::zeros((16, 16, 16)));
        let b = volume_from(Array3::from_elem((16, 16, 16), 1000.0));
        let png =
            render_compare_slices(&a, &b, Orientation::Axial, Some(8), Colormap::Gray).unwrap();

        // 16 -> scale 26 -> 416px panels.
        let (wa, _) = (416u32, 416u32);
        let panel_a = pixel(&png, MARGIN + 200, TITLE_H + 200);
        let panel_b = pixel(&png, MARGIN + wa + MARGIN + 200, TITLE_H + 200);
        assert!(panel_a[0] < 15, "panel A should be dark: {panel_a:?}");
        assert!(panel_b[0] > 240, "panel B should be bright: {panel_b:?}");
    }

    #[test]
    fn compare_clamps_to_smaller_extent() {
        let a = volume_from(Array3::zeros((16, 16, 16)));
        let b = volume_from(Array3::zeros((8, 8, 8)));
        // Index beyond B's extent clamps to the shared maximum (7).
        let png =
            render_compare_slices(&a, &b, Orientation::Axial, Some(15), Colormap::Gray).unwrap();
        assert!(image::load_from_memory(&png).is_ok());
    }
}
