//! RGB lookup for the recognized colormaps.
//!
//! Each map is a short table of anchor colors sampled by linear
//! interpolation; enough fidelity for display contrast without shipping
//! 256-entry tables per map.

use crate::enums::Colormap;

type Anchor = (f32, [u8; 3]);

const GRAY: &[Anchor] = &[(0.0, [0, 0, 0]), (1.0, [255, 255, 255])];

const BONE: &[Anchor] = &[
    (0.0, [0, 0, 1]),
    (0.375, [84, 84, 116]),
    (0.75, [167, 199, 199]),
    (1.0, [255, 255, 255]),
];

const VIRIDIS: &[Anchor] = &[
    (0.0, [68, 1, 84]),
    (0.25, [59, 82, 139]),
    (0.5, [33, 145, 140]),
    (0.75, [94, 201, 98]),
    (1.0, [253, 231, 37]),
];

const HOT: &[Anchor] = &[
    (0.0, [11, 0, 0]),
    (0.365, [255, 0, 0]),
    (0.746, [255, 255, 0]),
    (1.0, [255, 255, 255]),
];

// "cool" renders on the blues scale, light to dark.
const BLUES: &[Anchor] = &[
    (0.0, [247, 251, 255]),
    (0.5, [107, 174, 214]),
    (1.0, [8, 48, 107]),
];

const PLASMA: &[Anchor] = &[
    (0.0, [13, 8, 135]),
    (0.25, [126, 3, 168]),
    (0.5, [204, 71, 120]),
    (0.75, [248, 149, 64]),
    (1.0, [240, 249, 33]),
];

fn anchors(map: Colormap) -> &'static [Anchor] {
    match map {
        Colormap::Gray => GRAY,
        Colormap::Bone => BONE,
        Colormap::Viridis => VIRIDIS,
        Colormap::Hot => HOT,
        Colormap::Cool => BLUES,
        Colormap::Plasma => PLASMA,
    }
}

/// Map a normalized intensity in `[0, 1]` to an RGB color. Input outside the
/// range clips; non-finite input maps to the low end.
pub fn sample(map: Colormap, t: f32) -> [u8; 3] {
    let anchors = anchors(map);
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

    let mut lo = anchors[0];
    for &hi in &anchors[1..] {
        if t <= hi.0 {
            let span = hi.0 - lo.0;
            let f = if span > 0.0 { (t - lo.0) / span } else { 0.0 };
            return [
                lerp(lo.1[0], hi.1[0], f),
                lerp(lo.1[1], hi.1[1], f),
                lerp(lo.1[2], hi.1[2], f),
            ];
        }
        lo = hi;
    }
    anchors[anchors.len() - 1].1
}

#[inline]
fn lerp(a: u8, b: u8, f: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * f).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_endpoints_are_black_and_white() {
        assert_eq!(sample(Colormap::Gray, 0.0), [0, 0, 0]);
        assert_eq!(sample(Colormap::Gray, 1.0), [255, 255, 255]);
        assert_eq!(sample(Colormap::Gray, 0.5), [128, 128, 128]);
    }

    #[test]
    fn out_of_range_input_clips() {
        assert_eq!(sample(Colormap::Viridis, -2.0), [68, 1, 84]);
        assert_eq!(sample(Colormap::Viridis, 2.0), [253, 231, 37]);
        assert_eq!(sample(Colormap::Hot, f32::NAN), [11, 0, 0]);
    }

    #[test]
    fn interpolation_is_monotone_for_gray() {
        let mut prev = 0u8;
        for i in 0..=100 {
            let [r, g, b] = sample(Colormap::Gray, i as f32 / 100.0);
            assert_eq!(r, g);
            assert_eq!(g, b);
            assert!(r >= prev);
            prev = r;
        }
    }
}
