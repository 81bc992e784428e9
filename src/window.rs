//! Percentile-based intensity windowing shared by every renderer.
//!
//! All display contrast in this crate comes from the same 1st/99th
//! percentile window so that renderings of the same intensity distribution
//! are visually comparable.

use ndarray::Array3;

/// Lower/upper display percentiles.
const LOW_PERCENTILE: f64 = 1.0;
const HIGH_PERCENTILE: f64 = 99.0;

/// Guards the divide when a window is degenerate (constant data).
const NORMALIZE_EPSILON: f32 = 1e-8;

/// Compute the display window `(vmin, vmax)` as the 1st and 99th percentile
/// of `samples`. Non-finite samples are ignored. An empty sample set yields
/// the degenerate default `(0.0, 1.0)`.
pub fn window(samples: &[f32]) -> (f32, f32) {
    let mut sorted: Vec<f32> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return (0.0, 1.0);
    }
    sorted.sort_unstable_by(f32::total_cmp);
    (
        percentile_sorted(&sorted, LOW_PERCENTILE),
        percentile_sorted(&sorted, HIGH_PERCENTILE),
    )
}

/// Window two sample sets with an explicit sharing policy.
///
/// With `shared = true` one window is computed over the concatenation of
/// both sets and returned for both sides, so that two panels rendered from
/// these windows use one contrast scale. With `shared = false` each side is
/// windowed alone.
pub fn window_pair(a: &[f32], b: &[f32], shared: bool) -> ((f32, f32), (f32, f32)) {
    if shared {
        let mut combined = Vec::with_capacity(a.len() + b.len());
        combined.extend_from_slice(a);
        combined.extend_from_slice(b);
        let w = window(&combined);
        (w, w)
    } else {
        (window(a), window(b))
    }
}

/// Linearly interpolated percentile of an ascending-sorted, finite, non-empty
/// slice, matching the numpy convention: rank `p/100 * (n - 1)`.
fn percentile_sorted(sorted: &[f32], p: f64) -> f32 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let t = (rank - lo as f64) as f32;
    sorted[lo] + (sorted[hi] - sorted[lo]) * t
}

/// Percentile of an arbitrary sample set (sorts a filtered copy). Empty or
/// all-non-finite input yields 0.
pub fn percentile(samples: &[f32], p: f64) -> f32 {
    let mut sorted: Vec<f32> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_unstable_by(f32::total_cmp);
    percentile_sorted(&sorted, p)
}

/// Map a raw intensity into `[0, 1]` under the given window. Values outside
/// the window clip; non-finite values map to 0.
#[inline]
pub fn normalize_value(value: f32, (vmin, vmax): (f32, f32)) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    ((value - vmin) / (vmax - vmin + NORMALIZE_EPSILON)).clamp(0.0, 1.0)
}

/// Normalize a whole volume into `[0, 1]` under `window`.
pub fn normalize(data: &Array3<f32>, window: (f32, f32)) -> Array3<f32> {
    data.mapv(|v| normalize_value(v, window))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn empty_samples_default_to_unit_window() {
        assert_eq!(window(&[]), (0.0, 1.0));
        assert_eq!(window(&[f32::NAN, f32::INFINITY]), (0.0, 1.0));
    }

    #[test]
    fn constant_samples_collapse_the_window() {
        let samples = vec![7.5f32; 100];
        assert_eq!(window(&samples), (7.5, 7.5));
    }

    #[test]
    fn window_is_ordered_and_clips_outliers() {
        let mut samples: Vec<f32> = (0..1000).map(|i| i as f32).collect();
        samples.push(1e9);
        let (lo, hi) = window(&samples);
        assert!(lo <= hi);
        assert!(lo >= 0.0);
        // The single extreme outlier sits above the 99th percentile.
        assert!(hi < 1e9);
    }

    #[test]
    fn shared_window_equals_window_of_concatenation() {
        // Two disjoint intensity ranges: independent windows differ from the
        // shared one, which must equal window(concat(a, b)).
        let a: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let b: Vec<f32> = (0..100).map(|i| 1000.0 + i as f32).collect();

        let (shared_a, shared_b) = window_pair(&a, &b, true);
        assert_eq!(shared_a, shared_b);

        let mut combined = a.clone();
        combined.extend_from_slice(&b);
        assert_eq!(shared_a, window(&combined));

        let (indep_a, indep_b) = window_pair(&a, &b, false);
        assert_ne!(indep_a, shared_a);
        assert_ne!(indep_b, shared_b);
        assert!(indep_a.1 < indep_b.0);
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let samples = [0.0f32, 10.0];
        assert_eq!(percentile(&samples, 50.0), 5.0);
        assert_eq!(percentile(&samples, 0.0), 0.0);
        assert_eq!(percentile(&samples, 100.0), 10.0);
    }

    #[test]
    fn normalize_clips_and_scrubs_non_finite() {
        let data = Array3::from_shape_vec(
            (1, 1, 4),
            vec![-10.0f32, 5.0, 20.0, f32::NAN],
        )
        .unwrap();
        let normed = normalize(&data, (0.0, 10.0));
        assert_eq!(normed[[0, 0, 0]], 0.0);
        assert!((normed[[0, 0, 1]] - 0.5).abs() < 1e-4);
        assert_eq!(normed[[0, 0, 2]], 1.0);
        assert_eq!(normed[[0, 0, 3]], 0.0);
    }
}
