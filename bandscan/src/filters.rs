//! 1-D Gaussian filters and image rescaling used ahead of step detection.
//!
//! Borders are handled by symmetric reflection about the edge
//! (`d c b a | a b c d | d c b a`), so a sample at index `-1` reads index `0`.

use ndarray::{Array3, ArrayView3, Axis};

/// Samples of the truncated Gaussian and its first derivative.
///
/// Conventions:
/// - `radius = round(truncate * sigma)`, minimum 1, with `truncate = 4`.
/// - `g` is normalized so that `sum(g) == 1`.
/// - `dg[i] = (x / sigma^2) * g[i]` for `x = i - radius`, applied as a
///   correlation so that an increasing signal produces a positive response.
#[derive(Debug, Clone)]
pub struct GaussianDerivative {
    pub sigma: f64,
    pub radius: usize,
    pub g: Vec<f64>,
    pub dg: Vec<f64>,
}

const TRUNCATE: f64 = 4.0;

/// Smallest accepted rescale factor. Shrinking further would need an
/// anti-alias kernel wider than any realistic region.
pub const MIN_RESCALE_FACTOR: f64 = 0.05;

impl GaussianDerivative {
    /// # Panics
    /// If `sigma` is not finite and positive.
    pub fn new(sigma: f64) -> Self {
        assert!(
            sigma.is_finite() && sigma > 0.0,
            "sigma must be > 0 and finite"
        );

        let radius = ((TRUNCATE * sigma).round() as usize).max(1);
        let len = 2 * radius + 1;
        let sigma2 = sigma * sigma;

        let mut g: Vec<f64> = (0..len)
            .map(|i| {
                let x = i as f64 - radius as f64;
                (-(x * x) / (2.0 * sigma2)).exp()
            })
            .collect();
        let sum_g: f64 = g.iter().sum();
        for gi in &mut g {
            *gi /= sum_g;
        }

        let dg = g
            .iter()
            .enumerate()
            .map(|(i, gi)| {
                let x = i as f64 - radius as f64;
                (x / sigma2) * gi
            })
            .collect();

        Self {
            sigma,
            radius,
            g,
            dg,
        }
    }

    /// Smoothed first derivative of `signal`
    pub fn derivative(&self, signal: &[f64]) -> Vec<f64> {
        correlate_reflect(signal, &self.dg, self.radius)
    }

    /// Gaussian-smoothed copy of `signal`
    pub fn smooth(&self, signal: &[f64]) -> Vec<f64> {
        correlate_reflect(signal, &self.g, self.radius)
    }
}

/// Smoothed first derivative of `signal` with a Gaussian of width `sigma`
pub fn gaussian_derivative(signal: &[f64], sigma: f64) -> Vec<f64> {
    GaussianDerivative::new(sigma).derivative(signal)
}

/// Map an out-of-range index back into `0..n` by symmetric reflection.
fn reflect_index(i: isize, n: usize) -> usize {
    let n = n as isize;
    let period = 2 * n;
    let m = i.rem_euclid(period);
    if m < n {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

fn correlate_reflect(signal: &[f64], kernel: &[f64], radius: usize) -> Vec<f64> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    (0..n)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, &kv)| {
                    let idx = reflect_index(i as isize + k as isize - radius as isize, n);
                    kv * signal[idx]
                })
                .sum()
        })
        .collect()
}

/// Bilinearly resample the two spatial axes of a (rows, cols, channels) array.
///
/// Output shape is `round(rows * factor) x round(cols * factor)` (at least 1).
/// Pixel centres are aligned, so the first and last output samples sit half
/// an output pixel inside the input extent. When shrinking, each axis is first
/// smoothed with a Gaussian of `sigma = (1/factor - 1) / 2` to avoid aliasing.
///
/// # Panics
/// If `factor` is not finite or is below [`MIN_RESCALE_FACTOR`].
pub fn rescale_bilinear(data: ArrayView3<f64>, factor: f64) -> Array3<f64> {
    assert!(
        factor.is_finite() && factor >= MIN_RESCALE_FACTOR,
        "rescale factor must be finite and at least {MIN_RESCALE_FACTOR}"
    );

    let (rows, cols, channels) = data.dim();
    let source = if factor < 1.0 {
        let sigma = (1.0 / factor - 1.0) / 2.0;
        smooth_spatial(data, sigma)
    } else {
        data.to_owned()
    };

    let out_rows = ((rows as f64 * factor).round() as usize).max(1);
    let out_cols = ((cols as f64 * factor).round() as usize).max(1);
    let row_scale = rows as f64 / out_rows as f64;
    let col_scale = cols as f64 / out_cols as f64;

    let row_taps: Vec<(usize, usize, f64)> = (0..out_rows)
        .map(|o| linear_taps(o, row_scale, rows))
        .collect();
    let col_taps: Vec<(usize, usize, f64)> = (0..out_cols)
        .map(|o| linear_taps(o, col_scale, cols))
        .collect();

    Array3::from_shape_fn((out_rows, out_cols, channels), |(r, c, ch)| {
        let (r0, r1, tr) = row_taps[r];
        let (c0, c1, tc) = col_taps[c];
        let top = source[[r0, c0, ch]] * (1.0 - tc) + source[[r0, c1, ch]] * tc;
        let bottom = source[[r1, c0, ch]] * (1.0 - tc) + source[[r1, c1, ch]] * tc;
        top * (1.0 - tr) + bottom * tr
    })
}

/// Neighbouring input indices and interpolation weight for one output sample.
fn linear_taps(out_index: usize, scale: f64, len: usize) -> (usize, usize, f64) {
    let src = ((out_index as f64 + 0.5) * scale - 0.5).clamp(0.0, (len - 1) as f64);
    let i0 = src.floor() as usize;
    let i1 = (i0 + 1).min(len - 1);
    (i0, i1, src - i0 as f64)
}

fn smooth_spatial(data: ArrayView3<f64>, sigma: f64) -> Array3<f64> {
    let filter = GaussianDerivative::new(sigma);
    let mut out = data.to_owned();

    for axis in [Axis(0), Axis(1)] {
        for mut lane in out.lanes_mut(axis) {
            let smoothed = filter.smooth(&lane.to_vec());
            for (dst, src) in lane.iter_mut().zip(smoothed) {
                *dst = src;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_kernel_properties() {
        let k = GaussianDerivative::new(3.0);
        assert_eq!(k.radius, 12);
        assert_eq!(k.g.len(), 25);

        let sum_g: f64 = k.g.iter().sum();
        assert_abs_diff_eq!(sum_g, 1.0, epsilon = 1e-12);

        let sum_dg: f64 = k.dg.iter().sum();
        assert_abs_diff_eq!(sum_dg, 0.0, epsilon = 1e-12);

        for i in 1..=k.radius {
            assert_abs_diff_eq!(k.dg[k.radius + i], -k.dg[k.radius - i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_reflect_index() {
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(5, 4), 2);
        assert_eq!(reflect_index(2, 4), 2);
        // Overshoot longer than the signal wraps around again
        assert_eq!(reflect_index(9, 4), 1);
    }

    #[test]
    fn test_derivative_of_ramp_is_slope() {
        let ramp: Vec<f64> = (0..100).map(|i| 2.0 * i as f64).collect();
        let d = gaussian_derivative(&ramp, 3.0);
        for &v in &d[20..80] {
            assert_abs_diff_eq!(v, 2.0, epsilon = 1e-2);
        }
    }

    #[test]
    fn test_derivative_of_constant_is_zero() {
        let flat = vec![0.7; 50];
        for v in gaussian_derivative(&flat, 3.0) {
            assert_abs_diff_eq!(v, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_step_response_peaks_at_edge() {
        let signal: Vec<f64> = (0..80).map(|i| if i < 40 { 0.0 } else { 1.0 }).collect();
        let d = gaussian_derivative(&signal, 3.0);

        let (peak, _) = d
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        assert!(peak == 39 || peak == 40, "peak at {peak}");
        assert!(d.iter().all(|&v| v >= -1e-12));
    }

    #[test]
    fn test_rescale_upsample_shape_and_range() {
        let data = Array3::from_shape_fn((10, 4, 2), |(r, _, ch)| r as f64 + ch as f64);
        let up = rescale_bilinear(data.view(), 2.0);
        assert_eq!(up.dim(), (20, 8, 2));

        // Monotone along rows, bounded by the input range
        for ch in 0..2 {
            let column: Vec<f64> = (0..20).map(|r| up[[r, 3, ch]]).collect();
            assert!(column.windows(2).all(|w| w[1] >= w[0]));
            assert_abs_diff_eq!(column[0], ch as f64, epsilon = 1e-12);
            assert_abs_diff_eq!(column[19], 9.0 + ch as f64, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rescale_identity() {
        let data = Array3::from_shape_fn((6, 5, 1), |(r, c, _)| (r * 5 + c) as f64);
        let same = rescale_bilinear(data.view(), 1.0);
        assert_eq!(same, data);
    }

    #[test]
    fn test_rescale_downsample_shape() {
        let data = Array3::from_elem((40, 20, 3), 5.0);
        let down = rescale_bilinear(data.view(), 0.5);
        assert_eq!(down.dim(), (20, 10, 3));
        for v in down.iter() {
            assert_abs_diff_eq!(*v, 5.0, epsilon = 1e-12);
        }
    }
}
