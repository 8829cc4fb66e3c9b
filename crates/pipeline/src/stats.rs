//! Correlation and simple linear regression over paired samples.
//!
//! Both functions read the first `min(x.len(), y.len())` pairs and answer `None` rather
//! than NaN when the input is too short or has no variance.

use crate::model::Ols;

/// Fewest paired points for which correlation and regression are reported.
pub const MIN_POINTS: usize = 3;

/// Sums of squares over samples divided by a power-of-two scale, so large magnitudes
/// cannot overflow and ordinary inputs are unchanged bit for bit.
struct Moments {
    n: usize,
    scale_x: f64,
    scale_y: f64,
    mean_x: f64,
    mean_y: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

fn pow2_scale(values: &[f64]) -> f64 {
    let max = values.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    if max > 0.0 && max.is_finite() {
        2f64.powi(max.log2().ceil() as i32)
    } else {
        1.0
    }
}

fn moments(x: &[f64], y: &[f64]) -> Option<Moments> {
    let n = x.len().min(y.len());
    if n < MIN_POINTS {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let (scale_x, scale_y) = (pow2_scale(x), pow2_scale(y));
    let mean_x = x.iter().map(|v| v / scale_x).sum::<f64>() / n as f64;
    let mean_y = y.iter().map(|v| v / scale_y).sum::<f64>() / n as f64;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi / scale_x - mean_x;
        let dy = yi / scale_y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    Some(Moments { n, scale_x, scale_y, mean_x, mean_y, sxx, syy, sxy })
}

/// Pearson product-moment correlation, clamped into [-1, 1].
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let m = moments(x, y)?;
    let den = m.sxx.sqrt() * m.syy.sqrt();
    if den == 0.0 || !den.is_finite() {
        return None;
    }
    let r = m.sxy / den;
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Least-squares fit of `y = intercept + slope * x`.
pub fn ols(x: &[f64], y: &[f64]) -> Ols {
    let Some(m) = moments(x, y) else {
        return Ols::default();
    };
    if m.sxx == 0.0 || !m.sxx.is_finite() {
        return Ols::default();
    }
    // Fit in scaled units, then map back.
    let slope = m.sxy / m.sxx;
    let intercept = m.mean_y - slope * m.mean_x;

    let ss_res: f64 = x[..m.n]
        .iter()
        .zip(&y[..m.n])
        .map(|(xi, yi)| (yi / m.scale_y - (intercept + slope * (xi / m.scale_x))).powi(2))
        .sum();
    let r_squared = if m.syy == 0.0 { 0.0 } else { 1.0 - ss_res / m.syy };

    let slope = slope * (m.scale_y / m.scale_x);
    let intercept = intercept * m.scale_y;
    if !slope.is_finite() || !intercept.is_finite() {
        return Ols::default();
    }
    Ols {
        intercept: Some(intercept),
        slope: Some(slope),
        r_squared: Some(r_squared),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn perfect_positive_and_negative() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!(close(pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap(), 1.0));
        assert!(close(pearson(&x, &[8.0, 6.0, 4.0, 2.0]).unwrap(), -1.0));
    }

    #[test]
    fn known_correlation() {
        // Hand-computed: sxy = 6, sxx = 10, syy = 6
        let r = pearson(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 5.0, 4.0, 5.0]).unwrap();
        assert!(close(r, 6.0 / (10.0f64 * 6.0).sqrt()));
    }

    #[test]
    fn too_few_points_is_none() {
        assert_eq!(pearson(&[1.0, 2.0], &[3.0, 4.0]), None);
        assert_eq!(pearson(&[], &[]), None);
        assert_eq!(ols(&[1.0, 2.0], &[3.0, 4.0]), Ols::default());
    }

    #[test]
    fn zero_variance_is_none() {
        assert_eq!(pearson(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[7.0, 7.0, 7.0]), None);
        assert_eq!(ols(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]), Ols::default());
    }

    #[test]
    fn uses_shorter_length() {
        let r = pearson(&[1.0, 2.0, 3.0, 100.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!(close(r, 1.0));
    }

    #[test]
    fn ols_exact_line() {
        let fit = ols(&[0.0, 1.0, 2.0, 3.0], &[1.0, 3.0, 5.0, 7.0]);
        assert!(close(fit.slope.unwrap(), 2.0));
        assert!(close(fit.intercept.unwrap(), 1.0));
        assert!(close(fit.r_squared.unwrap(), 1.0));
    }

    #[test]
    fn ols_flat_response_has_zero_r_squared() {
        let fit = ols(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]);
        assert_eq!(fit.slope, Some(0.0));
        assert_eq!(fit.intercept, Some(4.0));
        assert_eq!(fit.r_squared, Some(0.0));
    }

    #[test]
    fn huge_magnitudes_do_not_overflow() {
        let x = [1e160, 2e160, 3e160];
        let y = [1.0, 2.0, 4.0];
        let r = pearson(&x, &y).unwrap();
        assert!(close(r, pearson(&[1.0, 2.0, 3.0], &y).unwrap()));

        let fit = ols(&x, &y);
        assert!((fit.slope.unwrap() - 1.5e-160).abs() < 1e-170);
        assert!(close(fit.intercept.unwrap(), -2.0 / 3.0));
        assert!(close(fit.r_squared.unwrap(), r * r));
    }

    #[test]
    fn ols_noisy_fit() {
        let fit = ols(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 5.0, 4.0, 5.0]);
        assert!(close(fit.slope.unwrap(), 0.6));
        assert!(close(fit.intercept.unwrap(), 2.2));
        assert!(close(fit.r_squared.unwrap(), 0.6));
    }
}
