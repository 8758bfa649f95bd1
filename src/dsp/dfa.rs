/// Detrended fluctuation analysis.
///
/// DFA measures long-range correlation in a signal. The signal is integrated
/// into a "profile", the profile is cut into windows of size n, a straight
/// line is fitted and removed in each window, and the RMS of what remains is
/// the fluctuation F(n). For a self-similar signal F(n) ∝ n^α, and α is the
/// slope of ln F(n) against ln n:
///   α ≈ 0.5  uncorrelated noise
///   α ≈ 1.0  1/f noise
///   α ≈ 1.5  Brownian motion
///
/// Window sizes grow geometrically by 20% from 4 samples to a tenth of the
/// signal, and neighbouring windows overlap by half.
///
/// Returns None when the signal is too short for two window sizes or every
/// fluctuation is zero (a constant signal).
pub fn detrended_fluctuation(samples: &[f32]) -> Option<f64> {
    let n_total = samples.len();
    let sizes = window_sizes(4, 0.1 * n_total as f64, 1.2)?;

    let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / n_total as f64;
    let profile: Vec<f64> = samples
        .iter()
        .scan(0.0, |acc, &s| {
            *acc += s as f64 - mean;
            Some(*acc)
        })
        .collect();

    let points: Vec<(f64, f64)> = sizes
        .iter()
        .filter_map(|&n| {
            let f = mean_fluctuation(&profile, n)?;
            (f > 0.0).then(|| ((n as f64).ln(), f.ln()))
        })
        .collect();

    least_squares_slope(&points)
}

/// Geometric window sizes from `min_n` up to `max_n`, deduplicated after
/// flooring. None when the range is empty.
fn window_sizes(min_n: usize, max_n: f64, factor: f64) -> Option<Vec<usize>> {
    if max_n <= min_n as f64 || factor <= 1.0 {
        return None;
    }

    let steps = ((max_n / min_n as f64).ln() / factor.ln()).floor() as i32;
    let mut sizes = vec![min_n];
    for i in 0..=steps {
        let n = (min_n as f64 * factor.powi(i)).floor() as usize;
        if sizes.last().is_some_and(|&last| n > last) {
            sizes.push(n);
        }
    }
    Some(sizes)
}

/// Mean over half-overlapping windows of the RMS residual after removing
/// each window's linear trend.
fn mean_fluctuation(profile: &[f64], n: usize) -> Option<f64> {
    if n < 2 || profile.len() <= n {
        return None;
    }

    let step = (n / 2).max(1);
    let (sum, count) = (0..profile.len() - n)
        .step_by(step)
        .map(|start| detrended_rms(&profile[start..start + n]))
        .fold((0.0, 0_usize), |(sum, count), rms| (sum + rms, count + 1));

    (count > 0).then(|| sum / count as f64)
}

/// RMS of `window` minus its least-squares line.
fn detrended_rms(window: &[f64]) -> f64 {
    let n = window.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = window.iter().sum::<f64>() / n;

    let (sxy, sxx) = window
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sxy, sxx), (i, &y)| {
            let dx = i as f64 - x_mean;
            (sxy + dx * (y - y_mean), sxx + dx * dx)
        });
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };

    let residual: f64 = window
        .iter()
        .enumerate()
        .map(|(i, &y)| {
            let trend = y_mean + slope * (i as f64 - x_mean);
            (y - trend).powi(2)
        })
        .sum();

    (residual / n).sqrt()
}

/// Slope of the least-squares line through `points`. Needs two distinct x.
fn least_squares_slope(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let x_mean = points.iter().map(|p| p.0).sum::<f64>() / n;
    let y_mean = points.iter().map(|p| p.1).sum::<f64>() / n;

    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), &(x, y)| {
        (sxy + (x - x_mean) * (y - y_mean), sxx + (x - x_mean).powi(2))
    });

    (sxx > 0.0).then(|| sxy / sxx)
}
