use std::f32::consts::PI;

/// Apply a symmetric Hanning window to a slice of samples, returning a new Vec.
///
/// The Hanning (also called Hann) window smoothly tapers a frame of audio
/// to zero at both edges. This prevents spectral leakage, the artifacts you'd
/// get from abruptly chopping a signal in the middle of a cycle.
///
/// Formula: w(n) = 0.5 * (1 - cos(2π * n / (N - 1)))
///
/// At n=0 and n=N-1 (the edges), w = 0.0 and the signal fades out.
/// At n=N/2 (the center), w = 1.0 and the signal passes through unchanged.
pub fn hanning(samples: &[f32]) -> Vec<f32> {
    let n = samples.len();
    if n <= 1 {
        return samples.to_vec();
    }

    let scale = 2.0 * PI / (n - 1) as f32;

    samples
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let w = 0.5 * (1.0 - (scale * i as f32).cos());
            s * w
        })
        .collect()
}

/// Periodic Hann window coefficients of length `n`.
///
/// w(n) = 0.5 * (1 - cos(2π * n / N))
///
/// Spectral framing uses the periodic form: consecutive overlapping frames
/// then sum to a constant, which the symmetric form above does not.
pub fn hann_periodic(n: usize) -> Vec<f32> {
    if n <= 1 {
        return vec![1.0; n];
    }

    let scale = 2.0 * PI / n as f32;
    (0..n)
        .map(|i| 0.5 * (1.0 - (scale * i as f32).cos()))
        .collect()
}
