use rustfft::{num_complex::Complex, FftPlanner};

/// Amplitude envelope: the magnitude of the analytic signal.
///
/// The analytic signal is built in the frequency domain over the full signal
/// length (no padding):
///   1. FFT of the real signal
///   2. keep DC (and Nyquist for even lengths), double the positive
///      frequencies, zero the negative ones
///   3. inverse FFT
///
/// Its magnitude `sqrt(x² + H{x}²)` follows the signal's amplitude without
/// the carrier oscillation. Returns one value per input sample.
pub fn hilbert_envelope(samples: &[f32]) -> Vec<f32> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(n);
    let inverse = planner.plan_fft_inverse(n);

    let mut spectrum: Vec<Complex<f64>> = samples
        .iter()
        .map(|&s| Complex::new(s as f64, 0.0))
        .collect();
    forward.process(&mut spectrum);

    for (k, bin) in spectrum.iter_mut().enumerate() {
        *bin *= analytic_gain(k, n);
    }

    inverse.process(&mut spectrum);

    // rustfft leaves the inverse unnormalized
    let norm = 1.0 / n as f64;
    spectrum.iter().map(|c| (c.norm() * norm) as f32).collect()
}

/// Frequency-domain weight of bin `k` for an analytic signal of length `n`.
fn analytic_gain(k: usize, n: usize) -> f64 {
    if k == 0 || (n % 2 == 0 && k == n / 2) {
        1.0
    } else if k < n.div_ceil(2) {
        2.0
    } else {
        0.0
    }
}
