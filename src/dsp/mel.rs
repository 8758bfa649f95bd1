use std::f64::consts::PI;

/// Settings for the mel-frequency cepstral transform.
#[derive(Debug, Clone, PartialEq)]
pub struct MfccConfig {
    /// Number of cepstral coefficients kept per frame.
    pub n_mfcc: usize,
    /// Number of triangular filters in the mel filter bank.
    pub n_mels: usize,
    /// Lowest filter edge in Hz.
    pub fmin: f32,
    /// Highest filter edge in Hz; `None` means Nyquist.
    pub fmax: Option<f32>,
    /// Log mel energies more than this many dB below the loudest value in
    /// the clip are raised to that floor.
    pub top_db: f32,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            n_mfcc: 13,
            n_mels: 40,
            fmin: 0.0,
            fmax: None,
            top_db: 80.0,
        }
    }
}

/// Floor applied before taking the log of a mel energy.
const POWER_FLOOR: f64 = 1e-10;

/// Hz to mel, HTK formula: `2595 * log10(1 + hz / 700)`.
pub fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Inverse of [`hz_to_mel`].
pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filter bank, `n_mels` rows of `fft_size / 2 + 1` weights.
///
/// Filter edges are spaced evenly on the mel scale between `fmin` and `fmax`.
/// Weights are evaluated at each bin's exact frequency rather than snapped to
/// bin indices, and each triangle is area-normalized (`2 / bandwidth`), so
/// narrow low-frequency filters are not empty at small FFT sizes.
pub fn mel_filterbank(
    n_mels: usize,
    fft_size: usize,
    sample_rate: u32,
    fmin: f32,
    fmax: f32,
) -> Vec<Vec<f32>> {
    let n_bins = fft_size / 2 + 1;
    let mel_low = hz_to_mel(fmin as f64);
    let mel_high = hz_to_mel(fmax as f64);

    let edges: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_low + (mel_high - mel_low) * i as f64 / (n_mels + 1) as f64))
        .collect();

    let bin_hz = |k: usize| k as f64 * sample_rate as f64 / fft_size as f64;

    (0..n_mels)
        .map(|m| {
            let (left, center, right) = (edges[m], edges[m + 1], edges[m + 2]);
            let norm = 2.0 / (right - left);
            (0..n_bins)
                .map(|k| {
                    let f = bin_hz(k);
                    let rising = (f - left) / (center - left);
                    let falling = (right - f) / (right - center);
                    (rising.min(falling).max(0.0) * norm) as f32
                })
                .collect()
        })
        .collect()
}

/// Orthonormal DCT-II, keeping the first `n_out` coefficients.
///
/// `X[k] = s_k * Σ x[n] * cos(π * k * (2n + 1) / 2N)` with
/// `s_0 = sqrt(1/N)` and `s_k = sqrt(2/N)`.
pub fn dct_ii_ortho(input: &[f64], n_out: usize) -> Vec<f64> {
    let n = input.len();
    if n == 0 {
        return vec![0.0; n_out];
    }

    (0..n_out)
        .map(|k| {
            if k >= n {
                return 0.0;
            }
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(i, &x)| x * (PI * k as f64 * (2 * i + 1) as f64 / (2 * n) as f64).cos())
                .sum();
            let scale = if k == 0 {
                (1.0 / n as f64).sqrt()
            } else {
                (2.0 / n as f64).sqrt()
            };
            sum * scale
        })
        .collect()
}

/// Mel-frequency cepstral coefficients from a power spectrogram.
///
/// `power` holds one row of `fft_size / 2 + 1` squared magnitudes per frame.
/// Returns an `n_mfcc × n_frames` matrix (one row per coefficient).
pub fn mfcc_from_power(
    power: &[Vec<f32>],
    fft_size: usize,
    sample_rate: u32,
    config: &MfccConfig,
) -> Vec<Vec<f32>> {
    let nyquist = sample_rate as f32 / 2.0;
    let fmax = config.fmax.unwrap_or(nyquist).min(nyquist);
    let bank = mel_filterbank(config.n_mels, fft_size, sample_rate, config.fmin, fmax);

    // Log mel energies in dB, frame-major
    let mut log_mel: Vec<Vec<f64>> = power
        .iter()
        .map(|row| {
            bank.iter()
                .map(|weights| {
                    let energy: f64 = weights
                        .iter()
                        .zip(row.iter())
                        .map(|(&w, &p)| w as f64 * p as f64)
                        .sum();
                    10.0 * energy.max(POWER_FLOOR).log10()
                })
                .collect()
        })
        .collect();

    // Dynamic range floor is relative to the loudest band of the whole clip
    let peak = log_mel
        .iter()
        .flatten()
        .fold(f64::NEG_INFINITY, |m, &v| m.max(v));
    if peak.is_finite() {
        let floor = peak - config.top_db as f64;
        for v in log_mel.iter_mut().flatten() {
            *v = v.max(floor);
        }
    }

    let per_frame: Vec<Vec<f64>> = log_mel
        .iter()
        .map(|bands| dct_ii_ortho(bands, config.n_mfcc))
        .collect();

    // Transpose to coefficient-major
    (0..config.n_mfcc)
        .map(|c| per_frame.iter().map(|frame| frame[c] as f32).collect())
        .collect()
}
