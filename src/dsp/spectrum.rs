use rustfft::{num_complex::Complex, FftPlanner};

use super::windowing;

/// Frame geometry for short-time analysis, in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub frame_len: usize,
    pub hop_len: usize,
    /// Next power of two at or above `frame_len`; frames are zero-padded to it.
    pub fft_size: usize,
}

impl FrameLayout {
    /// Convert millisecond frame/hop durations to sample counts at `sample_rate`.
    /// Both are at least one sample.
    pub fn from_ms(frame_ms: f32, hop_ms: f32, sample_rate: u32) -> Self {
        let sr = sample_rate as f32;
        let frame_len = ((frame_ms / 1000.0 * sr) as usize).max(1);
        let hop_len = ((hop_ms / 1000.0 * sr) as usize).max(1);
        Self {
            frame_len,
            hop_len,
            fft_size: frame_len.next_power_of_two(),
        }
    }

    /// Number of analysis frames for a signal of `n_samples`.
    ///
    /// Frames start at sample 0 and never run past the end, except that a
    /// signal shorter than one frame still gets exactly one (zero-padded) frame.
    pub fn frame_count(&self, n_samples: usize) -> usize {
        if n_samples <= self.frame_len {
            1
        } else {
            1 + (n_samples - self.frame_len) / self.hop_len
        }
    }

    /// Borrow each analysis frame. The only frame of a short signal is the
    /// whole signal (shorter than `frame_len`).
    pub fn frames<'a>(&self, samples: &'a [f32]) -> impl Iterator<Item = &'a [f32]> + 'a {
        let layout = *self;
        (0..layout.frame_count(samples.len())).map(move |i| {
            let start = (i * layout.hop_len).min(samples.len());
            let end = (start + layout.frame_len).min(samples.len());
            &samples[start..end]
        })
    }
}

/// One-sided magnitude spectra, one row per frame.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// `n_frames` rows of `fft_size / 2 + 1` magnitudes.
    pub magnitudes: Vec<Vec<f32>>,
    pub fft_size: usize,
    pub sample_rate: u32,
}

impl Spectrogram {
    pub fn n_frames(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn n_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Center frequency of bin `k` in Hz.
    pub fn bin_frequency(&self, k: usize) -> f32 {
        k as f32 * self.sample_rate as f32 / self.fft_size as f32
    }

    /// Squared magnitudes, same layout as `magnitudes`.
    pub fn power(&self) -> Vec<Vec<f32>> {
        self.magnitudes
            .iter()
            .map(|row| row.iter().map(|&m| m * m).collect())
            .collect()
    }

    /// Magnitude-weighted mean frequency of every frame.
    pub fn spectral_centroids(&self) -> Vec<f32> {
        self.magnitudes
            .iter()
            .map(|row| spectral_centroid(row, |k| self.bin_frequency(k)))
            .collect()
    }
}

/// Short-time Fourier transform magnitudes.
///
/// Each frame is multiplied by a periodic Hann window of `frame_len`, zero
/// padded to `fft_size`, and transformed. The planner and buffers live only
/// for this call.
pub fn magnitude_spectrogram(samples: &[f32], sample_rate: u32, layout: &FrameLayout) -> Spectrogram {
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(layout.fft_size);
    let window = windowing::hann_periodic(layout.frame_len);
    let n_bins = layout.fft_size / 2 + 1;

    let mut buffer = vec![Complex::new(0.0_f32, 0.0); layout.fft_size];
    let magnitudes = layout
        .frames(samples)
        .map(|frame| {
            buffer.fill(Complex::new(0.0, 0.0));
            for (slot, (&s, &w)) in buffer.iter_mut().zip(frame.iter().zip(window.iter())) {
                *slot = Complex::new(s * w, 0.0);
            }
            fft.process(&mut buffer);
            buffer[..n_bins].iter().map(|c| c.norm()).collect::<Vec<f32>>()
        })
        .collect();

    Spectrogram {
        magnitudes,
        fft_size: layout.fft_size,
        sample_rate,
    }
}

/// Spectral centroid: Σ(f_k × |X_k|) / Σ|X_k|.
///
/// Returns 0.0 for a frame with no energy.
pub fn spectral_centroid(magnitudes: &[f32], bin_frequency: impl Fn(usize) -> f32) -> f32 {
    let mut weighted = 0.0_f64;
    let mut total = 0.0_f64;
    for (k, &m) in magnitudes.iter().enumerate() {
        weighted += bin_frequency(k) as f64 * m as f64;
        total += m as f64;
    }

    if total <= 0.0 {
        0.0
    } else {
        (weighted / total) as f32
    }
}

/// Zero-crossing rate of one frame: sign changes divided by frame length.
///
/// Zero counts as positive, so digital silence has no crossings.
pub fn zero_crossing_rate(frame: &[f32]) -> f32 {
    if frame.len() < 2 {
        return 0.0;
    }

    let crossings = frame
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();

    crossings as f32 / frame.len() as f32
}
