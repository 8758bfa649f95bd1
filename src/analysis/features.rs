use serde::Serialize;

use crate::audio::AudioSignal;
use crate::dsp::envelope::hilbert_envelope;
use crate::dsp::mel::{mfcc_from_power, MfccConfig};
use crate::dsp::spectrum::{magnitude_spectrogram, zero_crossing_rate, FrameLayout};

/// Frame geometry and cepstral settings for feature extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureConfig {
    /// Analysis frame length in milliseconds. 23 ms is 507 samples at
    /// 22050 Hz, analysed with a 512-point FFT.
    pub frame_size_ms: f32,
    pub hop_size_ms: f32,
    pub mfcc: MfccConfig,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            frame_size_ms: 23.0,
            hop_size_ms: 10.0,
            mfcc: MfccConfig::default(),
        }
    }
}

/// Acoustic features of one clip.
///
/// The per-frame series (`spectral_centroid`, `zero_crossing_rate` and each
/// MFCC row) all have the same length. The envelope has one value per sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSet {
    /// `n_mfcc` rows of `n_frames` coefficients.
    pub mfcc: Vec<Vec<f32>>,
    /// Hz, per frame.
    pub spectral_centroid: Vec<f32>,
    /// Sign changes per sample, per frame.
    pub zero_crossing_rate: Vec<f32>,
    /// Amplitude envelope, per sample.
    pub envelope: Vec<f32>,
}

impl FeatureSet {
    pub fn n_frames(&self) -> usize {
        self.spectral_centroid.len()
    }
}

/// Compute every feature of a signal.
///
/// Never fails: the signal is non-empty by construction and every series is
/// defined for silence (zero centroid and ZCR, MFCCs at the dB floor).
pub fn extract_features(signal: &AudioSignal, config: &FeatureConfig) -> FeatureSet {
    let sr = signal.sample_rate();
    let layout = FrameLayout::from_ms(config.frame_size_ms, config.hop_size_ms, sr);

    let spectrogram = magnitude_spectrogram(signal.samples(), sr, &layout);
    let mfcc = mfcc_from_power(&spectrogram.power(), spectrogram.fft_size, sr, &config.mfcc);
    let spectral_centroid = spectrogram.spectral_centroids();
    let zero_crossing_rate = layout.frames(signal.samples()).map(zero_crossing_rate).collect();
    let envelope = hilbert_envelope(signal.samples());

    tracing::debug!(
        frames = spectral_centroid.len(),
        frame_len = layout.frame_len,
        hop_len = layout.hop_len,
        "extracted features"
    );

    FeatureSet {
        mfcc,
        spectral_centroid,
        zero_crossing_rate,
        envelope,
    }
}
