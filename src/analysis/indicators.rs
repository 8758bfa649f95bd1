use serde::{Deserialize, Serialize};

use crate::audio::AudioSignal;
use crate::dsp::peaks::{pick_peaks, PeakPickConfig};

use super::features::FeatureSet;

/// Tuning for the envelope-derived indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    /// Look-around for envelope peaks, seconds. Used for the max window, the
    /// average window and the minimum gap between peaks alike.
    pub peak_window_secs: f32,
    /// How far above its neighbourhood average a peak must rise.
    pub peak_delta: f32,
    /// Breaths per minute ceiling.
    pub max_breathing_rate: f64,
    /// Added to the envelope deviation so silence doesn't divide by zero.
    pub stability_epsilon: f64,
    pub stability_scale: f64,
    pub max_stability: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            peak_window_secs: 0.25,
            peak_delta: 0.1,
            max_breathing_rate: 30.0,
            stability_epsilon: 1e-6,
            stability_scale: 10.0,
            max_stability: 100.0,
        }
    }
}

/// Screening indicators for one clip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthIndicators {
    /// Breaths per minute in [0, max_breathing_rate]; 0 means fewer than two
    /// breaths were found.
    pub breathing_rate: f64,
    /// Inverse envelope spread in [0, max_stability]. Steadier is higher.
    pub voice_stability: f64,
    /// Seconds.
    pub duration: f64,
}

/// Derive the indicators from a clip and its features.
pub fn estimate_health(
    signal: &AudioSignal,
    features: &FeatureSet,
    config: &IndicatorConfig,
) -> HealthIndicators {
    HealthIndicators {
        breathing_rate: breathing_rate(&features.envelope, signal.sample_rate(), config),
        voice_stability: voice_stability(&features.envelope, config),
        duration: signal.duration_secs(),
    }
}

/// Breaths per minute from the spacing of envelope peaks.
///
/// Each peak is one breath, so the rate is `60 / mean gap in seconds`,
/// capped at `max_breathing_rate`. Fewer than two peaks gives 0.0.
pub fn breathing_rate(envelope: &[f32], sample_rate: u32, config: &IndicatorConfig) -> f64 {
    let window = (sample_rate as f32 * config.peak_window_secs) as usize;
    let peaks = pick_peaks(envelope, &PeakPickConfig::symmetric(window, config.peak_delta));

    if peaks.len() < 2 {
        tracing::debug!(peaks = peaks.len(), "too few envelope peaks for a breathing rate");
        return 0.0;
    }

    let gaps = peaks.windows(2).map(|w| (w[1] - w[0]) as f64);
    let mean_gap = gaps.sum::<f64>() / (peaks.len() - 1) as f64;
    let mean_gap_secs = mean_gap / sample_rate as f64;

    (60.0 / mean_gap_secs).min(config.max_breathing_rate)
}

/// `scale / (std(envelope) + epsilon)`, capped at `max_stability`.
///
/// A flat envelope (steady voice, or silence) hits the cap.
pub fn voice_stability(envelope: &[f32], config: &IndicatorConfig) -> f64 {
    let std = population_std(envelope);
    (config.stability_scale / (std + config.stability_epsilon)).min(config.max_stability)
}

fn population_std(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
