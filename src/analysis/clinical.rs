use serde::{Deserialize, Serialize};

use crate::audio::AudioSignal;
use crate::dsp::perturbation::PerturbationConfig;
use crate::dsp::pitch::{self, PitchConfig};
use crate::dsp::pulses::{self, PulseConfig};
use crate::dsp::{dfa, hnr, jitter, shimmer};
use crate::error::{Measurement, MeasurementWarning};

/// Everything the clinical measurements can be tuned with.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClinicalConfig {
    pub pitch: PitchConfig,
    pub pulses: PulseConfig,
    pub perturbation: PerturbationConfig,
}

/// Mean, highest and lowest voiced pitch, Hz. All 0 when nothing is voiced.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FundamentalFrequencyStats {
    pub mean: f64,
    pub max: f64,
    pub min: f64,
}

/// Voice-quality measures in the layout of the Parkinson's screening model.
///
/// Every field falls back to 0.0 when its measurement is undefined for the
/// clip; the reason is reported as a `MeasurementWarning` next to the record.
/// Jitter and shimmer are Praat-style fractions, not percentages, because
/// that is what the model was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClinicalIndicators {
    pub fundamental_frequency: FundamentalFrequencyStats,
    pub jitter_percent: f64,
    /// Seconds.
    pub jitter_absolute: f64,
    pub rap: f64,
    pub ppq: f64,
    pub ddp: f64,
    pub shimmer: f64,
    pub shimmer_db: f64,
    pub apq3: f64,
    pub apq5: f64,
    pub apq11: f64,
    pub dda: f64,
    /// dB.
    pub harmonic_to_noise_ratio: f64,
    pub noise_to_harmonic_ratio: f64,
    pub detrended_fluctuation_value: f64,
    /// Population standard deviation of voiced pitch, Hz.
    pub pitch_spread1: f64,
    /// Mean frame-to-frame pitch change, Hz.
    pub pitch_spread2: f64,
    /// Population variance of voiced pitch, Hz².
    pub pitch_variance: f64,
    /// Standard deviation of log pitch.
    pub pitch_period_entropy: f64,
}

/// Column names of `ClinicalIndicators::feature_vector`, in order.
pub const FEATURE_NAMES: [&str; 22] = [
    "fo", "fhi", "flo", "jitter_percent", "jitter_abs", "rap", "ppq", "ddp", "shimmer",
    "shimmer_db", "apq3", "apq5", "apq11", "dda", "nhr", "hnr", "status", "dfa", "spread1",
    "spread2", "d2", "ppe",
];

impl ClinicalIndicators {
    /// The 22 model inputs. Index 16 is the training set's status column,
    /// always 0 here.
    pub fn feature_vector(&self) -> [f64; 22] {
        let f0 = &self.fundamental_frequency;
        [
            f0.mean,
            f0.max,
            f0.min,
            self.jitter_percent,
            self.jitter_absolute,
            self.rap,
            self.ppq,
            self.ddp,
            self.shimmer,
            self.shimmer_db,
            self.apq3,
            self.apq5,
            self.apq11,
            self.dda,
            self.noise_to_harmonic_ratio,
            self.harmonic_to_noise_ratio,
            0.0,
            self.detrended_fluctuation_value,
            self.pitch_spread1,
            self.pitch_spread2,
            self.pitch_variance,
            self.pitch_period_entropy,
        ]
    }
}

/// Run every clinical measurement on a clip.
///
/// Never fails as a whole. Each measurement that can't be made leaves its
/// fields at 0.0 and adds a warning; a failed pulse extraction zeroes the
/// whole jitter and shimmer families.
pub fn estimate_clinical(
    signal: &AudioSignal,
    config: &ClinicalConfig,
) -> (ClinicalIndicators, Vec<MeasurementWarning>) {
    let samples = signal.samples();
    let sr = signal.sample_rate();
    let mut warnings = Vec::new();
    let mut out = ClinicalIndicators::default();

    let contour = pitch::extract_pitch_contour(samples, sr, &config.pitch);
    let frequencies: Vec<f64> = pitch::voiced_frequencies(&contour)
        .into_iter()
        .map(f64::from)
        .collect();
    tracing::debug!(
        frames = contour.len(),
        voiced = frequencies.len(),
        voiced_fraction = pitch::voiced_fraction(&contour),
        "pitch contour"
    );

    out.fundamental_frequency = f0_stats(&frequencies);
    if frequencies.len() > 1 {
        out.pitch_spread1 = population_variance(&frequencies).sqrt();
        out.pitch_spread2 = frequencies.windows(2).map(|w| w[1] - w[0]).sum::<f64>()
            / (frequencies.len() - 1) as f64;
        out.pitch_variance = population_variance(&frequencies);
        let logs: Vec<f64> = frequencies.iter().map(|f| (f + 1e-6).ln()).collect();
        out.pitch_period_entropy = population_variance(&logs).sqrt();
    }

    match pulses::extract_pulses(samples, sr, &contour, config.pitch.hop_size_ms, &config.pulses) {
        Ok(trains) => {
            match jitter::compute_jitter(&trains, &config.perturbation) {
                Some(j) => {
                    out.jitter_percent = j.local;
                    out.jitter_absolute = j.local_absolute;
                    out.rap = j.rap;
                    out.ppq = j.ppq5;
                    out.ddp = j.ddp;
                }
                None => warnings.push(MeasurementWarning::new(
                    Measurement::Jitter,
                    "no neighbouring periods within the accepted range",
                )),
            }
            match shimmer::compute_shimmer(&trains, &config.perturbation) {
                Some(s) => {
                    out.shimmer = s.local;
                    out.shimmer_db = s.local_db;
                    out.apq3 = s.apq3;
                    out.apq5 = s.apq5;
                    out.apq11 = s.apq11;
                    out.dda = s.dda;
                }
                None => warnings.push(MeasurementWarning::new(
                    Measurement::Shimmer,
                    "no neighbouring amplitudes within the accepted range",
                )),
            }
        }
        Err(e) => warnings.push(MeasurementWarning::new(Measurement::GlottalPulses, e.to_string())),
    }

    match hnr::compute_hnr_db(samples, sr, &contour) {
        Some(h) => {
            out.harmonic_to_noise_ratio = h as f64;
            out.noise_to_harmonic_ratio = hnr::noise_to_harmonics_ratio(h as f64);
        }
        None => warnings.push(MeasurementWarning::new(
            Measurement::Harmonicity,
            "no voiced frame long enough for autocorrelation",
        )),
    }

    match dfa::detrended_fluctuation(samples) {
        Some(alpha) if alpha.is_finite() => out.detrended_fluctuation_value = alpha,
        _ => warnings.push(MeasurementWarning::new(
            Measurement::DetrendedFluctuation,
            "signal too short or without fluctuation",
        )),
    }

    (out, warnings)
}

fn f0_stats(frequencies: &[f64]) -> FundamentalFrequencyStats {
    if frequencies.is_empty() {
        return FundamentalFrequencyStats::default();
    }
    FundamentalFrequencyStats {
        mean: frequencies.iter().sum::<f64>() / frequencies.len() as f64,
        max: frequencies.iter().cloned().fold(f64::MIN, f64::max),
        min: frequencies.iter().cloned().fold(f64::MAX, f64::min),
    }
}

fn population_variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine_signal(freq: f32, secs: f32) -> AudioSignal {
        let n = (22050.0 * secs) as usize;
        let samples = (0..n)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / 22050.0).sin())
            .collect();
        AudioSignal::new(samples, 22050).unwrap()
    }

    #[test]
    fn steady_tone_is_a_healthy_voice() {
        let (c, warnings) = estimate_clinical(&sine_signal(150.0, 1.0), &ClinicalConfig::default());

        assert!(warnings.is_empty(), "{warnings:?}");
        assert!((c.fundamental_frequency.mean - 150.0).abs() < 5.0);
        assert!(c.fundamental_frequency.min <= c.fundamental_frequency.mean);
        assert!(c.fundamental_frequency.max >= c.fundamental_frequency.mean);
        assert!(c.jitter_percent < 0.005, "jitter {}", c.jitter_percent);
        assert!(c.shimmer < 0.01, "shimmer {}", c.shimmer);
        assert!(c.harmonic_to_noise_ratio > 20.0);
        assert!((c.noise_to_harmonic_ratio - 1.0 / c.harmonic_to_noise_ratio).abs() < 1e-6);
        assert!(c.pitch_spread1 < 5.0);
        assert!((c.pitch_variance - c.pitch_spread1.powi(2)).abs() < 1e-9);
    }

    #[test]
    fn silence_falls_back_to_zero() {
        let signal = AudioSignal::new(vec![0.0; 22050], 22050).unwrap();
        let (c, warnings) = estimate_clinical(&signal, &ClinicalConfig::default());

        assert_eq!(c.fundamental_frequency, FundamentalFrequencyStats::default());
        assert_eq!(c.pitch_spread1, 0.0);
        assert_eq!(c.pitch_spread2, 0.0);
        assert_eq!(c.pitch_variance, 0.0);
        assert_eq!(c.pitch_period_entropy, 0.0);
        assert_eq!(c.jitter_percent, 0.0);
        assert_eq!(c.shimmer, 0.0);
        assert_eq!(c.harmonic_to_noise_ratio, 0.0);
        assert_eq!(c.noise_to_harmonic_ratio, 0.0);

        let failed: Vec<Measurement> = warnings.iter().map(|w| w.measurement).collect();
        assert!(failed.contains(&Measurement::GlottalPulses));
        assert!(failed.contains(&Measurement::Harmonicity));
        assert!(failed.contains(&Measurement::DetrendedFluctuation));
    }

    #[test]
    fn white_noise_has_no_pitch() {
        // Deterministic LCG noise, no periodicity in the 75-500 Hz range
        let mut state: u32 = 7;
        let samples: Vec<f32> = (0..22050)
            .map(|_| {
                state = state.wrapping_mul(1103515245).wrapping_add(12345);
                0.5 * ((state as f32 / u32::MAX as f32) * 2.0 - 1.0)
            })
            .collect();
        let signal = AudioSignal::new(samples, 22050).unwrap();
        let (c, warnings) = estimate_clinical(&signal, &ClinicalConfig::default());

        assert_eq!(c.fundamental_frequency, FundamentalFrequencyStats::default());
        assert_eq!(c.pitch_spread1, 0.0);
        assert_eq!(c.pitch_spread2, 0.0);
        assert_eq!(c.pitch_variance, 0.0);
        assert_eq!(c.pitch_period_entropy, 0.0);

        let failed: Vec<Measurement> = warnings.iter().map(|w| w.measurement).collect();
        assert!(failed.contains(&Measurement::GlottalPulses));
        // Noise still fluctuates, so DFA is measured
        assert!(!failed.contains(&Measurement::DetrendedFluctuation));
        assert!(c.detrended_fluctuation_value > 0.0);
    }

    #[test]
    fn feature_vector_layout() {
        let c = ClinicalIndicators {
            fundamental_frequency: FundamentalFrequencyStats {
                mean: 150.0,
                max: 160.0,
                min: 140.0,
            },
            harmonic_to_noise_ratio: 21.0,
            noise_to_harmonic_ratio: 0.05,
            detrended_fluctuation_value: 0.7,
            pitch_period_entropy: 0.1,
            ..Default::default()
        };
        let v = c.feature_vector();

        assert_eq!(v.len(), FEATURE_NAMES.len());
        assert_eq!(v[0], 150.0);
        assert_eq!(v[1], 160.0);
        assert_eq!(v[2], 140.0);
        assert_eq!(v[14], 0.05);
        assert_eq!(v[15], 21.0);
        assert_eq!(v[16], 0.0);
        assert_eq!(v[17], 0.7);
        assert_eq!(v[21], 0.1);
        assert_eq!(FEATURE_NAMES[16], "status");
    }

    #[test]
    fn spread_statistics_use_population_formulas() {
        let f = [100.0, 110.0, 120.0];
        assert!((population_variance(&f) - 200.0 / 3.0).abs() < 1e-9);
        let stats = f0_stats(&f);
        assert_eq!((stats.mean, stats.max, stats.min), (110.0, 120.0, 100.0));
    }
}
