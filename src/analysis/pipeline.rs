use serde::Serialize;

use crate::audio::{wav, AudioSignal};
use crate::config::AppConfig;
use crate::error::{AnalysisError, MeasurementWarning};

use super::clinical::{estimate_clinical, ClinicalIndicators};
use super::features::{extract_features, FeatureSet};
use super::indicators::{estimate_health, HealthIndicators};
use super::session::TestKind;

/// Everything derived from one clip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipAnalysis {
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub features: FeatureSet,
    pub health: HealthIndicators,
    pub clinical: ClinicalIndicators,
    /// Measurements that fell back to their defaults, and why.
    pub warnings: Vec<MeasurementWarning>,
}

/// Decode a clip and analyze it.
///
/// Fails on an invalid config or an undecodable clip; a decoded clip always
/// yields a complete record.
pub fn analyze_bytes(bytes: &[u8], config: &AppConfig) -> Result<ClipAnalysis, AnalysisError> {
    config.validate()?;
    let signal = wav::decode_wav(bytes, &(&config.loader).into())?;
    analyze_signal(&signal, config)
}

/// Analyze a decoded clip: features, then the indicators derived from them.
pub fn analyze_signal(
    signal: &AudioSignal,
    config: &AppConfig,
) -> Result<ClipAnalysis, AnalysisError> {
    config.validate()?;
    let features = extract_features(signal, &(&config.features).into());
    let health = estimate_health(signal, &features, &(&config.indicators).into());
    let (clinical, warnings) = estimate_clinical(signal, &config.into());

    tracing::info!(
        duration = signal.duration_secs(),
        breathing_rate = health.breathing_rate,
        voice_stability = health.voice_stability,
        warnings = warnings.len(),
        "analyzed clip"
    );

    Ok(ClipAnalysis {
        duration_secs: signal.duration_secs(),
        sample_rate: signal.sample_rate(),
        features,
        health,
        clinical,
        warnings,
    })
}

/// Analyze several clips at once, one scoped thread per clip.
///
/// Clips share nothing but the read-only config, so the threads need no
/// synchronisation. Results come back in input order.
pub fn analyze_clips_parallel(
    clips: &[(TestKind, Vec<u8>)],
    config: &AppConfig,
) -> Vec<(TestKind, Result<ClipAnalysis, AnalysisError>)> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = clips
            .iter()
            .map(|(kind, bytes)| {
                let kind = *kind;
                (kind, scope.spawn(move || analyze_bytes(bytes, config)))
            })
            .collect();

        handles
            .into_iter()
            .map(|(kind, handle)| {
                let result = handle
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
                (kind, result)
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const SR: u32 = 22050;

    fn signal(samples: Vec<f32>) -> AudioSignal {
        AudioSignal::new(samples, SR).unwrap()
    }

    fn tone(freq: f32, secs: f32) -> Vec<f32> {
        let n = (SR as f32 * secs) as usize;
        (0..n)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    /// 200 Hz carrier whose loudness swells once every `period` seconds.
    fn breathing(period: f32, secs: f32) -> Vec<f32> {
        let n = (SR as f32 * secs) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SR as f32;
                let phase = (t % period) - period / 2.0;
                let swell = (-(phase / 0.15).powi(2)).exp();
                swell * (2.0 * PI * 200.0 * t).sin()
            })
            .collect()
    }

    fn wav_bytes(samples: Vec<f32>) -> Vec<u8> {
        wav::encode_wav(&signal(samples)).unwrap()
    }

    #[test]
    fn indicators_stay_in_range() {
        let config = AppConfig::default();
        for samples in [tone(150.0, 2.0), breathing(2.5, 6.0)] {
            let analysis = analyze_signal(&signal(samples), &config).unwrap();
            let h = analysis.health;
            assert!((0.0..=30.0).contains(&h.breathing_rate), "rate {}", h.breathing_rate);
            assert!((0.0..=100.0).contains(&h.voice_stability), "stability {}", h.voice_stability);
        }
    }

    #[test]
    fn silent_clip() {
        let analysis = analyze_signal(&signal(vec![0.0; SR as usize * 2]), &AppConfig::default()).unwrap();
        assert_eq!(analysis.health.voice_stability, 100.0);
        assert_eq!(analysis.health.breathing_rate, 0.0);
        assert_eq!(analysis.clinical.fundamental_frequency.mean, 0.0);
        assert!(!analysis.warnings.is_empty());
    }

    #[test]
    fn breathing_rate_follows_swell_spacing() {
        // One swell every 4 s is 15 breaths per minute
        let analysis = analyze_signal(&signal(breathing(4.0, 16.0)), &AppConfig::default()).unwrap();
        let rate = analysis.health.breathing_rate;
        assert!((rate - 15.0).abs() <= 0.75, "rate {rate:.2}");
    }

    #[test]
    fn identical_input_gives_identical_output() {
        let bytes = wav_bytes(breathing(3.0, 4.0));
        let config = AppConfig::default();
        let a = analyze_bytes(&bytes, &config).unwrap();
        let b = analyze_bytes(&bytes, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn duration_is_length_over_rate() {
        let analysis = analyze_signal(&signal(tone(200.0, 1.5)), &AppConfig::default()).unwrap();
        let expected = (SR as f64 * 1.5).floor() / SR as f64;
        assert!((analysis.health.duration - expected).abs() < 1e-9);
        assert_eq!(analysis.duration_secs, analysis.health.duration);
    }

    #[test]
    fn text_is_a_decode_error() {
        let err = analyze_bytes(b"this is not audio at all", &AppConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)), "{err:?}");
    }

    #[test]
    fn invalid_config_is_rejected_not_panicking() {
        let mut config = AppConfig::default();
        config.pitch.pitch_floor_hz = 0.0;
        let bytes = wav_bytes(tone(150.0, 1.0));

        let err = analyze_bytes(&bytes, &config).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)), "{err:?}");

        let err = analyze_signal(&signal(tone(150.0, 1.0)), &config).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)), "{err:?}");
    }

    #[test]
    fn nan_pitch_floor_is_rejected() {
        let mut config = AppConfig::default();
        config.pitch.pitch_floor_hz = f32::NAN;
        let err = analyze_bytes(&wav_bytes(tone(150.0, 1.0)), &config).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)), "{err:?}");
    }

    #[test]
    fn single_swell_has_no_rate() {
        // One swell centred in a 3 s clip
        let analysis = analyze_signal(&signal(breathing(3.0, 3.0)), &AppConfig::default()).unwrap();
        assert_eq!(analysis.health.breathing_rate, 0.0);
    }

    #[test]
    fn parallel_results_keep_input_order() {
        let config = AppConfig::default();
        let clips = vec![
            (TestKind::Vowel, wav_bytes(tone(150.0, 1.0))),
            (TestKind::Cough, b"garbage".to_vec()),
            (TestKind::Breathing, wav_bytes(breathing(3.0, 6.0))),
        ];
        let results = analyze_clips_parallel(&clips, &config);

        let kinds: Vec<TestKind> = results.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, vec![TestKind::Vowel, TestKind::Cough, TestKind::Breathing]);
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(AnalysisError::Decode(_))));

        let sequential = analyze_bytes(&clips[2].1, &config).unwrap();
        assert_eq!(results[2].1.as_ref().unwrap(), &sequential);
    }
}
