use serde::Serialize;

use super::perturbation::{self, PerturbationConfig};
use super::pulses::PulseTrain;

/// Cycle-to-cycle variation of the peak amplitude.
///
/// Shimmer detects air leak and inconsistent vocal fold closure. Relative
/// measures are fractions of the mean amplitude (0.0381 is Praat's "3.81%").
///
/// Clinical thresholds (Praat, local):
///   Normal voice: < 0.0381
///   Pathological: > 0.0381
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShimmerMeasures {
    /// mean(|A(i) - A(i-1)|) / mean(A)
    pub local: f64,
    /// mean(|20·log10(A(i) / A(i-1))|), in dB.
    pub local_db: f64,
    /// Three-point amplitude perturbation quotient.
    pub apq3: f64,
    /// Five-point amplitude perturbation quotient.
    pub apq5: f64,
    /// Eleven-point amplitude perturbation quotient.
    pub apq11: f64,
    /// Difference of differences of amplitudes, three times `apq3`.
    pub dda: f64,
}

/// Compute shimmer from the peak amplitudes of the pulse trains.
///
/// Periods outside the floor/ceiling split the sequence like they do for
/// jitter. A neighbouring pair is only compared when the larger amplitude is
/// at most `max_amplitude_factor` times the smaller.
///
/// Returns None if no pair qualifies or the mean amplitude is zero. Quotients
/// whose windows don't fit in any segment are 0.0.
pub fn compute_shimmer(trains: &[PulseTrain], config: &PerturbationConfig) -> Option<ShimmerMeasures> {
    let segments = perturbation::segments(trains, config);
    let amplitudes: Vec<&[f64]> = segments.iter().map(|s| s.amplitudes.as_slice()).collect();

    let mean_amplitude = perturbation::grand_mean(&amplitudes)?;
    if mean_amplitude <= 0.0 {
        return None;
    }

    let factor = config.max_amplitude_factor;
    let absolute = perturbation::mean_abs_difference(&amplitudes, factor)?;
    let quotient = |width: usize| {
        perturbation::mean_abs_deviation_from_local_average(&amplitudes, width, factor)
            .map_or(0.0, |d| d / mean_amplitude)
    };
    let apq3 = quotient(3);

    Some(ShimmerMeasures {
        local: absolute / mean_amplitude,
        local_db: local_db(&amplitudes, factor),
        apq3,
        apq5: quotient(5),
        apq11: quotient(11),
        dda: 3.0 * apq3,
    })
}

/// Mean absolute dB step between neighbouring amplitudes.
fn local_db(sequences: &[&[f64]], factor: f64) -> f64 {
    let steps: Vec<f64> = sequences
        .iter()
        .flat_map(|s| s.windows(2))
        .filter(|w| w[0] > 0.0 && w[1] > 0.0)
        .map(|w| w[1] / w[0])
        .filter(|ratio| ratio.max(1.0 / ratio) <= factor)
        .map(|ratio| (20.0 * ratio.log10()).abs())
        .collect();

    if steps.is_empty() {
        return 0.0;
    }
    steps.iter().sum::<f64>() / steps.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::pulses::Pulse;

    /// Pulses 10 ms apart with the given amplitudes.
    fn train(amplitudes: &[f32]) -> PulseTrain {
        amplitudes
            .iter()
            .enumerate()
            .map(|(i, &amplitude)| Pulse {
                time: i as f64 * 0.01,
                amplitude,
            })
            .collect()
    }

    #[test]
    fn constant_amplitude_zero_shimmer() {
        let s = compute_shimmer(&[train(&[0.5; 40])], &PerturbationConfig::default()).unwrap();
        assert!(s.local < 1e-9);
        assert!(s.local_db < 1e-9);
        assert!(s.apq3 < 1e-9);
        assert!(s.apq11 < 1e-9);
    }

    #[test]
    fn alternating_amplitude() {
        // 0.5, 0.6, 0.5, 0.6 ...: every step is 0.1, mean amplitude 0.55
        // The last pulse only closes a period, so 31 pulses give 30 amplitudes
        let amps: Vec<f32> = (0..31).map(|i| if i % 2 == 0 { 0.5 } else { 0.6 }).collect();
        let s = compute_shimmer(&[train(&amps)], &PerturbationConfig::default()).unwrap();

        assert!((s.local - 0.1 / 0.55).abs() < 1e-4, "local {}", s.local);
        let db = 20.0 * (0.6_f64 / 0.5).log10();
        assert!((s.local_db - db).abs() < 1e-3, "dB {}", s.local_db);
        assert!((s.dda - 3.0 * s.apq3).abs() < 1e-12);
        assert!(s.apq3 > 0.0 && s.apq5 > 0.0 && s.apq11 > 0.0);
    }

    #[test]
    fn amplitude_factor_excludes_spikes() {
        // A 3x spike is excluded from every pair it belongs to
        let s = compute_shimmer(
            &[train(&[0.5, 0.5, 0.5, 1.5, 0.5, 0.5, 0.5])],
            &PerturbationConfig::default(),
        )
        .unwrap();
        assert!(s.local < 1e-9);
        assert!(s.local_db < 1e-9);
    }

    #[test]
    fn not_enough_pulses() {
        assert!(compute_shimmer(&[train(&[0.5, 0.5])], &PerturbationConfig::default()).is_none());
        assert!(compute_shimmer(&[], &PerturbationConfig::default()).is_none());
    }

    #[test]
    fn silent_pulses() {
        assert!(compute_shimmer(&[train(&[0.0; 10])], &PerturbationConfig::default()).is_none());
    }
}
