use serde::Serialize;

use super::perturbation::{self, PerturbationConfig, Segment};
use super::pulses::PulseTrain;

/// Cycle-to-cycle variation of the glottal period.
///
/// Jitter measures how much the pitch period varies from one cycle to the
/// next. It's a key indicator of vocal fold stability. All relative measures
/// are fractions of the mean period (0.0104 is Praat's "1.04%").
///
/// Clinical thresholds (Praat, local):
///   Normal voice: < 0.0104
///   Pathological: > 0.0104
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JitterMeasures {
    /// mean(|T(i) - T(i-1)|) / mean(T)
    pub local: f64,
    /// mean(|T(i) - T(i-1)|) in seconds.
    pub local_absolute: f64,
    /// Relative average perturbation: deviation of each period from the
    /// average of itself and its two neighbours, over mean(T).
    pub rap: f64,
    /// Five-point period perturbation quotient.
    pub ppq5: f64,
    /// Difference of differences of periods, three times `rap`.
    pub ddp: f64,
}

/// Compute jitter over the pulse trains of a recording.
///
/// Only periods between the configured floor and ceiling count, and a
/// neighbouring pair is only compared when the longer period is at most
/// `max_period_factor` times the shorter. Windows never span two segments,
/// so unvoiced gaps don't show up as perturbation.
///
/// Returns None if no pair of adjacent periods qualifies. The 3- and
/// 5-point measures fall back to 0.0 when the segments are too short for
/// their windows.
pub fn compute_jitter(trains: &[PulseTrain], config: &PerturbationConfig) -> Option<JitterMeasures> {
    let segments = perturbation::segments(trains, config);
    let periods: Vec<&[f64]> = segments.iter().map(|s: &Segment| s.periods.as_slice()).collect();

    let mean_period = perturbation::grand_mean(&periods)?;
    if mean_period <= 0.0 {
        return None;
    }

    let factor = config.max_period_factor;
    let absolute = perturbation::mean_abs_difference(&periods, factor)?;
    let rap = perturbation::mean_abs_deviation_from_local_average(&periods, 3, factor)
        .map_or(0.0, |d| d / mean_period);
    let ppq5 = perturbation::mean_abs_deviation_from_local_average(&periods, 5, factor)
        .map_or(0.0, |d| d / mean_period);

    Some(JitterMeasures {
        local: absolute / mean_period,
        local_absolute: absolute,
        rap,
        ppq5,
        ddp: 3.0 * rap,
    })
}
