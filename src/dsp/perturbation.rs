use super::pulses::{Pulse, PulseTrain};

/// Limits that decide which pulse-to-pulse periods count for jitter and
/// shimmer. The defaults are Praat's standard analysis settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PerturbationConfig {
    /// Shortest period accepted, seconds.
    pub period_floor_s: f64,
    /// Longest period accepted, seconds. Longer gaps are treated as voicing
    /// breaks.
    pub period_ceiling_s: f64,
    /// Neighbouring periods differing by more than this ratio are not compared.
    pub max_period_factor: f64,
    /// Neighbouring amplitudes differing by more than this ratio are not compared.
    pub max_amplitude_factor: f64,
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            period_floor_s: 0.0001,
            period_ceiling_s: 0.02,
            max_period_factor: 1.3,
            max_amplitude_factor: 1.6,
        }
    }
}

/// A stretch of pulses whose every period lies within the floor/ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub periods: Vec<f64>,
    pub amplitudes: Vec<f64>,
}

/// Split pulse trains wherever a period falls outside the accepted range.
///
/// Each segment keeps the periods between its pulses (one fewer than the
/// pulses) and the amplitudes of those periods' starting pulses, so both
/// sequences line up one per period.
pub fn segments(trains: &[PulseTrain], config: &PerturbationConfig) -> Vec<Segment> {
    let mut out = Vec::new();

    for train in trains {
        let mut current = Segment {
            periods: Vec::new(),
            amplitudes: Vec::new(),
        };

        for pair in train.windows(2) {
            let (a, b): (&Pulse, &Pulse) = (&pair[0], &pair[1]);
            let period = b.time - a.time;
            if period >= config.period_floor_s && period <= config.period_ceiling_s {
                current.periods.push(period);
                current.amplitudes.push(a.amplitude as f64);
            } else if !current.periods.is_empty() {
                out.push(std::mem::replace(
                    &mut current,
                    Segment {
                        periods: Vec::new(),
                        amplitudes: Vec::new(),
                    },
                ));
            }
        }

        if !current.periods.is_empty() {
            out.push(current);
        }
    }

    out
}

/// True when every neighbouring pair in `window` differs by at most `factor`.
fn within_factor(window: &[f64], factor: f64) -> bool {
    window.windows(2).all(|pair| {
        let (lo, hi) = if pair[0] <= pair[1] {
            (pair[0], pair[1])
        } else {
            (pair[1], pair[0])
        };
        lo > 0.0 && hi / lo <= factor
    })
}

/// Mean of every value across all sequences. None when there are none.
pub fn grand_mean(sequences: &[&[f64]]) -> Option<f64> {
    let (sum, count) = sequences
        .iter()
        .flat_map(|s| s.iter())
        .fold((0.0, 0_usize), |(sum, count), &v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Mean absolute difference between consecutive values (pairs that pass the
/// factor check). None when no pair qualifies.
pub fn mean_abs_difference(sequences: &[&[f64]], factor: f64) -> Option<f64> {
    mean_over_windows(sequences, 2, factor, |w| (w[1] - w[0]).abs())
}

/// Mean absolute deviation of each value from the `width`-point average
/// centred on it (`width` odd). None when no window qualifies.
///
/// With width 3 over periods this is the relative average perturbation
/// numerator; with width 5 the period perturbation quotient; over
/// amplitudes, the amplitude perturbation quotients.
pub fn mean_abs_deviation_from_local_average(
    sequences: &[&[f64]],
    width: usize,
    factor: f64,
) -> Option<f64> {
    let mid = width / 2;
    mean_over_windows(sequences, width, factor, |w| {
        let local = w.iter().sum::<f64>() / w.len() as f64;
        (w[mid] - local).abs()
    })
}

fn mean_over_windows(
    sequences: &[&[f64]],
    width: usize,
    factor: f64,
    measure: impl Fn(&[f64]) -> f64,
) -> Option<f64> {
    let (sum, count) = sequences
        .iter()
        .flat_map(|s| s.windows(width))
        .filter(|w| within_factor(w, factor))
        .fold((0.0, 0_usize), |(sum, count), w| (sum + measure(w), count + 1));
    (count > 0).then(|| sum / count as f64)
}
