use thiserror::Error;

use super::pitch::{voiced_runs, PitchFrame};

/// One glottal closure instant: where a pitch period's waveform peak sits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    /// Seconds from the start of the audio, refined to sub-sample precision.
    pub time: f64,
    /// Peak amplitude of the period at this pulse.
    pub amplitude: f32,
}

/// Pulses from one uninterrupted voiced stretch, in time order.
pub type PulseTrain = Vec<Pulse>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PulseError {
    #[error("no voiced frames to place pulses in")]
    Unvoiced,
    #[error("only {found} glottal pulses detected, need at least {required}")]
    TooFewPulses { found: usize, required: usize },
}

/// Settings for the pulse tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseConfig {
    /// Each pulse is searched for within ± this fraction of a period around
    /// where the previous pulse and the local pitch predict it.
    pub search_fraction: f32,
    /// Fewer pulses than this across the whole clip is an extraction failure.
    pub min_pulses: usize,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            search_fraction: 0.2,
            min_pulses: 3,
        }
    }
}

/// Place one pulse per pitch period inside every voiced run of the contour.
///
/// Per run:
///   1. the first pulse is the highest waveform peak within one period of
///      the run's start
///   2. each following pulse is the highest peak within ± `search_fraction`
///      of a period around `previous + period`, where the period comes from
///      the pitch frame nearest the previous pulse
///   3. the run ends when the search window leaves the voiced region
///
/// Peak positions and amplitudes are refined by parabolic interpolation.
/// Runs never share a train, so no period spans an unvoiced gap.
pub fn extract_pulses(
    samples: &[f32],
    sample_rate: u32,
    contour: &[PitchFrame],
    hop_size_ms: f32,
    config: &PulseConfig,
) -> Result<Vec<PulseTrain>, PulseError> {
    let runs = voiced_runs(contour);
    if runs.is_empty() || samples.is_empty() {
        return Err(PulseError::Unvoiced);
    }

    let sr = sample_rate as f64;
    let hop_secs = (hop_size_ms as f64 / 1000.0).max(1.0 / sr);

    let trains: Vec<PulseTrain> = runs
        .iter()
        .map(|&(start, end)| track_run(samples, sr, &contour[start..=end], hop_secs, config))
        .filter(|train| !train.is_empty())
        .collect();

    let found: usize = trains.iter().map(Vec::len).sum();
    if found < config.min_pulses {
        return Err(PulseError::TooFewPulses {
            found,
            required: config.min_pulses,
        });
    }

    Ok(trains)
}

/// Track pulses through one voiced run (every frame in `run` is voiced).
fn track_run(
    samples: &[f32],
    sr: f64,
    run: &[PitchFrame],
    hop_secs: f64,
    config: &PulseConfig,
) -> PulseTrain {
    let (Some(first), Some(last)) = (run.first(), run.last()) else {
        return Vec::new();
    };

    let region_start = ((first.time as f64 - hop_secs / 2.0) * sr).max(0.0) as usize;
    let region_end = (((last.time as f64 + hop_secs / 2.0) * sr) as usize).min(samples.len());
    if region_start >= region_end {
        return Vec::new();
    }

    // Period (in samples) of the frame nearest to a sample position
    let period_at = |pos: f64| -> f64 {
        let t = pos / sr;
        let idx = ((t - first.time as f64) / hop_secs).round().max(0.0) as usize;
        let frame = &run[idx.min(run.len() - 1)];
        let f0 = frame.frequency.or(first.frequency).unwrap_or(0.0) as f64;
        if f0 > 0.0 {
            sr / f0
        } else {
            0.0
        }
    };

    let mut train = Vec::new();

    let period = period_at(region_start as f64);
    if period < 1.0 {
        return train;
    }
    let first_end = (region_start + period.ceil() as usize).min(region_end);
    let Some(mut prev) = highest_peak(samples, region_start, first_end) else {
        return train;
    };
    train.push(to_pulse(samples, prev, sr));

    loop {
        let period = period_at(prev as f64);
        if period < 1.0 {
            break;
        }
        let expected = prev as f64 + period;
        let reach = (period * config.search_fraction as f64).max(1.0);
        let lo = ((expected - reach).ceil().max(prev as f64 + 1.0)) as usize;
        let hi = (expected + reach).floor() as usize + 1;
        // A window cut short by the region edge would pick a rising slope
        if hi > region_end || lo >= hi {
            break;
        }
        match highest_peak(samples, lo, hi) {
            Some(next) => {
                train.push(to_pulse(samples, next, sr));
                prev = next;
            }
            None => break,
        }
    }

    train
}

/// Index of the largest sample in `samples[lo..hi]`.
fn highest_peak(samples: &[f32], lo: usize, hi: usize) -> Option<usize> {
    samples
        .get(lo..hi)?
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &s)| match best {
            Some((_, v)) if v >= s => best,
            _ => Some((i, s)),
        })
        .map(|(i, _)| lo + i)
}

/// Refine a peak at sample `i` with a parabola through its neighbours.
fn to_pulse(samples: &[f32], i: usize, sr: f64) -> Pulse {
    let b = samples[i] as f64;
    let (offset, peak) = if i > 0 && i + 1 < samples.len() {
        let a = samples[i - 1] as f64;
        let c = samples[i + 1] as f64;
        let denom = a - 2.0 * b + c;
        if denom.abs() > 1e-12 {
            let offset = (0.5 * (a - c) / denom).clamp(-0.5, 0.5);
            (offset, b - 0.25 * (a - c) * offset)
        } else {
            (0.0, b)
        }
    } else {
        (0.0, b)
    };

    Pulse {
        time: (i as f64 + offset) / sr,
        amplitude: peak.abs() as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine_wave(freq: f32, sample_rate: u32, duration: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * duration) as usize;
        (0..n)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    fn voiced_contour(freq: f32, frames: usize, hop_ms: f32) -> Vec<PitchFrame> {
        (0..frames)
            .map(|i| PitchFrame {
                time: 0.05 + i as f32 * hop_ms / 1000.0,
                frequency: Some(freq),
            })
            .collect()
    }

    #[test]
    fn one_pulse_per_period_of_a_sine() {
        let sr = 22050;
        let samples = sine_wave(150.0, sr, 1.0);
        let contour = voiced_contour(150.0, 80, 10.0);

        let trains = extract_pulses(&samples, sr, &contour, 10.0, &PulseConfig::default()).unwrap();
        assert_eq!(trains.len(), 1);

        let train = &trains[0];
        // ~0.8 s of voicing at 150 Hz
        assert!(train.len() >= 115 && train.len() <= 125, "got {} pulses", train.len());

        for pair in train.windows(2) {
            let period = pair[1].time - pair[0].time;
            assert!((period - 1.0 / 150.0).abs() < 1e-5, "period {period}");
        }
        for pulse in train {
            assert!((pulse.amplitude - 0.5).abs() < 1e-3);
        }
    }

    #[test]
    fn gaps_split_trains() {
        let sr = 22050;
        let samples = sine_wave(200.0, sr, 1.0);
        let mut contour = voiced_contour(200.0, 80, 10.0);
        for frame in &mut contour[30..40] {
            frame.frequency = None;
        }

        let trains = extract_pulses(&samples, sr, &contour, 10.0, &PulseConfig::default()).unwrap();
        assert_eq!(trains.len(), 2);
        // No pulse falls inside the unvoiced gap
        let gap_start = contour[30].time as f64;
        let gap_end = contour[39].time as f64;
        assert!(trains[0].last().unwrap().time < gap_start);
        assert!(trains[1].first().unwrap().time > gap_end);
    }

    #[test]
    fn unvoiced_contour_is_an_error() {
        let contour = vec![
            PitchFrame { time: 0.0, frequency: None },
            PitchFrame { time: 0.01, frequency: None },
        ];
        let err = extract_pulses(&[0.0; 1000], 22050, &contour, 10.0, &PulseConfig::default())
            .unwrap_err();
        assert_eq!(err, PulseError::Unvoiced);
    }

    #[test]
    fn too_few_pulses_is_an_error() {
        // A single 10 ms voiced frame at 100 Hz holds about one period
        let samples = sine_wave(100.0, 22050, 0.2);
        let contour = vec![PitchFrame {
            time: 0.05,
            frequency: Some(100.0),
        }];
        let err = extract_pulses(&samples, 22050, &contour, 10.0, &PulseConfig::default())
            .unwrap_err();
        assert!(matches!(err, PulseError::TooFewPulses { required: 3, .. }), "{err:?}");
    }

    #[test]
    fn parabolic_refinement_finds_true_peak() {
        // Symmetric neighbours: peak stays on the sample
        let p = to_pulse(&[0.5, 1.0, 0.5], 1, 1.0);
        assert!((p.time - 1.0).abs() < 1e-12);
        assert!((p.amplitude - 1.0).abs() < 1e-6);

        // Right neighbour higher: true peak lies right of the sample
        let p = to_pulse(&[0.2, 1.0, 0.8], 1, 1.0);
        assert!(p.time > 1.0 && p.time < 1.5);
        assert!(p.amplitude > 1.0);
    }
}
