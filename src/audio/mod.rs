pub mod resample;
pub mod wav;

use crate::error::AnalysisError;

/// Sample rate the screening UI records at, and the rate clips are
/// normalized to unless configured otherwise.
pub const DEFAULT_SAMPLE_RATE: u32 = 22050;

/// A decoded mono recording.
///
/// Fields are private so the invariants checked in `new` (positive sample
/// rate, at least one sample) hold for the whole lifetime of the value.
/// Nothing mutates a signal after construction; every analysis stage borrows it.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSignal {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidConfig(
                "sample rate must be positive".into(),
            ));
        }
        if samples.is_empty() {
            return Err(AnalysisError::EmptySignal);
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed signal; provided alongside `len`.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds: `len / sample_rate`.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// How the loader shapes a decoded clip.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Rate every clip is resampled to.
    pub target_sample_rate: u32,
    /// Clips longer than this are truncated. Shorter clips are never padded.
    pub max_duration_secs: Option<f32>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            target_sample_rate: DEFAULT_SAMPLE_RATE,
            max_duration_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_samples() {
        let err = AudioSignal::new(Vec::new(), 22050).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptySignal));
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let err = AudioSignal::new(vec![0.0; 10], 0).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn duration_is_len_over_rate() {
        let signal = AudioSignal::new(vec![0.0; 33075], 22050).unwrap();
        assert!((signal.duration_secs() - 1.5).abs() < 1e-12);
        assert_eq!(signal.len(), 33075);
        assert!(!signal.is_empty());
    }
}
