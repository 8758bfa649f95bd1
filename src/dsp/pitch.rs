use pitch_detection::detector::mcleod::McLeodDetector;
use pitch_detection::detector::PitchDetector;

use super::windowing;

/// Configuration for pitch extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchConfig {
    /// Minimum accepted frequency in Hz. 75 Hz sits below the lowest
    /// speaking voices.
    pub pitch_floor_hz: f32,

    /// Maximum accepted frequency in Hz.
    pub pitch_ceiling_hz: f32,

    /// Minimum analysis window duration in milliseconds. The detector buffer
    /// grows past this when two periods of the floor pitch need more room.
    pub frame_size_ms: f32,

    /// How far to advance between frames, in milliseconds.
    pub hop_size_ms: f32,

    /// McLeod power threshold: frames with less windowed energy are unvoiced.
    pub power_threshold: f64,

    /// McLeod clarity threshold, 0.0-1.0. Periodicity below this is treated
    /// as unvoiced, which keeps broadband noise out of the pitch track.
    pub clarity_threshold: f64,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            pitch_floor_hz: 75.0,
            pitch_ceiling_hz: 500.0,
            frame_size_ms: 40.0,
            hop_size_ms: 10.0,
            power_threshold: 0.2,
            clarity_threshold: 0.6,
        }
    }
}

/// A single point in a pitch contour: a timestamp and an optional frequency.
/// `None` means the frame was unvoiced (no detectable pitch).
#[derive(Debug, Clone, PartialEq)]
pub struct PitchFrame {
    /// Center of the analysis window, in seconds from the start of the audio.
    pub time: f32,

    /// Detected fundamental frequency, or None if unvoiced.
    pub frequency: Option<f32>,
}

/// Detector buffer length in samples.
///
/// The McLeod detector needs at least 2 full cycles of the lowest frequency
/// we want to detect. At 75 Hz and 22050 Hz that's 2 × 294 = 588 samples,
/// rounded up to a power of 2 for FFT efficiency.
pub fn detector_size(sample_rate: u32, config: &PitchConfig) -> usize {
    let sr = sample_rate as f32;
    let frame_size = (config.frame_size_ms / 1000.0 * sr) as usize;
    let min_buffer = (2.0 * sr / config.pitch_floor_hz).ceil() as usize;
    min_buffer.next_power_of_two().max(frame_size).max(2)
}

/// Extract a pitch contour from audio samples.
///
/// This slides a window across the audio, runs the McLeod pitch detector on
/// each frame, and returns a sequence of (time, optional_frequency) pairs.
///
/// The McLeod Pitch Method works by computing a normalized autocorrelation
/// of the signal, comparing the signal with shifted copies of
/// itself to find the period of repetition. It's robust to harmonics and
/// works well with voice.
///
/// A signal shorter than one detector buffer yields an empty contour.
pub fn extract_pitch_contour(
    samples: &[f32],
    sample_rate: u32,
    config: &PitchConfig,
) -> Vec<PitchFrame> {
    let sr = sample_rate as f32;
    let hop_size = ((config.hop_size_ms / 1000.0 * sr) as usize).max(1);
    let size = detector_size(sample_rate, config);

    // Padding helps with edge effects in the autocorrelation.
    // Half the detector size is standard.
    let padding = size / 2;
    let mut detector = McLeodDetector::new(size, padding);

    let mut contour = Vec::new();
    let mut pos = 0;

    while pos + size <= samples.len() {
        let time = (pos + size / 2) as f32 / sr;

        let windowed = windowing::hanning(&samples[pos..pos + size]);
        let buffer: Vec<f64> = windowed.iter().map(|&s| s as f64).collect();

        let pitch = detector.get_pitch(
            &buffer,
            sample_rate as usize,
            config.power_threshold,
            config.clarity_threshold,
        );

        // Only accept pitches within the plausible voice range.
        // This rejects sub-bass rumble and high-frequency artifacts.
        let frequency = pitch
            .map(|p| p.frequency as f32)
            .filter(|&f| f.is_finite() && f >= config.pitch_floor_hz && f <= config.pitch_ceiling_hz);

        contour.push(PitchFrame { time, frequency });

        pos += hop_size;
    }

    contour
}

/// Extract only the voiced frequencies from a pitch contour.
pub fn voiced_frequencies(contour: &[PitchFrame]) -> Vec<f32> {
    contour
        .iter()
        .filter_map(|frame| frame.frequency)
        .collect()
}

/// Compute the fraction of frames that are voiced (have a detected pitch).
/// Returns 0.0 if contour is empty.
pub fn voiced_fraction(contour: &[PitchFrame]) -> f32 {
    if contour.is_empty() {
        return 0.0;
    }
    let voiced = contour.iter().filter(|f| f.frequency.is_some()).count();
    voiced as f32 / contour.len() as f32
}

/// Find consecutive runs of voiced frames in a pitch contour.
/// Returns a list of (start_index, end_index) pairs (inclusive).
pub fn voiced_runs(contour: &[PitchFrame]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;

    for (i, frame) in contour.iter().enumerate() {
        match (frame.frequency.is_some(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i - 1));
                start = None;
            }
            _ => {}
        }
    }

    // A run that extends to the end of the contour
    if let Some(s) = start {
        runs.push((s, contour.len() - 1));
    }

    runs
}
