use super::pitch::PitchFrame;

/// Harmonics-to-noise ratio of a clip in dB, averaged over its voiced frames.
///
/// Each voiced frame is measured on a three-period chunk centred on the
/// frame's timestamp. The normalized autocorrelation r at one pitch period
/// gives the harmonic share of the energy (Boersma, 1993):
///
///   HNR = 10 * log10(r / (1 - r))
///
/// r = 0.5 is 0 dB, r = 0.99 is about 20 dB. Frames too close to the clip
/// edges to hold two periods are skipped. None when no frame qualifies.
pub fn compute_hnr_db(samples: &[f32], sample_rate: u32, contour: &[PitchFrame]) -> Option<f32> {
    let sr = sample_rate as f32;
    let per_frame: Vec<f32> = contour
        .iter()
        .filter_map(|frame| {
            let f0 = frame.frequency?;
            let center = (frame.time * sr).round() as usize;
            frame_hnr_db(samples, center, (sr / f0).round() as usize)
        })
        .collect();

    if per_frame.is_empty() {
        return None;
    }
    Some(per_frame.iter().sum::<f32>() / per_frame.len() as f32)
}

fn frame_hnr_db(samples: &[f32], center: usize, period: usize) -> Option<f32> {
    if period == 0 {
        return None;
    }
    let span = period * 3;
    let start = center.saturating_sub(span / 2);
    let end = (start + span).min(samples.len());
    if end.saturating_sub(start) < period * 2 {
        return None;
    }

    // Rounding can push r just outside (0, 1)
    let r = normalized_autocorrelation(&samples[start..end], period).clamp(0.001, 0.999);
    Some(10.0 * (r / (1.0 - r)).log10())
}

/// Noise-to-harmonics ratio as the screening classifier expects it: the
/// reciprocal of the HNR in dB, or 0.0 when the HNR isn't positive.
pub fn noise_to_harmonics_ratio(hnr_db: f64) -> f64 {
    if hnr_db > 0.0 {
        1.0 / (hnr_db + 1e-6)
    } else {
        0.0
    }
}

/// Correlation between `signal` and itself shifted by `lag`, in [-1, 1].
fn normalized_autocorrelation(signal: &[f32], lag: usize) -> f32 {
    if lag >= signal.len() {
        return 0.0;
    }

    let n = signal.len() - lag;
    if n == 0 {
        return 0.0;
    }

    let mut cross_sum = 0.0_f64;
    let mut energy_a = 0.0_f64;
    let mut energy_b = 0.0_f64;

    for i in 0..n {
        let a = signal[i] as f64;
        let b = signal[i + lag] as f64;
        cross_sum += a * b;
        energy_a += a * a;
        energy_b += b * b;
    }

    let denom = (energy_a * energy_b).sqrt();
    if denom == 0.0 {
        return 0.0;
    }

    (cross_sum / denom) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn frame(time: f32, freq: Option<f32>) -> PitchFrame {
        PitchFrame {
            time,
            frequency: freq,
        }
    }

    fn sine_wave(freq: f32, sample_rate: u32, duration: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * duration) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn pure_tone_high_hnr() {
        // A pure sine wave has no noise → HNR should be very high
        let sr = 44100;
        let samples = sine_wave(100.0, sr, 1.0);

        let hop_ms = 10.0;
        let num_frames = 80; // ~0.8s worth
        let contour: Vec<_> = (0..num_frames)
            .map(|i| frame(i as f32 * hop_ms / 1000.0, Some(100.0)))
            .collect();

        let hnr = compute_hnr_db(&samples, sr, &contour).unwrap();
        assert!(
            hnr > 20.0,
            "Pure tone should have HNR > 20 dB, got {hnr:.1} dB"
        );
    }

    #[test]
    fn noisy_signal_low_hnr() {
        // Mix a sine wave with white noise at ~1:1 ratio → low HNR
        let sr = 44100;
        let n = (sr as f32 * 1.0) as usize;

        // Simple deterministic "noise" using a linear congruential generator.
        // Real white noise would be random, but we want reproducible tests.
        let mut rng_state: u32 = 42;
        let samples: Vec<f32> = (0..n)
            .map(|i| {
                let signal = (2.0 * PI * 100.0 * i as f32 / sr as f32).sin();
                // LCG pseudo-random noise in [-1, 1]
                rng_state = rng_state.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng_state as f32 / u32::MAX as f32) * 2.0 - 1.0;
                // Equal parts signal and noise
                0.5 * signal + 0.5 * noise
            })
            .collect();

        let hop_ms = 10.0;
        let num_frames = 80;
        let contour: Vec<_> = (0..num_frames)
            .map(|i| frame(i as f32 * hop_ms / 1000.0, Some(100.0)))
            .collect();

        let hnr = compute_hnr_db(&samples, sr, &contour).unwrap();
        assert!(
            hnr < 15.0,
            "Noisy signal should have low HNR, got {hnr:.1} dB"
        );
    }

    #[test]
    fn autocorrelation_self() {
        // Autocorrelation at lag 0 should be 1.0 (signal correlates perfectly with itself)
        let signal: Vec<f32> = (0..100).map(|i| (i as f32 * 0.1).sin()).collect();
        let r = normalized_autocorrelation(&signal, 0);
        assert!(
            (r - 1.0).abs() < 0.001,
            "Self-correlation should be 1.0, got {r}"
        );
    }

    #[test]
    fn frames_are_centred_on_their_timestamp() {
        // Tone only in the second half: frames stamped in the silent half
        // contribute nothing
        let sr = 22050;
        let mut samples = vec![0.0; sr as usize / 2];
        samples.extend(sine_wave(150.0, sr, 0.5));
        let contour: Vec<_> = (0..40)
            .map(|i| frame(0.55 + i as f32 * 0.01, Some(150.0)))
            .collect();

        let hnr = compute_hnr_db(&samples, sr, &contour).unwrap();
        assert!(hnr > 20.0, "got {hnr:.1} dB");
    }

    #[test]
    fn nhr_is_reciprocal_of_positive_hnr() {
        assert!((noise_to_harmonics_ratio(20.0) - 0.05).abs() < 1e-6);
        assert_eq!(noise_to_harmonics_ratio(0.0), 0.0);
        assert_eq!(noise_to_harmonics_ratio(-3.0), 0.0);
    }

    #[test]
    fn no_voiced_frames() {
        let contour = vec![frame(0.0, None), frame(0.01, None)];
        assert!(compute_hnr_db(&[0.0; 44100], 44100, &contour).is_none());
    }
}
