use rubato::{FftFixedInOut, Resampler};

use crate::error::AnalysisError;

/// Average interleaved frames down to a single channel.
///
/// A trailing partial frame (fewer samples than `channels`) is dropped.
pub fn downmix_to_mono(interleaved: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    let n = channels as usize;
    interleaved
        .chunks_exact(n)
        .map(|frame| frame.iter().sum::<f32>() / n as f32)
        .collect()
}

/// Input frames per FFT block.
const CHUNK_FRAMES: usize = 1024;

/// Band-limited resampling with rubato's FFT resampler.
///
/// Content above the lower of the two Nyquist frequencies is filtered out
/// rather than folded back. The resampler's output delay is trimmed so the
/// result lines up with the input, and the output length is
/// `round(len * to_rate / from_rate)`. Equal rates pass the samples through
/// untouched.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AnalysisError> {
    if samples.is_empty() || from_rate == to_rate {
        return Ok(samples.to_vec());
    }
    if from_rate == 0 || to_rate == 0 {
        return Err(AnalysisError::InvalidConfig(
            "sample rates must be positive".into(),
        ));
    }

    let mut resampler =
        FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_FRAMES, 1)
            .map_err(|e| AnalysisError::Decode(format!("failed to create resampler: {e}")))?;

    let out_len = ((samples.len() as f64 * to_rate as f64 / from_rate as f64).round() as usize)
        .max(1);
    let delay = resampler.output_delay();
    let chunk_size = resampler.input_frames_next();

    let mut input = samples.chunks(chunk_size);
    let mut output = Vec::with_capacity(delay + out_len + resampler.output_frames_next());

    // Keep feeding zeros after the last chunk until the delayed tail is out
    while output.len() < delay + out_len {
        let mut block = input.next().map(<[f32]>::to_vec).unwrap_or_default();
        block.resize(chunk_size, 0.0);

        let result = resampler
            .process(&[block], None)
            .map_err(|e| AnalysisError::Decode(format!("resampling failed: {e}")))?;
        match result.first() {
            Some(channel) if !channel.is_empty() => output.extend_from_slice(channel),
            _ => break,
        }
    }

    tracing::debug!(from_rate, to_rate, delay, samples = out_len, "Resampled clip");

    output.drain(..delay.min(output.len()));
    output.resize(out_len, 0.0);
    Ok(output)
}
