use std::io::{Cursor, Read};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use super::{resample, AudioSignal, LoadOptions};
use crate::error::AnalysisError;

/// WAV spec for signals we write back out: mono 16-bit PCM.
pub fn pcm16_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Decode an in-memory WAV clip into a normalized mono signal.
///
/// The pipeline is: read every sample as f32 in [-1.0, 1.0], average the
/// channels, resample to `options.target_sample_rate`, then truncate to
/// `options.max_duration_secs` if set.
pub fn decode_wav(bytes: &[u8], options: &LoadOptions) -> Result<AudioSignal, AnalysisError> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    decode_reader(reader, options)
}

/// Read a WAV file from disk and decode it like `decode_wav`.
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<AudioSignal, AnalysisError> {
    let bytes = std::fs::read(path)?;
    tracing::debug!("Read {} bytes from {}", bytes.len(), path.display());
    decode_wav(&bytes, options)
}

fn decode_reader<R: Read>(
    mut reader: WavReader<R>,
    options: &LoadOptions,
) -> Result<AudioSignal, AnalysisError> {
    if options.target_sample_rate == 0 {
        return Err(AnalysisError::InvalidConfig(
            "target sample rate must be positive".into(),
        ));
    }

    let spec = reader.spec();
    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(AnalysisError::Decode(format!(
            "invalid WAV header: {} channels at {} Hz",
            spec.channels, spec.sample_rate
        )));
    }

    let interleaved = read_samples(&mut reader, spec)?;
    let mono = resample::downmix_to_mono(&interleaved, spec.channels);
    if mono.is_empty() {
        return Err(AnalysisError::EmptySignal);
    }

    let mut samples = resample::resample(&mono, spec.sample_rate, options.target_sample_rate)?;

    if let Some(max_secs) = options.max_duration_secs {
        let max_samples = (max_secs.max(0.0) as f64 * options.target_sample_rate as f64) as usize;
        samples.truncate(max_samples);
    }

    tracing::debug!(
        channels = spec.channels,
        source_rate = spec.sample_rate,
        target_rate = options.target_sample_rate,
        samples = samples.len(),
        "Decoded WAV clip"
    );

    AudioSignal::new(samples, options.target_sample_rate)
}

/// Read every sample as f32 in [-1.0, 1.0], still interleaved.
fn read_samples<R: Read>(
    reader: &mut WavReader<R>,
    spec: WavSpec,
) -> Result<Vec<f32>, AnalysisError> {
    let samples = match spec.sample_format {
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(AnalysisError::Decode(format!(
                    "unsupported bit depth: {}",
                    spec.bits_per_sample
                )));
            }
            let max_val = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<hound::Result<Vec<_>>>()?
        }
        SampleFormat::Float => reader.samples::<f32>().collect::<hound::Result<Vec<_>>>()?,
    };
    Ok(samples)
}

/// Encode a signal as a mono 16-bit PCM WAV file in memory.
pub fn encode_wav(signal: &AudioSignal) -> Result<Vec<u8>, AnalysisError> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, pcm16_spec(signal.sample_rate()))?;
        for &sample in signal.samples() {
            writer.write_sample(to_i16(sample))?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Write a signal to disk as mono 16-bit PCM, creating parent directories.
pub fn write_wav(path: &Path, signal: &AudioSignal) -> Result<(), AnalysisError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = WavWriter::create(path, pcm16_spec(signal.sample_rate()))?;
    for &sample in signal.samples() {
        writer.write_sample(to_i16(sample))?;
    }
    writer.finalize()?;
    Ok(())
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    /// Build an in-memory WAV with an arbitrary spec, samples already interleaved.
    fn wav_bytes(spec: WavSpec, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn wav_roundtrip() {
        let original: Vec<f32> = (0..1000).map(|i| (i as f32 / 1000.0) * 2.0 - 1.0).collect();
        let signal = AudioSignal::new(original.clone(), 22050).unwrap();

        let bytes = encode_wav(&signal).unwrap();
        let loaded = decode_wav(&bytes, &LoadOptions::default()).unwrap();

        assert_eq!(loaded.sample_rate(), 22050);
        assert_eq!(loaded.len(), original.len());

        // 16-bit quantization error is ~0.00003
        for (orig, loaded) in original.iter().zip(loaded.samples()) {
            assert!(
                (orig - loaded).abs() < 0.001,
                "Sample mismatch: original={orig}, loaded={loaded}"
            );
        }
    }

    #[test]
    fn text_bytes_are_a_decode_error() {
        let err = decode_wav(b"this is definitely not a wav file", &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn tiny_garbage_is_a_decode_error() {
        let err = decode_wav(b"RI", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn empty_data_chunk_is_empty_signal() {
        let bytes = wav_bytes(pcm16_spec(22050), &[]);
        let err = decode_wav(&bytes, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptySignal), "got {err:?}");
    }

    #[test]
    fn stereo_is_downmixed() {
        let spec = WavSpec {
            channels: 2,
            ..pcm16_spec(22050)
        };
        // Left full scale, right silent: mono should be half scale
        let samples: Vec<i16> = (0..200).flat_map(|_| [i16::MAX, 0]).collect();
        let signal = decode_wav(&wav_bytes(spec, &samples), &LoadOptions::default()).unwrap();

        assert_eq!(signal.len(), 200);
        assert!(signal.samples().iter().all(|&s| (s - 0.5).abs() < 0.001));
    }

    #[test]
    fn resamples_to_target_rate() {
        let samples: Vec<i16> = (0..44100)
            .map(|i| ((2.0 * PI * 200.0 * i as f32 / 44100.0).sin() * 16000.0) as i16)
            .collect();
        let bytes = wav_bytes(pcm16_spec(44100), &samples);

        let signal = decode_wav(&bytes, &LoadOptions::default()).unwrap();
        assert_eq!(signal.sample_rate(), 22050);
        assert_eq!(signal.len(), 22050);
    }

    #[test]
    fn truncates_to_max_duration() {
        let bytes = wav_bytes(pcm16_spec(22050), &vec![1000; 22050 * 3]);
        let options = LoadOptions {
            max_duration_secs: Some(2.0),
            ..LoadOptions::default()
        };

        let signal = decode_wav(&bytes, &options).unwrap();
        assert_eq!(signal.len(), 44100);
    }

    #[test]
    fn short_clip_is_not_padded() {
        let bytes = wav_bytes(pcm16_spec(22050), &vec![1000; 500]);
        let options = LoadOptions {
            max_duration_secs: Some(5.0),
            ..LoadOptions::default()
        };

        let signal = decode_wav(&bytes, &options).unwrap();
        assert_eq!(signal.len(), 500);
    }

    #[test]
    fn float_wav_is_read_as_is() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for s in [0.25_f32, -0.5, 0.75] {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }

        let signal = decode_wav(&cursor.into_inner(), &LoadOptions::default()).unwrap();
        assert_eq!(signal.samples(), &[0.25, -0.5, 0.75]);
    }

    #[test]
    fn write_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("clip.wav");
        let signal = AudioSignal::new(vec![0.1; 2205], 22050).unwrap();

        write_wav(&path, &signal).unwrap();
        let loaded = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(loaded.len(), 2205);
    }

    #[test]
    fn load_nonexistent_file() {
        let result = load_file(
            Path::new("/tmp/does-not-exist-voicescreen.wav"),
            &LoadOptions::default(),
        );
        assert!(matches!(result, Err(AnalysisError::Io(_))));
    }
}
