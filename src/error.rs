use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors: the clip is rejected and no features are produced.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Could not decode audio: {0}")]
    Decode(String),
    #[error("Decoded audio contains no samples")]
    EmptySignal,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Audio I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hound::Error> for AnalysisError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) if e.kind() != std::io::ErrorKind::UnexpectedEof => {
                AnalysisError::Io(e)
            }
            other => AnalysisError::Decode(other.to_string()),
        }
    }
}

/// A derived measurement that may be unavailable for a given clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    GlottalPulses,
    Jitter,
    Shimmer,
    Harmonicity,
    DetrendedFluctuation,
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Measurement::GlottalPulses => "glottal pulses",
            Measurement::Jitter => "jitter",
            Measurement::Shimmer => "shimmer",
            Measurement::Harmonicity => "harmonicity",
            Measurement::DetrendedFluctuation => "detrended fluctuation",
        };
        f.write_str(name)
    }
}

/// Non-fatal: the measurement fell back to its default and the rest of the
/// record is still valid.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{measurement} unavailable: {reason}")]
pub struct MeasurementWarning {
    pub measurement: Measurement,
    pub reason: String,
}

impl MeasurementWarning {
    pub fn new(measurement: Measurement, reason: impl Into<String>) -> Self {
        let warning = Self {
            measurement,
            reason: reason.into(),
        };
        tracing::warn!("{warning}");
        warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_message_names_measurement() {
        let w = MeasurementWarning::new(Measurement::GlottalPulses, "only 2 pulses");
        assert_eq!(w.to_string(), "glottal pulses unavailable: only 2 pulses");
    }

    #[test]
    fn hound_format_errors_become_decode_errors() {
        let err: AnalysisError = hound::Error::FormatError("no RIFF tag found").into();
        assert!(matches!(err, AnalysisError::Decode(_)));
    }

    #[test]
    fn truncated_stream_is_a_decode_error() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: AnalysisError = hound::Error::IoError(io).into();
        assert!(matches!(err, AnalysisError::Decode(_)));
    }

    #[test]
    fn warning_serializes_snake_case() {
        let w = MeasurementWarning::new(Measurement::DetrendedFluctuation, "too short");
        let json = serde_json::to_string(&w).unwrap();
        assert!(json.contains("\"detrended_fluctuation\""));
    }
}
