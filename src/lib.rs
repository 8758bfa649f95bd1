//! Acoustic feature extraction and health indicators for voice screening.
//!
//! A clip flows through the crate in one direction:
//! WAV bytes -> [`audio::AudioSignal`] -> [`analysis::FeatureSet`] ->
//! [`analysis::HealthIndicators`] and [`analysis::ClinicalIndicators`].
//! Every stage is a pure function of its input and the [`config::AppConfig`].

pub mod analysis;
pub mod audio;
pub mod config;
pub mod dsp;
pub mod error;
pub mod paths;

pub use error::{AnalysisError, Measurement, MeasurementWarning};
