use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::clinical::ClinicalConfig;
use crate::analysis::features::FeatureConfig;
use crate::analysis::indicators::IndicatorConfig;
use crate::audio::{LoadOptions, DEFAULT_SAMPLE_RATE};
use crate::dsp::mel::MfccConfig;
use crate::dsp::perturbation::PerturbationConfig;
use crate::dsp::pitch::PitchConfig;
use crate::dsp::pulses::PulseConfig;
use crate::error::AnalysisError;
use crate::paths;

/// Application configuration, loaded from $XDG_CONFIG_HOME/voicescreen/config.toml.
///
/// serde's `default` attribute means: if a field is missing from the TOML file,
/// use the value from the Default implementation instead of failing to parse.
/// This makes the config file optional, and a partial file only overrides
/// what it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub loader: LoaderConfig,
    pub features: FeaturesConfig,
    pub indicators: IndicatorsConfig,
    pub pitch: PitchSettings,
    pub perturbation: PerturbationSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Every clip is resampled to this rate before analysis.
    pub sample_rate: u32,
    /// Longer clips are truncated. Unset means no limit.
    pub max_duration_secs: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    pub frame_size_ms: f32,
    pub hop_size_ms: f32,
    pub n_mfcc: usize,
    pub n_mels: usize,
    /// Dynamic range kept in the log mel energies, dB.
    pub top_db: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorsConfig {
    pub peak_window_secs: f32,
    pub peak_delta: f32,
    pub max_breathing_rate: f64,
    pub stability_epsilon: f64,
    pub stability_scale: f64,
    pub max_stability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchSettings {
    pub pitch_floor_hz: f32,
    pub pitch_ceiling_hz: f32,
    pub frame_size_ms: f32,
    pub hop_size_ms: f32,
    pub power_threshold: f64,
    pub clarity_threshold: f64,
}

/// Praat's jitter/shimmer arguments: period range and the largest ratio
/// between neighbouring periods and amplitudes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerturbationSettings {
    pub period_floor_s: f64,
    pub period_ceiling_s: f64,
    pub max_period_factor: f64,
    pub max_amplitude_factor: f64,
}

// --- Default implementations ---
// Every default mirrors the DSP-level default, so an empty config file and
// no config file behave the same.

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_duration_secs: None,
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        let features = FeatureConfig::default();
        Self {
            frame_size_ms: features.frame_size_ms,
            hop_size_ms: features.hop_size_ms,
            n_mfcc: features.mfcc.n_mfcc,
            n_mels: features.mfcc.n_mels,
            top_db: features.mfcc.top_db,
        }
    }
}

impl Default for IndicatorsConfig {
    fn default() -> Self {
        let d = IndicatorConfig::default();
        Self {
            peak_window_secs: d.peak_window_secs,
            peak_delta: d.peak_delta,
            max_breathing_rate: d.max_breathing_rate,
            stability_epsilon: d.stability_epsilon,
            stability_scale: d.stability_scale,
            max_stability: d.max_stability,
        }
    }
}

impl Default for PitchSettings {
    fn default() -> Self {
        let d = PitchConfig::default();
        Self {
            pitch_floor_hz: d.pitch_floor_hz,
            pitch_ceiling_hz: d.pitch_ceiling_hz,
            frame_size_ms: d.frame_size_ms,
            hop_size_ms: d.hop_size_ms,
            power_threshold: d.power_threshold,
            clarity_threshold: d.clarity_threshold,
        }
    }
}

impl Default for PerturbationSettings {
    fn default() -> Self {
        let d = PerturbationConfig::default();
        Self {
            period_floor_s: d.period_floor_s,
            period_ceiling_s: d.period_ceiling_s,
            max_period_factor: d.max_period_factor,
            max_amplitude_factor: d.max_amplitude_factor,
        }
    }
}

// --- Bridges from the user-facing config to the DSP parameters ---

impl From<&LoaderConfig> for LoadOptions {
    fn from(cfg: &LoaderConfig) -> Self {
        LoadOptions {
            target_sample_rate: cfg.sample_rate,
            max_duration_secs: cfg.max_duration_secs,
        }
    }
}

impl From<&FeaturesConfig> for FeatureConfig {
    fn from(cfg: &FeaturesConfig) -> Self {
        FeatureConfig {
            frame_size_ms: cfg.frame_size_ms,
            hop_size_ms: cfg.hop_size_ms,
            mfcc: MfccConfig {
                n_mfcc: cfg.n_mfcc,
                n_mels: cfg.n_mels,
                top_db: cfg.top_db,
                ..MfccConfig::default()
            },
        }
    }
}

impl From<&IndicatorsConfig> for IndicatorConfig {
    fn from(cfg: &IndicatorsConfig) -> Self {
        IndicatorConfig {
            peak_window_secs: cfg.peak_window_secs,
            peak_delta: cfg.peak_delta,
            max_breathing_rate: cfg.max_breathing_rate,
            stability_epsilon: cfg.stability_epsilon,
            stability_scale: cfg.stability_scale,
            max_stability: cfg.max_stability,
        }
    }
}

impl From<&PitchSettings> for PitchConfig {
    fn from(cfg: &PitchSettings) -> Self {
        PitchConfig {
            pitch_floor_hz: cfg.pitch_floor_hz,
            pitch_ceiling_hz: cfg.pitch_ceiling_hz,
            frame_size_ms: cfg.frame_size_ms,
            hop_size_ms: cfg.hop_size_ms,
            power_threshold: cfg.power_threshold,
            clarity_threshold: cfg.clarity_threshold,
        }
    }
}

impl From<&PerturbationSettings> for PerturbationConfig {
    fn from(cfg: &PerturbationSettings) -> Self {
        PerturbationConfig {
            period_floor_s: cfg.period_floor_s,
            period_ceiling_s: cfg.period_ceiling_s,
            max_period_factor: cfg.max_period_factor,
            max_amplitude_factor: cfg.max_amplitude_factor,
        }
    }
}

impl From<&AppConfig> for ClinicalConfig {
    fn from(cfg: &AppConfig) -> Self {
        ClinicalConfig {
            pitch: (&cfg.pitch).into(),
            pulses: PulseConfig::default(),
            perturbation: (&cfg.perturbation).into(),
        }
    }
}

impl AppConfig {
    /// Reject settings the analysis can't run with.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let invalid = |msg: &str| Err(AnalysisError::InvalidConfig(msg.into()));

        if self.loader.sample_rate == 0 {
            return invalid("loader.sample_rate must be positive");
        }
        if self.loader.max_duration_secs.is_some_and(|d| d <= 0.0) {
            return invalid("loader.max_duration_secs must be positive");
        }
        if self.features.frame_size_ms <= 0.0 || self.features.hop_size_ms <= 0.0 {
            return invalid("features frame and hop sizes must be positive");
        }
        if self.features.n_mfcc == 0 || self.features.n_mels < self.features.n_mfcc {
            return invalid("features.n_mels must be at least n_mfcc, and n_mfcc positive");
        }
        if self.indicators.peak_window_secs <= 0.0 || self.indicators.stability_epsilon <= 0.0 {
            return invalid("indicators peak window and stability epsilon must be positive");
        }
        // Written as a negation so NaN fails too
        if !(self.pitch.pitch_floor_hz > 0.0 && self.pitch.pitch_floor_hz < self.pitch.pitch_ceiling_hz) {
            return invalid("pitch range must satisfy 0 < pitch_floor_hz < pitch_ceiling_hz");
        }
        if self.pitch.hop_size_ms <= 0.0 || self.pitch.frame_size_ms <= 0.0 {
            return invalid("pitch frame and hop sizes must be positive");
        }
        let p = &self.perturbation;
        if p.period_floor_s <= 0.0 || p.period_floor_s >= p.period_ceiling_s {
            return invalid("perturbation period range must satisfy 0 < floor < ceiling");
        }
        if p.max_period_factor < 1.0 || p.max_amplitude_factor < 1.0 {
            return invalid("perturbation factors must be at least 1");
        }
        Ok(())
    }
}

/// Load the application config from $XDG_CONFIG_HOME/voicescreen/config.toml.
/// If the file doesn't exist, returns defaults.
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&paths::config_file())
}

/// Load and validate a config file at an explicit path.
pub fn load_config_from(path: &std::path::Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {}", path.display()))?;

    Ok(config)
}
