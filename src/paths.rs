use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// XDG-compliant config location for voicescreen.
///
/// On Linux this follows the XDG Base Directory Specification:
///   Config:  $XDG_CONFIG_HOME/voicescreen  (~/.config/voicescreen)
///
/// On macOS:
///   Config:  ~/Library/Application Support/voicescreen
///
/// The `dirs` crate handles platform detection. The resolved directory is
/// cached in a static OnceLock cell so the lookup only happens once.
static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Root config directory: $XDG_CONFIG_HOME/voicescreen
pub fn config_dir() -> &'static PathBuf {
    CONFIG_DIR.get_or_init(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voicescreen")
    })
}

/// Config file path: <config_dir>/config.toml
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Default output path for a normalized copy of `input`: next to the
/// original, with the extension replaced (`clip.wav` -> `clip.normalized.wav`).
pub fn normalized_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "clip".into());
    input.with_file_name(format!("{stem}.normalized.wav"))
}
