use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use voicescreen::analysis::clinical::FEATURE_NAMES;
use voicescreen::analysis::{
    analyze_bytes, analyze_clips_parallel, ClinicalIndicators, ClipAnalysis, FeatureSet,
    HealthIndicators, ScreeningSession, TestKind,
};
use voicescreen::audio::wav;
use voicescreen::config::AppConfig;
use voicescreen::paths;

/// Local jitter above this is elevated (Praat, as a fraction).
const JITTER_PATHOLOGICAL: f64 = 0.0104;
/// Local shimmer above this is elevated (Praat, as a fraction).
const SHIMMER_PATHOLOGICAL: f64 = 0.0381;
/// HNR below this is concerning (dB).
const HNR_LOW: f64 = 7.0;
/// HNR above this is healthy (dB).
const HNR_NORMAL: f64 = 20.0;

/// Analyze each file and print (or dump) the results.
///
/// Several files get a progress bar; a file that fails to decode is reported
/// and skipped so the rest still run.
pub fn analyze(files: &[PathBuf], clinical: bool, json: bool, config: &AppConfig) -> Result<()> {
    let pb = (files.len() > 1 && !json).then(|| {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .progress_chars("#>-"),
        );
        pb
    });

    let mut reports = Vec::new();
    let mut failures = 0;

    for path in files {
        if let Some(pb) = &pb {
            pb.set_message(display_name(path));
        }
        match analyze_file(path, config) {
            Ok(analysis) => reports.push((path, analysis)),
            Err(e) => {
                failures += 1;
                let line = format!("  {} {}: {e:#}", style("FAIL").red(), path.display());
                match &pb {
                    Some(pb) => pb.println(line),
                    None => eprintln!("{line}"),
                }
            }
        }
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if json {
        let out: Vec<serde_json::Value> = reports
            .iter()
            .map(|(path, analysis)| {
                serde_json::json!({ "file": path.display().to_string(), "analysis": analysis })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for (path, analysis) in &reports {
            println!("  {} {}", style(">>").cyan(), path.display());
            print_health(&analysis.health);
            if clinical {
                print_clinical(&analysis.clinical);
            }
            print_warnings(analysis);
            println!();
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} recordings could not be analyzed", files.len());
    }
    Ok(())
}

/// Print a summary of the features of one file, or all of them as JSON.
pub fn features(file: &Path, json: bool, config: &AppConfig) -> Result<()> {
    let analysis = analyze_file(file, config)?;
    let f = &analysis.features;

    if json {
        println!("{}", serde_json::to_string_pretty(f)?);
        return Ok(());
    }

    println!("  {} {}", style(">>").cyan(), file.display());
    println!(
        "     Loaded:     {:.2}s, {} Hz",
        analysis.duration_secs, analysis.sample_rate
    );
    print_feature_summary(f);
    Ok(())
}

/// Print the classifier input vector as one CSV line.
pub fn vector(file: &Path, header: bool, config: &AppConfig) -> Result<()> {
    let analysis = analyze_file(file, config)?;
    if header {
        println!("{}", FEATURE_NAMES.join(","));
    }
    let values: Vec<String> = analysis
        .clinical
        .feature_vector()
        .iter()
        .map(|v| format!("{v:.6}"))
        .collect();
    println!("{}", values.join(","));
    Ok(())
}

/// Run a screening session over the given recordings, analyzed in parallel.
pub fn screen(recordings: &[(TestKind, PathBuf)], json: bool, config: &AppConfig) -> Result<()> {
    if recordings.is_empty() {
        anyhow::bail!("No recordings given. Pass at least one of --breathing, --vowel, --counting, --cough, --speech");
    }

    let clips: Vec<(TestKind, Vec<u8>)> = recordings
        .iter()
        .map(|(kind, path)| {
            std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))
                .map(|bytes| (*kind, bytes))
        })
        .collect::<Result<_>>()?;

    let mut session = ScreeningSession::new();
    let mut rejected = Vec::new();
    for (kind, result) in analyze_clips_parallel(&clips, config) {
        match result {
            Ok(analysis) => session = session.with_result(kind, analysis),
            Err(e) => rejected.push((kind, e)),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        print_session(&session);
    }

    for (kind, e) in &rejected {
        eprintln!("  {} {kind}: {e}", style("REJECTED").red());
    }
    if !rejected.is_empty() {
        anyhow::bail!("{} recording(s) were rejected", rejected.len());
    }
    Ok(())
}

/// Decode a recording with the configured loader and write it back out.
pub fn normalize(input: &Path, output: Option<&Path>, config: &AppConfig) -> Result<()> {
    let output = output.map_or_else(|| paths::normalized_path(input), Path::to_path_buf);

    let signal = wav::load_file(input, &(&config.loader).into())
        .with_context(|| format!("Failed to load {}", input.display()))?;
    wav::write_wav(&output, &signal)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Wrote {:.2}s at {} Hz to {}",
        signal.duration_secs(),
        signal.sample_rate(),
        style(output.display()).green()
    );
    Ok(())
}

pub fn show_paths(config_override: Option<&Path>) {
    let config = config_override.map_or_else(paths::config_file, Path::to_path_buf);
    let state = if config.exists() {
        style("(found)").green()
    } else {
        style("(not found, using defaults)").yellow()
    };
    println!("Config: {} {state}", config.display());
}

fn analyze_file(path: &Path, config: &AppConfig) -> Result<ClipAnalysis> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    analyze_bytes(&bytes, config).with_context(|| format!("Failed to analyze {}", path.display()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_session(session: &ScreeningSession) {
    println!(
        "{}",
        style("=== Voice Screening ===").bold()
    );
    println!("  Started: {}", style(session.started_at.format("%Y-%m-%d %H:%M")).cyan());
    println!();

    for kind in TestKind::ALL {
        let marker = if session.is_step_complete(kind) {
            style("done").green()
        } else {
            style("missing").yellow()
        };
        println!(
            "{} {kind} {marker}",
            style(format!("Step {}/{}:", kind.step_number(), TestKind::ALL.len())).bold()
        );
        println!("  {}", style(kind.instructions()).dim());

        if let Some(analysis) = session.result(kind) {
            print_health(&analysis.health);
            if kind == TestKind::Vowel {
                print_clinical(&analysis.clinical);
            }
            print_warnings(analysis);
        }
        println!();
    }

    match session.current_step() {
        None => println!("{}", style("Screening complete.").green().bold()),
        Some(next) => println!("Next step: {}", style(next).cyan()),
    }
}

fn print_health(h: &HealthIndicators) {
    println!("     Duration:   {:.1}s", h.duration);
    if h.breathing_rate > 0.0 {
        println!("     Breathing:  {:.1} bpm", h.breathing_rate);
    } else {
        println!("     Breathing:  {}", style("not detected").dim());
    }
    println!("     Stability:  {:.1} / 100", h.voice_stability);
}

fn print_clinical(c: &ClinicalIndicators) {
    let f0 = &c.fundamental_frequency;
    if f0.mean == 0.0 {
        println!("     Pitch:      {}", style("unvoiced").dim());
        return;
    }
    println!(
        "     Mean F0:    {:.1} Hz ({:.1} - {:.1})",
        f0.mean, f0.min, f0.max
    );
    println!("     F0 std:     {:.1} Hz", c.pitch_spread1);
    println!(
        "     Jitter:     {:.2}% {}",
        c.jitter_percent * 100.0,
        threshold_label(c.jitter_percent, JITTER_PATHOLOGICAL)
    );
    println!(
        "     Shimmer:    {:.2}% ({:.2} dB) {}",
        c.shimmer * 100.0,
        c.shimmer_db,
        threshold_label(c.shimmer, SHIMMER_PATHOLOGICAL)
    );
    println!(
        "     HNR:        {:.1} dB {}",
        c.harmonic_to_noise_ratio,
        hnr_label(c.harmonic_to_noise_ratio)
    );
    println!("     DFA:        {:.3}", c.detrended_fluctuation_value);
}

fn print_feature_summary(f: &FeatureSet) {
    let n = f.n_frames().max(1) as f32;
    let centroid = f.spectral_centroid.iter().sum::<f32>() / n;
    let zcr = f.zero_crossing_rate.iter().sum::<f32>() / n;
    let peak = f.envelope.iter().fold(0.0_f32, |m, &e| m.max(e));

    println!("     Frames:     {}", f.n_frames());
    println!("     Centroid:   {centroid:.0} Hz (mean)");
    println!("     ZCR:        {zcr:.4} (mean)");
    println!("     Envelope:   {peak:.3} peak");

    let means: Vec<String> = f
        .mfcc
        .iter()
        .map(|row| format!("{:.1}", row.iter().sum::<f32>() / row.len().max(1) as f32))
        .collect();
    println!("     MFCC means: [{}]", means.join(", "));
}

fn print_warnings(analysis: &ClipAnalysis) {
    for w in &analysis.warnings {
        println!("     {} {w}", style("WARN").yellow());
    }
}

/// Format a label for metrics where lower is better (jitter, shimmer).
fn threshold_label(value: f64, threshold: f64) -> String {
    if value <= threshold {
        format!("{}", style("(normal)").green())
    } else {
        format!("{}", style("(elevated)").yellow())
    }
}

/// Format a label for HNR where higher is better.
fn hnr_label(hnr: f64) -> String {
    if hnr >= HNR_NORMAL {
        format!("{}", style("(healthy)").green())
    } else if hnr >= HNR_LOW {
        format!("{}", style("(fair)").yellow())
    } else {
        format!("{}", style("(low)").red())
    }
}
