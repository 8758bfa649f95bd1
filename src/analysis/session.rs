use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;
use crate::error::AnalysisError;

use super::pipeline::{analyze_bytes, ClipAnalysis};

/// The recordings a screening collects, in the order they are asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Breathing,
    Vowel,
    Counting,
    Cough,
    Speech,
}

impl TestKind {
    /// Every step, in screening order.
    pub const ALL: [TestKind; 5] = [
        TestKind::Breathing,
        TestKind::Vowel,
        TestKind::Counting,
        TestKind::Cough,
        TestKind::Speech,
    ];

    /// What the participant is asked to do for this recording.
    pub fn instructions(self) -> &'static str {
        match self {
            TestKind::Breathing => "Take deep breaths normally for 10 seconds",
            TestKind::Vowel => "Say 'Aaaaah' for as long as you can in a steady tone",
            TestKind::Counting => "Count from 1 to 20 at a normal pace",
            TestKind::Cough => "Provide three natural coughs with brief pauses",
            TestKind::Speech => "Read the provided paragraph naturally",
        }
    }

    /// 1-based position in the screening.
    pub fn step_number(self) -> usize {
        Self::ALL.iter().position(|&k| k == self).map_or(0, |i| i + 1)
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestKind::Breathing => "breathing",
            TestKind::Vowel => "sustained vowel",
            TestKind::Counting => "counting",
            TestKind::Cough => "cough",
            TestKind::Speech => "speech",
        };
        f.write_str(name)
    }
}

/// One analyzed recording of a screening.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub kind: TestKind,
    pub analysis: ClipAnalysis,
}

/// A recording `submit` turned away. The session comes back unchanged.
#[derive(Error, Debug)]
#[error("{kind} recording rejected")]
pub struct SubmitError {
    pub kind: TestKind,
    #[source]
    pub error: AnalysisError,
    pub session: ScreeningSession,
}

/// Progress through one screening.
///
/// The session is a plain value: `submit` consumes it and hands back the
/// updated one, so separate screenings never share state. Steps may be
/// submitted in any order and a resubmitted step replaces the earlier
/// recording; `current_step` always points at the first step, in screening
/// order, that still needs a recording.
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningSession {
    pub started_at: DateTime<Local>,
    results: Vec<StepResult>,
}

impl Default for ScreeningSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreeningSession {
    pub fn new() -> Self {
        Self {
            started_at: Local::now(),
            results: Vec::new(),
        }
    }

    /// Analyze a recording for `kind` and return the session with it recorded.
    ///
    /// A recording that fails to decode is rejected on its own: the error
    /// hands the session back with every earlier step intact.
    pub fn submit(
        self,
        kind: TestKind,
        bytes: &[u8],
        config: &AppConfig,
    ) -> Result<ScreeningSession, SubmitError> {
        match analyze_bytes(bytes, config) {
            Ok(analysis) => Ok(self.with_result(kind, analysis)),
            Err(error) => {
                tracing::warn!(step = %kind, %error, "recording rejected");
                Err(SubmitError {
                    kind,
                    error,
                    session: self,
                })
            }
        }
    }

    /// Record an already computed analysis for `kind`.
    pub fn with_result(mut self, kind: TestKind, analysis: ClipAnalysis) -> ScreeningSession {
        tracing::debug!(step = %kind, "step completed");
        self.results.retain(|r| r.kind != kind);
        self.results.push(StepResult { kind, analysis });
        self
    }

    /// The first step in screening order without a recording.
    pub fn current_step(&self) -> Option<TestKind> {
        TestKind::ALL
            .into_iter()
            .find(|&kind| !self.is_step_complete(kind))
    }

    pub fn is_step_complete(&self, kind: TestKind) -> bool {
        self.results.iter().any(|r| r.kind == kind)
    }

    pub fn is_complete(&self) -> bool {
        self.current_step().is_none()
    }

    /// Completed steps in screening order.
    pub fn completed_steps(&self) -> Vec<TestKind> {
        TestKind::ALL
            .into_iter()
            .filter(|&kind| self.is_step_complete(kind))
            .collect()
    }

    pub fn result(&self, kind: TestKind) -> Option<&ClipAnalysis> {
        self.results
            .iter()
            .find(|r| r.kind == kind)
            .map(|r| &r.analysis)
    }

    /// Results in screening order.
    pub fn results(&self) -> Vec<&StepResult> {
        TestKind::ALL
            .iter()
            .filter_map(|&kind| self.results.iter().find(|r| r.kind == kind))
            .collect()
    }
}
