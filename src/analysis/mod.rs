pub mod clinical;
pub mod features;
pub mod indicators;
pub mod pipeline;
pub mod session;

pub use clinical::{ClinicalIndicators, FundamentalFrequencyStats};
pub use features::FeatureSet;
pub use indicators::HealthIndicators;
pub use pipeline::{analyze_bytes, analyze_clips_parallel, analyze_signal, ClipAnalysis};
pub use session::{ScreeningSession, SubmitError, TestKind};
