pub mod dfa;
pub mod envelope;
pub mod hnr;
pub mod jitter;
pub mod mel;
pub mod peaks;
pub mod perturbation;
pub mod pitch;
pub mod pulses;
pub mod shimmer;
pub mod spectrum;
pub mod windowing;
