//! Trace extraction: from a cropped spectrum to its 1-D intensity profile.

pub mod profile;
pub mod trace;

pub use profile::{
    DEFAULT_THRESHOLD_FRACTION, Plateau, ProfilePoint, find_checkpoints, find_plateau,
    horizontal_average, profile_at, sample_segment,
};
pub use trace::{MediaFunction, SpectrumTrace, extract_trace, extract_trace_reusing};
