//! Configuration module for the chip zone analytics.

// Can all be private now because we have a public re-export.
mod analysis;
mod debug;

// Public
pub mod constants;

// Re-export commonly used items
pub use analysis::{
    ANALYSIS, AnalysisConfig, ChipZoneParams, OiSource, StrengthParams, TrendParams, WarmupPolicy,
};
pub use debug::{DF, LogFlags};
