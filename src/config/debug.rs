//! Debugging feature flags.

pub struct LogFlags {
    /// Activate trace_time macro (for cool scope-level timing)
    pub log_performance: bool,

    pub log_strength: bool,
    pub log_zones: bool,
    pub log_trends: bool,

    /// Per-symbol pipeline progress
    pub log_pipeline: bool,
}

pub const DF: LogFlags = LogFlags {
    log_performance: false,

    log_strength: false,
    log_zones: false,
    log_trends: true,

    log_pipeline: true,
};
