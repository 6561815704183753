//! Error taxonomy for the analytics core.
//!
//! Numerical degeneracies (flat prices, zero weights, empty candidate sets) are
//! not errors: they resolve to well-defined fallback values. Only malformed
//! input bars and out-of-range parameters fail, and they fail before any
//! computation starts.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("bar series is empty")]
    EmptySeries,

    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("series has {len} bars, detector is limited to {max}")]
    SeriesTooLong { len: usize, max: usize },
}

impl AnalysisError {
    pub(crate) fn invalid_param(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_bar(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidBar {
            index,
            reason: reason.into(),
        }
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
