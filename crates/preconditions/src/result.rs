//! Outcome of a precondition evaluation.

use http::StatusCode;
use std::fmt;

/// Result of evaluating a request's preconditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreconditionResult {
    /// Preconditions hold; continue normal processing
    Passed,
    /// Preconditions were evaluated and do not hold
    Failed {
        /// Status to respond with (412 or 304)
        status: StatusCode,
        /// Human-readable reason
        reason: String,
    },
    /// Preconditions could not be evaluated and a default was applied
    Indeterminable {
        /// Status to respond with (400 or 428)
        status: StatusCode,
        /// Human-readable reason
        reason: String,
    },
}

impl PreconditionResult {
    /// 412 Precondition Failed.
    pub fn precondition_failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            status: StatusCode::PRECONDITION_FAILED,
            reason: reason.into(),
        }
    }

    /// 304 Not Modified.
    pub fn not_modified(reason: impl Into<String>) -> Self {
        Self::Failed {
            status: StatusCode::NOT_MODIFIED,
            reason: reason.into(),
        }
    }

    /// Indeterminable with an arbitrary status.
    pub fn indeterminable(status: StatusCode, reason: impl Into<String>) -> Self {
        Self::Indeterminable {
            status,
            reason: reason.into(),
        }
    }

    /// Whether processing should continue.
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Whether preconditions were evaluated and did not hold.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Whether a default stood in for a real evaluation.
    pub fn is_indeterminable(&self) -> bool {
        matches!(self, Self::Indeterminable { .. })
    }

    /// Status to respond with; `None` for [`PreconditionResult::Passed`].
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Passed => None,
            Self::Failed { status, .. } | Self::Indeterminable { status, .. } => Some(*status),
        }
    }

    /// Reason phrase, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Passed => None,
            Self::Failed { reason, .. } | Self::Indeterminable { reason, .. } => Some(reason),
        }
    }

    /// Short label used in logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed { .. } => "failed",
            Self::Indeterminable { .. } => "indeterminable",
        }
    }
}

impl fmt::Display for PreconditionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed { status, reason } | Self::Indeterminable { status, reason } => {
                write!(f, "{} ({}): {}", self.kind(), status.as_u16(), reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passed_has_no_status() {
        let result = PreconditionResult::Passed;
        assert!(result.is_passed());
        assert_eq!(result.status(), None);
        assert_eq!(result.reason(), None);
    }

    #[test]
    fn test_failed_status() {
        let result = PreconditionResult::not_modified("unchanged");
        assert!(result.is_failed());
        assert_eq!(result.status(), Some(StatusCode::NOT_MODIFIED));
        assert_eq!(result.to_string(), "failed (304): unchanged");
    }

    #[test]
    fn test_indeterminable_is_distinct() {
        let result = PreconditionResult::indeterminable(StatusCode::PRECONDITION_REQUIRED, "no validators");
        assert!(result.is_indeterminable());
        assert!(!result.is_failed());
        assert_eq!(result.status().map(|s| s.as_u16()), Some(428));
    }
}
