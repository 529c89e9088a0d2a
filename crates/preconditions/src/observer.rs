//! Diagnostic events emitted by the evaluator.
//!
//! The evaluator holds an observer handed to it at construction; there is no
//! process-wide logger.

use std::fmt;

/// Which rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// `If-Match` compared against the local tag
    IfMatch,
    /// `If-None-Match` compared against the local tag
    IfNoneMatch,
    /// `If-Modified-Since` compared against the local time
    IfModifiedSince,
    /// `If-Unmodified-Since` compared against the local time
    IfUnmodifiedSince,
    /// Nothing usable; the default was applied
    Default,
}

impl Rule {
    /// Header name, or `default`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IfMatch => "If-Match",
            Self::IfNoneMatch => "If-None-Match",
            Self::IfModifiedSince => "If-Modified-Since",
            Self::IfUnmodifiedSince => "If-Unmodified-Since",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something worth recording about one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreconditionEvent {
    /// A decision was reached
    Decided {
        /// Request method
        method: String,
        /// Rule that decided
        rule: Rule,
        /// Outcome label (`passed`, `failed`, `indeterminable`)
        outcome: &'static str,
        /// Local tag in quoted form, when one was derived
        local_tag: Option<String>,
    },
    /// A wildcard was refused on a mutating request
    WildcardRejected {
        /// Request method
        method: String,
        /// Header that carried the wildcard
        header: &'static str,
    },
}

/// Capability for recording evaluator events.
pub trait PreconditionObserver: Send + Sync {
    /// Record a single event.
    fn record(&self, event: &PreconditionEvent);
}

/// Emits events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PreconditionObserver for TracingObserver {
    fn record(&self, event: &PreconditionEvent) {
        match event {
            PreconditionEvent::Decided {
                method,
                rule,
                outcome,
                local_tag,
            } => {
                tracing::debug!(
                    method = %method,
                    rule = %rule,
                    outcome = %outcome,
                    local_tag = local_tag.as_deref().unwrap_or("-"),
                    "Precondition evaluated"
                );
            }
            PreconditionEvent::WildcardRejected { method, header } => {
                tracing::warn!(
                    method = %method,
                    header = %header,
                    "Wildcard precondition rejected"
                );
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PreconditionObserver for NoopObserver {
    fn record(&self, _event: &PreconditionEvent) {}
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Collects events for assertions.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingObserver {
        pub(crate) events: Mutex<Vec<PreconditionEvent>>,
    }

    impl RecordingObserver {
        pub(crate) fn take(&self) -> Vec<PreconditionEvent> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }
    }

    impl PreconditionObserver for RecordingObserver {
        fn record(&self, event: &PreconditionEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }
}
