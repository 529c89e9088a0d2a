//! Precondition evaluation.
//!
//! Mutating requests consult `If-Match`, then `If-None-Match`, then
//! `If-Unmodified-Since`. Read-only requests consult `If-None-Match`, then
//! `If-Modified-Since`. The first header present decides; when nothing usable
//! is present the caller's default is returned unchanged.

use chrono::{DateTime, Duration, Utc};
use http::{HeaderMap, Method};
use std::fmt;
use std::sync::Arc;

use crate::conditions::{RequestConditions, TagToken};
use crate::config::PreconditionConfig;
use crate::method::MethodClassifier;
use crate::observer::{PreconditionEvent, PreconditionObserver, Rule, TracingObserver};
use crate::tag::{self, TagSource};
use crate::{PreconditionError, PreconditionResult, Result, VersionDescriptor};

/// Tolerance for timestamp comparisons. HTTP dates have one second resolution.
pub const DEFAULT_TOLERANCE_MS: i64 = 1000;

/// Decides whether a request may proceed given the resource's current version.
///
/// Holds no mutable state and can be shared across threads.
#[derive(Clone)]
pub struct PreconditionEvaluator {
    classifier: MethodClassifier,
    tolerance: Duration,
    observer: Arc<dyn PreconditionObserver>,
}

impl Default for PreconditionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PreconditionEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreconditionEvaluator")
            .field("classifier", &self.classifier)
            .field("tolerance_ms", &self.tolerance.num_milliseconds())
            .finish_non_exhaustive()
    }
}

impl PreconditionEvaluator {
    /// Evaluator with the standard method set, a one second tolerance and
    /// tracing output.
    pub fn new() -> Self {
        Self {
            classifier: MethodClassifier::default(),
            tolerance: Duration::milliseconds(DEFAULT_TOLERANCE_MS),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Evaluator configured from a validated configuration.
    pub fn from_config(config: &PreconditionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new()
            .with_classifier(config.classifier())
            .with_tolerance(Duration::milliseconds(config.timestamp_tolerance_ms)))
    }

    /// Replace the method classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: MethodClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace the timestamp tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Replace the event observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn PreconditionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The method classifier in use.
    pub fn classifier(&self) -> &MethodClassifier {
        &self.classifier
    }

    /// Evaluate `conditions` for `method` against `local`.
    ///
    /// `default` is returned unchanged when no header and version data
    /// combination is usable. A wildcard in `If-Match` or `If-None-Match` on
    /// a mutating request is refused with
    /// [`PreconditionError::UnsupportedWildcard`] whatever the local state.
    pub fn evaluate(
        &self,
        conditions: &RequestConditions,
        method: &str,
        default: &PreconditionResult,
        local: &VersionDescriptor,
    ) -> Result<PreconditionResult> {
        let mutating = self.classifier.is_mutating(method)?;

        if mutating {
            self.reject_wildcards(conditions, method)?;
        }

        let local_tag = tag::derive(&TagSource::Descriptor(local))
            .ok()
            .map(|etag| etag.to_quoted());

        let decision = local_tag.as_deref().and_then(|quoted| {
            if mutating {
                self.decide_mutating(conditions, quoted, local)
            } else {
                self.decide_read(conditions, quoted, local)
            }
        });

        let (rule, result) = decision.unwrap_or_else(|| (Rule::Default, default.clone()));

        self.observer.record(&PreconditionEvent::Decided {
            method: method.to_string(),
            rule,
            outcome: result.kind(),
            local_tag,
        });

        Ok(result)
    }

    /// Evaluate using the classifier's default for `method`.
    pub fn evaluate_with_method_default(
        &self,
        conditions: &RequestConditions,
        method: &str,
        local: &VersionDescriptor,
    ) -> Result<PreconditionResult> {
        let default = self.classifier.default_result_for_method(method)?;
        self.evaluate(conditions, method, &default, local)
    }

    /// Parse conditional headers and evaluate with the method default.
    pub fn evaluate_request(
        &self,
        headers: &HeaderMap,
        method: &Method,
        local: &VersionDescriptor,
    ) -> Result<PreconditionResult> {
        let conditions = RequestConditions::from_headers(headers);
        self.evaluate_with_method_default(&conditions, method.as_str(), local)
    }

    fn reject_wildcards(&self, conditions: &RequestConditions, method: &str) -> Result<()> {
        let header = if !conditions.if_match.is_empty() {
            has_wildcard(&conditions.if_match).then_some(Rule::IfMatch.as_str())
        } else {
            has_wildcard(&conditions.if_none_match).then_some(Rule::IfNoneMatch.as_str())
        };

        match header {
            Some(header) => {
                self.observer.record(&PreconditionEvent::WildcardRejected {
                    method: method.to_string(),
                    header,
                });
                Err(PreconditionError::UnsupportedWildcard { header })
            }
            None => Ok(()),
        }
    }

    fn decide_mutating(
        &self,
        conditions: &RequestConditions,
        local_tag: &str,
        local: &VersionDescriptor,
    ) -> Option<(Rule, PreconditionResult)> {
        if !conditions.if_match.is_empty() {
            let result = if any_matches(&conditions.if_match, local_tag) {
                PreconditionResult::Passed
            } else {
                PreconditionResult::precondition_failed("No If-Match entity tag matches the current version")
            };
            return Some((Rule::IfMatch, result));
        }

        if !conditions.if_none_match.is_empty() {
            let result = if any_matches(&conditions.if_none_match, local_tag) {
                PreconditionResult::precondition_failed("An If-None-Match entity tag matches the current version")
            } else {
                PreconditionResult::Passed
            };
            return Some((Rule::IfNoneMatch, result));
        }

        if let (Some(client), Some(modified)) = (conditions.if_unmodified_since, local.modified_on) {
            let result = if self.almost_equal(client, modified) {
                PreconditionResult::Passed
            } else {
                PreconditionResult::precondition_failed("Resource was modified after If-Unmodified-Since")
            };
            return Some((Rule::IfUnmodifiedSince, result));
        }

        None
    }

    fn decide_read(
        &self,
        conditions: &RequestConditions,
        local_tag: &str,
        local: &VersionDescriptor,
    ) -> Option<(Rule, PreconditionResult)> {
        if !conditions.if_none_match.is_empty() {
            let result = if any_matches(&conditions.if_none_match, local_tag) {
                PreconditionResult::not_modified("Client has the current version")
            } else {
                PreconditionResult::Passed
            };
            return Some((Rule::IfNoneMatch, result));
        }

        if let (Some(client), Some(modified)) = (conditions.if_modified_since, local.modified_on) {
            let result = if self.significantly_after(modified, client) {
                PreconditionResult::Passed
            } else {
                PreconditionResult::not_modified("Resource not modified since If-Modified-Since")
            };
            return Some((Rule::IfModifiedSince, result));
        }

        None
    }

    fn almost_equal(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        let diff = a - b;
        diff < self.tolerance && diff > -self.tolerance
    }

    fn significantly_after(&self, later: DateTime<Utc>, earlier: DateTime<Utc>) -> bool {
        later - earlier > self.tolerance
    }
}

fn has_wildcard(tokens: &[TagToken]) -> bool {
    tokens.iter().any(TagToken::is_any)
}

fn any_matches(tokens: &[TagToken], local_tag: &str) -> bool {
    tokens.iter().any(|token| token.matches(local_tag))
}
