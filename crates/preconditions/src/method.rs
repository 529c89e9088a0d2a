//! HTTP method classification and default outcomes.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::{PreconditionError, PreconditionResult, Result};

/// Methods that never change server state.
///
/// Anything not listed here, including unrecognized verbs, is treated as
/// mutating.
pub const READ_ONLY_METHODS: &[&str] = &["GET", "HEAD", "OPTIONS", "CONNECT", "TRACE"];

/// Outcome to use when preconditions cannot be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultBehavior {
    /// Continue as if the preconditions held
    Pass,
    /// Refuse with 412
    Fail,
    /// Refuse with 400, marked indeterminable
    BadRequest,
    /// Refuse with 428, marked indeterminable
    PreconditionRequired,
}

impl DefaultBehavior {
    /// The result this behavior stands for.
    pub fn to_result(self) -> PreconditionResult {
        match self {
            Self::Pass => PreconditionResult::Passed,
            Self::Fail => PreconditionResult::precondition_failed(
                "Preconditions could not be evaluated",
            ),
            Self::BadRequest => PreconditionResult::indeterminable(
                StatusCode::BAD_REQUEST,
                "Not enough information to evaluate preconditions",
            ),
            Self::PreconditionRequired => PreconditionResult::indeterminable(
                StatusCode::PRECONDITION_REQUIRED,
                "A conditional header is required for this request",
            ),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::BadRequest => "bad_request",
            Self::PreconditionRequired => "precondition_required",
        }
    }
}

impl fmt::Display for DefaultBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DefaultBehavior {
    type Err = PreconditionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "pass" => Ok(Self::Pass),
            "fail" => Ok(Self::Fail),
            "bad_request" | "400" => Ok(Self::BadRequest),
            "precondition_required" | "428" => Ok(Self::PreconditionRequired),
            other => Err(PreconditionError::invalid_argument(format!(
                "unknown default behavior: {}",
                other
            ))),
        }
    }
}

/// Classifies method tokens as read-only or mutating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodClassifier {
    read_only: BTreeSet<String>,
    mutating_default: DefaultBehavior,
    read_only_default: DefaultBehavior,
}

impl Default for MethodClassifier {
    fn default() -> Self {
        Self::new(READ_ONLY_METHODS.iter().copied())
    }
}

impl MethodClassifier {
    /// Classifier with a custom read-only set and the standard defaults.
    pub fn new<I, S>(read_only: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            read_only: read_only
                .into_iter()
                .map(|m| m.as_ref().trim().to_ascii_uppercase())
                .collect(),
            mutating_default: DefaultBehavior::Fail,
            read_only_default: DefaultBehavior::Pass,
        }
    }

    /// Override the default for mutating methods.
    #[must_use]
    pub fn with_mutating_default(mut self, behavior: DefaultBehavior) -> Self {
        self.mutating_default = behavior;
        self
    }

    /// Override the default for read-only methods.
    #[must_use]
    pub fn with_read_only_default(mut self, behavior: DefaultBehavior) -> Self {
        self.read_only_default = behavior;
        self
    }

    /// Methods classified as read-only.
    pub fn read_only_methods(&self) -> impl Iterator<Item = &str> {
        self.read_only.iter().map(String::as_str)
    }

    /// Whether `method` may change server state.
    ///
    /// Method tokens are compared case-insensitively.
    pub fn is_mutating(&self, method: &str) -> Result<bool> {
        let method = method.trim();
        if method.is_empty() {
            return Err(PreconditionError::invalid_argument("method must not be blank"));
        }
        Ok(!self.read_only.contains(&method.to_ascii_uppercase()))
    }

    /// Default behavior for `method`.
    pub fn default_behavior(&self, method: &str) -> Result<DefaultBehavior> {
        if self.is_mutating(method)? {
            Ok(self.mutating_default)
        } else {
            Ok(self.read_only_default)
        }
    }

    /// Default result for `method`: pass for reads, fail for mutations
    /// unless overridden.
    pub fn default_result_for_method(&self, method: &str) -> Result<PreconditionResult> {
        self.default_behavior(method).map(DefaultBehavior::to_result)
    }
}

/// Whether `method` is mutating under the standard read-only set.
pub fn is_mutating(method: &str) -> Result<bool> {
    MethodClassifier::default().is_mutating(method)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_methods() {
        let classifier = MethodClassifier::default();
        for method in READ_ONLY_METHODS {
            assert!(!classifier.is_mutating(method).unwrap(), "{method}");
        }
    }

    #[test]
    fn test_mutating_methods() {
        let classifier = MethodClassifier::default();
        for method in ["PUT", "POST", "DELETE", "PATCH", "PROPFIND", "BREW"] {
            assert!(classifier.is_mutating(method).unwrap(), "{method}");
        }
    }

    #[test]
    fn test_case_insensitive() {
        assert!(!is_mutating("get").unwrap());
        assert!(is_mutating("put").unwrap());
    }

    #[test]
    fn test_blank_method_rejected() {
        assert!(matches!(is_mutating(""), Err(PreconditionError::InvalidArgument(_))));
        assert!(is_mutating("   ").is_err());
    }

    #[test]
    fn test_custom_read_only_set() {
        let classifier = MethodClassifier::new(["get", "HEAD", "OPTIONS", " CONNECT "]);
        assert_eq!(
            classifier.read_only_methods().collect::<Vec<_>>(),
            vec!["CONNECT", "GET", "HEAD", "OPTIONS"]
        );
        assert!(classifier.is_mutating("TRACE").unwrap());
        assert!(!classifier.is_mutating("GET").unwrap());
    }

    #[test]
    fn test_default_results() {
        let classifier = MethodClassifier::default();
        assert_eq!(
            classifier.default_result_for_method("GET").unwrap(),
            PreconditionResult::Passed
        );
        let put = classifier.default_result_for_method("PUT").unwrap();
        assert_eq!(put.status(), Some(StatusCode::PRECONDITION_FAILED));
        assert!(put.is_failed());
    }

    #[test]
    fn test_overridden_default() {
        let classifier = MethodClassifier::default()
            .with_mutating_default(DefaultBehavior::PreconditionRequired);
        let result = classifier.default_result_for_method("DELETE").unwrap();
        assert!(result.is_indeterminable());
        assert_eq!(result.status(), Some(StatusCode::PRECONDITION_REQUIRED));
    }

    #[test]
    fn test_behavior_from_str() {
        assert_eq!("bad-request".parse::<DefaultBehavior>().unwrap(), DefaultBehavior::BadRequest);
        assert_eq!("428".parse::<DefaultBehavior>().unwrap(), DefaultBehavior::PreconditionRequired);
        assert!("maybe".parse::<DefaultBehavior>().is_err());
    }
}
