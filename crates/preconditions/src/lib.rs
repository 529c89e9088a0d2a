//! HTTP conditional request evaluation for FoodShare.
//!
//! This crate provides:
//! - Entity tag derivation from row versions and modification times
//! - Order-independent aggregation of many versions into one tag
//! - `If-Match` / `If-None-Match` / `If-Modified-Since` /
//!   `If-Unmodified-Since` evaluation for read and mutating methods
//! - `ETag` / `Last-Modified` response validators
//!
//! # Example
//!
//! ```rust
//! use foodshare_preconditions::{PreconditionEvaluator, RequestConditions, VersionDescriptor};
//!
//! let local = VersionDescriptor::from_row_version([1, 2, 3, 4, 5, 6, 7, 8]);
//! let conditions = RequestConditions::new().with_if_match("\"0102030405060708\"");
//!
//! let evaluator = PreconditionEvaluator::new();
//! let result = evaluator
//!     .evaluate_with_method_default(&conditions, "PUT", &local)
//!     .unwrap();
//! assert!(result.is_passed());
//! ```

#![warn(missing_docs)]

mod aggregate;
pub mod conditions;
mod config;
mod descriptor;
mod error;
mod evaluator;
pub mod http_date;
pub mod method;
pub mod observer;
mod result;
pub mod tag;
mod validators;

pub use aggregate::{aggregate_descriptors, aggregate_timestamps, AggregatePrecondition};
pub use conditions::{RequestConditions, TagToken};
pub use config::PreconditionConfig;
pub use descriptor::VersionDescriptor;
pub use error::{PreconditionError, Result};
pub use evaluator::{PreconditionEvaluator, DEFAULT_TOLERANCE_MS};
pub use method::{DefaultBehavior, MethodClassifier, READ_ONLY_METHODS};
pub use observer::{NoopObserver, PreconditionEvent, PreconditionObserver, TracingObserver};
pub use result::PreconditionResult;
pub use tag::{EntityTag, TagSource};
pub use validators::ResponseValidators;
