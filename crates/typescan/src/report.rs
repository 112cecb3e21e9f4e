//! What final collection hands back per (type, scope).

use std::collections::BTreeMap;
use std::fmt;

use crate::reason::SignalTarget;
use crate::requirements::DetectionRequirements;
use crate::scope::Scope;
use crate::type_id::TypeIdentifier;

/// A successfully resolved value and the requirements it was resolved under.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionResult<T> {
    pub definition: T,
    pub requirements: DetectionRequirements,
}

/// Why one definition could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub target: SignalTarget,
    /// Reasons given by the detector.
    pub reasons: Vec<String>,
    /// The describer's rendering of the active requirements.
    pub requirements: String,
    /// Rendered causal chains of every reason the definition was required for.
    pub causes: Vec<String>,
}

impl FailureReport {
    pub fn message(&self) -> String {
        let mut message = format!("{}: [{}]", self.target, self.reasons.join(", "));
        message.push_str(&format!("\n  requirements: {}", self.requirements));
        for cause in &self.causes {
            message.push_str(&format!("\n  because: {cause}"));
        }
        message
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Final state of one definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Report<T> {
    /// Never required; filtered out of every result map.
    Empty,
    Success(CollectionResult<T>),
    Failure(FailureReport),
}

impl<T> Report<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Report::Empty)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Report::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Report::Failure(_))
    }
}

/// Results keyed by type, then by the scope they were resolved in.
pub type ByScope<V> = BTreeMap<TypeIdentifier, BTreeMap<Scope, V>>;

/// Successfully resolved definitions.
pub type Definitions<T> = ByScope<CollectionResult<T>>;

/// Every non-empty report, success and failure alike.
pub type Reports<T> = ByScope<Report<T>>;

/// Only the failures.
pub type Failures = ByScope<FailureReport>;
