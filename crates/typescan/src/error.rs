//! Error types for the resolution engine.
//!
//! Soft failures (a detector declining to produce a value) are *not* errors:
//! they end up as [`Report::Failure`](crate::Report::Failure) entries and are
//! handed to the caller's [`OnCollectionError`](crate::OnCollectionError).
//! Everything in [`ScanError`] is either configuration misuse, a callback
//! failure, or the round safety valve.

use thiserror::Error;

use crate::requirements::RequirementName;
use crate::state::State;

/// Errors raised by the engine.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A requirement name that is not part of the configured requirement set.
    #[error("requirement '{name}' is not configured")]
    UnknownRequirement { name: RequirementName },

    /// Neither a scoped factory nor the default factory applies to a target.
    #[error("no state factory applies to {target}")]
    NoApplicableFactory { target: String },

    /// A definition was still mid-flight when reports were collected.
    #[error("{target} is still in state {state} at collection time")]
    Unsettled { target: String, state: State },

    /// The detect/resolve loop did not reach a fixpoint in time.
    #[error("no fixpoint after {max_rounds} rounds ({pending} signals still pending)")]
    RoundLimitExceeded { max_rounds: usize, pending: usize },

    /// Raised by [`FailOnCollectionError`](crate::FailOnCollectionError).
    #[error("{failures} definition(s) could not be resolved:\n{message}")]
    CollectionFailed { failures: usize, message: String },

    /// A detector or resolver failed. Propagated unchanged.
    #[error("callback failed: {0}")]
    Callback(#[source] anyhow::Error),
}

/// Callback errors that wrap a [`ScanError`] (a detector calling
/// `requirements.requires(..)?`, say) come back as that error, so
/// configuration misuse stays recognisable.
impl From<anyhow::Error> for ScanError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ScanError>() {
            Ok(scan) => scan,
            Err(err) => ScanError::Callback(err),
        }
    }
}

impl ScanError {
    /// Whether this error stems from how the engine was configured rather
    /// than from the data it processed.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ScanError::UnknownRequirement { .. } | ScanError::NoApplicableFactory { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_requirement_names_the_requirement() {
        let err = ScanError::UnknownRequirement {
            name: RequirementName::new("serializable"),
        };
        assert_eq!(err.to_string(), "requirement 'serializable' is not configured");
        assert!(err.is_configuration_error());
    }

    #[test]
    fn callback_errors_keep_their_message() {
        let err: ScanError = anyhow::anyhow!("detector exploded").into();
        assert_eq!(err.to_string(), "callback failed: detector exploded");
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn engine_errors_raised_inside_callbacks_are_unwrapped() {
        let inner = ScanError::UnknownRequirement {
            name: RequirementName::new("serializable"),
        };
        let err: ScanError = anyhow::Error::from(inner).into();

        assert!(matches!(err, ScanError::UnknownRequirement { .. }));
        assert!(err.is_configuration_error());
    }
}
