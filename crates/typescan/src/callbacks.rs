//! Pluggable strategies the engine calls out to.
//!
//! The engine never decides what a "type" is. A [`Detector`] produces the
//! value for a key, a [`Resolver`] discovers what that value depends on.
//! Both may fail hard with an `anyhow::Error`; the engine propagates such
//! errors out of `collect()` as [`ScanError::Callback`](crate::ScanError::Callback),
//! unless the error is itself a [`ScanError`](crate::ScanError), which is
//! passed through as is.

use anyhow::Result;

use crate::detection::DetectionResult;
use crate::requirements::DetectionRequirements;
use crate::scope::Scope;
use crate::signal::Signal;
use crate::type_id::TypeIdentifier;

/// Produces the value for a (type, scope) under the given requirements.
pub trait Detector<T> {
    fn detect(
        &self,
        type_id: &TypeIdentifier,
        scope: &Scope,
        requirements: &DetectionRequirements,
    ) -> Result<DetectionResult<T>>;
}

impl<T, F> Detector<T> for F
where
    F: Fn(&TypeIdentifier, &Scope, &DetectionRequirements) -> Result<DetectionResult<T>>,
{
    fn detect(
        &self,
        type_id: &TypeIdentifier,
        scope: &Scope,
        requirements: &DetectionRequirements,
    ) -> Result<DetectionResult<T>> {
        self(type_id, scope, requirements)
    }
}

/// Turns a detected value into follow-up signals, typically
/// `AddReason` signals for the types it depends on.
pub trait Resolver<T> {
    fn resolve(
        &self,
        result: &T,
        type_id: &TypeIdentifier,
        scope: &Scope,
        requirements: &DetectionRequirements,
    ) -> Result<Vec<Signal>>;
}

impl<T, F> Resolver<T> for F
where
    F: Fn(&T, &TypeIdentifier, &Scope, &DetectionRequirements) -> Result<Vec<Signal>>,
{
    fn resolve(
        &self,
        result: &T,
        type_id: &TypeIdentifier,
        scope: &Scope,
        requirements: &DetectionRequirements,
    ) -> Result<Vec<Signal>> {
        self(result, type_id, scope, requirements)
    }
}

/// Human readable rendering of a requirement vector, for diagnostics.
pub trait RequirementsDescriber {
    fn describe(&self, requirements: &DetectionRequirements) -> String;
}

impl<F> RequirementsDescriber for F
where
    F: Fn(&DetectionRequirements) -> String,
{
    fn describe(&self, requirements: &DetectionRequirements) -> String {
        self(requirements)
    }
}

/// Describes requirements by their reason counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryDescriber;

impl RequirementsDescriber for SummaryDescriber {
    fn describe(&self, requirements: &DetectionRequirements) -> String {
        requirements.summary()
    }
}

/// The detector/resolver pair one collection run works with.
pub struct Strategies<'a, T> {
    pub detector: &'a dyn Detector<T>,
    pub resolver: &'a dyn Resolver<T>,
}

impl<'a, T> Strategies<'a, T> {
    pub fn new(detector: &'a dyn Detector<T>, resolver: &'a dyn Resolver<T>) -> Self {
        Self { detector, resolver }
    }
}
