//! # Typescan Testing
//!
//! Fixtures for exercising a [`Processor`](typescan_core::Processor) without a
//! real host type system.
//!
//! - [`Definition`]: a payload naming its own dependencies
//! - [`MapDetector`]: detects from a table, fails for everything else
//! - [`DependencyResolver`]: turns dependencies into `AddReason` signals in the
//!   dependent's scope
//! - [`RecordingOnCollectionError`]: keeps every failure it is handed
//!
//! ```ignore
//! let detector = MapDetector::new()
//!     .with(order.clone(), Definition::depending_on("order", [address.clone()]))
//!     .with(address.clone(), Definition::leaf("address"));
//! let errors = RecordingOnCollectionError::new();
//!
//! let results = processor.collect(&detector, &DependencyResolver::new(REGISTERED), &errors, &SummaryDescriber)?;
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use anyhow::Result;
use typescan_core::{
    DetectionRequirements, DetectionResult, Detector, FailureReport, Failures, OnCollectionError,
    Reason, Reports, RequirementName, Resolver, ScanError, Scope, Signal, StateLog, TypeIdentifier,
};

/// The usual primary requirement in tests.
pub const REGISTERED: RequirementName = RequirementName::new("registered");

/// A resolved value that knows what it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub value: String,
    pub dependencies: Vec<TypeIdentifier>,
}

impl Definition {
    pub fn leaf(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn depending_on(
        value: impl Into<String>,
        dependencies: impl IntoIterator<Item = TypeIdentifier>,
    ) -> Self {
        Self {
            value: value.into(),
            dependencies: dependencies.into_iter().collect(),
        }
    }
}

/// Detects types from a fixed table.
///
/// Types missing from the table are undetectable with the reason
/// `"unknown type <description>"`. Counts every call.
#[derive(Debug, Default)]
pub struct MapDetector {
    definitions: HashMap<TypeIdentifier, Definition>,
    calls: Cell<usize>,
}

impl MapDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, type_id: TypeIdentifier, definition: Definition) -> Self {
        self.definitions.insert(type_id, definition);
        self
    }

    /// Number of times the engine consulted this detector.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Detector<Definition> for MapDetector {
    fn detect(
        &self,
        type_id: &TypeIdentifier,
        _scope: &Scope,
        _requirements: &DetectionRequirements,
    ) -> Result<DetectionResult<Definition>> {
        self.calls.set(self.calls.get() + 1);
        Ok(match self.definitions.get(type_id) {
            Some(definition) => DetectionResult::success(definition.clone()),
            None => DetectionResult::failure(format!("unknown type {type_id}")),
        })
    }
}

/// Requires every dependency of a definition under `requirement`, in the
/// dependent's scope, because of the dependent.
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    requirement: RequirementName,
}

impl DependencyResolver {
    pub fn new(requirement: RequirementName) -> Self {
        Self { requirement }
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new(REGISTERED)
    }
}

impl Resolver<Definition> for DependencyResolver {
    fn resolve(
        &self,
        result: &Definition,
        type_id: &TypeIdentifier,
        scope: &Scope,
        _requirements: &DetectionRequirements,
    ) -> Result<Vec<Signal>> {
        Ok(result
            .dependencies
            .iter()
            .map(|dependency| {
                Signal::add_reason(
                    dependency.clone(),
                    scope.clone(),
                    self.requirement.clone(),
                    Reason::because_of(type_id.clone(), scope.clone()),
                )
            })
            .collect())
    }
}

/// Records what the engine reports and lets collection carry on.
#[derive(Debug, Default)]
pub struct RecordingOnCollectionError {
    calls: Cell<usize>,
    failures: RefCell<Vec<FailureReport>>,
    last_log: RefCell<Option<StateLog>>,
}

impl RecordingOnCollectionError {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many `collect()` calls ended with failures.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Every failure seen so far, across calls, in report order.
    pub fn failures(&self) -> Vec<FailureReport> {
        self.failures.borrow().clone()
    }

    pub fn last_log(&self) -> Option<StateLog> {
        self.last_log.borrow().clone()
    }
}

impl<T> OnCollectionError<T> for RecordingOnCollectionError {
    fn on_collection_error(
        &self,
        _results: &Reports<T>,
        log: &StateLog,
        failures: &Failures,
    ) -> Result<(), ScanError> {
        self.calls.set(self.calls.get() + 1);
        self.failures
            .borrow_mut()
            .extend(failures.values().flat_map(|by_scope| by_scope.values()).cloned());
        *self.last_log.borrow_mut() = Some(log.clone());
        Ok(())
    }
}
