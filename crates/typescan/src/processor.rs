//! Drives pending signals to a fixpoint and collects the results.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::callbacks::{Detector, RequirementsDescriber, Resolver, Strategies};
use crate::error::ScanError;
use crate::factory::StateFactories;
use crate::log::{StateLog, StateLogBuilder};
use crate::reason::Reason;
use crate::report::{Definitions, Failures, Report, Reports};
use crate::requirements::RequirementName;
use crate::scope::Scope;
use crate::signal::Signal;
use crate::states::States;
use crate::type_id::TypeIdentifier;

/// Default cap on detect/resolve rounds per `collect()` call.
pub const DEFAULT_MAX_ROUNDS: usize = 10_000;

/// Called once per `collect()` when at least one definition failed.
///
/// Returning an error aborts the collection with that error; returning
/// `Ok(())` lets the caller carry on with the successes.
pub trait OnCollectionError<T> {
    fn on_collection_error(
        &self,
        results: &Reports<T>,
        log: &StateLog,
        failures: &Failures,
    ) -> Result<(), ScanError>;
}

impl<T, F> OnCollectionError<T> for F
where
    F: Fn(&Reports<T>, &StateLog, &Failures) -> Result<(), ScanError>,
{
    fn on_collection_error(
        &self,
        results: &Reports<T>,
        log: &StateLog,
        failures: &Failures,
    ) -> Result<(), ScanError> {
        self(results, log, failures)
    }
}

/// Turns any failure into [`ScanError::CollectionFailed`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FailOnCollectionError;

impl<T> OnCollectionError<T> for FailOnCollectionError {
    fn on_collection_error(
        &self,
        _results: &Reports<T>,
        _log: &StateLog,
        failures: &Failures,
    ) -> Result<(), ScanError> {
        let reports: Vec<String> = failures
            .values()
            .flat_map(|by_scope| by_scope.values())
            .map(|failure| failure.message())
            .collect();
        Err(ScanError::CollectionFailed {
            failures: reports.len(),
            message: reports.join("\n"),
        })
    }
}

/// Logs failures and keeps going.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreCollectionErrors;

impl<T> OnCollectionError<T> for IgnoreCollectionErrors {
    fn on_collection_error(
        &self,
        _results: &Reports<T>,
        _log: &StateLog,
        failures: &Failures,
    ) -> Result<(), ScanError> {
        for failure in failures.values().flat_map(|by_scope| by_scope.values()) {
            warn!(target = %failure.target, reasons = ?failure.reasons, "ignoring undetectable definition");
        }
        Ok(())
    }
}

/// Owns the store, the signal queue and the trace log of one resolution run.
///
/// Not meant to be shared: everything happens on the caller's thread, one
/// signal at a time, strictly in FIFO order.
pub struct Processor<T> {
    states: States<T>,
    pending: VecDeque<Signal>,
    log: StateLogBuilder,
    max_rounds: usize,
}

impl<T: Clone> Processor<T> {
    pub fn builder() -> ProcessorBuilder<T> {
        ProcessorBuilder::new()
    }

    /// Queue a signal. It is applied during the next `collect()`.
    pub fn dispatch(&mut self, signal: Signal) {
        self.pending.push_back(signal);
    }

    /// Queue the usual initial signal: `type_id` is required in `scope`
    /// because a caller asked for it.
    pub fn manually_add(&mut self, type_id: TypeIdentifier, scope: Scope, requirement: RequirementName) {
        self.dispatch(Signal::add_reason(type_id, scope, requirement, Reason::manually_added()));
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn states(&self) -> &States<T> {
        &self.states
    }

    pub fn log(&self) -> StateLog {
        self.log.build()
    }

    /// Run to a fixpoint, then partition the reports.
    ///
    /// `on_error` sees every non-empty report, the full trace and the
    /// failures whenever at least one definition is undetectable. Unless it
    /// returns an error, the successes are returned either way.
    pub fn collect<D, R, E, S>(
        &mut self,
        detector: &D,
        resolver: &R,
        on_error: &E,
        describer: &S,
    ) -> Result<Definitions<T>, ScanError>
    where
        D: Detector<T>,
        R: Resolver<T>,
        E: OnCollectionError<T> + ?Sized,
        S: RequirementsDescriber,
    {
        let strategies = Strategies::new(detector, resolver);
        self.resolve_to_fixpoint(&strategies)?;

        let reports = self.states.collect(describer)?;
        let mut definitions = Definitions::new();
        let mut failures = Failures::new();
        for (type_id, by_scope) in &reports {
            for (scope, report) in by_scope {
                match report {
                    Report::Success(result) => {
                        definitions
                            .entry(type_id.clone())
                            .or_default()
                            .insert(scope.clone(), result.clone());
                    }
                    Report::Failure(failure) => {
                        failures
                            .entry(type_id.clone())
                            .or_default()
                            .insert(scope.clone(), failure.clone());
                    }
                    Report::Empty => {}
                }
            }
        }

        info!(
            resolved = definitions.values().map(|by_scope| by_scope.len()).sum::<usize>(),
            failed = failures.values().map(|by_scope| by_scope.len()).sum::<usize>(),
            "collection finished"
        );
        if !failures.is_empty() {
            warn!(types = failures.len(), "collection contains undetectable definitions");
            on_error.on_collection_error(&reports, &self.log.build(), &failures)?;
        }
        Ok(definitions)
    }

    /// Drain the queue, then one global detect and one global resolve pass;
    /// repeat while resolution produced new signals.
    fn resolve_to_fixpoint(&mut self, strategies: &Strategies<'_, T>) -> Result<(), ScanError> {
        let mut round = 0;
        loop {
            if round >= self.max_rounds && !self.pending.is_empty() {
                return Err(ScanError::RoundLimitExceeded {
                    max_rounds: self.max_rounds,
                    pending: self.pending.len(),
                });
            }
            round += 1;
            debug!(round, pending = self.pending.len(), "starting resolution round");

            self.drain(strategies)?;
            for signal in [Signal::Detect, Signal::Resolve] {
                let dispatched = self.states.apply(&signal, strategies, &mut self.log)?;
                self.pending.extend(dispatched);
            }

            if self.pending.is_empty() {
                debug!(rounds = round, "reached fixpoint");
                return Ok(());
            }
        }
    }

    fn drain(&mut self, strategies: &Strategies<'_, T>) -> Result<(), ScanError> {
        while let Some(signal) = self.pending.pop_front() {
            let dispatched = self.states.apply(&signal, strategies, &mut self.log)?;
            self.pending.extend(dispatched);
        }
        Ok(())
    }
}

/// Configures a [`Processor`].
pub struct ProcessorBuilder<T> {
    factories: StateFactories<T>,
    primary: Vec<RequirementName>,
    secondary: Vec<RequirementName>,
    max_rounds: usize,
}

impl<T> Default for ProcessorBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ProcessorBuilder<T> {
    pub fn new() -> Self {
        Self {
            factories: StateFactories::default(),
            primary: Vec::new(),
            secondary: Vec::new(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// A requirement that keeps a definition alive on its own.
    pub fn primary_requirement(mut self, name: RequirementName) -> Self {
        self.primary.push(name);
        self
    }

    /// A requirement that is tracked but never keeps a definition alive.
    pub fn secondary_requirement(mut self, name: RequirementName) -> Self {
        self.secondary.push(name);
        self
    }

    pub fn state_factories(mut self, factories: StateFactories<T>) -> Self {
        self.factories = factories;
        self
    }

    /// Cap on detect/resolve rounds per `collect()` call. The cap only trips
    /// while signals are still pending, so an idle collection always succeeds.
    pub fn max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }
}

impl<T: Clone> ProcessorBuilder<T> {
    pub fn build(self) -> Processor<T> {
        Processor {
            states: States::new(self.factories, self.primary, self.secondary),
            pending: VecDeque::new(),
            log: StateLogBuilder::new(),
            max_rounds: self.max_rounds,
        }
    }
}
