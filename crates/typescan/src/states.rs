//! The authoritative store of stateful definitions.
//!
//! Definitions live in an arena and are always looked up by (type, scope);
//! nothing outside the store holds on to one. Signals emitted by a transition
//! are collected from the contexts after each application and returned to
//! the caller, which owns the queue.

use tracing::{debug, trace};

use crate::callbacks::{RequirementsDescriber, Strategies};
use crate::context::Context;
use crate::error::ScanError;
use crate::factory::StateFactories;
use crate::log::{LoggedState, StateLogBuilder};
use crate::reason::{Reason, SignalTarget, SubReasonProvider};
use crate::report::Reports;
use crate::requirements::{DetectionRequirements, RequirementName};
use crate::signal::Signal;
use crate::state::StatefulDefinition;

pub struct States<T> {
    factories: StateFactories<T>,
    definitions: Vec<StatefulDefinition<T>>,
    primary: Vec<RequirementName>,
    secondary: Vec<RequirementName>,
}

impl<T: Clone> States<T> {
    pub fn new(
        factories: StateFactories<T>,
        primary: Vec<RequirementName>,
        secondary: Vec<RequirementName>,
    ) -> Self {
        Self {
            factories,
            definitions: Vec::new(),
            primary,
            secondary,
        }
    }

    pub fn definitions(&self) -> &[StatefulDefinition<T>] {
        &self.definitions
    }

    /// The definition living exactly at `target`, if any.
    pub fn get(&self, target: &SignalTarget) -> Option<&StatefulDefinition<T>> {
        self.definitions
            .iter()
            .find(|definition| definition.type_id() == &target.type_id && definition.scope() == &target.scope)
    }

    /// Apply `signal`, record the outcome in `log`, and return every signal
    /// the affected definitions dispatched, in order.
    pub fn apply(
        &mut self,
        signal: &Signal,
        strategies: &Strategies<'_, T>,
        log: &mut StateLogBuilder,
    ) -> Result<Vec<Signal>, ScanError> {
        match signal.target() {
            None => {
                for definition in &mut self.definitions {
                    signal.handle_state(definition, strategies)?;
                }
            }
            Some(target) => {
                self.ensure_definition(target)?;
                for definition in self
                    .definitions
                    .iter_mut()
                    .filter(|definition| definition.matches(target))
                {
                    signal.handle_state(definition, strategies)?;
                }
            }
        }

        let mut dispatched = Vec::new();
        for definition in &mut self.definitions {
            dispatched.extend(definition.context_mut().take_dispatched());
        }

        trace!(
            signal = %signal,
            definitions = self.definitions.len(),
            dispatched = dispatched.len(),
            "applied signal"
        );
        log.log(signal.description(), self.dump_for_logging());
        Ok(dispatched)
    }

    /// Create the best-placed definition for `target` unless an existing one
    /// matching it is at least as specific.
    fn ensure_definition(&mut self, target: &SignalTarget) -> Result<(), ScanError> {
        let placement = self.factories.place(target)?;
        let covered = self.definitions.iter().any(|definition| {
            definition.matches(target) && definition.scope().size() >= placement.specificity
        });
        if covered {
            return Ok(());
        }

        let requirements = DetectionRequirements::empty(&self.primary, &self.secondary);
        let mut context = Context::new(target.type_id.clone(), placement.scope.clone(), requirements);
        placement.factory.create(&target.type_id, &mut context);
        debug!(
            type_id = %target.type_id,
            scope = %placement.scope,
            specificity = placement.specificity,
            "created definition"
        );
        self.definitions.push(StatefulDefinition::new(context));
        Ok(())
    }

    /// Final report of every definition that was ever required.
    pub fn collect(&self, describer: &dyn RequirementsDescriber) -> Result<Reports<T>, ScanError> {
        let mut reports = Reports::new();
        for definition in &self.definitions {
            let report = definition.definition(describer, self)?;
            if report.is_empty() {
                continue;
            }
            reports
                .entry(definition.type_id().clone())
                .or_default()
                .insert(definition.scope().clone(), report);
        }
        Ok(reports)
    }

    fn dump_for_logging(&self) -> Vec<LoggedState> {
        self.definitions
            .iter()
            .map(|definition| LoggedState {
                type_description: definition.type_id().description(),
                scope: definition.scope().render(),
                state: definition.state(),
                requirements: definition.context().detection_requirements().summary(),
            })
            .collect()
    }
}

impl<T: Clone> SubReasonProvider for States<T> {
    /// Reasons of the definition at exactly `target`, falling back to the
    /// most specific definition matching it.
    fn reasons_for(&self, target: &SignalTarget) -> Vec<Reason> {
        let definition = self.get(target).or_else(|| {
            self.definitions
                .iter()
                .filter(|definition| definition.matches(target))
                .max_by_key(|definition| definition.scope().size())
        });
        definition
            .map(|definition| {
                definition
                    .context()
                    .detection_requirements()
                    .all_reasons()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}
