//! The per-(type, scope) state machine.
//!
//! ```text
//!                 reasoned               success
//!  Unreasoned ───────────────► ToBeDetected ──────► Resolving ──resolve──► Resolved
//!      ▲                          │  ▲                                        │
//!      │                  failure │  │ requirements changed                   │
//!      │                          ▼  │                                        │
//!      │                       Undetectable                                   │
//!      │                                                                      │
//!      └──────────── unreasoned (from anywhere; Resolved retracts first) ─────┘
//! ```
//!
//! Requirement changes go through [`State::on_requirements_change`], a pure
//! transition table. Detection and resolution only act on `ToBeDetected`
//! and `Resolving` respectively and are no-ops in every other state.

use std::fmt;

use serde::Serialize;

use crate::callbacks::{Detector, RequirementsDescriber, Resolver};
use crate::context::{Context, RequiredAction};
use crate::detection::DetectionResult;
use crate::error::ScanError;
use crate::reason::{Reason, SignalTarget, SubReasonProvider};
use crate::report::{CollectionResult, FailureReport, Report};
use crate::requirements::DetectionRequirements;
use crate::scope::Scope;
use crate::signal::Signal;
use crate::type_id::TypeIdentifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum State {
    /// No primary requirement is active.
    Unreasoned,
    /// Waiting for the next detect pass.
    ToBeDetected,
    /// The detector declined; terminal until the requirements change.
    Undetectable,
    /// Detected, dependencies not yet resolved.
    Resolving,
    Resolved,
}

/// Outcome of one requirement change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: State,
    /// Remove every reason this definition put on its dependencies before
    /// moving on.
    pub retract_dependents: bool,
}

impl Transition {
    const fn to(next: State) -> Self {
        Transition {
            next,
            retract_dependents: false,
        }
    }

    const fn retracting(next: State) -> Self {
        Transition {
            next,
            retract_dependents: true,
        }
    }
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            State::Unreasoned => "Unreasoned",
            State::ToBeDetected => "ToBeDetected",
            State::Undetectable => "Undetectable",
            State::Resolving => "Resolving",
            State::Resolved => "Resolved",
        }
    }

    pub fn on_requirements_change(self, action: RequiredAction) -> Transition {
        match (self, action) {
            (state, RequiredAction::NothingChanged) => Transition::to(state),
            (State::Resolved, RequiredAction::RequirementsChanged) => {
                Transition::retracting(State::ToBeDetected)
            }
            (State::Resolved, RequiredAction::Unreasoned) => {
                Transition::retracting(State::Unreasoned)
            }
            (_, RequiredAction::RequirementsChanged) => Transition::to(State::ToBeDetected),
            (_, RequiredAction::Unreasoned) => Transition::to(State::Unreasoned),
        }
    }

    /// Whether a definition in this state can still move without a new
    /// requirement change.
    pub fn is_settled(&self) -> bool {
        !matches!(self, State::ToBeDetected | State::Resolving)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One state machine instance and the context it owns.
#[derive(Debug, Clone)]
pub struct StatefulDefinition<T> {
    state: State,
    context: Context<T>,
}

impl<T: Clone> StatefulDefinition<T> {
    pub fn new(context: Context<T>) -> Self {
        Self {
            state: State::Unreasoned,
            context,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn context(&self) -> &Context<T> {
        &self.context
    }

    pub(crate) fn context_mut(&mut self) -> &mut Context<T> {
        &mut self.context
    }

    pub fn type_id(&self) -> &TypeIdentifier {
        self.context.type_id()
    }

    pub fn scope(&self) -> &Scope {
        self.context.scope()
    }

    /// Same type, and our scope contains the target's.
    pub fn matches(&self, target: &SignalTarget) -> bool {
        self.type_id() == &target.type_id && self.scope().contains(&target.scope)
    }

    pub fn change_requirements<F>(&mut self, reducer: F) -> Result<(), ScanError>
    where
        F: FnOnce(&DetectionRequirements) -> Result<DetectionRequirements, ScanError>,
    {
        let action = self.context.change_requirements(reducer)?;
        let transition = self.state.on_requirements_change(action);
        if transition.retract_dependents {
            let transitive = Reason::because_of(self.type_id().clone(), self.scope().clone());
            self.context.dispatch(Signal::remove_all(transitive));
        }
        self.state = transition.next;
        Ok(())
    }

    pub fn detect(&mut self, detector: &dyn Detector<T>) -> Result<(), ScanError> {
        if self.state != State::ToBeDetected {
            return Ok(());
        }
        let result = match self.context.manually_configured_result() {
            Some(result) => DetectionResult::success(result.clone()),
            None => detector.detect(
                self.context.type_id(),
                self.context.scope(),
                self.context.detection_requirements(),
            )?,
        };
        self.state = if result.is_failure() {
            State::Undetectable
        } else {
            State::Resolving
        };
        self.context.set_detection_result(result);
        Ok(())
    }

    pub fn resolve(&mut self, resolver: &dyn Resolver<T>) -> Result<(), ScanError> {
        if self.state != State::Resolving {
            return Ok(());
        }
        let Some(DetectionResult::Success(result)) = self.context.detection_result() else {
            return Err(self.unsettled());
        };
        let signals = resolver.resolve(
            result,
            self.context.type_id(),
            self.context.scope(),
            self.context.detection_requirements(),
        )?;
        for signal in signals {
            self.context.dispatch(signal);
        }
        self.state = State::Resolved;
        Ok(())
    }

    /// The final report for this definition.
    pub fn definition<P>(
        &self,
        describer: &dyn RequirementsDescriber,
        provider: &P,
    ) -> Result<Report<T>, ScanError>
    where
        P: SubReasonProvider + ?Sized,
    {
        let requirements = self.context.detection_requirements();
        match (self.state, self.context.detection_result()) {
            (State::Unreasoned, _) => Ok(Report::Empty),
            (State::Resolved, Some(DetectionResult::Success(result))) => {
                Ok(Report::Success(CollectionResult {
                    definition: result.clone(),
                    requirements: requirements.clone(),
                }))
            }
            (State::Undetectable, Some(DetectionResult::Failure(reasons))) => {
                let causes = requirements
                    .all_reasons()
                    .flat_map(|reason| reason.render(provider))
                    .collect();
                Ok(Report::Failure(FailureReport {
                    target: self.context.target(),
                    reasons: reasons.clone(),
                    requirements: describer.describe(requirements),
                    causes,
                }))
            }
            _ => Err(self.unsettled()),
        }
    }

    fn unsettled(&self) -> ScanError {
        ScanError::Unsettled {
            target: self.context.target().description(),
            state: self.state,
        }
    }
}
