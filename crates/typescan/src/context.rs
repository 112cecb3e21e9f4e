//! The mutable cell behind one (type, scope) pair.

use smallvec::SmallVec;

use crate::detection::DetectionResult;
use crate::error::ScanError;
use crate::reason::SignalTarget;
use crate::requirements::DetectionRequirements;
use crate::scope::Scope;
use crate::signal::Signal;
use crate::type_id::TypeIdentifier;

/// What a requirement change means for the owning state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredAction {
    NothingChanged,
    RequirementsChanged,
    Unreasoned,
}

/// Per-(type, scope) state shared by every state of one definition.
///
/// Signals dispatched from inside a transition are buffered here and picked
/// up by the store once the transition returns; a context never holds a
/// reference back into the processor.
#[derive(Debug, Clone)]
pub struct Context<T> {
    type_id: TypeIdentifier,
    scope: Scope,
    requirements: DetectionRequirements,
    manually_configured_result: Option<T>,
    detection_result: Option<DetectionResult<T>>,
    outbox: SmallVec<[Signal; 4]>,
}

impl<T> Context<T> {
    pub fn new(type_id: TypeIdentifier, scope: Scope, requirements: DetectionRequirements) -> Self {
        Self {
            type_id,
            scope,
            requirements,
            manually_configured_result: None,
            detection_result: None,
            outbox: SmallVec::new(),
        }
    }

    pub fn type_id(&self) -> &TypeIdentifier {
        &self.type_id
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn target(&self) -> SignalTarget {
        SignalTarget::new(self.type_id.clone(), self.scope.clone())
    }

    pub fn detection_requirements(&self) -> &DetectionRequirements {
        &self.requirements
    }

    /// Pins the result; the detector will not be consulted for this context.
    pub fn set_manually_configured_result(&mut self, result: T) {
        self.manually_configured_result = Some(result);
    }

    pub fn manually_configured_result(&self) -> Option<&T> {
        self.manually_configured_result.as_ref()
    }

    pub fn detection_result(&self) -> Option<&DetectionResult<T>> {
        self.detection_result.as_ref()
    }

    pub(crate) fn set_detection_result(&mut self, result: DetectionResult<T>) {
        self.detection_result = Some(result);
    }

    pub fn dispatch(&mut self, signal: Signal) {
        self.outbox.push(signal);
    }

    pub(crate) fn take_dispatched(&mut self) -> SmallVec<[Signal; 4]> {
        std::mem::take(&mut self.outbox)
    }

    /// Replace the requirements with `reducer`'s output and classify the change.
    pub(crate) fn change_requirements<F>(&mut self, reducer: F) -> Result<RequiredAction, ScanError>
    where
        F: FnOnce(&DetectionRequirements) -> Result<DetectionRequirements, ScanError>,
    {
        let new_requirements = reducer(&self.requirements)?;
        let old_requirements = std::mem::replace(&mut self.requirements, new_requirements);
        if self.requirements.is_unreasoned() {
            return Ok(RequiredAction::Unreasoned);
        }
        if self.requirements.has_changed(&old_requirements) {
            Ok(RequiredAction::RequirementsChanged)
        } else {
            Ok(RequiredAction::NothingChanged)
        }
    }
}
