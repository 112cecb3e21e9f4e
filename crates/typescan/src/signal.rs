//! Events consumed by the engine.

use std::fmt;

use serde::Serialize;

use crate::callbacks::Strategies;
use crate::error::ScanError;
use crate::reason::{Reason, SignalTarget};
use crate::requirements::{Removal, RequirementName};
use crate::scope::Scope;
use crate::state::StatefulDefinition;
use crate::type_id::TypeIdentifier;

/// One unit of work for the processor.
///
/// `AddReason` addresses a single target; everything else is global and is
/// applied to every live definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum Signal {
    AddReason {
        target: SignalTarget,
        requirement: RequirementName,
        reason: Reason,
    },
    RemoveReason {
        reason: Reason,
        removal: Removal,
    },
    Detect,
    Resolve,
}

impl Signal {
    pub fn add_reason(
        type_id: TypeIdentifier,
        scope: Scope,
        requirement: RequirementName,
        reason: Reason,
    ) -> Self {
        Signal::AddReason {
            target: SignalTarget::new(type_id, scope),
            requirement,
            reason,
        }
    }

    /// `add_reason` in the root scope.
    pub fn add_root_reason(type_id: TypeIdentifier, requirement: RequirementName, reason: Reason) -> Self {
        Signal::add_reason(type_id, Scope::root(), requirement, reason)
    }

    /// Removes one occurrence of `reason` from every requirement of every definition.
    pub fn remove_reason(reason: Reason) -> Self {
        Signal::RemoveReason {
            reason,
            removal: Removal::Once,
        }
    }

    /// Removes every occurrence of `reason` everywhere.
    pub fn remove_all(reason: Reason) -> Self {
        Signal::RemoveReason {
            reason,
            removal: Removal::All,
        }
    }

    pub fn target(&self) -> Option<&SignalTarget> {
        match self {
            Signal::AddReason { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn description(&self) -> String {
        match self {
            Signal::AddReason {
                target,
                requirement,
                ..
            } => format!("add {requirement} to {target}"),
            Signal::RemoveReason { reason, removal: Removal::Once } => {
                format!("remove requirements resulting from '{reason}'")
            }
            Signal::RemoveReason { reason, removal: Removal::All } => {
                format!("remove all requirements resulting from '{reason}'")
            }
            Signal::Detect => "detect".to_string(),
            Signal::Resolve => "resolve".to_string(),
        }
    }

    /// Route this signal to the matching transition of `definition`.
    pub(crate) fn handle_state<T: Clone>(
        &self,
        definition: &mut StatefulDefinition<T>,
        strategies: &Strategies<'_, T>,
    ) -> Result<(), ScanError> {
        match self {
            Signal::AddReason {
                requirement,
                reason,
                ..
            } => definition.change_requirements(|requirements| {
                requirements.add_reason(requirement, reason.clone())
            }),
            Signal::RemoveReason { reason, removal } => definition
                .change_requirements(|requirements| Ok(requirements.remove_reason(reason, *removal))),
            Signal::Detect => definition.detect(strategies.detector),
            Signal::Resolve => definition.resolve(strategies.resolver),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}
