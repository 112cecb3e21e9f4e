//! Named demands and the reasons backing them.
//!
//! The set of [`RequirementName`]s is fixed when the processor is built and is
//! identical for every context. All updates are functional: they return a new
//! value and leave the receiver untouched.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::ScanError;
use crate::reason::Reason;

/// Name of one requirement, e.g. `registered` or `serializable`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RequirementName(Cow<'static, str>);

impl RequirementName {
    pub const fn new(name: &'static str) -> Self {
        RequirementName(Cow::Borrowed(name))
    }

    pub fn owned(name: impl Into<String>) -> Self {
        RequirementName(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequirementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How many occurrences of a reason a removal takes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Removal {
    /// One occurrence per requirement; the exact inverse of one addition.
    Once,
    /// Every occurrence.
    All,
}

/// One named demand, active while it has at least one reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionRequirement {
    name: RequirementName,
    reasons: Vec<Reason>,
    primary: bool,
}

impl DetectionRequirement {
    pub fn primary(name: RequirementName) -> Self {
        Self {
            name,
            reasons: Vec::new(),
            primary: true,
        }
    }

    pub fn secondary(name: RequirementName) -> Self {
        Self {
            name,
            reasons: Vec::new(),
            primary: false,
        }
    }

    pub fn is_required(&self) -> bool {
        !self.reasons.is_empty()
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn name(&self) -> &RequirementName {
        &self.name
    }

    pub fn reasons(&self) -> &[Reason] {
        &self.reasons
    }

    pub fn number_of_reasons(&self) -> usize {
        self.reasons.len()
    }

    pub fn add_reason(&self, reason: Reason) -> Self {
        let mut reasons = self.reasons.clone();
        reasons.push(reason);
        Self {
            reasons,
            ..self.clone()
        }
    }

    /// Removing an absent reason is a no-op. `Removal::Once` takes the most
    /// recently added occurrence so that add-then-remove restores the
    /// previous value exactly.
    pub fn remove_reason(&self, reason: &Reason, removal: Removal) -> Self {
        let mut reasons = self.reasons.clone();
        match removal {
            Removal::Once => {
                if let Some(index) = reasons.iter().rposition(|existing| existing == reason) {
                    reasons.remove(index);
                }
            }
            Removal::All => reasons.retain(|existing| existing != reason),
        }
        Self {
            reasons,
            ..self.clone()
        }
    }
}

/// The full demand vector of one context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionRequirements {
    requirements: Vec<DetectionRequirement>,
}

impl DetectionRequirements {
    /// Nothing required yet. Primary requirements come first, in the order given.
    pub fn empty(primary: &[RequirementName], secondary: &[RequirementName]) -> Self {
        let requirements = primary
            .iter()
            .cloned()
            .map(DetectionRequirement::primary)
            .chain(secondary.iter().cloned().map(DetectionRequirement::secondary))
            .collect();
        Self { requirements }
    }

    pub fn requires(&self, name: &RequirementName) -> Result<bool, ScanError> {
        Ok(self.requirement(name)?.is_required())
    }

    pub fn reasons_for(&self, name: &RequirementName) -> Result<&[Reason], ScanError> {
        Ok(self.requirement(name)?.reasons())
    }

    /// Every reason of every requirement, in requirement order.
    pub fn all_reasons(&self) -> impl Iterator<Item = &Reason> {
        self.requirements
            .iter()
            .flat_map(|requirement| requirement.reasons().iter())
    }

    pub fn add_reason(&self, name: &RequirementName, reason: Reason) -> Result<Self, ScanError> {
        let index = self.index_of(name)?;
        let mut requirements = self.requirements.clone();
        requirements[index] = requirements[index].add_reason(reason);
        Ok(Self { requirements })
    }

    pub fn remove_reason(&self, reason: &Reason, removal: Removal) -> Self {
        let requirements = self
            .requirements
            .iter()
            .map(|requirement| requirement.remove_reason(reason, removal))
            .collect();
        Self { requirements }
    }

    /// Compares activity only; reason counts do not matter.
    pub fn has_changed(&self, old: &DetectionRequirements) -> bool {
        self.current_requirements() != old.current_requirements()
    }

    pub fn current_requirements(&self) -> BTreeMap<RequirementName, bool> {
        self.requirements
            .iter()
            .map(|requirement| (requirement.name().clone(), requirement.is_required()))
            .collect()
    }

    /// True iff no primary requirement is active. Secondary requirements
    /// alone never keep a definition alive.
    pub fn is_unreasoned(&self) -> bool {
        !self
            .requirements
            .iter()
            .any(|requirement| requirement.is_primary() && requirement.is_required())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DetectionRequirement> {
        self.requirements.iter()
    }

    /// `registered: 2, serializable: 0`
    pub fn summary(&self) -> String {
        self.requirements
            .iter()
            .map(|requirement| {
                format!("{}: {}", requirement.name(), requirement.number_of_reasons())
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn requirement(&self, name: &RequirementName) -> Result<&DetectionRequirement, ScanError> {
        Ok(&self.requirements[self.index_of(name)?])
    }

    fn index_of(&self, name: &RequirementName) -> Result<usize, ScanError> {
        self.requirements
            .iter()
            .position(|requirement| requirement.name() == name)
            .ok_or_else(|| ScanError::UnknownRequirement { name: name.clone() })
    }
}
