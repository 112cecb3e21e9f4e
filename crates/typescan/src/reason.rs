//! Causal justifications and their rendering.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::scope::Scope;
use crate::type_id::TypeIdentifier;

/// Address of one stateful definition: a type within a scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SignalTarget {
    pub type_id: TypeIdentifier,
    pub scope: Scope,
}

impl SignalTarget {
    pub fn new(type_id: TypeIdentifier, scope: Scope) -> Self {
        Self { type_id, scope }
    }

    pub fn description(&self) -> String {
        format!("{} in {}", self.type_id.description(), self.scope.render())
    }
}

impl fmt::Display for SignalTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Why a requirement is active.
///
/// A terminal reason is plain text. A derived reason points at the target
/// whose resolution produced it; following those parents always ends in
/// terminal reasons, unless the graph is cyclic (see [`Reason::render`]).
/// Equality is by value, which is what `RemoveReason` signals rely on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Reason {
    text: String,
    parent: Option<SignalTarget>,
}

impl Reason {
    pub fn reason(text: impl Into<String>) -> Self {
        Reason {
            text: text.into(),
            parent: None,
        }
    }

    pub fn manually_added() -> Self {
        Reason::reason("manually added")
    }

    pub fn because_of(type_id: TypeIdentifier, scope: Scope) -> Self {
        Reason {
            text: format!("because of {}", type_id.description()),
            parent: Some(SignalTarget::new(type_id, scope)),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parent(&self) -> Option<&SignalTarget> {
        self.parent.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.parent.is_none()
    }

    /// Render every causal chain ending in this reason as `A -> B -> text`.
    ///
    /// Root/child relationships may form cycles and diamonds. Each reason is
    /// expanded at most once per render: meeting it again anywhere in the walk
    /// ends that chain with `<parent>...` instead of recursing.
    pub fn render<P>(&self, provider: &P) -> Vec<String>
    where
        P: SubReasonProvider + ?Sized,
    {
        let mut visited = HashSet::new();
        self.render_chain(provider, &mut visited)
    }

    fn render_chain<P>(&self, provider: &P, visited: &mut HashSet<Reason>) -> Vec<String>
    where
        P: SubReasonProvider + ?Sized,
    {
        let Some(parent) = &self.parent else {
            return vec![self.text.clone()];
        };
        let parent_name = parent.type_id.description();
        if !visited.insert(self.clone()) {
            return vec![format!("{parent_name}...")];
        }

        let parent_reasons = provider.reasons_for(parent);
        if parent_reasons.is_empty() {
            return vec![parent_name];
        }
        parent_reasons
            .iter()
            .flat_map(|reason| reason.render_chain(provider, visited))
            .map(|chain| format!("{parent_name} -> {chain}"))
            .collect()
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Looks up the reasons currently attached to a target.
pub trait SubReasonProvider {
    fn reasons_for(&self, target: &SignalTarget) -> Vec<Reason>;
}

impl<F> SubReasonProvider for F
where
    F: Fn(&SignalTarget) -> Vec<Reason>,
{
    fn reasons_for(&self, target: &SignalTarget) -> Vec<Reason> {
        self(target)
    }
}
