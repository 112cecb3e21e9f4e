//! Hierarchical scopes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::type_id::TypeIdentifier;

/// An immutable path of type identifiers.
///
/// The root scope is the empty path. `a.contains(b)` holds iff `a` is a
/// prefix of `b`, so containment is a partial order with the root at the
/// bottom: every scope contains itself and the root contains every scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope {
    path: Vec<TypeIdentifier>,
}

impl Scope {
    pub fn root() -> Self {
        Scope { path: Vec::new() }
    }

    /// A new scope with `element` appended.
    pub fn child_scope(&self, element: TypeIdentifier) -> Scope {
        let mut path = self.path.clone();
        path.push(element);
        Scope { path }
    }

    /// True iff `self` is a prefix of `other`.
    pub fn contains(&self, other: &Scope) -> bool {
        self.size() <= other.size() && other.path.starts_with(&self.path)
    }

    pub fn contains_element(&self, element: &TypeIdentifier) -> bool {
        self.path.contains(element)
    }

    pub fn size(&self) -> usize {
        self.path.len()
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    pub fn elements(&self) -> &[TypeIdentifier] {
        &self.path
    }

    /// `/a/b`, or `/` for the root scope.
    pub fn render(&self) -> String {
        if self.path.is_empty() {
            return "/".to_string();
        }
        self.path
            .iter()
            .map(|element| format!("/{}", element.simple_description()))
            .collect()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromIterator<TypeIdentifier> for Scope {
    fn from_iter<I: IntoIterator<Item = TypeIdentifier>>(iter: I) -> Self {
        Scope {
            path: iter.into_iter().collect(),
        }
    }
}
