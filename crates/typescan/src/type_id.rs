//! Opaque identifiers for the things under resolution.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one unit of resolution.
///
/// The engine never looks inside a type identifier; it only compares,
/// orders and prints them. A *real* identifier is named by whatever host
/// type system the caller maps from. A *virtual* identifier stands for a
/// synthetic entity with no backing type (and is handy as a scope element).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeIdentifier {
    Real { name: String },
    Virtual { id: Uuid, label: Option<String> },
}

impl TypeIdentifier {
    pub fn real(name: impl Into<String>) -> Self {
        TypeIdentifier::Real { name: name.into() }
    }

    /// A fresh virtual identifier, distinct from every other one.
    pub fn unique_virtual() -> Self {
        TypeIdentifier::Virtual {
            id: Uuid::new_v4(),
            label: None,
        }
    }

    /// A fresh virtual identifier that prints as `label`.
    ///
    /// Two calls with the same label still yield different identifiers.
    pub fn labelled_virtual(label: impl Into<String>) -> Self {
        TypeIdentifier::Virtual {
            id: Uuid::new_v4(),
            label: Some(label.into()),
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, TypeIdentifier::Virtual { .. })
    }

    /// Fully qualified, human readable name.
    pub fn description(&self) -> String {
        match self {
            TypeIdentifier::Real { name } => name.clone(),
            TypeIdentifier::Virtual {
                label: Some(label), ..
            } => label.clone(),
            TypeIdentifier::Virtual { id, label: None } => format!("virtual:{id}"),
        }
    }

    /// Short name: the last path segment of a real name.
    pub fn simple_description(&self) -> String {
        match self {
            TypeIdentifier::Real { name } => {
                let tail = name.rsplit("::").next().unwrap_or(name);
                tail.rsplit('.').next().unwrap_or(tail).to_string()
            }
            TypeIdentifier::Virtual {
                label: Some(label), ..
            } => label.clone(),
            TypeIdentifier::Virtual { id, label: None } => {
                let simple = id.simple().to_string();
                format!("virtual:{}", &simple[..8])
            }
        }
    }
}

impl fmt::Display for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

impl From<&str> for TypeIdentifier {
    fn from(name: &str) -> Self {
        TypeIdentifier::real(name)
    }
}
