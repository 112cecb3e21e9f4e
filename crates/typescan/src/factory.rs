//! Scope-ranked state factories.
//!
//! A factory registered for scope `S` overrides how definitions are created
//! for every target inside `S`. For a target the most specific registered
//! scope containing it wins; the default factory ranks below all of them.

use std::fmt;

use crate::context::Context;
use crate::error::ScanError;
use crate::reason::SignalTarget;
use crate::scope::Scope;
use crate::type_id::TypeIdentifier;

/// Prepares the context of a new definition.
///
/// `create` is only called when `applies` returned true for the type; it
/// typically pins a manually configured result.
pub trait StateFactory<T> {
    fn applies(&self, type_id: &TypeIdentifier) -> bool;

    fn create(&self, type_id: &TypeIdentifier, context: &mut Context<T>);
}

/// Applies to every type and leaves the context alone, so the detector
/// decides. The usual default.
#[derive(Debug, Clone, Copy, Default)]
pub struct UndetectedFactory;

impl<T> StateFactory<T> for UndetectedFactory {
    fn applies(&self, _type_id: &TypeIdentifier) -> bool {
        true
    }

    fn create(&self, _type_id: &TypeIdentifier, _context: &mut Context<T>) {}
}

/// Pins the result of one type.
#[derive(Debug, Clone)]
pub struct ManualResultFactory<T> {
    type_id: TypeIdentifier,
    result: T,
}

impl<T> ManualResultFactory<T> {
    pub fn new(type_id: TypeIdentifier, result: T) -> Self {
        Self { type_id, result }
    }
}

impl<T: Clone> StateFactory<T> for ManualResultFactory<T> {
    fn applies(&self, type_id: &TypeIdentifier) -> bool {
        &self.type_id == type_id
    }

    fn create(&self, _type_id: &TypeIdentifier, context: &mut Context<T>) {
        context.set_manually_configured_result(self.result.clone());
    }
}

/// Where a new definition for a target goes, and who prepares it.
pub struct Placement<'a, T> {
    /// Scope the definition will live in.
    pub scope: Scope,
    /// Rank of the chosen factory: the size of its registered scope, or zero
    /// for the default factory.
    pub specificity: usize,
    pub factory: &'a dyn StateFactory<T>,
}

impl<T> fmt::Debug for Placement<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Placement")
            .field("scope", &self.scope)
            .field("specificity", &self.specificity)
            .finish_non_exhaustive()
    }
}

/// Factories grouped by scope, plus the default.
pub struct StateFactories<T> {
    /// Sorted by descending scope size; registration order within a size.
    scoped: Vec<(Scope, Vec<Box<dyn StateFactory<T>>>)>,
    default: Box<dyn StateFactory<T>>,
}

impl<T> Default for StateFactories<T> {
    fn default() -> Self {
        Self::new(UndetectedFactory)
    }
}

impl<T> StateFactories<T> {
    pub fn new(default: impl StateFactory<T> + 'static) -> Self {
        Self {
            scoped: Vec::new(),
            default: Box::new(default),
        }
    }

    /// Register `factory` for targets inside `scope`. Factories of the same
    /// scope are consulted in registration order.
    pub fn with_factory(mut self, scope: Scope, factory: impl StateFactory<T> + 'static) -> Self {
        match self.scoped.iter_mut().find(|(existing, _)| *existing == scope) {
            Some((_, factories)) => factories.push(Box::new(factory)),
            None => {
                self.scoped.push((scope, vec![Box::new(factory)]));
                self.scoped
                    .sort_by(|(a, _), (b, _)| b.size().cmp(&a.size()));
            }
        }
        self
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scoped.iter().map(|(scope, _)| scope)
    }

    /// Choose the factory for `target`: the first applicable factory of the
    /// largest registered scope containing the target scope, else the default.
    pub fn place(&self, target: &SignalTarget) -> Result<Placement<'_, T>, ScanError> {
        let scoped = self
            .scoped
            .iter()
            .filter(|(scope, _)| scope.contains(&target.scope))
            .find_map(|(scope, factories)| {
                factories
                    .iter()
                    .find(|factory| factory.applies(&target.type_id))
                    .map(|factory| Placement {
                        scope: scope.clone(),
                        specificity: scope.size(),
                        factory: &**factory,
                    })
            });
        if let Some(placement) = scoped {
            return Ok(placement);
        }
        if self.default.applies(&target.type_id) {
            return Ok(Placement {
                scope: target.scope.clone(),
                specificity: 0,
                factory: &*self.default,
            });
        }
        Err(ScanError::NoApplicableFactory {
            target: target.description(),
        })
    }
}
