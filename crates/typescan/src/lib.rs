//! # Typescan
//!
//! A scoped, signal-driven engine that works out the transitive closure of
//! things a program needs, one definition per (type, scope), and explains
//! every definition it could not produce.
//!
//! ## Core Concepts
//!
//! The engine never knows what a "type" is. Callers plug in:
//! - a [`Detector`] = produces the value for a (type, scope)
//! - a [`Resolver`] = turns a value into [`Signal`]s for what it depends on
//!
//! Everything the engine tracks is a **reason**: a definition exists while
//! at least one primary requirement holds a reason for it. Dependencies are
//! reasons pointing back at the definition that needs them, so removing one
//! reason retracts the whole subtree that hung off it.
//!
//! ## Architecture
//!
//! ```text
//! manually_add() / dispatch()
//!     │
//!     ▼
//! pending (FIFO) ◄──────────────────────────────────┐
//!     │                                             │
//!     ▼ States::apply()                             │
//! AddReason ─► StateFactories::place() ─► create    │
//!     │                                             │
//!     ▼                                             │
//! StatefulDefinition (state + Context)              │
//!     │                                             │
//!     ├─► Detect  ─► Detector::detect()             │
//!     │                                             │
//!     └─► Resolve ─► Resolver::resolve() ─► outbox ─┘
//!
//! fixpoint reached ─► States::collect() ─► Definitions / Failures
//! ```
//!
//! ## Key Invariants
//!
//! 1. **One definition per (type, scope)** - found by lookup, never by pointer
//! 2. **Signals are applied in FIFO order** - on the caller's thread
//! 3. **Transitions are pure** - the state table lives in [`State`]
//! 4. **Factories rank by scope** - the most specific applicable scope wins
//! 5. **Failures carry their history** - every cause is rendered as a chain
//!
//! ## Example
//!
//! ```ignore
//! use typescan_core::{
//!     DetectionResult, FailOnCollectionError, Processor, Reason, RequirementName,
//!     Scope, Signal, SummaryDescriber, TypeIdentifier,
//! };
//!
//! const REGISTERED: RequirementName = RequirementName::new("registered");
//!
//! let mut processor = Processor::builder().primary_requirement(REGISTERED).build();
//! processor.manually_add(TypeIdentifier::real("Order"), Scope::root(), REGISTERED);
//!
//! let definitions = processor.collect(
//!     &|type_id: &TypeIdentifier, _: &Scope, _: &_| Ok(DetectionResult::success(type_id.description())),
//!     &|_: &String, type_id: &TypeIdentifier, scope: &Scope, _: &_| {
//!         Ok(vec![Signal::add_reason(
//!             TypeIdentifier::real("Address"),
//!             scope.clone(),
//!             REGISTERED,
//!             Reason::because_of(type_id.clone(), scope.clone()),
//!         )])
//!     },
//!     &FailOnCollectionError,
//!     &SummaryDescriber,
//! )?;
//! ```

// Core modules
mod callbacks;
mod context;
mod detection;
mod error;
mod factory;
mod log;
mod processor;
mod reason;
mod report;
mod requirements;
mod scope;
mod signal;
mod state;
mod states;
mod type_id;

// End-to-end scenarios (test-only)
#[cfg(test)]
mod scenario_tests;



// Re-export keys and reasons
pub use reason::{Reason, SignalTarget, SubReasonProvider};
pub use scope::Scope;
pub use type_id::TypeIdentifier;

// Re-export requirement bookkeeping
pub use requirements::{DetectionRequirement, DetectionRequirements, Removal, RequirementName};

// Re-export engine
pub use callbacks::{Detector, RequirementsDescriber, Resolver, Strategies, SummaryDescriber};
pub use context::{Context, RequiredAction};
pub use detection::DetectionResult;
pub use factory::{ManualResultFactory, Placement, StateFactories, StateFactory, UndetectedFactory};
pub use processor::{
    FailOnCollectionError, IgnoreCollectionErrors, OnCollectionError, Processor, ProcessorBuilder,
    DEFAULT_MAX_ROUNDS,
};
pub use signal::Signal;
pub use state::{State, StatefulDefinition, Transition};
pub use states::States;

// Re-export results and diagnostics
pub use error::ScanError;
pub use log::{LoggedState, StateLog, StateLogBuilder, StateLogEntry};
pub use report::{ByScope, CollectionResult, Definitions, FailureReport, Failures, Report, Reports};
