//! End-to-end runs of the processor: scoping, factory ranking, failure
//! reporting and retraction across repeated collections.

use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::{anyhow, Result};

use crate::{
    Context, DetectionRequirements, DetectionResult, Detector, FailOnCollectionError, Failures,
    IgnoreCollectionErrors, Processor, Reason, Reports, RequirementName, ScanError, Scope, Signal,
    State, StateFactories, StateFactory, StateLog, SummaryDescriber, TypeIdentifier,
    UndetectedFactory,
};

const REGISTERED: RequirementName = RequirementName::new("registered");
const DOCUMENTED: RequirementName = RequirementName::new("documented");

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Definition {
    value: String,
    dependencies: Vec<TypeIdentifier>,
}

impl Definition {
    fn leaf(value: &str) -> Self {
        Self {
            value: value.to_string(),
            dependencies: Vec::new(),
        }
    }

    fn depending_on(value: &str, dependencies: &[&TypeIdentifier]) -> Self {
        Self {
            value: value.to_string(),
            dependencies: dependencies.iter().map(|&id| id.clone()).collect(),
        }
    }
}

/// Pins one type to a fixed definition.
struct Pinned {
    type_id: TypeIdentifier,
    definition: Definition,
}

impl Pinned {
    fn new(type_id: &TypeIdentifier, definition: Definition) -> Self {
        Self {
            type_id: type_id.clone(),
            definition,
        }
    }
}

impl StateFactory<Definition> for Pinned {
    fn applies(&self, type_id: &TypeIdentifier) -> bool {
        &self.type_id == type_id
    }

    fn create(&self, _type_id: &TypeIdentifier, context: &mut Context<Definition>) {
        context.set_manually_configured_result(self.definition.clone());
    }
}

/// Detects from a fixed table; unknown types are undetectable.
struct TableDetector(HashMap<TypeIdentifier, Definition>);

impl TableDetector {
    fn new<'a>(entries: impl IntoIterator<Item = (&'a TypeIdentifier, Definition)>) -> Self {
        Self(entries.into_iter().map(|(id, def)| (id.clone(), def)).collect())
    }
}

impl Detector<Definition> for TableDetector {
    fn detect(
        &self,
        type_id: &TypeIdentifier,
        _scope: &Scope,
        _requirements: &DetectionRequirements,
    ) -> Result<DetectionResult<Definition>> {
        Ok(match self.0.get(type_id) {
            Some(definition) => DetectionResult::success(definition.clone()),
            None => DetectionResult::failure(format!("no definition for {type_id}")),
        })
    }
}

fn follow_dependencies(
    definition: &Definition,
    type_id: &TypeIdentifier,
    scope: &Scope,
    _requirements: &DetectionRequirements,
) -> Result<Vec<Signal>> {
    Ok(definition
        .dependencies
        .iter()
        .map(|dependency| {
            Signal::add_reason(
                dependency.clone(),
                scope.clone(),
                REGISTERED,
                Reason::because_of(type_id.clone(), scope.clone()),
            )
        })
        .collect())
}

fn processor(factories: StateFactories<Definition>) -> Processor<Definition> {
    Processor::builder()
        .primary_requirement(REGISTERED)
        .secondary_requirement(DOCUMENTED)
        .state_factories(factories)
        .build()
}

fn child_of(scope: &Scope) -> Scope {
    scope.child_scope(TypeIdentifier::unique_virtual())
}

// ============================================================================
// Scoping
// ============================================================================

#[test]
fn definitions_are_resolved_in_the_requested_scope() {
    let type_id = TypeIdentifier::unique_virtual();
    let scope = child_of(&Scope::root());
    let mut processor = processor(StateFactories::new(UndetectedFactory));
    processor.manually_add(type_id.clone(), scope.clone(), REGISTERED);

    let detector = TableDetector::new([(&type_id, Definition::leaf("foo"))]);
    let results = processor
        .collect(&detector, &follow_dependencies, &FailOnCollectionError, &SummaryDescriber)
        .unwrap();

    let by_scope = &results[&type_id];
    assert_eq!(by_scope.len(), 1);
    assert_eq!(by_scope[&scope].definition.value, "foo");
}

#[test]
fn dependencies_inherit_the_scope_of_their_dependent() {
    let type_id = TypeIdentifier::unique_virtual();
    let dependency = TypeIdentifier::unique_virtual();
    let scope = child_of(&Scope::root());
    let mut processor = processor(StateFactories::new(UndetectedFactory));
    processor.manually_add(type_id.clone(), scope.clone(), REGISTERED);

    let detector = TableDetector::new([
        (&type_id, Definition::depending_on("foo", &[&dependency])),
        (&dependency, Definition::leaf("bar")),
    ]);
    let results = processor
        .collect(&detector, &follow_dependencies, &FailOnCollectionError, &SummaryDescriber)
        .unwrap();

    let by_scope = &results[&dependency];
    assert_eq!(by_scope.len(), 1);
    assert_eq!(by_scope[&scope].definition.value, "bar");
    assert_eq!(results[&type_id][&scope].definition.value, "foo");
}

#[test]
fn factories_in_a_more_specific_scope_are_used() {
    let type_id = TypeIdentifier::unique_virtual();
    let root = Scope::root();
    let child = child_of(&root);
    let factories = StateFactories::new(UndetectedFactory)
        .with_factory(root.clone(), Pinned::new(&type_id, Definition::leaf("foo")))
        .with_factory(child.clone(), Pinned::new(&type_id, Definition::leaf("bar")));
    let mut processor = processor(factories);
    processor.manually_add(type_id.clone(), root.clone(), REGISTERED);
    processor.manually_add(type_id.clone(), child.clone(), REGISTERED);

    let results = processor
        .collect(
            &TableDetector::new([]),
            &follow_dependencies,
            &FailOnCollectionError,
            &SummaryDescriber,
        )
        .unwrap();

    let by_scope = &results[&type_id];
    assert_eq!(by_scope.len(), 2);
    assert_eq!(by_scope[&root].definition.value, "foo");
    assert_eq!(by_scope[&child].definition.value, "bar");
}

#[test]
fn definitions_take_the_scope_of_their_factory() {
    let type_id = TypeIdentifier::unique_virtual();
    let dependency = TypeIdentifier::unique_virtual();
    let root = Scope::root();
    let child = child_of(&root);
    let grandchild = child_of(&child);
    let factories = StateFactories::new(UndetectedFactory)
        .with_factory(root.clone(), Pinned::new(&dependency, Definition::leaf("foo")))
        .with_factory(child.clone(), Pinned::new(&dependency, Definition::leaf("bar")))
        .with_factory(
            grandchild.clone(),
            Pinned::new(&type_id, Definition::depending_on("asdf", &[&dependency])),
        );
    let mut processor = processor(factories);
    processor.manually_add(type_id.clone(), grandchild.clone(), REGISTERED);

    let results = processor
        .collect(
            &TableDetector::new([]),
            &follow_dependencies,
            &FailOnCollectionError,
            &SummaryDescriber,
        )
        .unwrap();

    let by_scope = &results[&dependency];
    assert_eq!(by_scope.len(), 1);
    assert_eq!(by_scope[&child].definition.value, "bar");
    assert_eq!(results[&type_id][&grandchild].definition.value, "asdf");
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn failures_reach_the_error_callback_with_their_causal_chain() {
    let order = TypeIdentifier::real("Order");
    let address = TypeIdentifier::real("Address");
    let mut processor = processor(StateFactories::default());
    processor.manually_add(order.clone(), Scope::root(), REGISTERED);

    let seen = RefCell::new(Vec::new());
    let record = |reports: &Reports<Definition>,
                  log: &StateLog,
                  failures: &Failures|
     -> Result<(), ScanError> {
        assert_eq!(reports.len(), 2);
        assert!(!log.is_empty());
        for failure in failures.values().flat_map(|by_scope| by_scope.values()) {
            seen.borrow_mut().push(failure.clone());
        }
        Ok(())
    };

    let detector = TableDetector::new([(&order, Definition::depending_on("order", &[&address]))]);
    let results = processor
        .collect(&detector, &follow_dependencies, &record, &SummaryDescriber)
        .unwrap();

    assert!(results.contains_key(&order));
    assert!(!results.contains_key(&address));

    let seen = seen.into_inner();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].target.type_id, address);
    assert_eq!(seen[0].reasons, ["no definition for Address"]);
    assert_eq!(seen[0].requirements, "registered: 1, documented: 0");
    assert_eq!(seen[0].causes, ["Order -> manually added"]);
}

#[test]
fn fail_on_collection_error_aborts_with_the_rendered_report() {
    let order = TypeIdentifier::real("Order");
    let mut processor = processor(StateFactories::default());
    processor.manually_add(order, Scope::root(), REGISTERED);

    let err = processor
        .collect(
            &TableDetector::new([]),
            &follow_dependencies,
            &FailOnCollectionError,
            &SummaryDescriber,
        )
        .unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("1 definition(s) could not be resolved"));
    assert!(message.contains("because: manually added"));
}

#[test]
fn callback_errors_propagate_out_of_collect() {
    let mut processor = processor(StateFactories::default());
    processor.manually_add(TypeIdentifier::real("Order"), Scope::root(), REGISTERED);
    let broken = |_: &TypeIdentifier,
                  _: &Scope,
                  _: &DetectionRequirements|
     -> Result<DetectionResult<Definition>> { Err(anyhow!("classpath unavailable")) };

    let err = processor
        .collect(&broken, &follow_dependencies, &FailOnCollectionError, &SummaryDescriber)
        .unwrap_err();

    assert!(matches!(err, ScanError::Callback(_)));
    assert!(err.to_string().contains("classpath unavailable"));
}

#[test]
fn unknown_requirements_asked_by_a_detector_stay_configuration_errors() {
    let mut processor = processor(StateFactories::default());
    processor.manually_add(TypeIdentifier::real("Order"), Scope::root(), REGISTERED);
    let asks_for_unknown = |type_id: &TypeIdentifier,
                            _: &Scope,
                            requirements: &DetectionRequirements|
     -> Result<DetectionResult<Definition>> {
        requirements.requires(&RequirementName::new("serializable"))?;
        Ok(DetectionResult::success(Definition::leaf(&type_id.description())))
    };

    let err = processor
        .collect(&asks_for_unknown, &follow_dependencies, &FailOnCollectionError, &SummaryDescriber)
        .unwrap_err();

    assert!(matches!(err, ScanError::UnknownRequirement { .. }));
    assert!(err.is_configuration_error());
}

#[test]
fn undetectable_definitions_are_retried_when_requirements_change() {
    let report = TypeIdentifier::real("Report");
    let mut processor = processor(StateFactories::default());
    processor.manually_add(report.clone(), Scope::root(), REGISTERED);
    let needs_docs = |type_id: &TypeIdentifier,
                      _: &Scope,
                      requirements: &DetectionRequirements|
     -> Result<DetectionResult<Definition>> {
        Ok(if requirements.requires(&DOCUMENTED)? {
            DetectionResult::success(Definition::leaf(&type_id.description()))
        } else {
            DetectionResult::failure("only documented reports are supported")
        })
    };

    let first = processor
        .collect(&needs_docs, &follow_dependencies, &IgnoreCollectionErrors, &SummaryDescriber)
        .unwrap();
    assert!(first.is_empty());

    processor.dispatch(Signal::add_root_reason(
        report.clone(),
        DOCUMENTED,
        Reason::reason("public API"),
    ));
    let second = processor
        .collect(&needs_docs, &follow_dependencies, &FailOnCollectionError, &SummaryDescriber)
        .unwrap();

    assert_eq!(second[&report][&Scope::root()].definition.value, "Report");
}

// ============================================================================
// Retraction
// ============================================================================

#[test]
fn removing_the_root_reason_retracts_its_dependencies() {
    let order = TypeIdentifier::real("Order");
    let address = TypeIdentifier::real("Address");
    let country = TypeIdentifier::real("Country");
    let detector = TableDetector::new([
        (&order, Definition::depending_on("order", &[&address])),
        (&address, Definition::depending_on("address", &[&country])),
        (&country, Definition::leaf("country")),
    ]);
    let mut processor = processor(StateFactories::default());
    processor.manually_add(order.clone(), Scope::root(), REGISTERED);

    let first = processor
        .collect(&detector, &follow_dependencies, &FailOnCollectionError, &SummaryDescriber)
        .unwrap();
    assert_eq!(first.len(), 3);

    processor.dispatch(Signal::remove_reason(Reason::manually_added()));
    let second = processor
        .collect(&detector, &follow_dependencies, &FailOnCollectionError, &SummaryDescriber)
        .unwrap();

    assert!(second.is_empty());
    assert!(processor
        .states()
        .definitions()
        .iter()
        .all(|definition| definition.state() == State::Unreasoned));
}

#[test]
fn shared_dependencies_survive_partial_retraction() {
    let invoice = TypeIdentifier::real("Invoice");
    let order = TypeIdentifier::real("Order");
    let money = TypeIdentifier::real("Money");
    let detector = TableDetector::new([
        (&invoice, Definition::depending_on("invoice", &[&money])),
        (&order, Definition::depending_on("order", &[&money])),
        (&money, Definition::leaf("money")),
    ]);
    let mut processor = processor(StateFactories::default());
    processor.manually_add(invoice.clone(), Scope::root(), REGISTERED);
    processor.dispatch(Signal::add_root_reason(
        order.clone(),
        REGISTERED,
        Reason::reason("exported"),
    ));
    processor
        .collect(&detector, &follow_dependencies, &FailOnCollectionError, &SummaryDescriber)
        .unwrap();

    processor.dispatch(Signal::remove_reason(Reason::reason("exported")));
    let results = processor
        .collect(&detector, &follow_dependencies, &FailOnCollectionError, &SummaryDescriber)
        .unwrap();

    assert!(results.contains_key(&invoice));
    assert!(!results.contains_key(&order));
    assert_eq!(results[&money][&Scope::root()].definition.value, "money");
    assert_eq!(
        results[&money][&Scope::root()]
            .requirements
            .reasons_for(&REGISTERED)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn secondary_reasons_on_a_dependent_do_not_duplicate_its_dependencies() {
    let service = TypeIdentifier::real("Service");
    let client = TypeIdentifier::real("Client");
    let detector = TableDetector::new([
        (&service, Definition::depending_on("service", &[&client])),
        (&client, Definition::leaf("client")),
    ]);
    let mut processor = processor(StateFactories::default());
    processor.manually_add(service.clone(), Scope::root(), REGISTERED);
    processor
        .collect(&detector, &follow_dependencies, &FailOnCollectionError, &SummaryDescriber)
        .unwrap();

    processor.dispatch(Signal::add_root_reason(
        service.clone(),
        DOCUMENTED,
        Reason::reason("public API"),
    ));
    let results = processor
        .collect(&detector, &follow_dependencies, &FailOnCollectionError, &SummaryDescriber)
        .unwrap();

    let service_requirements = &results[&service][&Scope::root()].requirements;
    assert_eq!(service_requirements.summary(), "registered: 1, documented: 1");
    let client_requirements = &results[&client][&Scope::root()].requirements;
    assert_eq!(client_requirements.reasons_for(&REGISTERED).unwrap().len(), 1);
    assert_eq!(client_requirements.summary(), "registered: 1, documented: 0");
}

#[test]
fn mutually_dependent_types_settle_and_render_finitely() {
    let left = TypeIdentifier::real("Left");
    let right = TypeIdentifier::real("Right");
    let detector = TableDetector::new([
        (&left, Definition::depending_on("left", &[&right])),
        (&right, Definition::depending_on("right", &[&left])),
    ]);
    let mut processor = processor(StateFactories::default());
    processor.manually_add(left.clone(), Scope::root(), REGISTERED);

    let results = processor
        .collect(&detector, &follow_dependencies, &FailOnCollectionError, &SummaryDescriber)
        .unwrap();

    assert_eq!(results.len(), 2);
    let left_reasons = &results[&left][&Scope::root()].requirements;
    let chains: Vec<String> = left_reasons
        .all_reasons()
        .flat_map(|reason| reason.render(processor.states()))
        .collect();
    assert_eq!(
        chains,
        [
            "manually added",
            "Right -> Left -> manually added",
            "Right -> Left -> Right...",
        ]
    );
}
