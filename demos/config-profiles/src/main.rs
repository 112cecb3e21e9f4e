//! # Config Profiles Example
//!
//! Resolves the components an application needs under two deployment
//! profiles. Each profile is a scope; the `prod` profile pins its own
//! database through a scoped factory, `dev` falls back to detection.
//!
//! Run with `RUST_LOG=typescan_core=debug` to watch the rounds.

use std::collections::HashMap;

use anyhow::Result;
use tracing::info;
use typescan_core::{
    DetectionRequirements, DetectionResult, Detector, Failures, ManualResultFactory, Processor,
    Reason, Reports, RequirementName, Resolver, ScanError, Scope, Signal, StateFactories, StateLog,
    SummaryDescriber, TypeIdentifier, UndetectedFactory,
};

const REQUIRED: RequirementName = RequirementName::new("required");
const EXPOSED: RequirementName = RequirementName::new("exposed");

// ============================================================================
// Components
// ============================================================================

#[derive(Debug, Clone)]
struct Component {
    settings: String,
    needs: Vec<TypeIdentifier>,
}

impl Component {
    fn new(settings: &str, needs: &[&str]) -> Self {
        Self {
            settings: settings.to_string(),
            needs: needs.iter().map(|&name| TypeIdentifier::real(name)).collect(),
        }
    }
}

// ============================================================================
// Detection (what a component looks like without profile overrides)
// ============================================================================

struct Catalog {
    components: HashMap<TypeIdentifier, Component>,
}

impl Catalog {
    fn new() -> Self {
        let components = [
            ("WebServer", Component::new("port=8080", &["Database", "Cache"])),
            ("Database", Component::new("sqlite://dev.db", &[])),
            ("Cache", Component::new("in-memory", &[])),
        ]
        .into_iter()
        .map(|(name, component)| (TypeIdentifier::real(name), component))
        .collect();
        Self { components }
    }
}

impl Detector<Component> for Catalog {
    fn detect(
        &self,
        type_id: &TypeIdentifier,
        scope: &Scope,
        requirements: &DetectionRequirements,
    ) -> Result<DetectionResult<Component>> {
        if requirements.requires(&EXPOSED)? && type_id.description() == "Cache" {
            return Ok(DetectionResult::failure(format!(
                "an in-memory cache cannot be exposed in {scope}"
            )));
        }
        Ok(match self.components.get(type_id) {
            Some(component) => DetectionResult::success(component.clone()),
            None => DetectionResult::failure(format!("no component registered for {type_id}")),
        })
    }
}

struct Needs;

impl Resolver<Component> for Needs {
    fn resolve(
        &self,
        component: &Component,
        type_id: &TypeIdentifier,
        scope: &Scope,
        _requirements: &DetectionRequirements,
    ) -> Result<Vec<Signal>> {
        Ok(component
            .needs
            .iter()
            .map(|need| {
                Signal::add_reason(
                    need.clone(),
                    scope.clone(),
                    REQUIRED,
                    Reason::because_of(type_id.clone(), scope.clone()),
                )
            })
            .collect())
    }
}

// ============================================================================
// Main
// ============================================================================

fn print_failures(
    _results: &Reports<Component>,
    log: &StateLog,
    failures: &Failures,
) -> Result<(), ScanError> {
    println!("\n{} signal(s) applied before giving up on:", log.len());
    for failure in failures.values().flat_map(|by_scope| by_scope.values()) {
        println!("  {failure}");
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let dev = Scope::root().child_scope(TypeIdentifier::real("dev"));
    let prod = Scope::root().child_scope(TypeIdentifier::real("prod"));

    let factories = StateFactories::new(UndetectedFactory).with_factory(
        prod.clone(),
        ManualResultFactory::new(
            TypeIdentifier::real("Database"),
            Component::new("postgres://db.internal/app", &[]),
        ),
    );
    let mut processor = Processor::builder()
        .primary_requirement(REQUIRED)
        .secondary_requirement(EXPOSED)
        .state_factories(factories)
        .build();

    for profile in [&dev, &prod] {
        processor.manually_add(TypeIdentifier::real("WebServer"), profile.clone(), REQUIRED);
    }
    processor.dispatch(Signal::add_reason(
        TypeIdentifier::real("Cache"),
        prod.clone(),
        EXPOSED,
        Reason::reason("shared with the worker fleet"),
    ));
    processor.manually_add(TypeIdentifier::real("Tracing"), dev.clone(), REQUIRED);

    let results = processor.collect(&Catalog::new(), &Needs, &print_failures, &SummaryDescriber)?;

    println!("\nResolved components:");
    for (type_id, by_scope) in &results {
        for (scope, result) in by_scope {
            println!(
                "  {:<10} {:<6} {}",
                type_id.to_string(),
                scope.to_string(),
                result.definition.settings
            );
        }
    }
    info!(types = results.len(), "done");
    Ok(())
}
