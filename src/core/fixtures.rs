use std::collections::BTreeMap;
use std::sync::Arc;

use super::error::Result;
use super::evaluate::ScenarioEvaluator;
use super::metadata::{Metadata, RecordExtractor, ScenarioRecord};
use super::situation::SituationBuilder;
use super::types::{ChildSpec, ScenarioParams};
use crate::engine::CalculationEngine;

/// A named scenario in the built-in validation set.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureScenario {
    pub label: &'static str,
    pub params: ScenarioParams,
}

/// The built-in validation set. The scenarios are chosen to exercise joint
/// filing, credit phase-outs, benefit cliffs, state credits, and zero
/// income, so a regression anywhere in the schedule shows up in at least
/// one record.
pub fn fixture_scenarios() -> Vec<FixtureScenario> {
    let mut married_ca = ScenarioParams::new("CA", 45_000.0);
    married_ca.spouse_income = Some(45_000.0);

    let mut single_parent_ca = ScenarioParams::new("CA", 20_000.0);
    single_parent_ca.children = vec![ChildSpec::aged(5)];

    let mut low_income_ca = ScenarioParams::new("CA", 10_000.0);
    low_income_ca.children = vec![ChildSpec::aged(3)];

    let mut family_ny = ScenarioParams::new("NY", 80_000.0);
    family_ny.spouse_income = Some(40_000.0);
    family_ny.children = vec![ChildSpec::aged(8), ChildSpec::aged(12)];

    let zero_income_tx = ScenarioParams::new("TX", 0.0);

    vec![
        FixtureScenario {
            label: "Married CA $45k/$45k, no children",
            params: married_ca,
        },
        FixtureScenario {
            label: "Single CA $20k, one child aged 5",
            params: single_parent_ca,
        },
        FixtureScenario {
            label: "Single CA $10k, one child aged 3",
            params: low_income_ca,
        },
        FixtureScenario {
            label: "Married NY $80k/$40k, two children",
            params: family_ny,
        },
        FixtureScenario {
            label: "Single TX $0, no children",
            params: zero_income_tx,
        },
    ]
}

/// Extracts a full record for every fixture scenario, keyed by label.
pub fn generate_fixtures(
    engine: Arc<dyn CalculationEngine>,
    year: u16,
) -> Result<BTreeMap<String, ScenarioRecord>> {
    let builder = SituationBuilder::new();
    let extractor = RecordExtractor::new(
        ScenarioEvaluator::new(engine),
        Metadata::builtin().clone(),
        year,
    );
    let mut records = BTreeMap::new();
    for scenario in fixture_scenarios() {
        let situation = builder.build(&scenario.params)?;
        let record = extractor.extract(&situation)?;
        records.insert(scenario.label.to_string(), record);
    }
    Ok(records)
}

/// Renders the validation set as pretty-printed JSON with a trailing
/// newline, the form it is stored in on disk.
pub fn fixtures_json(engine: Arc<dyn CalculationEngine>, year: u16) -> Result<String> {
    let records = generate_fixtures(engine, year)?;
    Ok(format!("{}\n", serde_json::to_string_pretty(&records)?))
}
