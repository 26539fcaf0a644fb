use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::error::Result;
use super::evaluate::ScenarioEvaluator;
use super::types::{Descriptor, Situation};

/// A state-specific refundable credit with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCredit {
    pub label: String,
    #[serde(flatten)]
    pub descriptor: Descriptor,
}

/// Catalog of the variables worth reporting, grouped by display category.
/// The catalog drives extraction: a variable absent here never appears in a
/// record, and adding one requires no code change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub aggregates: Vec<Descriptor>,
    pub benefits: Vec<Descriptor>,
    pub credits: Vec<Descriptor>,
    pub taxes: Vec<Descriptor>,
    pub healthcare: Vec<Descriptor>,
    pub state_credits: Vec<Descriptor>,
    pub state_taxes: Vec<Descriptor>,
    pub state_credits_by_state: BTreeMap<String, Vec<StateCredit>>,
}

static BUILTIN: OnceLock<Metadata> = OnceLock::new();

impl Metadata {
    /// The catalog compiled into the binary.
    pub fn builtin() -> &'static Metadata {
        BUILTIN.get_or_init(|| {
            serde_json::from_str(include_str!("../../data/metadata.json"))
                .expect("built-in metadata parses")
        })
    }

    pub fn state_credits_for(&self, state: &str) -> &[StateCredit] {
        self.state_credits_by_state
            .get(state)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Per-program descriptors for married-versus-separate breakdowns, in
    /// category order with duplicates removed.
    pub fn comparison_descriptors(&self) -> Vec<Descriptor> {
        let mut seen = BTreeSet::new();
        let mut descriptors = Vec::new();
        let categories = self
            .benefits
            .iter()
            .chain(&self.credits)
            .chain(&self.taxes)
            .chain(&self.healthcare)
            .chain(&self.state_credits);
        for descriptor in categories {
            if seen.insert(descriptor.variable.clone()) {
                descriptors.push(descriptor.clone());
            }
        }
        descriptors
    }
}

/// A fully extracted scenario: every cataloged variable, rounded to cents
/// and grouped the way the catalog groups it. State-specific credits are
/// keyed by display label; a state without special credits contributes no
/// label keys at all. The record key for the healthcare category is
/// `health`, the name the fixture consumers expect.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRecord {
    pub aggregates: BTreeMap<String, f64>,
    pub benefits: BTreeMap<String, f64>,
    pub credits: BTreeMap<String, f64>,
    pub taxes: BTreeMap<String, f64>,
    pub health: BTreeMap<String, f64>,
    pub state_credits: BTreeMap<String, f64>,
    pub state_taxes: BTreeMap<String, f64>,
}

/// Evaluates every cataloged variable for a situation and shapes the output
/// into a [`ScenarioRecord`].
#[derive(Clone)]
pub struct RecordExtractor {
    evaluator: ScenarioEvaluator,
    metadata: Metadata,
    year: u16,
}

impl RecordExtractor {
    pub fn new(evaluator: ScenarioEvaluator, metadata: Metadata, year: u16) -> Self {
        Self {
            evaluator,
            metadata,
            year,
        }
    }

    pub fn extract(&self, situation: &Situation) -> Result<ScenarioRecord> {
        let mut record = ScenarioRecord::default();
        self.fill(situation, &self.metadata.aggregates, &mut record.aggregates)?;
        self.fill(situation, &self.metadata.benefits, &mut record.benefits)?;
        self.fill(situation, &self.metadata.credits, &mut record.credits)?;
        self.fill(situation, &self.metadata.taxes, &mut record.taxes)?;
        self.fill(situation, &self.metadata.healthcare, &mut record.health)?;
        self.fill(situation, &self.metadata.state_credits, &mut record.state_credits)?;
        self.fill(situation, &self.metadata.state_taxes, &mut record.state_taxes)?;

        for credit in self.metadata.state_credits_for(&situation.household.state) {
            let value = self.evaluator.evaluate(
                situation,
                self.year,
                &credit.descriptor.variable,
                credit.descriptor.entity,
            )?;
            record.state_credits.insert(credit.label.clone(), round2(value));
        }
        Ok(record)
    }

    fn fill(
        &self,
        situation: &Situation,
        descriptors: &[Descriptor],
        values: &mut BTreeMap<String, f64>,
    ) -> Result<()> {
        for descriptor in descriptors {
            let value = self.evaluator.evaluate(
                situation,
                self.year,
                &descriptor.variable,
                descriptor.entity,
            )?;
            values.insert(descriptor.variable.clone(), round2(value));
        }
        Ok(())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
