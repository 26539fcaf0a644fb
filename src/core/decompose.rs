use std::sync::Arc;

use serde::Serialize;

use super::error::Result;
use super::evaluate::ScenarioEvaluator;
use super::situation::SituationBuilder;
use super::types::{Decomposition, Descriptor, Entity, ScenarioParams, ScenarioResult};
use crate::engine::CalculationEngine;

pub const NET_INCOME: &str = "household_net_income";

/// One variable evaluated for the married household and both halves of its
/// separate counterpart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitValues {
    pub married: f64,
    pub head_only: f64,
    pub spouse_only: f64,
}

impl SplitValues {
    pub fn separate(&self) -> f64 {
        self.head_only + self.spouse_only
    }

    pub fn delta(&self) -> f64 {
        self.married - self.separate()
    }
}

/// Full per-variable comparison between a married household and its separate
/// decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramComparison {
    pub married: ScenarioResult,
    pub head_only: ScenarioResult,
    pub spouse_only: ScenarioResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDelta {
    pub variable: String,
    pub married: f64,
    pub head_only: f64,
    pub spouse_only: f64,
    pub separate: f64,
    pub delta: f64,
}

impl ProgramComparison {
    /// Per-variable rows in variable order. Variables missing from a
    /// separate half contribute zero to it.
    pub fn deltas(&self) -> Vec<ProgramDelta> {
        self.married
            .iter()
            .map(|(variable, tagged)| {
                let head_only = self.head_only.get(variable).unwrap_or(0.0);
                let spouse_only = self.spouse_only.get(variable).unwrap_or(0.0);
                let separate = head_only + spouse_only;
                ProgramDelta {
                    variable: variable.to_string(),
                    married: tagged.value,
                    head_only,
                    spouse_only,
                    separate,
                    delta: tagged.value - separate,
                }
            })
            .collect()
    }
}

/// Compares a married household with the counterfactual in which the couple
/// never married. The head keeps every dependent in the separate filing and
/// the spouse files alone and childless; a scenario without spouse income
/// decomposes to the head's own filing and a zero spouse half.
#[derive(Clone)]
pub struct Decomposer {
    builder: SituationBuilder,
    evaluator: ScenarioEvaluator,
    year: u16,
}

impl Decomposer {
    pub fn new(engine: Arc<dyn CalculationEngine>, year: u16) -> Self {
        Self {
            builder: SituationBuilder::new(),
            evaluator: ScenarioEvaluator::new(engine),
            year,
        }
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    /// Evaluates one variable across the married scenario and both separate
    /// halves.
    pub fn split_values(
        &self,
        params: &ScenarioParams,
        variable: &str,
        entity: Entity,
    ) -> Result<SplitValues> {
        let married = self.evaluate_params(params, variable, entity)?;
        let (head_params, spouse_params) = split(params);
        let head_only = self.evaluate_params(&head_params, variable, entity)?;
        let spouse_only = match &spouse_params {
            Some(p) => self.evaluate_params(p, variable, entity)?,
            None => 0.0,
        };
        Ok(SplitValues {
            married,
            head_only,
            spouse_only,
        })
    }

    /// Net-income decomposition with the headline bonus figure. The relative
    /// bonus is undefined when the married household nets exactly zero.
    pub fn decompose(&self, params: &ScenarioParams) -> Result<Decomposition> {
        let values = self.split_values(params, NET_INCOME, Entity::Household)?;
        let bonus = values.delta();
        let bonus_percent = if values.married == 0.0 {
            None
        } else {
            Some(bonus / values.married)
        };
        Ok(Decomposition {
            net_income_married: values.married,
            net_income_head_only: values.head_only,
            net_income_spouse_only: values.spouse_only,
            net_income_separate: values.separate(),
            bonus,
            bonus_percent,
        })
    }

    /// Evaluates a battery of variables for all three filings at once, for
    /// per-program breakdowns.
    pub fn compare_programs(
        &self,
        params: &ScenarioParams,
        descriptors: &[Descriptor],
    ) -> Result<ProgramComparison> {
        let married_situation = self.builder.build(params)?;
        let married = self
            .evaluator
            .evaluate_many(&married_situation, self.year, descriptors)?;

        let (head_params, spouse_params) = split(params);
        let head_situation = self.builder.build(&head_params)?;
        let head_only = self
            .evaluator
            .evaluate_many(&head_situation, self.year, descriptors)?;

        let spouse_only = match &spouse_params {
            Some(p) => {
                let spouse_situation = self.builder.build(p)?;
                self.evaluator
                    .evaluate_many(&spouse_situation, self.year, descriptors)?
            }
            None => ScenarioResult::default(),
        };

        Ok(ProgramComparison {
            married,
            head_only,
            spouse_only,
        })
    }

    fn evaluate_params(
        &self,
        params: &ScenarioParams,
        variable: &str,
        entity: Entity,
    ) -> Result<f64> {
        let situation = self.builder.build(params)?;
        self.evaluator.evaluate(&situation, self.year, variable, entity)
    }
}

fn split(params: &ScenarioParams) -> (ScenarioParams, Option<ScenarioParams>) {
    let mut head = params.clone();
    head.spouse_income = None;
    head.spouse_age = None;

    let spouse = params.spouse_income.map(|income| {
        let mut alone = ScenarioParams::new(params.state.clone(), income);
        alone.head_age = params.spouse_age;
        alone
    });

    (head, spouse)
}
