use std::sync::Arc;

use tracing::trace;

use super::error::{Error, Result};
use super::types::{Descriptor, Entity, ScenarioResult, Situation};
use crate::engine::CalculationEngine;

/// Reads variables out of a calculation engine and reduces each per-entity
/// array to one scalar per scenario. This is the only place engine output is
/// aggregated or sanitized; everything downstream works with clean scalars.
#[derive(Clone)]
pub struct ScenarioEvaluator {
    engine: Arc<dyn CalculationEngine>,
}

impl ScenarioEvaluator {
    pub fn new(engine: Arc<dyn CalculationEngine>) -> Self {
        Self { engine }
    }

    /// Evaluates one variable. Person-level variables sum over every member,
    /// group-level variables read the single group instance, and an empty
    /// array reads as zero. Non-finite engine values are coerced to 0.0 here
    /// so NaN can never leak into a comparison.
    pub fn evaluate(
        &self,
        situation: &Situation,
        year: u16,
        variable: &str,
        entity: Entity,
    ) -> Result<f64> {
        let values = self
            .engine
            .calculate(situation, year, variable)
            .map_err(|source| Error::Engine {
                variable: variable.to_string(),
                source,
            })?;
        let value = match entity {
            Entity::Person => values.iter().copied().map(sanitize).sum(),
            Entity::TaxUnit | Entity::SpmUnit | Entity::Household => {
                values.first().copied().map(sanitize).unwrap_or(0.0)
            }
        };
        trace!(variable, entity = ?entity, value, "evaluated variable");
        Ok(value)
    }

    /// Evaluates a batch of descriptors into a tagged result map. Fails on
    /// the first engine error; partial results are never returned.
    pub fn evaluate_many(
        &self,
        situation: &Situation,
        year: u16,
        descriptors: &[Descriptor],
    ) -> Result<ScenarioResult> {
        let mut result = ScenarioResult::default();
        for descriptor in descriptors {
            let value = self.evaluate(situation, year, &descriptor.variable, descriptor.entity)?;
            result.insert(descriptor.variable.clone(), descriptor.entity, value);
        }
        Ok(result)
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::core::situation::SituationBuilder;
    use crate::core::types::ScenarioParams;
    use crate::engine::EngineError;

    struct TableEngine {
        variables: BTreeMap<&'static str, Vec<f64>>,
    }

    impl CalculationEngine for TableEngine {
        fn calculate(
            &self,
            _situation: &Situation,
            _year: u16,
            variable: &str,
        ) -> std::result::Result<Vec<f64>, EngineError> {
            self.variables
                .get(variable)
                .cloned()
                .ok_or_else(|| EngineError::new(format!("unknown variable {variable:?}")))
        }
    }

    fn evaluator(variables: BTreeMap<&'static str, Vec<f64>>) -> ScenarioEvaluator {
        ScenarioEvaluator::new(Arc::new(TableEngine { variables }))
    }

    fn any_situation() -> Situation {
        SituationBuilder::new()
            .build(&ScenarioParams::new("CA", 0.0))
            .expect("valid scenario")
    }

    #[test]
    fn person_level_variables_sum_over_members() {
        let evaluator = evaluator(BTreeMap::from([("employee_payroll_tax", vec![
            1_000.0, 500.0, 0.0,
        ])]));
        let value = evaluator
            .evaluate(&any_situation(), 2026, "employee_payroll_tax", Entity::Person)
            .expect("evaluates");
        assert_eq!(value, 1_500.0);
    }

    #[test]
    fn group_level_variables_take_first_instance() {
        let evaluator = evaluator(BTreeMap::from([("household_net_income", vec![42_000.0])]));
        let value = evaluator
            .evaluate(&any_situation(), 2026, "household_net_income", Entity::Household)
            .expect("evaluates");
        assert_eq!(value, 42_000.0);
    }

    #[test]
    fn empty_array_reads_as_zero() {
        let evaluator = evaluator(BTreeMap::from([("snap", Vec::new())]));
        let value = evaluator
            .evaluate(&any_situation(), 2026, "snap", Entity::SpmUnit)
            .expect("evaluates");
        assert_eq!(value, 0.0);
    }

    #[test]
    fn non_finite_values_coerce_to_zero() {
        let evaluator = evaluator(BTreeMap::from([
            ("wic", vec![f64::NAN, 800.0, f64::INFINITY]),
            ("eitc", vec![f64::NEG_INFINITY]),
        ]));
        let situation = any_situation();
        assert_eq!(
            evaluator
                .evaluate(&situation, 2026, "wic", Entity::Person)
                .expect("evaluates"),
            800.0
        );
        assert_eq!(
            evaluator
                .evaluate(&situation, 2026, "eitc", Entity::TaxUnit)
                .expect("evaluates"),
            0.0
        );
    }

    #[test]
    fn unknown_variable_surfaces_engine_error() {
        let evaluator = evaluator(BTreeMap::new());
        let err = evaluator
            .evaluate(&any_situation(), 2026, "no_such_variable", Entity::Household)
            .expect_err("must fail");
        assert!(matches!(err, Error::Engine { ref variable, .. } if variable == "no_such_variable"));
        assert!(err.to_string().contains("no_such_variable"));
    }

    #[test]
    fn evaluate_many_tags_each_value_with_its_entity() {
        let evaluator = evaluator(BTreeMap::from([
            ("household_net_income", vec![30_000.0]),
            ("employee_payroll_tax", vec![900.0, 600.0]),
        ]));
        let descriptors = vec![
            Descriptor::new("household_net_income", Entity::Household),
            Descriptor::new("employee_payroll_tax", Entity::Person),
        ];
        let result = evaluator
            .evaluate_many(&any_situation(), 2026, &descriptors)
            .expect("evaluates");

        assert_eq!(result.len(), 2);
        assert_eq!(result.get("household_net_income"), Some(30_000.0));
        assert_eq!(result.entity("household_net_income"), Some(Entity::Household));
        assert_eq!(result.get("employee_payroll_tax"), Some(1_500.0));
        assert_eq!(result.entity("employee_payroll_tax"), Some(Entity::Person));
    }
}
