use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Entity level an engine variable is defined on. Person-level results come
/// back as one value per household member; the rest are scalars at index 0.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Person,
    TaxUnit,
    SpmUnit,
    Household,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub variable: String,
    pub entity: Entity,
}

impl Descriptor {
    pub fn new(variable: impl Into<String>, entity: Entity) -> Self {
        Self {
            variable: variable.into(),
            entity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub age: u32,
    pub employment_income: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaritalUnit {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Household {
    pub members: Vec<String>,
    pub state: String,
}

/// One tax year's snapshot of a household scenario, in the entity-graph form
/// the calculation engine consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Situation {
    pub people: BTreeMap<String, Person>,
    pub marital_units: Vec<MaritalUnit>,
    pub family: Vec<String>,
    pub tax_unit: Vec<String>,
    pub spm_unit: Vec<String>,
    pub household: Household,
}

impl Situation {
    pub fn total_employment_income(&self) -> f64 {
        self.people.values().map(|p| p.employment_income).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildSpec {
    pub age: Option<u32>,
}

impl ChildSpec {
    pub fn aged(age: u32) -> Self {
        Self { age: Some(age) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioParams {
    pub state: String,
    pub head_income: f64,
    pub spouse_income: Option<f64>,
    pub head_age: Option<u32>,
    pub spouse_age: Option<u32>,
    pub children: Vec<ChildSpec>,
}

impl ScenarioParams {
    pub fn new(state: impl Into<String>, head_income: f64) -> Self {
        Self {
            state: state.into(),
            head_income,
            spouse_income: None,
            head_age: None,
            spouse_age: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaggedValue {
    pub entity: Entity,
    pub value: f64,
}

/// Extracted engine output for one situation: variable name to value, tagged
/// with the entity level it was read from. Built once per evaluation and
/// never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioResult {
    values: BTreeMap<String, TaggedValue>,
}

impl ScenarioResult {
    pub(crate) fn insert(&mut self, variable: impl Into<String>, entity: Entity, value: f64) {
        self.values
            .insert(variable.into(), TaggedValue { entity, value });
    }

    pub fn get(&self, variable: &str) -> Option<f64> {
        self.values.get(variable).map(|v| v.value)
    }

    pub fn entity(&self, variable: &str) -> Option<Entity> {
        self.values.get(variable).map(|v| v.entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TaggedValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    Bonus,
    Penalty,
    Neutral,
}

/// Married-versus-separate outcome for one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub net_income_married: f64,
    pub net_income_head_only: f64,
    pub net_income_spouse_only: f64,
    pub net_income_separate: f64,
    pub bonus: f64,
    pub bonus_percent: Option<f64>,
}

impl Decomposition {
    pub fn verdict(&self) -> Verdict {
        if self.bonus > 0.0 {
            Verdict::Bonus
        } else if self.bonus < 0.0 {
            Verdict::Penalty
        } else {
            Verdict::Neutral
        }
    }
}
