use std::collections::{BTreeMap, BTreeSet};

use super::error::{Error, Result};
use super::types::{Household, MaritalUnit, Person, ScenarioParams, Situation};

pub const DEFAULT_ADULT_AGE: u32 = 40;
pub const DEFAULT_CHILD_AGE: u32 = 10;

const MAX_AGE: u32 = 120;

pub const US_STATES: [&str; 51] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH",
    "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VT", "VA", "WA", "WV", "WI", "WY",
];

pub fn validate_state(code: &str) -> Result<()> {
    if US_STATES.contains(&code) {
        Ok(())
    } else {
        Err(Error::UnknownState(code.to_string()))
    }
}

/// Constructs household entity graphs from scenario parameters. The default
/// ages stand in for the ages the caller did not specify; they are explicit
/// configuration so that building is a pure function of its inputs.
#[derive(Debug, Clone)]
pub struct SituationBuilder {
    pub default_adult_age: u32,
    pub default_child_age: u32,
}

impl Default for SituationBuilder {
    fn default() -> Self {
        Self {
            default_adult_age: DEFAULT_ADULT_AGE,
            default_child_age: DEFAULT_CHILD_AGE,
        }
    }
}

impl SituationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds and validates the full entity graph for one scenario. With no
    /// spouse income the partner is omitted entirely, which is how a
    /// head-only separate filing is represented.
    pub fn build(&self, params: &ScenarioParams) -> Result<Situation> {
        validate_state(&params.state)?;
        check_amount("head income", params.head_income)?;
        if let Some(spouse_income) = params.spouse_income {
            check_amount("spouse income", spouse_income)?;
        }

        let head_age = params.head_age.unwrap_or(self.default_adult_age);
        check_age("head age", head_age)?;
        let spouse_age = params.spouse_age.unwrap_or(self.default_adult_age);
        check_age("spouse age", spouse_age)?;
        for child in &params.children {
            check_age("child age", child.age.unwrap_or(self.default_child_age))?;
        }

        let mut people = BTreeMap::new();
        people.insert(
            "you".to_string(),
            Person {
                age: head_age,
                employment_income: params.head_income,
            },
        );
        let mut adults = vec!["you".to_string()];
        if let Some(spouse_income) = params.spouse_income {
            people.insert(
                "your partner".to_string(),
                Person {
                    age: spouse_age,
                    employment_income: spouse_income,
                },
            );
            adults.push("your partner".to_string());
        }

        let mut marital_units = vec![MaritalUnit {
            name: "your marital unit".to_string(),
            members: adults.clone(),
        }];

        let mut members = adults;
        for (index, child) in params.children.iter().enumerate() {
            let id = format!("child {}", index + 1);
            people.insert(
                id.clone(),
                Person {
                    age: child.age.unwrap_or(self.default_child_age),
                    employment_income: 0.0,
                },
            );
            // Dependents each carry a singleton marital unit so the unit
            // graph covers every person.
            marital_units.push(MaritalUnit {
                name: format!("{id} marital unit"),
                members: vec![id.clone()],
            });
            members.push(id);
        }

        let situation = Situation {
            people,
            marital_units,
            family: members.clone(),
            tax_unit: members.clone(),
            spm_unit: members.clone(),
            household: Household {
                members,
                state: params.state.clone(),
            },
        };
        situation.validate()?;
        Ok(situation)
    }
}

impl Situation {
    /// Checks the graph invariants: a recognized state, finite non-negative
    /// incomes, no dangling member references, and household membership that
    /// covers every person exactly once. Externally constructed documents go
    /// through the same checks the builder applies.
    pub fn validate(&self) -> Result<()> {
        validate_state(&self.household.state)?;

        for person in self.people.values() {
            check_amount("employment income", person.employment_income)?;
            check_age("age", person.age)?;
        }

        self.check_members("family", &self.family)?;
        self.check_members("tax unit", &self.tax_unit)?;
        self.check_members("SPM unit", &self.spm_unit)?;
        self.check_members("household", &self.household.members)?;
        for unit in &self.marital_units {
            self.check_members(&unit.name, &unit.members)?;
        }

        let covered: BTreeSet<&str> = self.household.members.iter().map(String::as_str).collect();
        if covered.len() != self.household.members.len()
            || covered.len() != self.people.len()
            || !self.people.keys().all(|id| covered.contains(id.as_str()))
        {
            return Err(Error::MembershipMismatch);
        }
        Ok(())
    }

    fn check_members(&self, unit: &str, members: &[String]) -> Result<()> {
        for member in members {
            if !self.people.contains_key(member) {
                return Err(Error::DanglingMember {
                    unit: unit.to_string(),
                    person: member.clone(),
                });
            }
        }
        Ok(())
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidAmount { field, value })
    }
}

fn check_age(field: &'static str, value: u32) -> Result<()> {
    if value <= MAX_AGE {
        Ok(())
    } else {
        Err(Error::AgeOutOfRange {
            field,
            limit: MAX_AGE,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ChildSpec;

    fn couple_with_children() -> ScenarioParams {
        let mut params = ScenarioParams::new("CA", 45_000.0);
        params.spouse_income = Some(45_000.0);
        params.children = vec![ChildSpec::aged(8), ChildSpec::aged(12)];
        params
    }

    #[test]
    fn builds_couple_graph_with_children() {
        let situation = SituationBuilder::new()
            .build(&couple_with_children())
            .expect("valid scenario");

        assert_eq!(situation.people.len(), 4);
        assert!(situation.people.contains_key("you"));
        assert!(situation.people.contains_key("your partner"));
        assert!(situation.people.contains_key("child 1"));
        assert!(situation.people.contains_key("child 2"));

        assert_eq!(situation.marital_units.len(), 3);
        assert_eq!(
            situation.marital_units[0].members,
            vec!["you".to_string(), "your partner".to_string()]
        );
        assert_eq!(situation.marital_units[1].members, vec!["child 1".to_string()]);

        assert_eq!(situation.family.len(), 4);
        assert_eq!(situation.tax_unit, situation.family);
        assert_eq!(situation.spm_unit, situation.family);
        assert_eq!(situation.household.members.len(), 4);
        assert_eq!(situation.household.state, "CA");
        assert_eq!(situation.total_employment_income(), 90_000.0);
    }

    #[test]
    fn head_only_scenario_omits_partner() {
        let mut params = ScenarioParams::new("CA", 20_000.0);
        params.children = vec![ChildSpec::aged(5)];
        let situation = SituationBuilder::new().build(&params).expect("valid scenario");

        assert_eq!(situation.people.len(), 2);
        assert!(!situation.people.contains_key("your partner"));
        assert_eq!(situation.marital_units[0].members, vec!["you".to_string()]);
    }

    #[test]
    fn default_ages_fill_unspecified_ones() {
        let mut params = ScenarioParams::new("NY", 10_000.0);
        params.children = vec![ChildSpec::default()];
        let situation = SituationBuilder::new().build(&params).expect("valid scenario");

        assert_eq!(situation.people["you"].age, DEFAULT_ADULT_AGE);
        assert_eq!(situation.people["child 1"].age, DEFAULT_CHILD_AGE);
    }

    #[test]
    fn explicit_ages_override_defaults() {
        let mut params = ScenarioParams::new("NY", 10_000.0);
        params.head_age = Some(67);
        params.spouse_income = Some(0.0);
        params.spouse_age = Some(64);
        let situation = SituationBuilder::new().build(&params).expect("valid scenario");

        assert_eq!(situation.people["you"].age, 67);
        assert_eq!(situation.people["your partner"].age, 64);
    }

    #[test]
    fn rejects_unknown_state() {
        let params = ScenarioParams::new("ZZ", 1_000.0);
        let err = SituationBuilder::new().build(&params).expect_err("must reject");
        assert!(matches!(err, Error::UnknownState(code) if code == "ZZ"));
    }

    #[test]
    fn state_codes_are_case_sensitive() {
        assert!(validate_state("CA").is_ok());
        assert!(validate_state("DC").is_ok());
        assert!(validate_state("ca").is_err());
    }

    #[test]
    fn rejects_negative_and_non_finite_income() {
        let params = ScenarioParams::new("CA", -1.0);
        assert!(matches!(
            SituationBuilder::new().build(&params),
            Err(Error::InvalidAmount { field: "head income", .. })
        ));

        let mut params = ScenarioParams::new("CA", 1_000.0);
        params.spouse_income = Some(f64::NAN);
        assert!(matches!(
            SituationBuilder::new().build(&params),
            Err(Error::InvalidAmount { field: "spouse income", .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_age() {
        let mut params = ScenarioParams::new("CA", 1_000.0);
        params.head_age = Some(121);
        assert!(matches!(
            SituationBuilder::new().build(&params),
            Err(Error::AgeOutOfRange { field: "head age", .. })
        ));
    }

    #[test]
    fn validate_detects_dangling_member() {
        let mut situation = SituationBuilder::new()
            .build(&couple_with_children())
            .expect("valid scenario");
        situation.family.push("nobody".to_string());

        let err = situation.validate().expect_err("must detect");
        assert!(matches!(
            err,
            Error::DanglingMember { unit, person } if unit == "family" && person == "nobody"
        ));
    }

    #[test]
    fn validate_detects_household_membership_gap() {
        let mut situation = SituationBuilder::new()
            .build(&couple_with_children())
            .expect("valid scenario");
        situation.household.members.pop();

        assert!(matches!(
            situation.validate(),
            Err(Error::MembershipMismatch)
        ));
    }
}
