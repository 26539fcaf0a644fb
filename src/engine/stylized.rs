//! A deterministic, hand-computable tax and benefit schedule.
//!
//! The schedule is a deliberately simplified composite of US federal and
//! state policy: progressive income tax with a standard deduction, flat
//! payroll tax, EITC and child tax credit, a handful of means-tested
//! benefits, public health coverage valued at cost, and flat state income
//! taxes with a few state-level refundable credits. Every rule is a small
//! closed-form function of household composition and total employment
//! income, so any scenario can be checked by hand. The schedule does not
//! vary by year.

use crate::core::{Person, Situation};

use super::{CalculationEngine, EngineError};

const ADULT_AGE: u32 = 18;

const PAYROLL_TAX_RATE: f64 = 0.0765;

const STANDARD_DEDUCTION_SINGLE: f64 = 15_000.0;
const STANDARD_DEDUCTION_SINGLE_WITH_CHILDREN: f64 = 22_500.0;
const STANDARD_DEDUCTION_JOINT: f64 = 30_000.0;

const LOW_BRACKET_RATE: f64 = 0.10;
const HIGH_BRACKET_RATE: f64 = 0.25;
const LOW_BRACKET_TOP_SINGLE: f64 = 12_000.0;
const LOW_BRACKET_TOP_JOINT: f64 = 24_000.0;

const EITC_PHASE_IN_RATE: f64 = 0.40;
const EITC_PHASE_OUT_RATE: f64 = 0.20;
const EITC_PHASE_OUT_START_SINGLE: f64 = 18_000.0;
const EITC_PHASE_OUT_START_JOINT: f64 = 26_000.0;

const CTC_PER_CHILD: f64 = 1_700.0;
const CTC_CHILD_AGE_LIMIT: u32 = 17;

const SNAP_BASE: f64 = 6_000.0;
const SNAP_PER_CHILD: f64 = 2_400.0;
const SNAP_PHASE_OUT_RATE: f64 = 0.30;

const TANF_BASE: f64 = 3_000.0;
const TANF_PER_CHILD: f64 = 1_200.0;
const TANF_PHASE_OUT_RATE: f64 = 0.50;

const WIC_AGE_LIMIT: u32 = 5;
const WIC_PER_CHILD: f64 = 800.0;

const SCHOOL_AGE_MIN: u32 = 5;
const FREE_MEALS_PER_CHILD: f64 = 900.0;
const FREE_MEALS_INCOME_LIMIT: f64 = 30_000.0;
const REDUCED_MEALS_PER_CHILD: f64 = 400.0;
const REDUCED_MEALS_INCOME_LIMIT: f64 = 50_000.0;

const LIFELINE_AMOUNT: f64 = 120.0;
const LIFELINE_INCOME_LIMIT: f64 = 25_000.0;

const MEDICAID_ADULT_VALUE: f64 = 6_500.0;
const MEDICAID_ADULT_INCOME_LIMIT: f64 = 21_000.0;
const MEDICAID_CHILD_VALUE: f64 = 3_500.0;
const MEDICAID_CHILD_INCOME_LIMIT: f64 = 45_000.0;
const CHIP_PER_CHILD: f64 = 2_800.0;
const CHIP_INCOME_LIMIT: f64 = 70_000.0;
const ACA_BASE_SUBSIDY: f64 = 7_000.0;
const ACA_PHASE_OUT_RATE: f64 = 0.10;
const ACA_INCOME_LIMIT: f64 = 60_000.0;

const YCTC_AMOUNT: f64 = 1_000.0;
const YCTC_CHILD_AGE_LIMIT: u32 = 6;
const YCTC_INCOME_LIMIT: f64 = 30_000.0;
const NY_CTC_PER_CHILD: f64 = 330.0;

const DEFAULT_STATE_TAX_RATE: f64 = 0.04;
const NO_INCOME_TAX_STATES: [&str; 9] = ["AK", "FL", "NV", "NH", "SD", "TN", "TX", "WA", "WY"];

const STATE_CREDIT_VARIABLES: [&str; 6] =
    ["ca_eitc", "ca_yctc", "dc_eitc", "md_eitc", "ny_ctc", "ny_eitc"];

/// The built-in calculation engine. Stateless; a single instance can serve
/// any number of concurrent evaluations.
#[derive(Debug, Default, Clone, Copy)]
pub struct StylizedEngine;

impl StylizedEngine {
    pub fn new() -> Self {
        Self
    }
}

impl CalculationEngine for StylizedEngine {
    fn calculate(
        &self,
        situation: &Situation,
        _year: u16,
        variable: &str,
    ) -> std::result::Result<Vec<f64>, EngineError> {
        let values = match variable {
            "household_market_income" => group(total_income(situation)),
            "household_net_income" => group(net_income(situation)),
            "household_net_income_including_health_benefits" => {
                group(net_income(situation) + healthcare_benefit_value(situation))
            }
            "household_benefits" => group(total_benefits(situation)),
            "household_refundable_tax_credits" => group(refundable_credits(situation)),
            "household_tax_before_refundable_credits" => group(tax_before_credits(situation)),
            "household_refundable_state_tax_credits" => group(state_credits_total(situation)),
            "healthcare_benefit_value" => group(healthcare_benefit_value(situation)),
            "income_tax_before_refundable_credits" => group(federal_income_tax(situation)),
            "state_income_tax_before_refundable_credits"
            | "household_state_tax_before_refundable_credits" => {
                group(state_income_tax(situation))
            }
            "employee_payroll_tax" => {
                per_person(situation, |p| p.employment_income * PAYROLL_TAX_RATE)
            }
            "wic" => per_person(situation, |p| {
                if p.age < WIC_AGE_LIMIT { WIC_PER_CHILD } else { 0.0 }
            }),
            // The model carries no disability or aged-blind inputs, so SSI
            // is uniformly zero.
            "ssi" => per_person(situation, |_| 0.0),
            "medicaid_cost" => {
                let income = total_income(situation);
                per_person(situation, |p| medicaid_cost(p, income))
            }
            "per_capita_chip" => {
                let income = total_income(situation);
                per_person(situation, |p| chip_value(p, income))
            }
            "aca_ptc" => group(aca_ptc(situation)),
            "snap" => group(snap(situation)),
            "tanf" => group(tanf(situation)),
            "free_school_meals" => group(free_school_meals(situation)),
            "reduced_price_school_meals" => group(reduced_price_school_meals(situation)),
            "lifeline" => group(lifeline(situation)),
            "eitc" => group(eitc(situation)),
            "refundable_ctc" => group(refundable_ctc(situation)),
            "ca_eitc" | "ca_yctc" | "dc_eitc" | "md_eitc" | "ny_ctc" | "ny_eitc" => {
                group(state_credit(situation, variable))
            }
            _ => return Err(EngineError::new(format!("unknown variable {variable:?}"))),
        };
        Ok(values)
    }
}

fn group(value: f64) -> Vec<f64> {
    vec![value]
}

fn per_person(situation: &Situation, f: impl Fn(&Person) -> f64) -> Vec<f64> {
    situation.people.values().map(f).collect()
}

fn total_income(situation: &Situation) -> f64 {
    situation.total_employment_income()
}

fn adult_count(situation: &Situation) -> usize {
    situation.people.values().filter(|p| p.age >= ADULT_AGE).count()
}

fn child_count(situation: &Situation) -> usize {
    situation.people.values().filter(|p| p.age < ADULT_AGE).count()
}

fn count_children_under(situation: &Situation, age: u32) -> usize {
    situation.people.values().filter(|p| p.age < age).count()
}

fn school_age_children(situation: &Situation) -> usize {
    situation
        .people
        .values()
        .filter(|p| p.age >= SCHOOL_AGE_MIN && p.age < ADULT_AGE)
        .count()
}

fn files_jointly(situation: &Situation) -> bool {
    adult_count(situation) >= 2
}

fn standard_deduction(situation: &Situation) -> f64 {
    if files_jointly(situation) {
        STANDARD_DEDUCTION_JOINT
    } else if child_count(situation) > 0 {
        STANDARD_DEDUCTION_SINGLE_WITH_CHILDREN
    } else {
        STANDARD_DEDUCTION_SINGLE
    }
}

fn taxable_income(situation: &Situation) -> f64 {
    (total_income(situation) - standard_deduction(situation)).max(0.0)
}

fn federal_income_tax(situation: &Situation) -> f64 {
    let taxable = taxable_income(situation);
    let bracket_top = if files_jointly(situation) {
        LOW_BRACKET_TOP_JOINT
    } else {
        LOW_BRACKET_TOP_SINGLE
    };
    LOW_BRACKET_RATE * taxable.min(bracket_top)
        + HIGH_BRACKET_RATE * (taxable - bracket_top).max(0.0)
}

fn payroll_tax_total(situation: &Situation) -> f64 {
    total_income(situation) * PAYROLL_TAX_RATE
}

fn eitc(situation: &Situation) -> f64 {
    let income = total_income(situation);
    let maximum = match child_count(situation) {
        0 => 600.0,
        1 => 4_000.0,
        2 => 6_600.0,
        _ => 7_400.0,
    };
    let phase_out_start = if files_jointly(situation) {
        EITC_PHASE_OUT_START_JOINT
    } else {
        EITC_PHASE_OUT_START_SINGLE
    };
    let phased_in = (EITC_PHASE_IN_RATE * income).min(maximum);
    let reduction = EITC_PHASE_OUT_RATE * (income - phase_out_start).max(0.0);
    (phased_in - reduction).max(0.0)
}

fn refundable_ctc(situation: &Situation) -> f64 {
    CTC_PER_CHILD * count_children_under(situation, CTC_CHILD_AGE_LIMIT) as f64
}

fn snap(situation: &Situation) -> f64 {
    let guarantee = SNAP_BASE + SNAP_PER_CHILD * child_count(situation) as f64;
    (guarantee - SNAP_PHASE_OUT_RATE * total_income(situation)).max(0.0)
}

fn tanf(situation: &Situation) -> f64 {
    let guarantee = TANF_BASE + TANF_PER_CHILD * child_count(situation) as f64;
    (guarantee - TANF_PHASE_OUT_RATE * total_income(situation)).max(0.0)
}

fn wic_total(situation: &Situation) -> f64 {
    WIC_PER_CHILD * count_children_under(situation, WIC_AGE_LIMIT) as f64
}

fn free_school_meals(situation: &Situation) -> f64 {
    if total_income(situation) <= FREE_MEALS_INCOME_LIMIT {
        FREE_MEALS_PER_CHILD * school_age_children(situation) as f64
    } else {
        0.0
    }
}

fn reduced_price_school_meals(situation: &Situation) -> f64 {
    let income = total_income(situation);
    if income > FREE_MEALS_INCOME_LIMIT && income <= REDUCED_MEALS_INCOME_LIMIT {
        REDUCED_MEALS_PER_CHILD * school_age_children(situation) as f64
    } else {
        0.0
    }
}

fn lifeline(situation: &Situation) -> f64 {
    if total_income(situation) <= LIFELINE_INCOME_LIMIT {
        LIFELINE_AMOUNT
    } else {
        0.0
    }
}

fn total_benefits(situation: &Situation) -> f64 {
    snap(situation)
        + tanf(situation)
        + wic_total(situation)
        + free_school_meals(situation)
        + reduced_price_school_meals(situation)
        + lifeline(situation)
}

fn medicaid_cost(person: &Person, household_income: f64) -> f64 {
    if person.age >= ADULT_AGE {
        if household_income <= MEDICAID_ADULT_INCOME_LIMIT {
            MEDICAID_ADULT_VALUE
        } else {
            0.0
        }
    } else if household_income <= MEDICAID_CHILD_INCOME_LIMIT {
        MEDICAID_CHILD_VALUE
    } else {
        0.0
    }
}

fn chip_value(person: &Person, household_income: f64) -> f64 {
    if person.age < ADULT_AGE
        && household_income > MEDICAID_CHILD_INCOME_LIMIT
        && household_income <= CHIP_INCOME_LIMIT
    {
        CHIP_PER_CHILD
    } else {
        0.0
    }
}

fn aca_ptc(situation: &Situation) -> f64 {
    let income = total_income(situation);
    // Adults above the Medicaid cutoff but inside the subsidy window buy
    // marketplace coverage; everyone else is covered elsewhere or ineligible.
    if adult_count(situation) > 0
        && income > MEDICAID_ADULT_INCOME_LIMIT
        && income <= ACA_INCOME_LIMIT
    {
        (ACA_BASE_SUBSIDY - ACA_PHASE_OUT_RATE * income).max(0.0)
    } else {
        0.0
    }
}

fn healthcare_benefit_value(situation: &Situation) -> f64 {
    let income = total_income(situation);
    let medicaid: f64 = situation
        .people
        .values()
        .map(|p| medicaid_cost(p, income))
        .sum();
    let chip: f64 = situation.people.values().map(|p| chip_value(p, income)).sum();
    medicaid + chip + aca_ptc(situation)
}

fn state_tax_rate(state: &str) -> f64 {
    match state {
        "CA" => 0.05,
        "NY" => 0.055,
        "DC" => 0.06,
        "MD" => 0.0475,
        s if NO_INCOME_TAX_STATES.contains(&s) => 0.0,
        _ => DEFAULT_STATE_TAX_RATE,
    }
}

fn state_income_tax(situation: &Situation) -> f64 {
    state_tax_rate(&situation.household.state) * taxable_income(situation)
}

fn state_credit(situation: &Situation, variable: &str) -> f64 {
    match (variable, situation.household.state.as_str()) {
        ("ca_eitc", "CA") => 0.25 * eitc(situation),
        ("ca_yctc", "CA") => {
            if count_children_under(situation, YCTC_CHILD_AGE_LIMIT) > 0
                && total_income(situation) <= YCTC_INCOME_LIMIT
            {
                YCTC_AMOUNT
            } else {
                0.0
            }
        }
        ("dc_eitc", "DC") => 0.40 * eitc(situation),
        ("md_eitc", "MD") => 0.28 * eitc(situation),
        ("ny_ctc", "NY") => NY_CTC_PER_CHILD * child_count(situation) as f64,
        ("ny_eitc", "NY") => 0.30 * eitc(situation),
        _ => 0.0,
    }
}

fn state_credits_total(situation: &Situation) -> f64 {
    STATE_CREDIT_VARIABLES
        .iter()
        .map(|variable| state_credit(situation, variable))
        .sum()
}

fn refundable_credits(situation: &Situation) -> f64 {
    eitc(situation) + refundable_ctc(situation) + state_credits_total(situation)
}

fn tax_before_credits(situation: &Situation) -> f64 {
    federal_income_tax(situation) + state_income_tax(situation) + payroll_tax_total(situation)
}

fn net_income(situation: &Situation) -> f64 {
    total_income(situation) - tax_before_credits(situation)
        + refundable_credits(situation)
        + total_benefits(situation)
}
