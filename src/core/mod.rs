mod decompose;
mod error;
mod evaluate;
mod fixtures;
mod grid;
mod metadata;
mod situation;
mod types;

pub use decompose::{Decomposer, NET_INCOME, ProgramComparison, ProgramDelta, SplitValues};
pub use error::{Error, Result};
pub use evaluate::ScenarioEvaluator;
pub use fixtures::{FixtureScenario, fixture_scenarios, fixtures_json, generate_fixtures};
pub use grid::{Classification, Grid, GridBuilder, GridMeasure, GridRequest, income_axis};
pub use metadata::{Metadata, RecordExtractor, ScenarioRecord, StateCredit};
pub use situation::{SituationBuilder, US_STATES, validate_state};
pub use types::{
    ChildSpec, Decomposition, Descriptor, Entity, Household, MaritalUnit, Person, ScenarioParams,
    ScenarioResult, Situation, TaggedValue, Verdict,
};
