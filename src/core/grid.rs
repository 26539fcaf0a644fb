use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rayon::prelude::*;
use tracing::error;

use super::decompose::Decomposer;
use super::error::{Error, Result};
use super::situation::validate_state;
use super::types::{ChildSpec, Entity, ScenarioParams};

/// Household aggregate a grid is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridMeasure {
    NetIncome,
    Benefits,
    RefundableCredits,
    TaxBeforeCredits,
}

impl GridMeasure {
    pub fn variable(&self) -> &'static str {
        match self {
            GridMeasure::NetIncome => "household_net_income",
            GridMeasure::Benefits => "household_benefits",
            GridMeasure::RefundableCredits => "household_refundable_tax_credits",
            GridMeasure::TaxBeforeCredits => "household_tax_before_refundable_credits",
        }
    }

    /// For taxes a smaller married figure is the favorable outcome, so the
    /// delta is negated before classification.
    pub fn lower_is_better(&self) -> bool {
        matches!(self, GridMeasure::TaxBeforeCredits)
    }
}

/// How each cell's delta is mapped to a cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Buckets,
    Binary,
    Raw,
}

impl Classification {
    pub fn score(&self, delta: f64) -> f64 {
        match self {
            Classification::Buckets => bucket_score(delta),
            Classification::Binary => {
                if delta > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Classification::Raw => delta,
        }
    }
}

/// Maps a dollar delta onto an eleven-step scale centered at 0.5. Values
/// above 0.5 are bonuses, below are penalties, and the magnitude thresholds
/// are symmetric.
fn bucket_score(delta: f64) -> f64 {
    if delta > 5_000.0 {
        1.0
    } else if delta > 3_000.0 {
        0.9
    } else if delta > 1_000.0 {
        0.8
    } else if delta > 500.0 {
        0.7
    } else if delta > 100.0 {
        0.6
    } else if delta >= 0.0 {
        0.5
    } else if delta < -5_000.0 {
        0.0
    } else if delta < -3_000.0 {
        0.1
    } else if delta < -1_000.0 {
        0.2
    } else if delta < -500.0 {
        0.3
    } else if delta < -100.0 {
        0.4
    } else {
        0.5
    }
}

/// Evenly spaced axis from zero to `max_income`, rounded to whole dollars.
pub fn income_axis(max_income: f64, steps: usize) -> Vec<f64> {
    if steps == 0 {
        return Vec::new();
    }
    if steps == 1 {
        return vec![0.0];
    }
    let step = max_income / (steps - 1) as f64;
    (0..steps).map(|i| (step * i as f64).round()).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridRequest {
    pub state: String,
    pub income_axis: Vec<f64>,
    pub children: usize,
    pub measure: GridMeasure,
    pub classification: Classification,
    pub parallel: bool,
    pub timeout: Option<Duration>,
}

impl GridRequest {
    pub fn new(state: impl Into<String>, income_axis: Vec<f64>) -> Self {
        Self {
            state: state.into(),
            income_axis,
            children: 0,
            measure: GridMeasure::NetIncome,
            classification: Classification::Buckets,
            parallel: true,
            timeout: None,
        }
    }
}

/// Cross product of the income axis with itself. `cells[i][j]` holds the
/// score for head income `head_axis[i]` against spouse income
/// `spouse_axis[j]`, or `None` where the engine failed for that cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub head_axis: Vec<f64>,
    pub spouse_axis: Vec<f64>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl Grid {
    pub fn unavailable(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| cell.is_none())
            .count()
    }
}

/// Computes bonus/penalty grids by decomposing one scenario per cell. Cell
/// placement is by coordinate, so results are identical whether cells are
/// computed in parallel or sequentially.
#[derive(Clone)]
pub struct GridBuilder {
    decomposer: Decomposer,
}

impl GridBuilder {
    pub fn new(decomposer: Decomposer) -> Self {
        Self { decomposer }
    }

    pub fn build(&self, request: &GridRequest) -> Result<Grid> {
        validate_request(request)?;
        match request.timeout {
            Some(timeout) => self.build_with_deadline(request, timeout),
            None => self.compute(request),
        }
    }

    /// Runs the computation on a worker thread and gives up waiting once the
    /// deadline passes. The worker is left to finish on its own; its result
    /// is discarded.
    fn build_with_deadline(&self, request: &GridRequest, timeout: Duration) -> Result<Grid> {
        let builder = self.clone();
        let request = request.clone();
        let (sender, receiver) = mpsc::sync_channel(1);
        thread::spawn(move || {
            let _ = sender.send(builder.compute(&request));
        });
        match receiver.recv_timeout(timeout) {
            Ok(result) => result,
            Err(_) => Err(Error::GridTimedOut {
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    fn compute(&self, request: &GridRequest) -> Result<Grid> {
        let axis = &request.income_axis;
        let n = axis.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .collect();

        let evaluate = |&(i, j): &(usize, usize)| self.cell(request, axis[i], axis[j]);
        let values: Vec<Option<f64>> = if request.parallel {
            pairs.par_iter().map(evaluate).collect()
        } else {
            pairs.iter().map(evaluate).collect()
        };

        let mut cells = vec![vec![None; n]; n];
        for (&(i, j), value) in pairs.iter().zip(values) {
            cells[i][j] = value;
        }
        Ok(Grid {
            head_axis: axis.clone(),
            spouse_axis: axis.clone(),
            cells,
        })
    }

    fn cell(&self, request: &GridRequest, head: f64, spouse: f64) -> Option<f64> {
        let mut params = ScenarioParams::new(request.state.clone(), head);
        params.spouse_income = Some(spouse);
        params.children = vec![ChildSpec::default(); request.children];

        let split = self
            .decomposer
            .split_values(&params, request.measure.variable(), Entity::Household);
        match split {
            Ok(values) => {
                let mut delta = values.delta();
                if request.measure.lower_is_better() {
                    delta = -delta;
                }
                Some(request.classification.score(delta))
            }
            Err(error) => {
                error!(%error, head, spouse, "grid cell failed");
                None
            }
        }
    }
}

fn validate_request(request: &GridRequest) -> Result<()> {
    validate_state(&request.state)?;
    if request.income_axis.is_empty() {
        return Err(Error::EmptyAxis);
    }
    for &income in &request.income_axis {
        if !income.is_finite() || income < 0.0 {
            return Err(Error::InvalidAmount {
                field: "axis income",
                value: income,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::types::Situation;
    use crate::engine::{CalculationEngine, EngineError, StylizedEngine};

    const EPS: f64 = 1e-6;

    fn builder() -> GridBuilder {
        GridBuilder::new(Decomposer::new(Arc::new(StylizedEngine::new()), 2026))
    }

    fn cell_value(grid: &Grid, i: usize, j: usize) -> f64 {
        grid.cells[i][j].expect("cell computed")
    }

    #[test]
    fn bucket_boundaries_match_the_scale() {
        let expectations = [
            (5_001.0, 1.0),
            (5_000.0, 0.9),
            (3_001.0, 0.9),
            (3_000.0, 0.8),
            (1_001.0, 0.8),
            (1_000.0, 0.7),
            (501.0, 0.7),
            (500.0, 0.6),
            (101.0, 0.6),
            (100.0, 0.5),
            (0.0, 0.5),
            (-100.0, 0.5),
            (-101.0, 0.4),
            (-500.0, 0.4),
            (-501.0, 0.3),
            (-1_000.0, 0.3),
            (-1_001.0, 0.2),
            (-3_000.0, 0.2),
            (-3_001.0, 0.1),
            (-5_000.0, 0.1),
            (-5_001.0, 0.0),
        ];
        for (delta, expected) in expectations {
            assert_eq!(bucket_score(delta), expected, "delta {delta}");
        }
    }

    #[test]
    fn binary_classification_is_a_step_at_zero() {
        assert_eq!(Classification::Binary.score(0.01), 1.0);
        assert_eq!(Classification::Binary.score(0.0), 0.0);
        assert_eq!(Classification::Binary.score(-3_000.0), 0.0);
    }

    #[test]
    fn income_axis_is_a_rounded_linspace() {
        assert_eq!(
            income_axis(80_000.0, 9),
            vec![
                0.0, 10_000.0, 20_000.0, 30_000.0, 40_000.0, 50_000.0, 60_000.0, 70_000.0,
                80_000.0
            ]
        );
        assert_eq!(income_axis(10_000.0, 3), vec![0.0, 5_000.0, 10_000.0]);
        assert_eq!(
            income_axis(1_000.0, 7),
            vec![0.0, 167.0, 333.0, 500.0, 667.0, 833.0, 1_000.0]
        );
        assert_eq!(income_axis(1_000.0, 1), vec![0.0]);
        assert!(income_axis(1_000.0, 0).is_empty());
    }

    #[test]
    fn raw_grid_matches_hand_computed_deltas() {
        let mut request = GridRequest::new("CA", vec![20_000.0, 80_000.0]);
        request.classification = Classification::Raw;
        let grid = builder().build(&request).expect("builds");

        // 20k/20k: married nets 35440 against 18090 twice separately.
        assert!((cell_value(&grid, 0, 0) - -740.0).abs() < EPS);
        // 80k with a 20k spouse gains 680 either way around.
        assert!((cell_value(&grid, 0, 1) - 680.0).abs() < EPS);
        assert!((cell_value(&grid, 1, 0) - 680.0).abs() < EPS);
        // 80k/80k: both filings land entirely in the top bracket.
        assert!(cell_value(&grid, 1, 1).abs() < EPS);
        assert_eq!(grid.unavailable(), 0);
    }

    #[test]
    fn bucket_grid_classifies_the_same_cells() {
        let request = GridRequest::new("CA", vec![20_000.0, 80_000.0]);
        let grid = builder().build(&request).expect("builds");

        assert_eq!(grid.cells[0][0], Some(0.3));
        assert_eq!(grid.cells[0][1], Some(0.7));
        assert_eq!(grid.cells[1][0], Some(0.7));
        assert_eq!(grid.cells[1][1], Some(0.5));
    }

    #[test]
    fn tax_measure_inverts_the_delta() {
        let mut request = GridRequest::new("CA", vec![20_000.0, 80_000.0]);
        request.measure = GridMeasure::TaxBeforeCredits;
        request.classification = Classification::Raw;
        let grid = builder().build(&request).expect("builds");

        // Married owes 25050 against 26100 separately; owing less scores as
        // a positive 1050.
        assert!((cell_value(&grid, 1, 0) - 1_050.0).abs() < EPS);
    }

    #[test]
    fn children_enter_every_cell() {
        let mut request = GridRequest::new("CA", vec![0.0]);
        request.children = 2;
        request.measure = GridMeasure::Benefits;
        request.classification = Classification::Raw;
        let grid = builder().build(&request).expect("builds");

        // Married with two children draws 18120 in benefits; separately the
        // head draws the same 18120 and the spouse another 9120.
        assert!((cell_value(&grid, 0, 0) - -9_120.0).abs() < EPS);
    }

    #[test]
    fn cells_are_indexed_head_then_spouse() {
        struct RoleWeightedEngine;

        impl CalculationEngine for RoleWeightedEngine {
            fn calculate(
                &self,
                situation: &Situation,
                _year: u16,
                _variable: &str,
            ) -> std::result::Result<Vec<f64>, EngineError> {
                let head = situation.people["you"].employment_income;
                let spouse = situation
                    .people
                    .get("your partner")
                    .map_or(0.0, |p| p.employment_income);
                Ok(vec![head + 3.0 * spouse])
            }
        }

        let decomposer = Decomposer::new(Arc::new(RoleWeightedEngine), 2026);
        let mut request = GridRequest::new("CA", vec![0.0, 1_000.0]);
        request.classification = Classification::Raw;
        let grid = GridBuilder::new(decomposer).build(&request).expect("builds");

        // The partner's extra weight shows up only along the spouse axis, so
        // a transposed write would flip these two cells.
        assert!((cell_value(&grid, 0, 1) - 2_000.0).abs() < EPS);
        assert!(cell_value(&grid, 1, 0).abs() < EPS);
    }

    #[test]
    fn default_grid_lands_every_cell_in_a_bucket() {
        let axis: Vec<f64> = (1..=8).map(|i| (i * 10_000) as f64).collect();
        let grid = builder()
            .build(&GridRequest::new("CA", axis))
            .expect("builds");

        let buckets = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];
        assert_eq!(grid.cells.len(), 8);
        for row in &grid.cells {
            assert_eq!(row.len(), 8);
            for cell in row {
                let value = cell.expect("cell computed");
                assert!(
                    buckets.iter().any(|b| (b - value).abs() < EPS),
                    "value {value} is not a bucket score"
                );
            }
        }
    }

    #[test]
    fn parallel_and_sequential_grids_agree() {
        let axis = income_axis(60_000.0, 5);
        let mut request = GridRequest::new("NY", axis);
        request.children = 1;

        let parallel = builder().build(&request).expect("builds");
        request.parallel = false;
        let sequential = builder().build(&request).expect("builds");
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn engine_failure_marks_cells_unavailable() {
        struct FlakyEngine {
            inner: StylizedEngine,
        }

        impl CalculationEngine for FlakyEngine {
            fn calculate(
                &self,
                situation: &Situation,
                year: u16,
                variable: &str,
            ) -> std::result::Result<Vec<f64>, EngineError> {
                if situation.total_employment_income() == 100_000.0 {
                    return Err(EngineError::new("synthetic failure"));
                }
                self.inner.calculate(situation, year, variable)
            }
        }

        let decomposer = Decomposer::new(
            Arc::new(FlakyEngine {
                inner: StylizedEngine::new(),
            }),
            2026,
        );
        let request = GridRequest::new("CA", vec![20_000.0, 80_000.0]);
        let grid = GridBuilder::new(decomposer).build(&request).expect("builds");

        // Only the mixed cells hit the poisoned 100k married total.
        assert_eq!(grid.cells[0][1], None);
        assert_eq!(grid.cells[1][0], None);
        assert!(grid.cells[0][0].is_some());
        assert!(grid.cells[1][1].is_some());
        assert_eq!(grid.unavailable(), 2);
    }

    #[test]
    fn deadline_cuts_off_a_slow_engine() {
        struct SlowEngine;

        impl CalculationEngine for SlowEngine {
            fn calculate(
                &self,
                _situation: &Situation,
                _year: u16,
                _variable: &str,
            ) -> std::result::Result<Vec<f64>, EngineError> {
                thread::sleep(Duration::from_millis(50));
                Ok(vec![0.0])
            }
        }

        let decomposer = Decomposer::new(Arc::new(SlowEngine), 2026);
        let mut request = GridRequest::new("CA", income_axis(80_000.0, 3));
        request.timeout = Some(Duration::from_millis(10));

        let err = GridBuilder::new(decomposer)
            .build(&request)
            .expect_err("must time out");
        assert!(matches!(err, Error::GridTimedOut { timeout_ms: 10 }));
    }

    #[test]
    fn invalid_requests_are_rejected_up_front() {
        let grid = builder();

        let request = GridRequest::new("ZZ", vec![1_000.0]);
        assert!(matches!(grid.build(&request), Err(Error::UnknownState(_))));

        let request = GridRequest::new("CA", Vec::new());
        assert!(matches!(grid.build(&request), Err(Error::EmptyAxis)));

        let request = GridRequest::new("CA", vec![1_000.0, -5.0]);
        assert!(matches!(
            grid.build(&request),
            Err(Error::InvalidAmount { field: "axis income", .. })
        ));
    }
}
