use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backtest::metrics::MetricsCalculator;
use crate::common::error::BacktestError;
use crate::config::param_grid::{BandParams, ParamGrid};
use crate::data::price_series::PriceSeries;
use crate::strategy::bollinger_strategy::BollingerStrategy;

/// Outcome of one grid candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridEntry {
    pub params: BandParams,
    /// `None` when the strategy returns had no deviation
    pub sharpe_ratio: Option<f64>,
    pub total_return: f64,
    pub total_trades: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub best: Option<GridEntry>,
    /// Every candidate, in grid order
    pub grid: Vec<GridEntry>,
}

impl OptimizationResult {
    pub fn best_params(&self) -> Option<BandParams> {
        self.best.map(|e| e.params)
    }

    pub fn best_sharpe(&self) -> Option<f64> {
        self.best.and_then(|e| e.sharpe_ratio)
    }
}

/// Exhaustive (window, num_std) search maximising the Sharpe ratio.
///
/// Candidates are evaluated independently, optionally on the rayon pool,
/// and always selected in grid order: the first candidate with the highest
/// Sharpe wins. Candidates without a defined Sharpe are never selected.
#[derive(Debug, Clone)]
pub struct GridSearch {
    grid: ParamGrid,
    metrics: MetricsCalculator,
    initial_capital: f64,
    parallel: bool,
}

impl GridSearch {
    pub fn new(grid: ParamGrid) -> Self {
        Self {
            grid,
            metrics: MetricsCalculator::default(),
            initial_capital: 10000.0,
            parallel: true,
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsCalculator) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_initial_capital(mut self, initial_capital: f64) -> Self {
        self.initial_capital = initial_capital;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn run(&self, series: &PriceSeries) -> Result<OptimizationResult, BacktestError> {
        if series.is_empty() {
            return Err(BacktestError::no_data("cannot optimize on an empty price series"));
        }

        let candidates: Vec<BandParams> = self.grid.iter().collect();
        info!(
            candidates = candidates.len(),
            parallel = self.parallel,
            "starting parameter search"
        );

        let grid: Vec<GridEntry> = if self.parallel {
            candidates
                .par_iter()
                .map(|params| self.evaluate(series, *params))
                .collect::<Result<_, _>>()?
        } else {
            candidates
                .iter()
                .map(|params| self.evaluate(series, *params))
                .collect::<Result<_, _>>()?
        };

        let best = select_best(&grid);
        match best {
            Some(entry) => info!(
                window = entry.params.window,
                num_std = entry.params.num_std,
                sharpe = entry.sharpe_ratio.unwrap_or_default(),
                "parameter search finished"
            ),
            None => warn!("no candidate produced a defined Sharpe ratio"),
        }

        Ok(OptimizationResult { best, grid })
    }

    fn evaluate(
        &self,
        series: &PriceSeries,
        params: BandParams,
    ) -> Result<GridEntry, BacktestError> {
        let result = BollingerStrategy::new(params)?
            .with_metrics(self.metrics)
            .backtest(series, self.initial_capital)?;
        let sharpe_ratio = self.metrics.sharpe_ratio(&result.simulation.strategy_returns());

        debug!(
            window = params.window,
            num_std = params.num_std,
            sharpe = ?sharpe_ratio,
            "evaluated candidate"
        );

        Ok(GridEntry {
            params,
            sharpe_ratio,
            total_return: result.metrics.total_return,
            total_trades: result.metrics.total_trades,
        })
    }
}

/// Highest Sharpe, earliest entry on ties
fn select_best(grid: &[GridEntry]) -> Option<GridEntry> {
    let mut best: Option<(GridEntry, f64)> = None;
    for entry in grid {
        let Some(sharpe) = entry.sharpe_ratio else {
            continue;
        };
        if best.map_or(true, |(_, top)| sharpe > top) {
            best = Some((*entry, sharpe));
        }
    }
    best.map(|(entry, _)| entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(window: usize, num_std: f64, sharpe: Option<f64>) -> GridEntry {
        GridEntry {
            params: BandParams { window, num_std },
            sharpe_ratio: sharpe,
            total_return: 0.0,
            total_trades: 0,
        }
    }

    fn wavy_series(n: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let closes: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64;
                100.0 + 8.0 * (t / 5.0).sin() + 3.0 * (t / 1.7).cos() + 0.05 * t
            })
            .collect();
        PriceSeries::from_closes(start, &closes).unwrap()
    }

    #[test]
    fn test_select_best_first_on_ties() {
        let grid = vec![
            entry(10, 1.5, Some(0.5)),
            entry(10, 2.0, Some(1.2)),
            entry(20, 1.5, Some(1.2)),
            entry(20, 2.0, None),
        ];
        let best = select_best(&grid).unwrap();
        assert_eq!(best.params, BandParams { window: 10, num_std: 2.0 });
    }

    #[test]
    fn test_select_best_skips_undefined() {
        let grid = vec![entry(10, 1.5, None), entry(10, 2.0, Some(-0.3))];
        assert_eq!(select_best(&grid).unwrap().params.num_std, 2.0);
        assert!(select_best(&[entry(10, 1.5, None)]).is_none());
        assert!(select_best(&[]).is_none());
    }

    #[test]
    fn test_flat_series_has_no_winner() {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let series = PriceSeries::from_closes(start, &[50.0; 60]).unwrap();
        let result = GridSearch::new(ParamGrid::default()).run(&series).unwrap();
        assert_eq!(result.grid.len(), 20);
        assert!(result.best.is_none());
        assert!(result.best_params().is_none());
    }

    #[test]
    fn test_deterministic_and_parallel_matches_sequential() {
        let series = wavy_series(200);
        let grid = ParamGrid::new(vec![5, 10], vec![1.0, 1.5]).unwrap();

        let sequential = GridSearch::new(grid.clone()).with_parallel(false).run(&series).unwrap();
        let parallel = GridSearch::new(grid.clone()).run(&series).unwrap();
        let again = GridSearch::new(grid).run(&series).unwrap();

        assert_eq!(sequential, parallel);
        assert_eq!(parallel, again);
        assert_eq!(sequential.grid.len(), 4);
        assert_eq!(sequential.grid[1].params, BandParams { window: 5, num_std: 1.5 });
    }

    #[test]
    fn test_best_is_max_sharpe() {
        let series = wavy_series(250);
        let result = GridSearch::new(ParamGrid::default()).run(&series).unwrap();
        assert!(result.best.is_some(), "wavy fixture should trade");
        let best = result.best.unwrap();
        let top = best.sharpe_ratio.unwrap();
        assert_eq!(result.best_sharpe(), Some(top));
        assert!(result
            .grid
            .iter()
            .filter_map(|e| e.sharpe_ratio)
            .all(|s| s <= top));
    }

    #[test]
    fn test_empty_series_is_no_data() {
        let err = GridSearch::new(ParamGrid::default())
            .run(&PriceSeries::default())
            .unwrap_err();
        assert!(err.is_no_data());
    }
}
