use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backtest::metrics::{Metrics, MetricsCalculator};
use crate::common::error::{BacktestError, ErrCode};
use crate::config::param_grid::BandParams;
use crate::data::price_series::PriceSeries;
use crate::strategy::bollinger_strategy::BollingerStrategy;

/// A named strategy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySpec {
    pub name: String,
    pub window: usize,
    pub num_std: f64,
}

impl StrategySpec {
    pub fn new(name: impl Into<String>, window: usize, num_std: f64) -> Self {
        Self {
            name: name.into(),
            window,
            num_std,
        }
    }
}

pub fn default_strategies() -> Vec<StrategySpec> {
    vec![
        StrategySpec::new("Default (20, 2.0)", 20, 2.0),
        StrategySpec::new("Narrow Bands (20, 1.5)", 20, 1.5),
        StrategySpec::new("Wide Bands (20, 2.5)", 20, 2.5),
        StrategySpec::new("Short Window (10, 2.0)", 10, 2.0),
        StrategySpec::new("Long Window (50, 2.0)", 50, 2.0),
    ]
}

/// Keep the specs whose names are listed, in their configured order.
///
/// An empty name list keeps everything.
pub fn select_strategies(
    specs: &[StrategySpec],
    names: &[String],
) -> Result<Vec<StrategySpec>, BacktestError> {
    if names.is_empty() {
        return Ok(specs.to_vec());
    }
    if let Some(unknown) = names.iter().find(|n| !specs.iter().any(|s| &s.name == *n)) {
        return Err(BacktestError::new(
            format!("unknown strategy: {}", unknown),
            ErrCode::ConfigError,
        ));
    }
    Ok(specs
        .iter()
        .filter(|s| names.contains(&s.name))
        .cloned()
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonEntry {
    pub name: String,
    pub params: BandParams,
    pub metrics: Metrics,
    #[serde(skip)]
    pub portfolio_values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyComparison {
    pub dates: Vec<NaiveDate>,
    pub entries: Vec<ComparisonEntry>,
}

/// Backtest every spec over the same series.
///
/// Specs that fail on their own parameters are logged and skipped; data
/// errors abort the whole comparison, and so does having no success.
pub fn compare_strategies(
    series: &PriceSeries,
    specs: &[StrategySpec],
    initial_capital: f64,
    metrics: MetricsCalculator,
) -> Result<StrategyComparison, BacktestError> {
    if series.is_empty() {
        return Err(BacktestError::no_data("cannot compare on an empty price series"));
    }

    let mut entries = Vec::with_capacity(specs.len());
    for spec in specs {
        info!(name = %spec.name, "running strategy");
        let run = BandParams::new(spec.window, spec.num_std)
            .and_then(BollingerStrategy::new)
            .and_then(|s| s.with_metrics(metrics).backtest(series, initial_capital));

        match run {
            Ok(result) => entries.push(ComparisonEntry {
                name: spec.name.clone(),
                params: result.params,
                metrics: result.metrics,
                portfolio_values: result.simulation.portfolio_values(),
            }),
            Err(e) if e.is_data_err() => return Err(e),
            Err(e) => warn!(name = %spec.name, error = %e, "strategy skipped"),
        }
    }

    if entries.is_empty() {
        return Err(BacktestError::new(
            "no strategy in the comparison ran successfully",
            ErrCode::NoSuccessfulRun,
        ));
    }

    Ok(StrategyComparison {
        dates: series.dates(),
        entries,
    })
}
