use serde::Serialize;
use tracing::debug;

use crate::backtest::{
    metrics::{Metrics, MetricsCalculator},
    simulator::{SimulationResult, Simulator},
};
use crate::common::{enums::Signal, error::BacktestError};
use crate::config::param_grid::BandParams;
use crate::data::price_series::PriceSeries;
use crate::math::boll::{compute_bands, BandTriple};
use crate::signal::crossover::{derive_signals, signal_points, SignalPoint};

/// Bands and signals for every date of a series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorFrame {
    pub bands: Vec<Option<BandTriple>>,
    pub signals: Vec<Signal>,
}

/// Everything a report or chart needs from one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub params: BandParams,
    pub indicators: IndicatorFrame,
    pub simulation: SimulationResult,
    pub signal_points: Vec<SignalPoint>,
    pub metrics: Metrics,
}

/// Bollinger Bands mean-reversion strategy: buy the rebound off the lower
/// band, exit on the pullback from the upper band. Long only.
#[derive(Debug, Clone, Copy)]
pub struct BollingerStrategy {
    params: BandParams,
    metrics: MetricsCalculator,
}

impl BollingerStrategy {
    pub fn new(params: BandParams) -> Result<Self, BacktestError> {
        params.validate()?;
        Ok(Self {
            params,
            metrics: MetricsCalculator::default(),
        })
    }

    pub fn with_metrics(mut self, metrics: MetricsCalculator) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn generate_signals(&self, series: &PriceSeries) -> IndicatorFrame {
        let closes = series.closes();
        let bands = compute_bands(&closes, &self.params);
        let signals = derive_signals(&closes, &bands);
        IndicatorFrame { bands, signals }
    }

    pub fn backtest(
        &self,
        series: &PriceSeries,
        initial_capital: f64,
    ) -> Result<BacktestResult, BacktestError> {
        if series.is_empty() {
            return Err(BacktestError::no_data("price series is empty"));
        }
        let simulator = Simulator::new(initial_capital)?;
        if series.len() < self.params.window {
            debug!(
                rows = series.len(),
                window = self.params.window,
                "series shorter than window, no bands"
            );
        }

        let indicators = self.generate_signals(series);
        let simulation = simulator.run(series, &indicators.signals)?;
        let metrics = self.metrics.calculate(
            &simulation.portfolio_values(),
            &simulation.strategy_returns(),
            simulation.trades.len(),
        );
        let signal_points = signal_points(series, &indicators.signals);

        debug!(
            window = self.params.window,
            num_std = self.params.num_std,
            trades = metrics.total_trades,
            total_return = metrics.total_return,
            sharpe = metrics.sharpe_ratio,
            "backtest finished"
        );

        Ok(BacktestResult {
            params: self.params,
            indicators,
            simulation,
            signal_points,
            metrics,
        })
    }
}
