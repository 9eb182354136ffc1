pub mod backtest;
pub mod common;
pub mod compare;
pub mod config;
pub mod data;
pub mod math;
pub mod optimize;
pub mod signal;
pub mod strategy;

pub use backtest::metrics::{Metrics, MetricsCalculator};
pub use backtest::simulator::{BacktestRow, SimulationResult, Simulator, Trade};
pub use common::enums::{Position, PositionStatus, Signal};
pub use common::error::{BacktestError, ErrCode};
pub use config::backtest_config::BacktestConfig;
pub use config::param_grid::{BandParams, ParamGrid};
pub use data::price_series::{PricePoint, PriceSeries};
pub use math::boll::BandTriple;
pub use optimize::grid_search::{GridSearch, OptimizationResult};
pub use strategy::bollinger_strategy::{BacktestResult, BollingerStrategy};
