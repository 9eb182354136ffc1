pub mod backtest_config;
pub mod param_grid;
