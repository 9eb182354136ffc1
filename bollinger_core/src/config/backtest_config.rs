use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backtest::metrics::MetricsCalculator;
use crate::compare::comparison::{default_strategies, StrategySpec};
use crate::common::{
    error::{BacktestError, ErrCode},
    time::parse_date,
};
use crate::config::param_grid::{
    BandParams, GridRange, ParamGrid, DEFAULT_NUM_STD, DEFAULT_WINDOW,
};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10000.0;
pub const DEFAULT_TRADING_DAYS: f64 = 252.0;

/// Backtest run configuration
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub ticker: String,
    /// Inclusive
    pub start_date: Option<NaiveDate>,
    /// Exclusive
    pub end_date: Option<NaiveDate>,
    pub initial_capital: f64,
    pub window: usize,
    pub num_std: f64,
    pub optimize: bool,
    /// Annual rate subtracted from returns in the Sharpe numerator
    pub risk_free_rate: f64,
    pub trading_days: f64,
    pub grid: ParamGrid,
    pub parallel: bool,
    /// Named strategies for comparison runs
    pub strategies: Vec<StrategySpec>,
}

impl BacktestConfig {
    pub fn new(conf: Option<HashMap<String, Value>>) -> Result<Self, BacktestError> {
        let mut conf = ConfigWithCheck::new(conf.unwrap_or_default());

        let start_date = conf
            .get::<String>("start_date")?
            .map(|s| parse_date(&s))
            .transpose()?;
        let end_date = conf
            .get::<String>("end_date")?
            .map(|s| parse_date(&s))
            .transpose()?;

        let grid = match (
            conf.get::<GridRange>("grid_range")?,
            conf.get::<Vec<usize>>("grid_windows")?,
            conf.get::<Vec<f64>>("grid_num_stds")?,
        ) {
            (Some(range), None, None) => range.to_grid()?,
            (Some(_), _, _) => {
                return Err(BacktestError::new(
                    "grid_range cannot be combined with grid_windows or grid_num_stds",
                    ErrCode::ConfigError,
                ))
            }
            (None, None, None) => ParamGrid::default(),
            (None, windows, num_stds) => {
                let default = ParamGrid::default();
                ParamGrid::new(
                    windows.unwrap_or_else(|| default.windows().to_vec()),
                    num_stds.unwrap_or_else(|| default.num_stds().to_vec()),
                )?
            }
        };

        let config = Self {
            ticker: conf.get("ticker")?.unwrap_or_else(|| "AAPL".to_string()),
            start_date,
            end_date,
            initial_capital: conf.get("initial_capital")?.unwrap_or(DEFAULT_INITIAL_CAPITAL),
            window: conf.get("window")?.unwrap_or(DEFAULT_WINDOW),
            num_std: conf.get("num_std")?.unwrap_or(DEFAULT_NUM_STD),
            optimize: conf.get("optimize")?.unwrap_or(false),
            risk_free_rate: conf.get("risk_free_rate")?.unwrap_or(0.0),
            trading_days: conf.get("trading_days")?.unwrap_or(DEFAULT_TRADING_DAYS),
            grid,
            parallel: conf.get("parallel")?.unwrap_or(true),
            strategies: conf
                .get("strategies")?
                .unwrap_or_else(default_strategies),
        };

        conf.check()?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        self.band_params()?;
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(BacktestError::new(
                format!("initial_capital must be positive, got {}", self.initial_capital),
                ErrCode::ParaError,
            ));
        }
        if !self.trading_days.is_finite() || self.trading_days <= 0.0 {
            return Err(BacktestError::new(
                format!("trading_days must be positive, got {}", self.trading_days),
                ErrCode::ParaError,
            ));
        }
        if !self.risk_free_rate.is_finite() || self.risk_free_rate <= -1.0 {
            return Err(BacktestError::new(
                format!("risk_free_rate out of range: {}", self.risk_free_rate),
                ErrCode::ParaError,
            ));
        }
        if self.strategies.is_empty() {
            return Err(BacktestError::new(
                "strategies must name at least one strategy",
                ErrCode::ConfigError,
            ));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start >= end {
                return Err(BacktestError::new(
                    format!("start_date {} must be before end_date {}", start, end),
                    ErrCode::ParaError,
                ));
            }
        }
        Ok(())
    }

    pub fn band_params(&self) -> Result<BandParams, BacktestError> {
        BandParams::new(self.window, self.num_std)
    }

    pub fn metrics_calculator(&self) -> MetricsCalculator {
        MetricsCalculator::new(self.trading_days, self.risk_free_rate)
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            ticker: "AAPL".to_string(),
            start_date: None,
            end_date: None,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            window: DEFAULT_WINDOW,
            num_std: DEFAULT_NUM_STD,
            optimize: false,
            risk_free_rate: 0.0,
            trading_days: DEFAULT_TRADING_DAYS,
            grid: ParamGrid::default(),
            parallel: true,
            strategies: default_strategies(),
        }
    }
}

pub fn read_json_map(path: &Path) -> Result<HashMap<String, Value>, BacktestError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        BacktestError::new(
            format!("cannot read config {}: {}", path.display(), e),
            ErrCode::ConfigError,
        )
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Key/value config that tracks which keys were consumed
#[derive(Debug, Default)]
pub struct ConfigWithCheck {
    conf: HashMap<String, Value>,
}

impl ConfigWithCheck {
    pub fn new(conf: HashMap<String, Value>) -> Self {
        Self { conf }
    }

    /// Take a key out of the config, `Ok(None)` when absent or null
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, BacktestError> {
        match self.conf.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => serde_json::from_value(v).map(Some).map_err(|e| {
                BacktestError::new(format!("invalid value for {}: {}", key, e), ErrCode::ConfigError)
            }),
        }
    }

    /// Fails if any key was left unconsumed
    pub fn check(&self) -> Result<(), BacktestError> {
        if self.conf.is_empty() {
            return Ok(());
        }
        let mut keys: Vec<&str> = self.conf.keys().map(String::as_str).collect();
        keys.sort_unstable();
        Err(BacktestError::new(
            format!("unknown para = {}", keys.join(", ")),
            ErrCode::ConfigError,
        ))
    }
}
