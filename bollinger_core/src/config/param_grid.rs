use serde::{Deserialize, Serialize};

use crate::common::{
    error::{BacktestError, ErrCode},
    utils::round_to,
};

pub const DEFAULT_WINDOW: usize = 20;
pub const DEFAULT_NUM_STD: f64 = 2.0;
/// Upper bound on values per grid axis
pub const MAX_AXIS_POINTS: usize = 10_000;

/// Band parameters: look-back window and band width in standard deviations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandParams {
    pub window: usize,
    pub num_std: f64,
}

impl BandParams {
    pub fn new(window: usize, num_std: f64) -> Result<Self, BacktestError> {
        let params = Self { window, num_std };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.window == 0 {
            return Err(BacktestError::new(
                "window must be a positive integer",
                ErrCode::ParaError,
            ));
        }
        if !self.num_std.is_finite() || self.num_std <= 0.0 {
            return Err(BacktestError::new(
                format!("num_std must be a positive number, got {}", self.num_std),
                ErrCode::ParaError,
            ));
        }
        Ok(())
    }
}

impl Default for BandParams {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            num_std: DEFAULT_NUM_STD,
        }
    }
}

/// Inclusive parameter ranges, the `grid_range` config key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridRange {
    pub window_lo: usize,
    pub window_hi: usize,
    #[serde(default = "default_window_step")]
    pub window_step: usize,
    pub num_std_lo: f64,
    pub num_std_hi: f64,
    pub num_std_step: f64,
}

fn default_window_step() -> usize {
    1
}

impl GridRange {
    pub fn to_grid(&self) -> Result<ParamGrid, BacktestError> {
        ParamGrid::from_ranges(
            self.window_lo,
            self.window_hi,
            self.window_step,
            self.num_std_lo,
            self.num_std_hi,
            self.num_std_step,
        )
    }
}

/// Finite (window, num_std) grid, iterated window-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    windows: Vec<usize>,
    num_stds: Vec<f64>,
}

impl ParamGrid {
    pub fn new(windows: Vec<usize>, num_stds: Vec<f64>) -> Result<Self, BacktestError> {
        if windows.is_empty() || num_stds.is_empty() {
            return Err(BacktestError::new(
                "parameter grid needs at least one window and one num_std",
                ErrCode::ParaError,
            ));
        }
        for &window in &windows {
            for &num_std in &num_stds {
                BandParams { window, num_std }.validate()?;
            }
        }
        Ok(Self { windows, num_stds })
    }

    /// Build a grid from inclusive ranges.
    ///
    /// `num_std` values are `lo, lo + step, ...` up to and including `hi`,
    /// rounded to ten decimals.
    pub fn from_ranges(
        window_lo: usize,
        window_hi: usize,
        window_step: usize,
        num_std_lo: f64,
        num_std_hi: f64,
        num_std_step: f64,
    ) -> Result<Self, BacktestError> {
        if window_step == 0 || window_lo > window_hi {
            return Err(BacktestError::new(
                format!(
                    "invalid window range {}..={} step {}",
                    window_lo, window_hi, window_step
                ),
                ErrCode::ParaError,
            ));
        }
        if !(num_std_step > 0.0) || !(num_std_lo <= num_std_hi) {
            return Err(BacktestError::new(
                format!(
                    "invalid num_std range {}..={} step {}",
                    num_std_lo, num_std_hi, num_std_step
                ),
                ErrCode::ParaError,
            ));
        }

        let window_points = ((window_hi - window_lo) / window_step).saturating_add(1);
        if window_points > MAX_AXIS_POINTS {
            return Err(BacktestError::new(
                format!(
                    "window range {}..={} step {} has {} points, limit is {}",
                    window_lo, window_hi, window_step, window_points, MAX_AXIS_POINTS
                ),
                ErrCode::ParaError,
            ));
        }
        let steps = round_to((num_std_hi - num_std_lo) / num_std_step, 6).floor();
        if !steps.is_finite() || steps >= MAX_AXIS_POINTS as f64 {
            return Err(BacktestError::new(
                format!(
                    "num_std range {}..={} step {} exceeds {} points",
                    num_std_lo, num_std_hi, num_std_step, MAX_AXIS_POINTS
                ),
                ErrCode::ParaError,
            ));
        }

        let windows: Vec<usize> = (window_lo..=window_hi).step_by(window_step).collect();
        let num_stds: Vec<f64> = (0..=steps as usize)
            .map(|i| round_to(num_std_lo + i as f64 * num_std_step, 10))
            .collect();

        Self::new(windows, num_stds)
    }

    pub fn windows(&self) -> &[usize] {
        &self.windows
    }

    pub fn num_stds(&self) -> &[f64] {
        &self.num_stds
    }

    pub fn len(&self) -> usize {
        self.windows.len() * self.num_stds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = BandParams> + '_ {
        self.windows.iter().flat_map(move |&window| {
            self.num_stds
                .iter()
                .map(move |&num_std| BandParams { window, num_std })
        })
    }
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            windows: vec![10, 15, 20, 25, 30],
            num_stds: vec![1.5, 2.0, 2.5, 3.0],
        }
    }
}
