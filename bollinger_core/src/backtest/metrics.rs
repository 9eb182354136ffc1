use serde::Serialize;

use crate::common::utils::{mean, sample_std};

/// Summary performance of one backtest
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    /// Non-positive fraction, e.g. -0.25 for a 25% peak-to-trough loss
    pub max_drawdown: f64,
    /// Share of winning periods among periods with a non-zero return
    pub win_rate: f64,
    pub total_trades: usize,
    pub final_value: f64,
}

/// Annualisation settings for the metrics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsCalculator {
    trading_days: f64,
    risk_free_rate: f64,
}

impl MetricsCalculator {
    pub fn new(trading_days: f64, risk_free_rate: f64) -> Self {
        Self {
            trading_days,
            risk_free_rate,
        }
    }

    /// Calculate all metrics from the portfolio curve and per-period returns.
    ///
    /// `portfolio_values[0]` is the initial capital. Every date counts,
    /// including the warm-up dates before the bands exist, which always
    /// carry a zero return. A longer window therefore adds more zero periods,
    /// which dilutes its mean return and volatility and stretches the
    /// annualisation horizon. Compare Sharpe ratios across windows with that
    /// in mind.
    pub fn calculate(
        &self,
        portfolio_values: &[f64],
        strategy_returns: &[f64],
        total_trades: usize,
    ) -> Metrics {
        let initial = portfolio_values.first().copied().unwrap_or(0.0);
        let final_value = portfolio_values.last().copied().unwrap_or(initial);
        let total_return = Self::total_return(initial, final_value);

        Metrics {
            total_return,
            annualized_return: self.annualized_return(total_return, strategy_returns.len()),
            annualized_volatility: self.annualized_volatility(strategy_returns),
            sharpe_ratio: self.sharpe_ratio(strategy_returns).unwrap_or(0.0),
            max_drawdown: Self::max_drawdown(portfolio_values),
            win_rate: Self::win_rate(strategy_returns),
            total_trades,
            final_value,
        }
    }

    fn total_return(initial: f64, final_value: f64) -> f64 {
        if initial <= 0.0 {
            return 0.0;
        }
        final_value / initial - 1.0
    }

    fn annualized_return(&self, total_return: f64, periods: usize) -> f64 {
        if periods == 0 {
            return 0.0;
        }
        if total_return <= -1.0 {
            return -1.0;
        }
        let years = periods as f64 / self.trading_days;
        (1.0 + total_return).powf(1.0 / years) - 1.0
    }

    fn annualized_volatility(&self, returns: &[f64]) -> f64 {
        sample_std(returns).unwrap_or(0.0) * self.trading_days.sqrt()
    }

    /// Annualised Sharpe ratio, `None` when the deviation is zero or undefined
    pub fn sharpe_ratio(&self, returns: &[f64]) -> Option<f64> {
        let std = sample_std(returns)?;
        if std == 0.0 || !std.is_finite() {
            return None;
        }
        let daily_rf = (1.0 + self.risk_free_rate).powf(1.0 / self.trading_days) - 1.0;
        Some((mean(returns) - daily_rf) / std * self.trading_days.sqrt())
    }

    fn max_drawdown(portfolio_values: &[f64]) -> f64 {
        let mut peak = f64::MIN;
        let mut max_dd = 0.0f64;
        for &value in portfolio_values {
            peak = peak.max(value);
            if peak > 0.0 {
                max_dd = max_dd.min(value / peak - 1.0);
            }
        }
        max_dd
    }

    fn win_rate(returns: &[f64]) -> f64 {
        let active = returns.iter().filter(|&&r| r != 0.0).count();
        if active == 0 {
            return 0.0;
        }
        let wins = returns.iter().filter(|&&r| r > 0.0).count();
        wins as f64 / active as f64
    }
}

impl Default for MetricsCalculator {
    fn default() -> Self {
        Self::new(252.0, 0.0)
    }
}
