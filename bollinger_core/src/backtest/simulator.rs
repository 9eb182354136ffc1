use chrono::NaiveDate;
use serde::Serialize;

use crate::common::{
    enums::{Position, PositionStatus, Signal},
    error::{BacktestError, ErrCode},
};
use crate::data::price_series::PriceSeries;

/// One simulated date
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BacktestRow {
    pub date: NaiveDate,
    pub price: f64,
    pub signal: Signal,
    pub position: Position,
    pub status: PositionStatus,
    /// Close-to-close return of the asset
    pub market_return: f64,
    /// Return earned by the position held coming into this date
    pub strategy_return: f64,
    pub portfolio_value: f64,
}

/// A completed or still-open round trip
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: Option<NaiveDate>,
    pub exit_price: Option<f64>,
    /// Exit (or last close when still open) over entry, minus one
    pub trade_return: f64,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.exit_date.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub initial_capital: f64,
    pub rows: Vec<BacktestRow>,
    pub trades: Vec<Trade>,
}

impl SimulationResult {
    pub fn positions(&self) -> Vec<Position> {
        self.rows.iter().map(|r| r.position).collect()
    }

    pub fn strategy_returns(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.strategy_return).collect()
    }

    pub fn portfolio_values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.portfolio_value).collect()
    }

    pub fn final_value(&self) -> f64 {
        self.rows.last().map_or(self.initial_capital, |r| r.portfolio_value)
    }
}

/// Long-only simulator.
///
/// A signal on date t changes the position at t's close; the return for
/// (t-1, t] always uses the position held at t-1.
#[derive(Debug, Clone, Copy)]
pub struct Simulator {
    initial_capital: f64,
}

impl Simulator {
    pub fn new(initial_capital: f64) -> Result<Self, BacktestError> {
        if !initial_capital.is_finite() || initial_capital <= 0.0 {
            return Err(BacktestError::new(
                format!("initial_capital must be positive, got {}", initial_capital),
                ErrCode::ParaError,
            ));
        }
        Ok(Self { initial_capital })
    }

    pub fn run(
        &self,
        series: &PriceSeries,
        signals: &[Signal],
    ) -> Result<SimulationResult, BacktestError> {
        if series.is_empty() {
            return Err(BacktestError::no_data("cannot simulate an empty price series"));
        }
        if signals.len() != series.len() {
            return Err(BacktestError::new(
                format!(
                    "{} signals for {} prices",
                    signals.len(),
                    series.len()
                ),
                ErrCode::SignalNotAligned,
            ));
        }

        let points = series.points();
        let mut rows = Vec::with_capacity(points.len());
        let mut trades = Vec::new();
        let mut open_trade: Option<Trade> = None;
        let mut position = Position::Flat;
        let mut value = self.initial_capital;

        for (i, (point, &signal)) in points.iter().zip(signals).enumerate() {
            let market_return = if i == 0 {
                0.0
            } else {
                point.close / points[i - 1].close - 1.0
            };
            let strategy_return = if position.is_long() { market_return } else { 0.0 };
            value *= 1.0 + strategy_return;

            let next = position.on_signal(signal);
            match (position, next) {
                (Position::Flat, Position::Long) => {
                    open_trade = Some(Trade {
                        entry_date: point.date,
                        entry_price: point.close,
                        exit_date: None,
                        exit_price: None,
                        trade_return: 0.0,
                    });
                }
                (Position::Long, Position::Flat) => {
                    if let Some(mut trade) = open_trade.take() {
                        trade.exit_date = Some(point.date);
                        trade.exit_price = Some(point.close);
                        trade.trade_return = point.close / trade.entry_price - 1.0;
                        trades.push(trade);
                    }
                }
                _ => {}
            }

            rows.push(BacktestRow {
                date: point.date,
                price: point.close,
                signal,
                position: next,
                status: PositionStatus::from_transition(position, next),
                market_return,
                strategy_return,
                portfolio_value: value,
            });
            position = next;
        }

        if let (Some(mut trade), Some(last)) = (open_trade, points.last()) {
            trade.trade_return = last.close / trade.entry_price - 1.0;
            trades.push(trade);
        }

        Ok(SimulationResult {
            initial_capital: self.initial_capital,
            rows,
            trades,
        })
    }
}
