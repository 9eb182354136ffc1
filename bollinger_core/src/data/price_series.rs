use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::common::error::{BacktestError, ErrCode};

/// One closing price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Date-ordered closing prices.
///
/// Dates are strictly increasing and every close is finite and positive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, BacktestError> {
        for (i, p) in points.iter().enumerate() {
            if !p.close.is_finite() || p.close <= 0.0 {
                return Err(BacktestError::new(
                    format!("invalid close {} on {}", p.close, p.date),
                    ErrCode::PriceBelowZero,
                ));
            }
            if i > 0 && points[i - 1].date >= p.date {
                return Err(BacktestError::new(
                    format!(
                        "dates must be strictly increasing: {} followed by {}",
                        points[i - 1].date, p.date
                    ),
                    ErrCode::DatesNotMonotonous,
                ));
            }
        }
        Ok(Self { points })
    }

    /// Closes on consecutive calendar days starting at `start`
    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> Result<Self, BacktestError> {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint::new(start + Duration::days(i as i64), close))
            .collect();
        Self::new(points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}
