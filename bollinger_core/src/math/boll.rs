use std::collections::VecDeque;

use serde::Serialize;

use crate::common::{enums::BandZone, utils::sample_std};
use crate::config::param_grid::BandParams;

/// Middle, upper and lower band at one date
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandTriple {
    pub middle: f64,
    pub upper: f64,
    pub lower: f64,
}

impl BandTriple {
    pub fn zone(&self, price: f64) -> BandZone {
        if price < self.lower {
            BandZone::Below
        } else if price > self.upper {
            BandZone::Above
        } else {
            BandZone::Inside
        }
    }
}

/// Streaming Bollinger model over a fixed trailing window.
///
/// Uses the sample standard deviation (divisor `window - 1`); a window of
/// one has zero deviation.
#[derive(Debug, Clone)]
pub struct BollModel {
    window: usize,
    k: f64,
    prices: VecDeque<f64>,
}

impl BollModel {
    pub fn new(params: &BandParams) -> Self {
        Self {
            window: params.window,
            k: params.num_std,
            prices: VecDeque::with_capacity(params.window),
        }
    }

    /// Push the next close; bands appear once the window is full
    pub fn add(&mut self, price: f64) -> Option<BandTriple> {
        self.prices.push_back(price);
        if self.prices.len() > self.window {
            self.prices.pop_front();
        }
        if self.prices.len() < self.window {
            return None;
        }

        let (head, tail) = self.prices.as_slices();
        let window: Vec<f64> = head.iter().chain(tail).copied().collect();
        let mid = window.iter().sum::<f64>() / window.len() as f64;
        let std_dev = sample_std(&window).unwrap_or(0.0);

        Some(BandTriple {
            middle: mid,
            upper: mid + self.k * std_dev,
            lower: mid - self.k * std_dev,
        })
    }
}

/// Bands for every close, `None` before the window fills
pub fn compute_bands(closes: &[f64], params: &BandParams) -> Vec<Option<BandTriple>> {
    let mut model = BollModel::new(params);
    closes.iter().map(|&price| model.add(price)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn params(window: usize, num_std: f64) -> BandParams {
        BandParams::new(window, num_std).unwrap()
    }

    #[test]
    fn test_bands_undefined_before_window() {
        let bands = compute_bands(&[1.0, 2.0, 3.0, 4.0], &params(3, 2.0));
        assert!(bands[0].is_none());
        assert!(bands[1].is_none());
        assert!(bands[2].is_some());
        assert!(bands[3].is_some());
    }

    #[test]
    fn test_middle_is_trailing_mean() {
        let closes = [10.0, 11.0, 12.0, 13.0, 20.0];
        let bands = compute_bands(&closes, &params(3, 2.0));
        assert!((bands[2].unwrap().middle - 11.0).abs() < EPS);
        assert!((bands[3].unwrap().middle - 12.0).abs() < EPS);
        assert!((bands[4].unwrap().middle - 15.0).abs() < EPS);
    }

    #[test]
    fn test_sample_std_width() {
        // window [1, 3, 5]: mean 3, sample std 2
        let bands = compute_bands(&[1.0, 3.0, 5.0], &params(3, 1.5));
        let band = bands[2].unwrap();
        assert!((band.upper - 6.0).abs() < EPS);
        assert!((band.lower - 0.0).abs() < EPS);
    }

    #[test]
    fn test_constant_prices_collapse_bands() {
        let bands = compute_bands(&[100.0; 30], &params(20, 2.0));
        for band in bands.iter().skip(19) {
            let band = band.unwrap();
            assert_eq!(band.middle, 100.0);
            assert_eq!(band.upper, 100.0);
            assert_eq!(band.lower, 100.0);
        }
    }

    #[test]
    fn test_window_of_one() {
        let bands = compute_bands(&[5.0, 7.0], &params(1, 2.0));
        assert_eq!(
            bands[1],
            Some(BandTriple { middle: 7.0, upper: 7.0, lower: 7.0 })
        );
    }

    #[test]
    fn test_zone() {
        let band = BandTriple { middle: 10.0, upper: 12.0, lower: 8.0 };
        assert_eq!(band.zone(7.9), BandZone::Below);
        assert_eq!(band.zone(8.0), BandZone::Inside);
        assert_eq!(band.zone(12.0), BandZone::Inside);
        assert_eq!(band.zone(12.1), BandZone::Above);
    }

    #[test]
    fn test_short_series_has_no_bands() {
        let bands = compute_bands(&[1.0, 2.0], &params(20, 2.0));
        assert!(bands.iter().all(Option::is_none));
        assert!(compute_bands(&[], &params(20, 2.0)).is_empty());
    }
}
