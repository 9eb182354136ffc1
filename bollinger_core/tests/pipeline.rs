//! End-to-end checks of bands -> signals -> simulation -> metrics.

use bollinger_core::backtest::position::positions_from_signals;
use bollinger_core::data::loader::load_prices;
use bollinger_core::{
    BandParams, BollingerStrategy, GridSearch, ParamGrid, Position, PriceSeries, Signal,
};
use chrono::NaiveDate;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

/// Deterministic oscillating prices that cross the bands several times
fn choppy_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            let shock = if i % 17 == 0 { -6.0 } else if i % 23 == 0 { 6.0 } else { 0.0 };
            100.0 + 5.0 * (t / 6.0).sin() + 2.0 * (t / 2.3).cos() + shock + 0.02 * t
        })
        .collect()
}

fn choppy_series(n: usize) -> PriceSeries {
    PriceSeries::from_closes(start(), &choppy_closes(n)).unwrap()
}

// ============================================================================
// INDICATOR
// ============================================================================

#[test]
fn test_middle_band_matches_trailing_mean() {
    let closes = choppy_closes(80);
    let series = PriceSeries::from_closes(start(), &closes).unwrap();

    for window in [1, 2, 5, 20] {
        let strategy = BollingerStrategy::new(BandParams::new(window, 2.0).unwrap()).unwrap();
        let frame = strategy.generate_signals(&series);
        for (i, band) in frame.bands.iter().enumerate() {
            if i + 1 < window {
                assert!(band.is_none(), "window {} index {} should be undefined", window, i);
                continue;
            }
            let expected = closes[i + 1 - window..=i].iter().sum::<f64>() / window as f64;
            let band = band.expect("band defined once the window is full");
            assert!((band.middle - expected).abs() < 1e-9);
            assert!(band.lower <= band.middle && band.middle <= band.upper);
        }
    }
}

#[test]
fn test_signals_never_fire_on_first_band_date() {
    let series = choppy_series(150);
    for window in [3, 10, 20] {
        let strategy = BollingerStrategy::new(BandParams::new(window, 1.0).unwrap()).unwrap();
        let frame = strategy.generate_signals(&series);
        assert!(frame.signals[..window].iter().all(|s| *s == Signal::Hold));
    }
}

#[test]
fn test_dip_and_recovery_buys_on_recovery() {
    let series =
        PriceSeries::from_closes(start(), &[100.0, 100.0, 100.0, 100.0, 100.0, 90.0, 100.0])
            .unwrap();
    let strategy = BollingerStrategy::new(BandParams::new(5, 1.0).unwrap()).unwrap();
    let frame = strategy.generate_signals(&series);
    assert_eq!(frame.signals[5], Signal::Hold);
    assert_eq!(frame.signals[6], Signal::Buy);
}

// ============================================================================
// SIMULATION
// ============================================================================

#[test]
fn test_positions_follow_state_machine() {
    let series = choppy_series(300);
    let strategy = BollingerStrategy::new(BandParams::new(10, 1.5).unwrap()).unwrap();
    let result = strategy.backtest(&series, 10000.0).unwrap();

    let signals = &result.indicators.signals;
    let positions = result.simulation.positions();
    assert_eq!(positions, positions_from_signals(signals));
    assert!(result.metrics.total_trades > 0, "fixture should trade");

    let mut prev = Position::Flat;
    for (i, &pos) in positions.iter().enumerate() {
        if prev == Position::Flat && pos == Position::Long {
            assert_eq!(signals[i], Signal::Buy);
        }
        if prev == Position::Long && pos == Position::Flat {
            assert_eq!(signals[i], Signal::Sell);
        }
        prev = pos;
    }
}

#[test]
fn test_no_lookahead_and_flat_returns() {
    let series = choppy_series(300);
    let closes = series.closes();
    let strategy = BollingerStrategy::new(BandParams::new(10, 1.5).unwrap()).unwrap();
    let result = strategy.backtest(&series, 10000.0).unwrap();
    let rows = &result.simulation.rows;

    assert_eq!(rows[0].strategy_return, 0.0);
    assert_eq!(rows[0].portfolio_value, 10000.0);
    for i in 1..rows.len() {
        if rows[i - 1].position == Position::Flat {
            assert_eq!(rows[i].strategy_return, 0.0);
            assert_eq!(rows[i].portfolio_value, rows[i - 1].portfolio_value);
        } else {
            let expected = closes[i] / closes[i - 1] - 1.0;
            assert_eq!(rows[i].strategy_return, expected);
        }
        assert!(rows[i].portfolio_value >= 0.0);
    }
}

#[test]
fn test_constant_prices() {
    let series = PriceSeries::from_closes(start(), &[100.0; 30]).unwrap();
    let result = BollingerStrategy::new(BandParams::new(20, 2.0).unwrap())
        .unwrap()
        .backtest(&series, 10000.0)
        .unwrap();

    for band in result.indicators.bands.iter().flatten() {
        assert_eq!(band.upper, 100.0);
        assert_eq!(band.lower, 100.0);
    }
    assert!(result.indicators.signals.iter().all(|s| *s == Signal::Hold));
    assert!(result.simulation.positions().iter().all(|p| *p == Position::Flat));
    assert_eq!(result.metrics.total_return, 0.0);
    assert_eq!(result.metrics.sharpe_ratio, 0.0);
    assert!(!result.metrics.sharpe_ratio.is_nan());
}

#[test]
fn test_idempotent() {
    let series = choppy_series(250);
    let strategy = BollingerStrategy::new(BandParams::new(15, 2.0).unwrap()).unwrap();
    let first = strategy.backtest(&series, 5000.0).unwrap();
    let second = strategy.backtest(&series, 5000.0).unwrap();
    assert_eq!(first, second);
}

// ============================================================================
// PARAMETER SEARCH
// ============================================================================

#[test]
fn test_small_grid_is_stable() {
    let series = choppy_series(300);
    let grid = ParamGrid::new(vec![10, 20], vec![1.5, 2.0]).unwrap();

    let winners: Vec<_> = (0..5)
        .map(|_| {
            GridSearch::new(grid.clone())
                .run(&series)
                .unwrap()
                .best_params()
        })
        .collect();
    assert!(winners[0].is_some(), "fixture should produce a winner");
    assert!(winners.windows(2).all(|w| w[0] == w[1]));
}

// ============================================================================
// CSV INPUT
// ============================================================================

#[test]
fn test_csv_to_metrics() {
    let mut csv = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for (i, close) in choppy_closes(60).iter().enumerate() {
        let date = start() + chrono::Duration::days(i as i64);
        csv.push_str(&format!("{},0,0,0,{:.4},0,0\n", date.format("%Y-%m-%d"), close));
    }

    let series = load_prices(csv.as_bytes(), None, None).unwrap();
    assert_eq!(series.len(), 60);

    let result = BollingerStrategy::new(BandParams::default())
        .unwrap()
        .backtest(&series, 10000.0)
        .unwrap();
    assert_eq!(result.simulation.rows.len(), 60);
    assert!(result.metrics.max_drawdown <= 0.0);
    assert!((0.0..=1.0).contains(&result.metrics.win_rate));
}
