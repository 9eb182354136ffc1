use std::error::Error;
use std::path::{Path, PathBuf};

use bollinger_core::common::time::to_date_str;
use bollinger_core::compare::comparison::StrategyComparison;
use bollinger_core::signal::crossover::SignalPoint;
use bollinger_core::{BacktestResult, Metrics};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
struct BacktestRecord {
    date: NaiveDate,
    price: f64,
    middle_band: Option<f64>,
    upper_band: Option<f64>,
    lower_band: Option<f64>,
    signal: i8,
    position: u8,
    status: String,
    #[serde(rename = "return")]
    market_return: f64,
    strategy_return: f64,
    portfolio_value: f64,
}

#[derive(Debug, Serialize)]
struct ComparisonRecord<'a> {
    strategy: &'a str,
    window: usize,
    num_std: f64,
    total_return: f64,
    annualized_return: f64,
    annualized_volatility: f64,
    sharpe_ratio: f64,
    max_drawdown: f64,
    win_rate: f64,
    total_trades: usize,
    final_value: f64,
}

pub fn print_performance_metrics(label: &str, metrics: &Metrics) {
    println!("\nPerformance Metrics ({})", label);
    println!("{}", "-".repeat(40));
    println!("{:<24}{:>15.2}%", "Total Return", metrics.total_return * 100.0);
    println!("{:<24}{:>15.2}%", "Annualized Return", metrics.annualized_return * 100.0);
    println!("{:<24}{:>15.2}%", "Annualized Volatility", metrics.annualized_volatility * 100.0);
    println!("{:<24}{:>16.2}", "Sharpe Ratio", metrics.sharpe_ratio);
    println!("{:<24}{:>15.2}%", "Max Drawdown", metrics.max_drawdown * 100.0);
    println!("{:<24}{:>15.2}%", "Win Rate", metrics.win_rate * 100.0);
    println!("{:<24}{:>16}", "Total Trades", metrics.total_trades);
    println!("{:<24}{:>16.2}", "Final Value", metrics.final_value);
}

pub fn print_comparison(comparison: &StrategyComparison) {
    println!(
        "\n{:<26}{:>10}{:>10}{:>10}{:>10}{:>8}",
        "Strategy", "Return", "Sharpe", "MaxDD", "WinRate", "Trades"
    );
    println!("{}", "-".repeat(74));
    for entry in &comparison.entries {
        let m = &entry.metrics;
        println!(
            "{:<26}{:>9.2}%{:>10.2}{:>9.2}%{:>9.2}%{:>8}",
            entry.name,
            m.total_return * 100.0,
            m.sharpe_ratio,
            m.max_drawdown * 100.0,
            m.win_rate * 100.0,
            m.total_trades
        );
    }
}

pub fn write_backtest_csv(
    out_dir: &Path,
    ticker: &str,
    result: &BacktestResult,
) -> Result<PathBuf, Box<dyn Error>> {
    let path = out_dir.join(format!("{}_backtest_results.csv", ticker));
    let mut wtr = csv::Writer::from_path(&path)?;

    for (row, band) in result.simulation.rows.iter().zip(&result.indicators.bands) {
        wtr.serialize(BacktestRecord {
            date: row.date,
            price: row.price,
            middle_band: band.map(|b| b.middle),
            upper_band: band.map(|b| b.upper),
            lower_band: band.map(|b| b.lower),
            signal: row.signal.as_i8(),
            position: u8::from(row.position.is_long()),
            status: row.status.to_string(),
            market_return: row.market_return,
            strategy_return: row.strategy_return,
            portfolio_value: row.portfolio_value,
        })?;
    }
    wtr.flush()?;

    info!(path = %path.display(), rows = result.simulation.rows.len(), "wrote backtest results");
    Ok(path)
}

/// One row per buy or sell
pub fn write_signals_csv(
    out_dir: &Path,
    ticker: &str,
    result: &BacktestResult,
) -> Result<PathBuf, Box<dyn Error>> {
    let path = out_dir.join(format!("{}_signals.csv", ticker));
    let mut wtr = csv::Writer::from_path(&path)?;
    for point in &result.signal_points {
        wtr.serialize(point)?;
    }
    wtr.flush()?;

    info!(path = %path.display(), signals = result.signal_points.len(), "wrote signals");
    Ok(path)
}

pub fn write_metrics_json(path: &Path, result: &BacktestResult) -> Result<(), Box<dyn Error>> {
    #[derive(Serialize)]
    struct MetricsReport<'a> {
        window: usize,
        num_std: f64,
        metrics: &'a Metrics,
        trades: &'a [bollinger_core::Trade],
        signals: &'a [SignalPoint],
    }

    let report = MetricsReport {
        window: result.params.window,
        num_std: result.params.num_std,
        metrics: &result.metrics,
        trades: &result.simulation.trades,
        signals: &result.signal_points,
    };
    std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
    info!(path = %path.display(), "wrote metrics");
    Ok(())
}

pub fn write_comparison_csvs(
    out_dir: &Path,
    ticker: &str,
    comparison: &StrategyComparison,
) -> Result<(), Box<dyn Error>> {
    let summary_path = out_dir.join(format!("{}_strategy_comparison.csv", ticker));
    let mut wtr = csv::Writer::from_path(&summary_path)?;
    for entry in &comparison.entries {
        let m = &entry.metrics;
        wtr.serialize(ComparisonRecord {
            strategy: &entry.name,
            window: entry.params.window,
            num_std: entry.params.num_std,
            total_return: m.total_return,
            annualized_return: m.annualized_return,
            annualized_volatility: m.annualized_volatility,
            sharpe_ratio: m.sharpe_ratio,
            max_drawdown: m.max_drawdown,
            win_rate: m.win_rate,
            total_trades: m.total_trades,
            final_value: m.final_value,
        })?;
    }
    wtr.flush()?;

    // wide layout: one column per strategy
    let values_path = out_dir.join(format!("{}_portfolio_values.csv", ticker));
    let mut wtr = csv::Writer::from_path(&values_path)?;
    let mut header = vec!["date".to_string()];
    header.extend(comparison.entries.iter().map(|e| e.name.clone()));
    wtr.write_record(&header)?;
    for (i, date) in comparison.dates.iter().enumerate() {
        let mut record = vec![to_date_str(date)];
        record.extend(
            comparison
                .entries
                .iter()
                .map(|e| e.portfolio_values.get(i).map_or(String::new(), |v| v.to_string())),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;

    info!(
        summary = %summary_path.display(),
        values = %values_path.display(),
        "wrote strategy comparison"
    );
    Ok(())
}
