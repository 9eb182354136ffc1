mod report;

use std::collections::HashMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use bollinger_core::compare::comparison::{compare_strategies, select_strategies, StrategySpec};
use bollinger_core::config::backtest_config::read_json_map;
use bollinger_core::data::loader::load_prices_from_path;
use bollinger_core::{BacktestConfig, BollingerStrategy, GridSearch, PriceSeries};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "bollinger")]
#[command(about = "Bollinger Bands mean-reversion backtester", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one parameter set, optionally chosen by grid search
    Backtest {
        #[command(flatten)]
        common: CommonArgs,

        /// Band window in periods
        #[arg(long)]
        window: Option<usize>,

        /// Band width in standard deviations
        #[arg(long)]
        num_std: Option<f64>,

        /// Pick window and num_std by maximum Sharpe over the grid
        #[arg(long)]
        optimize: bool,

        /// Also write metrics and trades as JSON
        #[arg(long)]
        json_metrics: Option<PathBuf>,
    },

    /// Run the configured set of named strategies side by side
    Compare {
        #[command(flatten)]
        common: CommonArgs,

        /// Only run the named strategy; repeat to pick several
        #[arg(short, long = "strategy")]
        strategies: Vec<String>,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// CSV with a date column and a Close column
    #[arg(short, long)]
    data: PathBuf,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ticker label used in output file names
    #[arg(short, long)]
    ticker: Option<String>,

    /// First date to include (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<String>,

    /// First date to exclude (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<String>,

    #[arg(long)]
    initial_capital: Option<f64>,

    /// Directory for CSV output
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

impl CommonArgs {
    /// Config file keys, overridden by whatever was given on the command line
    fn config_map(&self) -> Result<HashMap<String, Value>, Box<dyn Error>> {
        let mut conf = match &self.config {
            Some(path) => read_json_map(path)?,
            None => HashMap::new(),
        };
        if let Some(ticker) = &self.ticker {
            conf.insert("ticker".into(), Value::from(ticker.as_str()));
        }
        if let Some(start) = &self.start_date {
            conf.insert("start_date".into(), Value::from(start.as_str()));
        }
        if let Some(end) = &self.end_date {
            conf.insert("end_date".into(), Value::from(end.as_str()));
        }
        if let Some(capital) = self.initial_capital {
            conf.insert("initial_capital".into(), Value::from(capital));
        }
        Ok(conf)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Backtest {
            common,
            window,
            num_std,
            optimize,
            json_metrics,
        } => {
            let mut conf = common.config_map()?;
            if let Some(window) = window {
                conf.insert("window".into(), Value::from(window));
            }
            if let Some(num_std) = num_std {
                conf.insert("num_std".into(), Value::from(num_std));
            }
            if optimize {
                conf.insert("optimize".into(), Value::Bool(true));
            }
            let config = BacktestConfig::new(Some(conf))?;
            let series = load_series(&common.data, &config)?;
            run_backtest(&config, &series, &common.output_dir, json_metrics.as_deref())?;
        }
        Commands::Compare { common, strategies } => {
            let config = BacktestConfig::new(Some(common.config_map()?))?;
            let specs = select_strategies(&config.strategies, &strategies)?;
            let series = load_series(&common.data, &config)?;
            run_compare(&config, &series, &specs, &common.output_dir)?;
        }
    }

    Ok(())
}

fn load_series(path: &Path, config: &BacktestConfig) -> Result<PriceSeries, Box<dyn Error>> {
    let series = match load_prices_from_path(path, config.start_date, config.end_date) {
        Ok(series) => series,
        Err(e) if e.is_no_data() => {
            warn!(
                ticker = %config.ticker,
                start = ?config.start_date,
                end = ?config.end_date,
                "no price data for the requested range"
            );
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        info!(
            ticker = %config.ticker,
            from = %first.date,
            to = %last.date,
            rows = series.len(),
            "price history ready"
        );
    }
    Ok(series)
}

fn run_backtest(
    config: &BacktestConfig,
    series: &PriceSeries,
    out_dir: &Path,
    json_metrics: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let mut params = config.band_params()?;

    if config.optimize {
        let search = GridSearch::new(config.grid.clone())
            .with_metrics(config.metrics_calculator())
            .with_initial_capital(config.initial_capital)
            .with_parallel(config.parallel);
        let result = search.run(series)?;
        match result.best_params() {
            Some(best) => {
                println!(
                    "Optimal parameters: window={}, num_std={} (Sharpe {:.2})",
                    best.window,
                    best.num_std,
                    result.best_sharpe().unwrap_or_default()
                );
                params = best;
            }
            None => warn!(
                window = params.window,
                num_std = params.num_std,
                "optimization found no winner, keeping configured parameters"
            ),
        }
    }

    let result = BollingerStrategy::new(params)?
        .with_metrics(config.metrics_calculator())
        .backtest(series, config.initial_capital)?;

    let label = format!("{}, window={}, num_std={}", config.ticker, params.window, params.num_std);
    report::print_performance_metrics(&label, &result.metrics);

    std::fs::create_dir_all(out_dir)?;
    let csv_path = report::write_backtest_csv(out_dir, &config.ticker, &result)?;
    let signals_path = report::write_signals_csv(out_dir, &config.ticker, &result)?;
    println!(
        "\nResults saved to {} and {}",
        csv_path.display(),
        signals_path.display()
    );

    if let Some(path) = json_metrics {
        report::write_metrics_json(path, &result)?;
    }
    Ok(())
}

fn run_compare(
    config: &BacktestConfig,
    series: &PriceSeries,
    specs: &[StrategySpec],
    out_dir: &Path,
) -> Result<(), Box<dyn Error>> {
    let comparison = compare_strategies(
        series,
        specs,
        config.initial_capital,
        config.metrics_calculator(),
    )?;
    report::print_comparison(&comparison);

    std::fs::create_dir_all(out_dir)?;
    report::write_comparison_csvs(out_dir, &config.ticker, &comparison)?;
    println!("\nComparison saved to {}", out_dir.display());
    Ok(())
}
