//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report;
use crate::domain::backtest::{BacktestConfig, Backtester, RunStatus};
use crate::domain::compare::compare_strategies;
use crate::domain::config_validation::{
    DataSettings, backtest_config_from, data_settings_from, seed_from, strategy_id_from,
    strategy_params_from, sweep_grid_from, sweep_min_trades_from, unknown_keys, validate_config,
};
use crate::domain::error::TraderError;
use crate::domain::ohlcv::{Bar, is_strictly_ascending};
use crate::domain::strategy::{StrategyId, StrategyParams, build_strategy};
use crate::domain::summary::TradeSummary;
use crate::domain::sweep::{SweepRequest, run_sweep};
use crate::ports::data_port::DataPort;

pub const DEFAULT_MIN_TRADES: usize = 3;

#[derive(Parser, Debug)]
#[command(name = "bartrader", about = "Bar-by-bar strategy backtester")]
pub struct Cli {
    /// Debug-level logging unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Strategy id or slug, overrides [strategy] id
        #[arg(short, long)]
        strategy: Option<String>,
        /// Bar CSV, overrides [data] path
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Force tiered slippage on
        #[arg(long)]
        slippage: bool,
    },
    /// Run the [sweep] parameter grid
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, default_value_t = 10)]
        top: usize,
        #[arg(long)]
        min_trades: Option<usize>,
    },
    /// Backtest every built-in strategy on the same bars and rank them
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        /// Bar CSV, overrides [data] path
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Force tiered slippage on
        #[arg(long)]
        slippage: bool,
    },
    /// List built-in strategies and their presets
    Strategies,
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing(cli.verbose);
    match cli.command {
        Command::Backtest {
            config,
            strategy,
            data,
            slippage,
        } => run_backtest(&config, strategy.as_deref(), data, slippage),
        Command::Sweep {
            config,
            top,
            min_trades,
        } => run_sweep_command(&config, top, min_trades),
        Command::Compare {
            config,
            data,
            slippage,
        } => run_compare(&config, data, slippage),
        Command::Strategies => {
            print!("{}", text_report::format_strategy_list());
            ExitCode::SUCCESS
        }
        Command::Validate { config } => run_validate(&config),
    }
}

/// Logs go to stderr so that report output on stdout stays clean.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn fail(err: TraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TraderError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    for key in unknown_keys(&adapter) {
        warn!(key = %key, "unrecognised config key ignored");
    }
    Ok(adapter)
}

/// Everything one run needs, resolved from config plus command-line overrides.
#[derive(Debug, Clone)]
pub struct RunSetup {
    pub strategy: StrategyId,
    pub params: StrategyParams,
    pub seed: u64,
    pub backtest: BacktestConfig,
    pub data: DataSettings,
}

pub fn prepare(
    config: &FileConfigAdapter,
    strategy_override: Option<&str>,
    data_override: Option<PathBuf>,
    force_slippage: bool,
) -> Result<RunSetup, TraderError> {
    let strategy = match strategy_override {
        Some(raw) => raw.parse()?,
        None => strategy_id_from(config)?,
    };
    let params = strategy_params_from(config)?;
    let seed = seed_from(config)?;
    let mut backtest = backtest_config_from(config, &strategy.preset())?;
    if force_slippage {
        backtest.slippage_enabled = true;
    }

    let data = resolve_data(config, data_override)?;

    Ok(RunSetup {
        strategy,
        params,
        seed,
        backtest,
        data,
    })
}

/// `[data]` with an optional path override. With an override the section
/// may be missing entirely.
pub fn resolve_data(
    config: &FileConfigAdapter,
    data_override: Option<PathBuf>,
) -> Result<DataSettings, TraderError> {
    match data_override {
        Some(path) => match data_settings_from(config) {
            Ok(from_file) => Ok(DataSettings { path, ..from_file }),
            Err(TraderError::ConfigMissing { .. }) => Ok(DataSettings {
                path,
                start: None,
                end: None,
            }),
            Err(e) => Err(e),
        },
        None => data_settings_from(config),
    }
}

pub fn load_bars(port: &dyn DataPort, data: &DataSettings) -> Result<Vec<Bar>, TraderError> {
    let bars = port.fetch_bars(data.start, data.end)?;
    if bars.is_empty() {
        return Err(TraderError::data(format!(
            "no bars in {} for the requested range",
            data.path.display()
        )));
    }
    if !is_strictly_ascending(&bars) {
        return Err(TraderError::data("bar timestamps must be strictly ascending"));
    }
    Ok(bars)
}

fn run_backtest(
    config_path: &Path,
    strategy_override: Option<&str>,
    data_override: Option<PathBuf>,
    force_slippage: bool,
) -> ExitCode {
    // Stage 1: Load and resolve config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    let setup = match prepare(&adapter, strategy_override, data_override, force_slippage) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let preset = setup.strategy.preset();
    eprintln!(
        "Strategy: {} ({}, tuned on {} bars)",
        preset.name, setup.strategy, preset.interval
    );

    // Stage 2: Load bars
    let port = CsvAdapter::new(setup.data.path.clone());
    let bars = match load_bars(&port, &setup.data) {
        Ok(b) => b,
        Err(e) => return fail(e),
    };
    eprintln!("Loaded {} bars from {}", bars.len(), setup.data.path.display());

    // Stage 3: Simulate
    let backtester = match Backtester::new(setup.backtest.clone()) {
        Ok(b) => b,
        Err(e) => return fail(e),
    };
    let mut strategy = build_strategy(setup.strategy, &setup.params, setup.seed);
    let result = backtester.run_raw(strategy.as_mut(), bars);

    // Stage 4: Report
    println!("{}", text_report::format_result(&result));
    println!("{}", text_report::format_trade_log(&result.ledger));
    print!(
        "{}",
        text_report::format_summary(&TradeSummary::compute(&result.ledger))
    );

    if let RunStatus::InsufficientData { bars, warmup } = result.status {
        eprintln!("warning: {bars} bars do not exceed the {warmup}-bar warmup; no trades simulated");
    }
    ExitCode::SUCCESS
}

fn run_sweep_command(config_path: &Path, top: usize, min_trades: Option<usize>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    let setup = match prepare(&adapter, None, None, false) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let grid = match sweep_grid_from(&adapter, &setup.params, &setup.backtest) {
        Ok(g) => g,
        Err(e) => return fail(e),
    };
    let min_trades = match min_trades {
        Some(n) => n,
        None => match sweep_min_trades_from(&adapter) {
            Ok(n) => n.unwrap_or(DEFAULT_MIN_TRADES),
            Err(e) => return fail(e),
        },
    };

    let port = CsvAdapter::new(setup.data.path.clone());
    let bars = match load_bars(&port, &setup.data) {
        Ok(b) => b,
        Err(e) => return fail(e),
    };
    if bars.len() <= setup.backtest.warmup_bars {
        return fail(TraderError::InsufficientData {
            bars: bars.len(),
            minimum: setup.backtest.warmup_bars,
        });
    }

    eprintln!(
        "Sweeping {} cells of {} over {} bars",
        grid.len(),
        setup.strategy,
        bars.len()
    );
    let request = SweepRequest {
        strategy: setup.strategy,
        params: setup.params,
        base: setup.backtest,
        seed: setup.seed,
        min_trades,
    };
    let rows = match run_sweep(&request, &grid, bars) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    info!(kept = rows.len(), min_trades, "sweep ranked");

    print!("{}", text_report::format_sweep(&rows, top));
    ExitCode::SUCCESS
}

fn run_compare(config_path: &Path, data_override: Option<PathBuf>, force_slippage: bool) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    let params = match strategy_params_from(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let seed = match seed_from(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let data = match resolve_data(&adapter, data_override) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };

    let port = CsvAdapter::new(data.path.clone());
    let bars = match load_bars(&port, &data) {
        Ok(b) => b,
        Err(e) => return fail(e),
    };
    eprintln!(
        "Comparing {} strategies over {} bars",
        StrategyId::ALL.len(),
        bars.len()
    );

    let config_for = |id: StrategyId| -> Result<BacktestConfig, TraderError> {
        let mut config = backtest_config_from(&adapter, &id.preset())?;
        if force_slippage {
            config.slippage_enabled = true;
        }
        Ok(config)
    };
    let runs = match compare_strategies(config_for, &params, seed, &bars) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    print!("{}", text_report::format_comparison(&runs));
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    if let Err(e) = validate_config(&adapter) {
        return fail(e);
    }
    let unknown = unknown_keys(&adapter);
    if !unknown.is_empty() {
        eprintln!("warning: unrecognised keys: {}", unknown.join(", "));
    }
    eprintln!("Config validated successfully");
    ExitCode::SUCCESS
}
