//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::{JsonReportAdapter, STDOUT_PATH};
use crate::domain::alignment::{
    align_movements, Alignment, AlignmentConfig, AlignmentWarning, DEFAULT_APPROX_TOLERANCE_PCT,
    DEFAULT_EXACT_TOLERANCE, DEFAULT_WINDOW_DAYS,
};
use crate::domain::analysis::{analyze_in_window, Analysis, AnalysisConfig};
use crate::domain::config_validation::validate_analysis_config;
use crate::domain::error::AnalyticsError;
use crate::domain::metrics::rolling_sharpe::DEFAULT_SHARPE_WINDOW;
use crate::domain::valuation::DateWindow;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_REPORT_PATH: &str = "report.json";

#[derive(Parser, Debug)]
#[command(
    name = "portfolio-analyzer",
    about = "Portfolio return and risk analytics"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Align movements, compute returns and metrics, write a JSON report
    Analyze {
        #[command(flatten)]
        input: InputArgs,
        /// JSON report path, `-` for stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        sharpe_window: Option<usize>,
    },
    /// Show where each cash movement lands in the valuation series
    Align {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Inputs shared by `analyze` and `align`. Flags win over the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Valuations CSV (`date,net_worth,cash_balance,margin_debt`)
    #[arg(long)]
    pub valuations: Option<PathBuf>,
    /// Movements CSV (`date,amount`)
    #[arg(long)]
    pub movements: Option<PathBuf>,
    /// First date to analyse (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Last date to analyse (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            input,
            output,
            sharpe_window,
        } => run_analyze(&input, output.as_ref(), sharpe_window),
        Command::Align { input } => run_align(&input),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = AnalyticsError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Load and validate `--config` when given, otherwise an empty config.
fn load_validated_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    let adapter = match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading config");
            load_config(path)?
        }
        None => FileConfigAdapter::default(),
    };

    validate_analysis_config(&adapter).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    Ok(adapter)
}

fn run_analyze(
    input: &InputArgs,
    output_override: Option<&PathBuf>,
    sharpe_window: Option<usize>,
) -> ExitCode {
    // Stage 1: Load and validate config
    let adapter = match load_validated_config(input.config.as_ref()) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Merge flags over config
    let analysis_config = match build_analysis_config(&adapter, input, sharpe_window) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let data_port = match build_data_port(&adapter, input) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let output = resolve_output(&adapter, output_override);

    // Stages 3-6: Fetch, analyse, report, summarise
    let report_port = JsonReportAdapter::new();
    match run_analysis_pipeline(&data_port, &report_port, &analysis_config, &output) {
        Ok(analysis) => {
            print_summary(&analysis);
            if output != STDOUT_PATH {
                eprintln!("\nReport written to: {}", output);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_align(input: &InputArgs) -> ExitCode {
    let adapter = match load_validated_config(input.config.as_ref()) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let result = build_analysis_config(&adapter, input, None).and_then(|config| {
        let data_port = build_data_port(&adapter, input)?;
        run_alignment(&data_port, &config)
    });

    match result {
        Ok(alignment) => {
            for m in &alignment.movements {
                println!(
                    "{}  ->  {}  {:<16}  {:>14.2}",
                    m.date, m.effective_date, m.match_kind, m.amount
                );
            }
            eprintln!(
                "{} movements aligned, {} warnings",
                alignment.movements.len(),
                alignment.warnings.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_analysis_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let config = match build_analysis_config(&adapter, &InputArgs::default(), None) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nAlignment:");
    eprintln!("  window_days:          {}", config.alignment.window_days);
    eprintln!("  exact_tolerance:      {}", config.alignment.exact_tolerance);
    eprintln!(
        "  approx_tolerance_pct: {}",
        config.alignment.approx_tolerance_pct
    );
    eprintln!("\nMetrics:");
    eprintln!("  sharpe_window:        {}", config.sharpe_window);
    eprintln!("\nAnalysis window:");
    eprintln!("  start: {}", format_bound(config.window.start));
    eprintln!("  end:   {}", format_bound(config.window.end));

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

/// Merge config values and command-line overrides into an `AnalysisConfig`.
///
/// Expects `config` to have passed `validate_analysis_config`.
pub fn build_analysis_config(
    config: &dyn ConfigPort,
    input: &InputArgs,
    sharpe_window: Option<usize>,
) -> Result<AnalysisConfig, AnalyticsError> {
    let alignment = AlignmentConfig {
        window_days: config.get_int("alignment", "window_days", DEFAULT_WINDOW_DAYS),
        exact_tolerance: config.get_double(
            "alignment",
            "exact_tolerance",
            DEFAULT_EXACT_TOLERANCE,
        ),
        approx_tolerance_pct: config.get_double(
            "alignment",
            "approx_tolerance_pct",
            DEFAULT_APPROX_TOLERANCE_PCT,
        ),
    };

    let sharpe_window = match sharpe_window {
        Some(w) => w,
        None => config.get_int("metrics", "sharpe_window", DEFAULT_SHARPE_WINDOW as i64) as usize,
    };
    if sharpe_window == 0 {
        return Err(AnalyticsError::ConfigInvalid {
            section: "metrics".into(),
            key: "sharpe_window".into(),
            reason: "sharpe_window must be at least 1".into(),
        });
    }

    let start = match input.start {
        Some(d) => Some(d),
        None => config.get_date("analysis", "start_date")?,
    };
    let end = match input.end {
        Some(d) => Some(d),
        None => config.get_date("analysis", "end_date")?,
    };

    Ok(AnalysisConfig {
        alignment,
        sharpe_window,
        window: DateWindow::new(start, end)?,
    })
}

fn data_path(
    config: &dyn ConfigPort,
    flag: Option<&PathBuf>,
    key: &str,
) -> Result<PathBuf, AnalyticsError> {
    flag.cloned()
        .or_else(|| config.get_string("data", key).map(PathBuf::from))
        .ok_or_else(|| AnalyticsError::ConfigMissing {
            section: "data".into(),
            key: key.into(),
        })
}

pub fn build_data_port(
    config: &dyn ConfigPort,
    input: &InputArgs,
) -> Result<CsvAdapter, AnalyticsError> {
    let valuations = data_path(config, input.valuations.as_ref(), "valuations")?;
    let movements = data_path(config, input.movements.as_ref(), "movements")?;
    let adapter = CsvAdapter::new(valuations, movements);

    Ok(match config.get_string("data", "date_format") {
        Some(format) => adapter.with_date_format(&format),
        None => adapter,
    })
}

pub fn resolve_output(config: &dyn ConfigPort, output: Option<&PathBuf>) -> String {
    output
        .map(|p| p.display().to_string())
        .or_else(|| config.get_string("report", "output"))
        .unwrap_or_else(|| DEFAULT_REPORT_PATH.to_string())
}

pub fn run_alignment(
    data_port: &dyn DataPort,
    config: &AnalysisConfig,
) -> Result<Alignment, AnalyticsError> {
    let valuations = data_port.fetch_valuations(&config.window)?;
    let movements = data_port.fetch_movements(&config.window)?;

    let alignment = align_movements(&valuations, &movements, &config.alignment);
    log_warnings(&alignment.warnings);
    Ok(alignment)
}

pub fn run_analysis_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    config: &AnalysisConfig,
    output: &str,
) -> Result<Analysis, AnalyticsError> {
    // Stage 3: Fetch data
    let valuations = data_port.fetch_valuations(&config.window)?;
    let movements = data_port.fetch_movements(&config.window)?;
    tracing::info!(
        valuations = valuations.len(),
        movements = movements.len(),
        "loaded input"
    );
    if valuations.len() < 2 {
        tracing::warn!(
            valuations = valuations.len(),
            "fewer than two valuations in range, returns will be zero"
        );
    }

    // Stage 4: Align, compute returns and metrics
    let analysis = analyze_in_window(&valuations, &movements, config);
    log_warnings(&analysis.warnings);
    tracing::info!(
        records = analysis.stats.records.len(),
        warnings = analysis.warnings.len(),
        "analysis complete"
    );

    // Stage 5: Write report
    report_port.write(&analysis, output)?;
    Ok(analysis)
}

fn log_warnings(warnings: &[AlignmentWarning]) {
    for warning in warnings {
        tracing::warn!("{}", warning);
    }
}

fn format_bound(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string())
        .unwrap_or_else(|| "unbounded".to_string())
}

fn format_pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}%", v * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

// Stage 6: Console summary on stderr
fn print_summary(analysis: &Analysis) {
    let stats = &analysis.stats;
    let metrics = &analysis.metrics;

    eprintln!("\n=== Period ===");
    eprintln!("From:             {}", format_bound(stats.start_date));
    eprintln!("To:               {}", format_bound(stats.end_date));
    eprintln!("Initial Value:    {:.2}", stats.initial_net_worth);
    eprintln!("Final Value:      {:.2}", stats.final_net_worth);
    eprintln!("Net Cash Flow:    {:.2}", stats.total_net_cash_flow);

    eprintln!("\n=== Returns ===");
    eprintln!("Gain/Loss:        {:.2}", stats.total_gain_loss);
    eprintln!("Modified Dietz:   {:.2}%", stats.total_gain_loss_pct * 100.0);
    eprintln!("TWRR:             {:.2}%", stats.total_twrr * 100.0);
    eprintln!("CAGR:             {}", format_pct(stats.cagr));

    eprintln!("\n=== Risk ===");
    eprintln!("Max Drawdown:     {:.2}%", metrics.max_drawdown_pct);
    if let Some(last) = metrics.rolling_sharpe.last() {
        eprintln!(
            "Sharpe ({}d):     {:.2} on {}",
            metrics.sharpe_window, last.sharpe, last.date
        );
    }
    if let Some(best) = &metrics.best_day {
        eprintln!("Best Day:         {} ({:+.2})", best.date, best.gain_loss);
    }
    if let Some(worst) = &metrics.worst_day {
        eprintln!("Worst Day:        {} ({:+.2})", worst.date, worst.gain_loss);
    }
    if let Some(rise) = &metrics.streaks.longest_rise {
        eprintln!(
            "Longest Rise:     {} days, {} to {} ({:+.2})",
            rise.days, rise.start, rise.end, rise.sum
        );
    }
    if let Some(drop) = &metrics.streaks.longest_drop {
        eprintln!(
            "Longest Drop:     {} days, {} to {} ({:+.2})",
            drop.days, drop.start, drop.end, drop.sum
        );
    }
    if let (Some(start), Some(end)) = (metrics.recovery.start, metrics.recovery.end) {
        eprintln!(
            "Longest Recovery: {} days, {} to {}",
            metrics.recovery.days, start, end
        );
    }

    if !metrics.monthly.years.is_empty() {
        eprintln!("\n=== Yearly ===");
        for year in &metrics.monthly.years {
            eprintln!("  {}:  {:+.2}%", year.year, year.value * 100.0);
        }
    }

    if !analysis.warnings.is_empty() {
        eprintln!("\n{} movement(s) aligned with low confidence", analysis.warnings.len());
    }
}
