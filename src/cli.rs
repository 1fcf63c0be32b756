//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::typst_report::TypstReportAdapter;
use crate::domain::alert::Severity;
use crate::domain::config_validation::{parse_date, validate_monitor_config};
use crate::domain::error::PortwatchError;
use crate::domain::metrics::{MetricsConfig, DEFAULT_ANNUALIZATION_FACTOR};
use crate::domain::monitor::{
    run_cycle, AlertConfig, CycleOutput, MonitorConfig, DEFAULT_INITIAL_VALUE,
    DEFAULT_SINGLE_DAY_DROP_THRESHOLD,
};
use crate::domain::universe::{parse_tickers, parse_weights};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "portwatch", about = "Portfolio performance metrics and alerts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute metrics and evaluate alerts for the configured portfolio
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Write a Typst report to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Comma-separated tickers, overriding [data] tickers
        #[arg(long)]
        tickers: Option<String>,
    },
    /// Validate a configuration file without reading price data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers available in the configured data directory
    ListTickers {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            output,
            tickers,
        } => run_monitor(&config, output.as_ref(), tickers.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListTickers { config } => run_list_tickers(&config),
    }
}

fn fail(err: PortwatchError) -> ExitCode {
    tracing::error!("{err}");
    ExitCode::from(&err)
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, PortwatchError> {
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> PortwatchError {
    PortwatchError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: reason.into(),
    }
}

fn severity(
    config: &dyn ConfigPort,
    key: &str,
    default: Severity,
) -> Result<Severity, PortwatchError> {
    match config.get_string("alerts", key) {
        Some(raw) => raw
            .parse::<Severity>()
            .map_err(|e| invalid("alerts", key, e.to_string())),
        None => Ok(default),
    }
}

/// Builds a [`MonitorConfig`] from INI settings, applying defaults for
/// everything optional.
pub fn build_monitor_config(config: &dyn ConfigPort) -> Result<MonitorConfig, PortwatchError> {
    let tickers_str = config
        .get_string("data", "tickers")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| PortwatchError::ConfigMissing {
            section: "data".into(),
            key: "tickers".into(),
        })?;
    let tickers =
        parse_tickers(&tickers_str).map_err(|e| invalid("data", "tickers", e.to_string()))?;

    let start_date = parse_date(config.get_string("data", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("data", "end_date").as_deref(), "end_date")?;

    let weights = match config
        .get_string("portfolio", "weights")
        .filter(|s| !s.trim().is_empty())
    {
        Some(raw) => Some(
            parse_weights(&raw).map_err(|e| invalid("portfolio", "weights", e.to_string()))?,
        ),
        None => None,
    };

    let annualization_factor = config.get_int(
        "metrics",
        "annualization_factor",
        DEFAULT_ANNUALIZATION_FACTOR as i64,
    );
    let annualization_factor = u32::try_from(annualization_factor)
        .ok()
        .filter(|f| *f > 0)
        .ok_or_else(|| {
            invalid(
                "metrics",
                "annualization_factor",
                "annualization_factor must be a positive integer",
            )
        })?;

    let alerts = AlertConfig {
        single_day_drop_threshold: config.get_double(
            "alerts",
            "single_day_drop_threshold",
            DEFAULT_SINGLE_DAY_DROP_THRESHOLD,
        ),
        single_day_drop_severity: severity(config, "single_day_drop_severity", Severity::Warning)?,
        portfolio_floor_value: config.get_optional_double("alerts", "portfolio_floor_value"),
        portfolio_floor_severity: severity(config, "portfolio_floor_severity", Severity::Critical)?,
        portfolio_drop_threshold: config.get_optional_double("alerts", "portfolio_drop_threshold"),
        portfolio_drop_severity: severity(config, "portfolio_drop_severity", Severity::Critical)?,
    };

    Ok(MonitorConfig {
        start_date,
        end_date,
        tickers,
        weights,
        initial_value: config.get_double("portfolio", "initial_value", DEFAULT_INITIAL_VALUE),
        metrics: MetricsConfig {
            risk_free_rate: config.get_double("metrics", "risk_free_rate", 0.0),
            annualization_factor,
        },
        alerts,
    })
}

/// `--tickers` wins over the config file.
pub fn resolve_tickers(
    tickers_override: Option<&str>,
    config: &MonitorConfig,
) -> Result<Vec<String>, PortwatchError> {
    match tickers_override {
        Some(raw) => parse_tickers(raw).map_err(|e| invalid("data", "tickers", e.to_string())),
        None => Ok(config.tickers.clone()),
    }
}

pub fn data_port_from_config(config: &dyn ConfigPort) -> CsvAdapter {
    let dir = config
        .get_string("data", "dir")
        .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
    CsvAdapter::new(PathBuf::from(dir))
}

/// Loads, validates and runs one refresh cycle, optionally writing a report.
pub fn execute(
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
    output_path: Option<&PathBuf>,
    tickers_override: Option<&str>,
) -> Result<CycleOutput, PortwatchError> {
    validate_monitor_config(config)?;
    let mut monitor_config = build_monitor_config(config)?;
    monitor_config.tickers = resolve_tickers(tickers_override, &monitor_config)?;
    if tickers_override.is_some() && monitor_config.weights.take().is_some() {
        tracing::warn!("ticker override given, ignoring configured weights");
    }

    tracing::info!(
        tickers = %monitor_config.tickers.join(","),
        start = %monitor_config.start_date,
        end = %monitor_config.end_date,
        "running refresh cycle"
    );
    let output = run_cycle(data_port, &monitor_config, Vec::new())?;

    let report_path = output_path
        .cloned()
        .or_else(|| config.get_string("report", "output").map(PathBuf::from));
    if let Some(path) = report_path {
        let adapter = match config.get_string("report", "template_path") {
            Some(template) => TypstReportAdapter::with_template(template),
            None => TypstReportAdapter::new(),
        };
        adapter.write(
            &output.report,
            &output.alerts,
            &path.display().to_string(),
        )?;
    }

    Ok(output)
}

pub fn print_summary(output: &CycleOutput, initial_value: f64) {
    let report = &output.report;
    println!("=== Portfolio Summary ===");
    println!("Period:           {} to {}", report.start_date, report.end_date);
    println!("Trading Days:     {}", report.trading_days());
    if let Some(last) = report.portfolio_value(initial_value).last() {
        println!("Portfolio Value:  {:.2}", last.value);
    }
    println!("Total Return:     {:+.2}%", report.total_return * 100.0);
    println!(
        "Volatility:       {:.2}%",
        report.annualized_volatility * 100.0
    );
    println!("Sharpe Ratio:     {:.2}", report.sharpe_ratio);
    println!("Sortino Ratio:    {:.2}", report.sortino_ratio);
    println!("Max Drawdown:     {:.2}%", report.max_drawdown * 100.0);

    println!("\n=== Latest Changes ===");
    for change in &report.latest {
        println!(
            "  {:<8} {:>10.2}  {:+.2}%",
            change.ticker,
            change.price,
            change.change * 100.0
        );
    }

    println!("\n=== Alerts ===");
    if output.alerts.is_empty() {
        println!("  none");
    }
    for alert in &output.alerts {
        println!("  {alert}");
    }

    if !output.skipped.is_empty() {
        let skipped: Vec<&str> = output.skipped.iter().map(|s| s.ticker.as_str()).collect();
        println!("\nSkipped tickers: {}", skipped.join(", "));
    }
}

fn run_monitor(
    config_path: &PathBuf,
    output_path: Option<&PathBuf>,
    tickers_override: Option<&str>,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    let data_port = data_port_from_config(&adapter);

    match execute(&adapter, &data_port, output_path, tickers_override) {
        Ok(output) => {
            let initial_value =
                adapter.get_double("portfolio", "initial_value", DEFAULT_INITIAL_VALUE);
            print_summary(&output, initial_value);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    match validate_monitor_config(&adapter).and_then(|()| build_monitor_config(&adapter)) {
        Ok(config) => {
            println!("Configuration is valid.");
            println!("  tickers: {}", config.tickers.join(", "));
            println!("  period:  {} to {}", config.start_date, config.end_date);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_list_tickers(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    match data_port_from_config(&adapter).list_tickers() {
        Ok(tickers) => {
            if tickers.is_empty() {
                tracing::warn!("no tickers found");
            }
            for ticker in &tickers {
                println!("{ticker}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_run_with_overrides() {
        let cli = Cli::parse_from([
            "portwatch",
            "run",
            "-c",
            "portwatch.ini",
            "--output",
            "out.typ",
            "--tickers",
            "AAPL,MSFT",
        ]);
        match cli.command {
            Command::Run {
                config,
                output,
                tickers,
            } => {
                assert_eq!(config, PathBuf::from("portwatch.ini"));
                assert_eq!(output, Some(PathBuf::from("out.typ")));
                assert_eq!(tickers.as_deref(), Some("AAPL,MSFT"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_parses_list_tickers() {
        let cli = Cli::parse_from(["portwatch", "list-tickers", "--config", "a.ini"]);
        assert!(matches!(cli.command, Command::ListTickers { .. }));
    }

    #[test]
    fn build_applies_defaults() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\ntickers = aapl\nstart_date = 2024-01-01\nend_date = 2024-02-01\n",
        )
        .unwrap();
        let config = build_monitor_config(&adapter).unwrap();

        assert_eq!(config.tickers, vec!["AAPL"]);
        assert_eq!(config.weights, None);
        assert_eq!(config.initial_value, DEFAULT_INITIAL_VALUE);
        assert_eq!(config.metrics, MetricsConfig::default());
        assert_eq!(config.alerts, AlertConfig::default());
    }

    #[test]
    fn resolve_tickers_prefers_override() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\ntickers = AAPL\nstart_date = 2024-01-01\nend_date = 2024-02-01\n",
        )
        .unwrap();
        let config = build_monitor_config(&adapter).unwrap();

        assert_eq!(
            resolve_tickers(Some("msft, tsla"), &config).unwrap(),
            vec!["MSFT", "TSLA"]
        );
        assert_eq!(resolve_tickers(None, &config).unwrap(), vec!["AAPL"]);
        assert!(resolve_tickers(Some("A,,B"), &config).is_err());
    }
}
