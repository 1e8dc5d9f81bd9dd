//! Command-line parsing for the Higgs coupling scanner.
//!
//! Argument parsing and command dispatch stay separate from the scan and
//! statistics code. Values are only shape-checked here; ranges are checked by
//! the validator when the typed inputs are built.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Dataset, ParameterName, ScanAxis, TwoHdmType};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "hscan",
    version,
    about = "Higgs coupling likelihood scans against an external likelihood engine"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate one coupling scenario.
    Eval(EvalArgs),
    /// Evaluate a set of signal strengths.
    Signal(SignalArgs),
    /// Evaluate a two-Higgs-doublet-model benchmark.
    Thdm(ThdmArgs),
    /// Run a 1-D or 2-D likelihood scan.
    Scan(ScanArgs),
    /// Print and plot a previously exported scan report.
    Render(RenderArgs),
}

/// Options shared by every command that calls the engine.
#[derive(Debug, Args, Clone)]
pub struct EngineArgs {
    /// Experimental dataset to compare against.
    #[arg(short = 'd', long, value_enum, default_value_t = Dataset::Latest)]
    pub dataset: Dataset,
}

#[derive(Debug, Args, Clone)]
pub struct EvalArgs {
    /// Coupling value, e.g. `--param CV=1.05`. Repeatable.
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    pub params: Vec<(ParameterName, f64)>,

    /// JSON request file; mutually exclusive with --param.
    #[arg(long, value_name = "JSON", conflicts_with_all = ["params", "precision"])]
    pub input: Option<PathBuf>,

    /// QCD precision (BEST-QCD or LO). Anything else means BEST-QCD.
    #[arg(long)]
    pub precision: Option<String>,

    /// Also evaluate the Standard Model and report the difference.
    #[arg(long)]
    pub compare_sm: bool,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SignalArgs {
    /// Signal strength, e.g. `--mu ggH_gammagamma=1.1`. Repeatable.
    #[arg(short = 'm', long = "mu", value_name = "PROD_DECAY=VALUE", value_parser = parse_mu, required = true)]
    pub mu: Vec<(String, f64)>,

    /// Higgs mass in GeV.
    #[arg(long)]
    pub mass: Option<f64>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ThdmArgs {
    /// Yukawa type.
    #[arg(short = 't', long = "type", value_enum)]
    pub model: TwoHdmType,

    /// tan(beta), in (0, 100].
    #[arg(long)]
    pub tan_beta: f64,

    /// cos(beta - alpha), in [-1, 1].
    #[arg(long, allow_negative_numbers = true)]
    pub cos_beta_alpha: f64,

    /// Also evaluate the Standard Model and report the difference.
    #[arg(long)]
    pub compare_sm: bool,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ScanArgs {
    /// Scan axis `NAME:MIN:MAX:STEPS`. Give once for 1-D, twice for 2-D.
    #[arg(short = 'a', long = "axis", value_name = "NAME:MIN:MAX:STEPS", required = true, num_args = 1, allow_hyphen_values = true)]
    pub axes: Vec<ScanAxis>,

    /// Fixed coupling value applied to every point. Repeatable.
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    pub params: Vec<(ParameterName, f64)>,

    /// QCD precision (BEST-QCD or LO). Anything else means BEST-QCD.
    #[arg(long)]
    pub precision: Option<String>,

    /// Concurrent engine runs; overrides HSCAN_WORKERS.
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Print every grid point.
    #[arg(long)]
    pub table: bool,

    /// Render an ASCII plot in the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the report to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Export per-point results to CSV.
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Report JSON produced by `hscan scan --export`.
    #[arg(long, value_name = "JSON")]
    pub report: PathBuf,

    /// Print every grid point.
    #[arg(long)]
    pub table: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Parse `NAME=VALUE` with a known parameter name.
fn parse_param(raw: &str) -> Result<(ParameterName, f64), String> {
    let (name, value) = split_assignment(raw)?;
    let name = name.parse::<ParameterName>().map_err(|e| e.to_string())?;
    Ok((name, value))
}

/// Parse `PROD_DECAY=VALUE`; the key itself is checked when the set is built.
fn parse_mu(raw: &str) -> Result<(String, f64), String> {
    let (key, value) = split_assignment(raw)?;
    Ok((key.to_string(), value))
}

fn split_assignment(raw: &str) -> Result<(&str, f64), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("'{value}' is not a number"))?;
    Ok((key.trim(), value))
}
