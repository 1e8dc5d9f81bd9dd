//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main that:
//! - parses CLI arguments
//! - loads engine settings from the environment
//! - builds typed inputs and runs evaluations or scans
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, EvalArgs, RenderArgs, ScanArgs, SignalArgs, ThdmArgs};
use crate::domain::{Dataset, ParameterName, ParameterSet, Precision, ScanReport};
use crate::error::AppError;
use crate::input::{EvaluationInput, SignalStrengths, two_hdm_couplings};
use crate::scan::{ScanExecutor, compare_with_reference, evaluate};

pub mod pipeline;

/// Entry point for the `hscan` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Eval(args) => handle_eval(args),
        Command::Signal(args) => handle_signal(args),
        Command::Thdm(args) => handle_thdm(args),
        Command::Scan(args) => handle_scan(args),
        Command::Render(args) => handle_render(args),
    }
}

fn handle_eval(args: EvalArgs) -> Result<(), AppError> {
    let input = match &args.input {
        Some(path) => crate::io::read_request_json(path)?,
        None => EvaluationInput::Couplings(parameter_set(&args.params, args.precision.as_deref())?),
    };
    let session = pipeline::open_session()?;
    let dataset = args.engine.dataset;

    match (&input, args.compare_sm) {
        (EvaluationInput::Couplings(params), true) => {
            print_comparison(&*session.engine, params, dataset)
        }
        (EvaluationInput::SignalStrengths(_), true) => Err(AppError::new(
            2,
            "--compare-sm needs a couplings request, not signal strengths",
        )),
        (_, false) => {
            let eval = evaluate(&*session.engine, &input, dataset)?;
            println!("{}", crate::report::format_evaluation(&eval, dataset));
            Ok(())
        }
    }
}

fn handle_signal(args: SignalArgs) -> Result<(), AppError> {
    let mut strengths = SignalStrengths::from_pairs(&args.mu)?;
    if let Some(mass) = args.mass {
        strengths = strengths.with_mass(mass)?;
    }
    let session = pipeline::open_session()?;
    let dataset = args.engine.dataset;

    let eval = evaluate(
        &*session.engine,
        &EvaluationInput::SignalStrengths(strengths),
        dataset,
    )?;
    println!("{}", crate::report::format_evaluation(&eval, dataset));
    Ok(())
}

fn handle_thdm(args: ThdmArgs) -> Result<(), AppError> {
    let params = two_hdm_couplings(args.model, args.tan_beta, args.cos_beta_alpha)?;
    println!(
        "2HDM {} at tan(beta)={}, cos(beta-alpha)={}:",
        args.model.display_name(),
        args.tan_beta,
        args.cos_beta_alpha
    );
    for (name, value) in params.iter() {
        println!("  {name:<6} = {value:.6}");
    }
    println!();

    let session = pipeline::open_session()?;
    let dataset = args.engine.dataset;
    if args.compare_sm {
        return print_comparison(&*session.engine, &params, dataset);
    }
    let eval = evaluate(&*session.engine, &EvaluationInput::Couplings(params), dataset)?;
    println!("{}", crate::report::format_evaluation(&eval, dataset));
    Ok(())
}

fn handle_scan(args: ScanArgs) -> Result<(), AppError> {
    let fixed = parameter_set(&args.params, args.precision.as_deref())?;
    let session = pipeline::open_session()?;
    let workers = args.workers.unwrap_or(session.settings.workers);

    let executor = ScanExecutor::new(&*session.engine).with_workers(workers)?;
    let report = executor.scan(&fixed, &args.axes, args.engine.dataset)?;

    print_report(&report, args.table, args.plot, args.width, args.height);

    if let Some(path) = &args.export {
        crate::io::write_report_json(path, &report)?;
        log::info!("report written to {}", path.display());
    }
    if let Some(path) = &args.export_csv {
        crate::io::write_report_csv(path, &report)?;
        log::info!("points written to {}", path.display());
    }
    Ok(())
}

fn handle_render(args: RenderArgs) -> Result<(), AppError> {
    let report = crate::io::read_report_json(&args.report)?;
    print_report(&report, args.table, true, args.width, args.height);
    Ok(())
}

fn print_comparison(
    engine: &dyn crate::engine::Engine,
    params: &ParameterSet,
    dataset: Dataset,
) -> Result<(), AppError> {
    let cmp = compare_with_reference(engine, params, dataset)?;
    println!("{}", crate::report::format_comparison(&cmp, dataset));
    Ok(())
}

fn print_report(report: &ScanReport, table: bool, plot: bool, width: usize, height: usize) {
    println!("{}", crate::report::format_scan_summary(report));
    if table {
        println!("{}", crate::report::format_scan_table(report));
    }
    if plot {
        let rendered = match report.axes.len() {
            1 => crate::plot::render_profile(report, width, height),
            _ => crate::plot::render_sigma_map(report),
        };
        println!("{rendered}");
    }
}

/// Typed parameter set from `--param` pairs; later pairs win.
pub fn parameter_set(
    pairs: &[(ParameterName, f64)],
    precision: Option<&str>,
) -> Result<ParameterSet, AppError> {
    let mut params = ParameterSet::from_pairs(pairs)?;
    if let Some(literal) = precision {
        params.set_precision(Precision::from_literal(literal));
    }
    Ok(params)
}
