use std::path::PathBuf;
use anyhow::Context;
use clap::Parser;
use rovib::{
    curve::PotentialCurve,
    fit::{ FitEngine, FitTarget },
    potential::Potential,
};
use drivers::{ ResultFile, init_logging, write_fit_done, write_fitted, write_state };

/// Fit an analytic potential to a point-wise curve.
#[derive(Parser, Debug)]
#[command(version, long_about = None)]
struct Args {
    /// Initial analytic parameters (EMO, MLR, or DELR section).
    params: PathBuf,

    /// Point-wise curve: radius, energy[, uncertainty].
    pec: PathBuf,

    /// Result file. Defaults to the first free PecApprox_<n>.log.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    let mut res = ResultFile::create("PecApprox", args.output)?;
    let params_text = res.echo_input("Init PEC parameters", &args.params)?;
    let pec_text = res.echo_input("Point-wise PEC", &args.pec)?;
    let initial = Potential::parse(&params_text)
        .with_context(|| format!("in {}", args.params.display()))?;
    let curve = PotentialCurve::parse(&pec_text)
        .with_context(|| format!("in {}", args.pec.display()))?;

    res.note("=== Point-wise PEC approximation ===\n")?;
    write_state(&mut res, "Initial guess", &initial, &curve, None)?;
    let fit = FitEngine::new().fit(&initial, &FitTarget::curve(&curve))?;
    write_fit_done(&mut res, &fit)?;
    write_state(&mut res, "Fit results", &fit.parameters, &curve, None)?;
    write_fitted(&mut res, &fit)?;
    res.finish()?;
    Ok(())
}
