use std::path::PathBuf;
use anyhow::Context;
use clap::Parser;
use rovib::{
    curve::PotentialCurve,
    fit::{ FitEngine, FitTarget },
    input::{ ExperimentalLevelSet, Purpose, RunParameters },
    potential::Potential,
    solve::{ LevelSelection, RadialGridSolver },
};
use drivers::{ ResultFile, init_logging, write_fit_done, write_fitted, write_state };

/// Fit an analytic potential to experimental levels and a point-wise curve.
#[derive(Parser, Debug)]
#[command(version, long_about = None)]
struct Args {
    /// Run parameters (FIT section).
    run: PathBuf,

    /// Pre-fitted analytic parameters (EMO, MLR, or DELR section).
    params: PathBuf,

    /// Point-wise curve: radius, energy[, uncertainty].
    pec: PathBuf,

    /// Experimental levels, one section per J listing `v energy`.
    levels: PathBuf,

    /// Result file. Defaults to the first free FitExp_<n>.log.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    let mut res = ResultFile::create("FitExp", args.output)?;
    let run_text = res.echo_input("Parameters for fit", &args.run)?;
    let params_text = res.echo_input("Fitted PEC parameters", &args.params)?;
    let pec_text = res.echo_input("Point-wise PEC", &args.pec)?;
    let levels_text = res.echo_input("Experimental levels", &args.levels)?;
    let run = RunParameters::parse(&run_text, Purpose::Fit)
        .with_context(|| format!("in {}", args.run.display()))?;
    let initial = Potential::parse(&params_text)
        .with_context(|| format!("in {}", args.params.display()))?;
    let curve = PotentialCurve::parse(&pec_text)
        .with_context(|| format!("in {}", args.pec.display()))?;
    let exp = ExperimentalLevelSet::parse(&levels_text)
        .with_context(|| format!("in {}", args.levels.display()))?;

    let solver = RadialGridSolver::new(&run)?;
    res.note("=== Fit PEC to reproduce exp. data ===\n")?;
    let before = solver.solve(&initial, LevelSelection::Experimental(&exp))?;
    let rows = before.compare(&exp);
    write_state(&mut res, "Initial", &initial, &curve, Some(rows.as_slice()))?;

    let target = FitTarget::levels(&exp, &solver).with_curve(&curve);
    let fit = FitEngine::new().fit(&initial, &target)?;
    write_fit_done(&mut res, &fit)?;
    let after = solver.solve(&fit.parameters, LevelSelection::Experimental(&exp))?;
    let rows = after.compare(&exp);
    write_state(&mut res, "Fitted", &fit.parameters, &curve, Some(rows.as_slice()))?;
    write_fitted(&mut res, &fit)?;
    res.finish()?;
    Ok(())
}
