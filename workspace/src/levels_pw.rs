use std::path::PathBuf;
use anyhow::Context;
use clap::Parser;
use rovib::{
    curve::PotentialCurve,
    input::{ Purpose, RunParameters },
    solve::{ LevelSelection, RadialGridSolver },
};
use drivers::{ ResultFile, init_logging, write_levels };

/// Compute rovibrational levels of a point-wise curve.
#[derive(Parser, Debug)]
#[command(version, long_about = None)]
struct Args {
    /// Run parameters (ENERGY section).
    run: PathBuf,

    /// Point-wise curve: radius, energy[, uncertainty].
    pec: PathBuf,

    /// Result file. Defaults to the first free LevelsPW_<n>.log.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    let mut res = ResultFile::create("LevelsPW", args.output)?;
    let run_text = res.echo_input("Parameter for levels calculation", &args.run)?;
    let pec_text = res.echo_input("Point-wise PEC", &args.pec)?;
    let run = RunParameters::parse(&run_text, Purpose::Energy)
        .with_context(|| format!("in {}", args.run.display()))?;
    let curve = PotentialCurve::parse(&pec_text)
        .with_context(|| format!("in {}", args.pec.display()))?;

    let jmax = run.mode.jmax().unwrap_or(0);
    let levels = RadialGridSolver::new(&run)?
        .solve(&curve, LevelSelection::Blind { jmax })?;
    write_levels(&mut res, &levels)?;
    res.finish()?;
    Ok(())
}
