use std::path::PathBuf;
use anyhow::Context;
use clap::Parser;
use rovib::{
    input::{ Purpose, RunParameters },
    potential::Potential,
    solve::{ LevelSelection, RadialGridSolver },
};
use drivers::{ ResultFile, init_logging, write_levels };

/// Compute rovibrational levels of an analytic potential.
#[derive(Parser, Debug)]
#[command(version, long_about = None)]
struct Args {
    /// Run parameters (ENERGY section).
    run: PathBuf,

    /// Analytic parameters (EMO, MLR, or DELR section).
    params: PathBuf,

    /// Result file. Defaults to the first free LevelsAn_<n>.log.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    let mut res = ResultFile::create("LevelsAn", args.output)?;
    let run_text = res.echo_input("Parameter for levels calculation", &args.run)?;
    let params_text = res.echo_input("Fitted PEC parameters", &args.params)?;
    let run = RunParameters::parse(&run_text, Purpose::Energy)
        .with_context(|| format!("in {}", args.run.display()))?;
    let potential = Potential::parse(&params_text)
        .with_context(|| format!("in {}", args.params.display()))?;

    let jmax = run.mode.jmax().unwrap_or(0);
    let levels = RadialGridSolver::new(&run)?
        .solve(&potential, LevelSelection::Blind { jmax })?;
    write_levels(&mut res, &levels)?;
    res.finish()?;
    Ok(())
}
