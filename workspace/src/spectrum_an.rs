use std::path::PathBuf;
use anyhow::Context;
use clap::Parser;
use rovib::{
    curve::PotentialCurve,
    input::{ Purpose, RunParameters },
    potential::Potential,
};
use drivers::{ ResultFile, init_logging, write_spectrum };

/// Compute transition frequencies and dipole matrix elements from an analytic
/// potential.
#[derive(Parser, Debug)]
#[command(version, long_about = None)]
struct Args {
    /// Run parameters (SPECTRUM section).
    run: PathBuf,

    /// Analytic parameters (EMO, MLR, or DELR section).
    params: PathBuf,

    /// Point-wise dipole moment: radius, dipole.
    dm: PathBuf,

    /// Also write P and R branch intensities and Einstein coefficients.
    #[arg(short, long, default_value_t = false)]
    branches: bool,

    /// Result file. Defaults to the first free SpectrumAn_<n>.log.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    let mut res = ResultFile::create("SpectrumAn", args.output)?;
    let run_text = res.echo_input("Parameter for spectrum calculation", &args.run)?;
    let params_text = res.echo_input("Fitted PEC parameters", &args.params)?;
    let dm_text = res.echo_input("Point-wise dipole moment", &args.dm)?;
    let run = RunParameters::parse(&run_text, Purpose::Spectrum)
        .with_context(|| format!("in {}", args.run.display()))?;
    let potential = Potential::parse(&params_text)
        .with_context(|| format!("in {}", args.params.display()))?;
    let dipole = PotentialCurve::parse(&dm_text)
        .with_context(|| format!("in {}", args.dm.display()))?;

    write_spectrum(&mut res, &run, &potential, &dipole, args.branches)?;
    res.finish()?;
    Ok(())
}
