use std::path::PathBuf;
use anyhow::Context;
use clap::Parser;
use rovib::{
    curve::PotentialCurve,
    input::{ Purpose, RunParameters },
};
use drivers::{ ResultFile, init_logging, write_spectrum };

/// Compute transition frequencies and dipole matrix elements from a
/// point-wise curve.
#[derive(Parser, Debug)]
#[command(version, long_about = None)]
struct Args {
    /// Run parameters (SPECTRUM section).
    run: PathBuf,

    /// Point-wise curve: radius, energy[, uncertainty].
    pec: PathBuf,

    /// Point-wise dipole moment: radius, dipole.
    dm: PathBuf,

    /// Also write P and R branch intensities and Einstein coefficients.
    #[arg(short, long, default_value_t = false)]
    branches: bool,

    /// Result file. Defaults to the first free SpectrumPW_<n>.log.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    let mut res = ResultFile::create("SpectrumPW", args.output)?;
    let run_text = res.echo_input("Parameter for spectrum calculation", &args.run)?;
    let pec_text = res.echo_input("Point-wise PEC", &args.pec)?;
    let dm_text = res.echo_input("Point-wise dipole moment", &args.dm)?;
    let run = RunParameters::parse(&run_text, Purpose::Spectrum)
        .with_context(|| format!("in {}", args.run.display()))?;
    let curve = PotentialCurve::parse(&pec_text)
        .with_context(|| format!("in {}", args.pec.display()))?;
    let dipole = PotentialCurve::parse(&dm_text)
        .with_context(|| format!("in {}", args.dm.display()))?;

    write_spectrum(&mut res, &run, &curve, &dipole, args.branches)?;
    res.finish()?;
    Ok(())
}
