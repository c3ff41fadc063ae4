//! Shared plumbing for the driver binaries: result-file naming, input echoing,
//! and the level/fit reports common to several run modes.

use std::{
    fs,
    io::{ self, BufWriter, Write },
    path::{ Path, PathBuf },
};
use anyhow::Context;
use log::info;
use rovib::{
    curve::PotentialCurve,
    fit::FitResult,
    input::{ RunMode, RunParameters },
    potential::Potential,
    report,
    solve::{ LevelComparison, LevelSelection, LevelSet, PotentialSampler, RadialGridSolver },
    transition::TransitionSet,
};

/// Install the `RUST_LOG`-controlled logger, defaulting to `info`.
pub fn init_logging() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();
}

/// First path of the form `<mode>_<n>.log`, n = 1, 2, ..., that does not name
/// a non-empty file.
pub fn next_free_path<P>(dir: P, mode: &str) -> PathBuf
where P: AsRef<Path>
{
    (1_usize..)
        .map(|n| dir.as_ref().join(format!("{}_{}.log", mode, n)))
        .find(|path| {
            fs::metadata(path).map(|meta| meta.len() == 0).unwrap_or(true)
        })
        .unwrap_or_else(|| dir.as_ref().join(format!("{}.log", mode)))
}

/// Result file of a single run.
pub struct ResultFile {
    path: PathBuf,
    out: BufWriter<fs::File>,
}

impl ResultFile {
    /// Create the result file at `output`, or at the first free
    /// `<mode>_<n>.log` in the working directory.
    pub fn create(mode: &str, output: Option<PathBuf>) -> anyhow::Result<Self> {
        let path = output.unwrap_or_else(|| next_free_path(".", mode));
        let file = fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        info!("writing results to {}", path.display());
        Ok(Self { path, out: BufWriter::new(file) })
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Read an input file and copy it into the result file, returning its
    /// contents.
    pub fn echo_input<P>(&mut self, role: &str, path: P) -> anyhow::Result<String>
    where P: AsRef<Path>
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        report::write_input(self, role, &path.display().to_string(), &text)?;
        Ok(text)
    }

    /// Write a line of free text.
    pub fn note(&mut self, text: &str) -> io::Result<()> {
        writeln!(self, "{}", text)
    }

    /// Flush and close the result file.
    pub fn finish(mut self) -> anyhow::Result<PathBuf> {
        self.out.flush()
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(self.path)
    }
}

impl Write for ResultFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> { self.out.write(buf) }

    fn flush(&mut self) -> io::Result<()> { self.out.flush() }
}

/// Write the comparison of a point-wise curve with a model, optionally
/// followed by computed-vs-experimental levels.
pub fn write_state<W>(
    out: &mut W,
    label: &str,
    model: &Potential,
    curve: &PotentialCurve,
    comparison: Option<&[LevelComparison]>,
) -> io::Result<()>
where W: Write
{
    writeln!(out, "{}\n", label)?;
    report::write_curve_comparison(
        out, model.kind(), &curve.evaluate_with_model(model))?;
    if let Some(rows) = comparison {
        report::write_level_comparison(out, rows)?;
    }
    Ok(())
}

/// Write the termination status of a completed fit.
pub fn write_fit_done<W>(out: &mut W, fit: &FitResult) -> io::Result<()>
where W: Write
{
    writeln!(out, "\nPEC fit done: {}\n", fit.message)
}

/// Write the fitted parameters of a completed fit.
pub fn write_fitted<W>(out: &mut W, fit: &FitResult) -> io::Result<()>
where W: Write
{
    writeln!(out, "Fitted parameters\n")?;
    report::write_fit_summary(out, fit)
}

/// Write levels computed for a blind search.
pub fn write_levels<W>(out: &mut W, levels: &LevelSet) -> io::Result<()>
where W: Write
{
    writeln!(out, "=== Vibrational-rotational levels ===\n")?;
    report::write_levels(out, levels)
}

/// Compute levels for `J = 0..=jmax` and write the transitions `v1 → v2`
/// within them, optionally followed by the P and R branches.
pub fn write_spectrum<W, P>(
    out: &mut W,
    run: &RunParameters,
    potential: &P,
    dipole: &PotentialCurve,
    branches: bool,
) -> anyhow::Result<()>
where
    W: Write,
    P: PotentialSampler + ?Sized,
{
    let RunMode::Spectrum { jmax, v1, v2 } = run.mode else {
        anyhow::bail!("expected a SPECTRUM run, got {}", run.mode.purpose());
    };
    let levels = RadialGridSolver::new(run)?
        .solve(potential, LevelSelection::Blind { jmax })?;
    let transitions = TransitionSet::compute(&levels, &levels, v1, v2, dipole)?;
    writeln!(out, "\n=== Transition energies & Integrals <f(v',J')|d|f(v'',J'')>,D ===\n")?;
    report::write_transitions(out, &transitions)?;
    if branches {
        writeln!(out, "=== P and R branches ===\n")?;
        report::write_branches(out, &transitions.branches()?)?;
    }
    Ok(())
}
