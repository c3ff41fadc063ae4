//! Fixed-width text tables for result files.
//!
//! Every writer takes any [`Write`] and appends a single table followed by a
//! blank line.

use std::io::{ self, Write };
use crate::{
    curve::CurveComparison,
    fit::FitResult,
    solve::{ LevelComparison, LevelSet },
    transition::{ BranchLine, TransitionSet },
};

/// Copy the contents of an input file between markers naming it and
/// describing its role.
pub fn write_input<W>(out: &mut W, role: &str, name: &str, text: &str)
    -> io::Result<()>
where W: Write
{
    writeln!(out, "* {} *", role)?;
    writeln!(out, "\n=== Input file: {} ===\n", name)?;
    write!(out, "{}", text)?;
    if !text.ends_with('\n') { writeln!(out)?; }
    writeln!(out, "\n=== End of input file: {} ===\n", name)
}

/// Energies and rotational constants, one block per J.
pub fn write_levels<W>(out: &mut W, levels: &LevelSet) -> io::Result<()>
where W: Write
{
    for j in levels.js() {
        writeln!(out, "J = {}", j)?;
        writeln!(out, "{:>3}{:>15}{:>15}", "v", "E,cm-1", "Bv,cm-1")?;
        for (v, lev) in levels.levels(j).into_iter().flatten() {
            writeln!(out, "{:3}{:15.3}{:15.5}", v, lev.energy, lev.bv)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Computed levels next to their experimental counterparts.
pub fn write_level_comparison<W>(out: &mut W, rows: &[LevelComparison])
    -> io::Result<()>
where W: Write
{
    writeln!(
        out, "{:>4}{:>4}{:>15}{:>15}{:>15}",
        "J", "v", "Eexp,cm-1", "Ecalc,cm-1", "delta,cm-1",
    )?;
    for row in rows.iter() {
        writeln!(
            out, "{:4}{:4}{:15.3}{:15.3}{:15.3}",
            row.j, row.v, row.eexp, row.ecalc, row.delta(),
        )?;
    }
    writeln!(out)
}

/// Frequencies, lower-level energies, and matrix elements, one block per J'.
pub fn write_transitions<W>(out: &mut W, transitions: &TransitionSet)
    -> io::Result<()>
where W: Write
{
    writeln!(out, "v'' = {}", transitions.v1())?;
    writeln!(out, "v'  = {}", transitions.v2())?;
    writeln!(out)?;
    for j2 in transitions.j2s() {
        writeln!(out, "J' = {}", j2)?;
        writeln!(
            out, "{:>4}{:>15}{:>15}{:>15}", "J''", "freq,cm-1", "E'',cm-1", "<f'|d|f''>,D",
        )?;
        for (j1, t) in transitions.row(j2).into_iter().flatten() {
            writeln!(out, "{:4}{:15.3}{:15.3}{:15.5e}", j1, t.freq, t.energy1, t.me)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// P and R branch lines with intensities and Einstein coefficients.
pub fn write_branches<W>(out: &mut W, lines: &[BranchLine]) -> io::Result<()>
where W: Write
{
    writeln!(
        out, "{:>6}{:>4}{:>4}{:>15}{:>15}{:>10}{:>15}{:>15}{:>15}{:>10}{:>15}",
        "Branch", "J'", "J''", "freq,cm-1", "me,D", "Sa", "E'',cm-1", "pop", "int", "Se", "A,s-1",
    )?;
    for l in lines.iter() {
        writeln!(
            out,
            "{:>6}{:4}{:4}{:15.3}{:15.5e}{:10.5}{:15.3}{:15.5e}{:15.5e}{:10.5}{:15.5e}",
            l.branch.as_str(), l.j2, l.j1, l.freq, l.me, l.sa, l.energy1, l.pop,
            l.intensity, l.se, l.a,
        )?;
    }
    writeln!(out)
}

/// A point-wise curve next to a model evaluated on the same radii; `model`
/// labels the model column.
pub fn write_curve_comparison<W>(out: &mut W, model: &str, rows: &[CurveComparison])
    -> io::Result<()>
where W: Write
{
    writeln!(
        out, "{:>10}{:>20}{:>20}{:>20}",
        "R,A", "U(p-w),cm-1", format!("U({}),cm-1", model), "delta,cm-1",
    )?;
    for row in rows.iter() {
        writeln!(
            out, "{:10.5}{:20.3}{:20.3}{:20.3}",
            row.r, row.sampled, row.model, row.delta(),
        )?;
    }
    writeln!(out)
}

/// Termination status and fitted parameters, the latter in the same format
/// read by [`crate::input`].
pub fn write_fit_summary<W>(out: &mut W, fit: &FitResult) -> io::Result<()>
where W: Write
{
    writeln!(out, "message: {}", fit.message)?;
    writeln!(out, "success: {}", fit.success)?;
    writeln!(out, "nfev: {}", fit.nfev)?;
    writeln!(out)?;
    writeln!(out, "{}", fit.parameters)?;
    writeln!(out)
}
