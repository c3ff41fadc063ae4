use approx::assert_abs_diff_eq;
use ndarray as nd;
use rovib::{
    curve::PotentialCurve,
    fit::{ FitEngine, FitTarget },
    input::{ ExperimentalLevelSet, Purpose, RunParameters },
    potential::Potential,
    report,
    solve::{ LevelSelection, RadialGridSolver },
    transition::{ Branch, TransitionSet },
};

// pure Morse: a single β with rref = re and q = 1
const MORSE: &str = "
[EMO]
de    10000.0
re    1.3
rref  1.3
q     1
beta  2.0
";

const SPECTRUM: &str = "
[SPECTRUM]
mass1  1.0
mass2  35.0
rmin   0.6
rmax   4.0
jmax   2
v1     0
v2     1
ngrid  3000
";

fn tabulate<F>(rmin: f64, rmax: f64, n: usize, f: F) -> String
where F: Fn(f64) -> f64
{
    nd::Array1::linspace(rmin, rmax, n).iter()
        .map(|r| format!("{} {}\n", r, f(*r)))
        .collect()
}

#[test]
fn morse_levels_and_fundamental_band() {
    let run = RunParameters::parse(SPECTRUM, Purpose::Spectrum).unwrap();
    let pot = Potential::parse(MORSE).unwrap();
    let solver = RadialGridSolver::new(&run).unwrap();
    let levels = solver.solve(&pot, LevelSelection::Blind { jmax: 2 }).unwrap();

    let s = solver.units().scale;
    let we = 2.0 * 2.0 * (10000.0 * s).sqrt();
    let wexe = 4.0 * s;
    let fundamental = levels.energy(0, 1).unwrap() - levels.energy(0, 0).unwrap();
    assert_abs_diff_eq!(fundamental, we - 2.0 * wexe, epsilon = 5e-2);

    let dipole = PotentialCurve::parse(&tabulate(0.5, 4.5, 200, |r| r - 1.3)).unwrap();
    let transitions = TransitionSet::compute(&levels, &levels, 0, 1, &dipole).unwrap();
    assert_eq!(transitions.iter().count(), 9);
    let band = transitions.get(0, 0).unwrap();
    assert_abs_diff_eq!(band.freq, fundamental, epsilon = 1e-12);
    // harmonic estimate of <0|r - re|1>
    assert_abs_diff_eq!(band.me.abs(), (s / we).sqrt(), epsilon = 1e-2);

    let lines = transitions.branches().unwrap();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines.iter().filter(|l| l.branch == Branch::P).count(), 2);
    assert!(lines.iter().all(|l| l.a > 0.0 && l.intensity > 0.0));

    let mut out: Vec<u8> = Vec::new();
    report::write_transitions(&mut out, &transitions).unwrap();
    report::write_branches(&mut out, &lines).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("v'' = 0\nv'  = 1\n"));
    assert_eq!(text.matches("J' = ").count(), 3);
}

#[test]
fn pointwise_curve_reproduces_model_levels() {
    let run = RunParameters::parse(SPECTRUM, Purpose::Spectrum).unwrap();
    let pot = Potential::parse(MORSE).unwrap();
    let curve
        = PotentialCurve::parse(&tabulate(0.5, 4.5, 400, |r| pot.value(r))).unwrap();
    let solver = RadialGridSolver::new(&run).unwrap();
    let an = solver.solve(&pot, LevelSelection::Blind { jmax: 1 }).unwrap();
    let pw = solver.solve(&curve, LevelSelection::Blind { jmax: 1 }).unwrap();
    for j in 0..=1 {
        for v in 0..6 {
            assert_abs_diff_eq!(
                an.energy(j, v).unwrap(), pw.energy(j, v).unwrap(), epsilon = 1e-2);
            assert_abs_diff_eq!(an.bv(j, v).unwrap(), pw.bv(j, v).unwrap(), epsilon = 1e-4);
        }
    }
}

#[test]
fn fit_levels_and_curve_from_text() {
    let fit_run = "[FIT]\nmass1 1.0\nmass2 35.0\nrmin 0.6\nrmax 4.0\nngrid 1500\n";
    let run = RunParameters::parse(fit_run, Purpose::Fit).unwrap();
    let truth = Potential::parse(MORSE).unwrap();
    let solver = RadialGridSolver::new(&run).unwrap();

    let probe = ExperimentalLevelSet::parse("[0]\n0 0\n1 0\n2 0\n[4]\n0 0\n1 0\n").unwrap();
    let computed
        = solver.solve(&truth, LevelSelection::Experimental(&probe)).unwrap();
    let exp_text: String
        = probe.js()
        .map(|j| {
            let mut sec = format!("[{}]\n", j);
            for (v, lev) in computed.levels(j).unwrap() {
                sec.push_str(&format!("{} {}\n", v, lev.energy));
            }
            sec
        })
        .collect();
    let exp = ExperimentalLevelSet::parse(&exp_text).unwrap();
    assert_eq!(exp.len(), 5);

    let curve
        = PotentialCurve::parse(&tabulate(0.8, 3.5, 30, |r| truth.value(r))).unwrap();
    let guess = Potential::parse(&MORSE.replace("10000.0", "10400.0")).unwrap();
    let fit = FitEngine::new()
        .fit(&guess, &FitTarget::levels(&exp, &solver).with_curve(&curve))
        .unwrap();
    assert!(fit.success);
    assert_abs_diff_eq!(fit.parameters.de(), 10000.0, epsilon = 1.0);
    assert_abs_diff_eq!(fit.parameters.re(), 1.3, epsilon = 1e-5);
    assert_abs_diff_eq!(fit.parameters.beta()[0], 2.0, epsilon = 1e-4);
    assert_eq!(guess.de(), 10400.0);

    let refit = Potential::parse(&fit.parameters.to_string()).unwrap();
    assert_abs_diff_eq!(refit.de(), fit.parameters.de(), epsilon = 1e-3);
}
