//! Parameter files and the records read from them.
//!
//! All parameter files share a minimal section/key-value format:
//! ```text
//! # comment
//! [SECTION]
//! key   value
//! beta  1.0e+00
//!       1.0e-01
//! ```
//! Indented lines continue the value of the previous key. Keys are
//! case-insensitive and separated from their values by whitespace;
//! lines starting with `#` or `;` are comments. Which sections and keys are
//! allowed depends on the record being read:
//!
//! | Record                   | Sections                | Keys                                              |
//! |:-------------------------|:------------------------|:--------------------------------------------------|
//! | [`Potential`]            | one of `EMO MLR DELR`   | `de re rref q beta` (+ `p` for MLR) (+ `cnpow cnval dampf rho s` for MLR/DELR), optional `te` *or* `td` |
//! | [`RunParameters`]        | one of `ENERGY SPECTRUM FIT` | `mass1 mass2 rmin rmax` (+ `jmax` for ENERGY) (+ `jmax v1 v2` for SPECTRUM), optional `ngrid` |
//! | [`ExperimentalLevelSet`] | one per J               | `v energy` pairs                                  |

use std::{
    collections::{ BTreeMap, BTreeSet },
    fmt,
    fs,
    path::Path,
    str::FromStr,
};
use crate::{
    error::{ Error, InputError },
    longrange::{ Damping, LongRange },
    potential::{ Delr, Emo, Mlr, Model, Origin, Potential },
    DEF_NGRID,
};

#[derive(Clone, Debug)]
struct Section {
    name: String,
    // (key, value) in file order
    entries: Vec<(String, String)>,
}

impl Section {
    fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, key: &str) -> Result<&str, InputError> {
        self.get(key)
            .ok_or_else(|| {
                InputError::MissingKey { section: self.name.clone(), key: key.into() }
            })
    }

    fn value<T: FromStr>(&self, key: &str) -> Result<T, InputError> {
        let raw = self.require(key)?;
        raw.parse().map_err(|_| self.bad_value(key, raw))
    }

    fn opt_value<T: FromStr>(&self, key: &str) -> Result<Option<T>, InputError> {
        self.get(key)
            .map(|raw| raw.parse().map_err(|_| self.bad_value(key, raw)))
            .transpose()
    }

    fn list<T: FromStr>(&self, key: &str) -> Result<Vec<T>, InputError> {
        let raw = self.require(key)?;
        raw.split_whitespace()
            .map(|tok| tok.parse().map_err(|_| self.bad_value(key, tok)))
            .collect()
    }

    fn bad_value(&self, key: &str, value: &str) -> InputError {
        InputError::Value {
            section: self.name.clone(),
            key: key.into(),
            value: value.into(),
        }
    }

    // every key must be in `required` or `optional`, and every required key
    // must be present
    fn check_keys(&self, required: &[&str], optional: &[&str])
        -> Result<(), InputError>
    {
        if let Some((k, _))
            = self.entries.iter()
            .find(|(k, _)| {
                !required.contains(&k.as_str()) && !optional.contains(&k.as_str())
            })
        {
            return Err(InputError::UnexpectedKey {
                section: self.name.clone(),
                key: k.clone(),
            });
        }
        required.iter()
            .try_for_each(|key| self.require(key).map(|_| ()))
    }
}

fn parse_sections(text: &str) -> Result<Vec<Section>, InputError> {
    let mut sections: Vec<Section> = Vec::new();
    for (k, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with(';')
        {
            continue;
        }
        let syntax = || InputError::Syntax { line: k + 1, text: trimmed.into() };
        if let Some(name)
            = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']'))
        {
            sections.push(Section { name: name.trim().into(), entries: Vec::new() });
            continue;
        }
        let section = sections.last_mut().ok_or_else(syntax)?;
        let indented = line.starts_with(char::is_whitespace);
        match section.entries.last_mut() {
            Some((_, value)) if indented => {
                if !value.is_empty() { value.push(' '); }
                value.push_str(trimmed);
            },
            _ if indented => { return Err(syntax()); },
            _ => {
                let (key, value)
                    = trimmed.split_once(char::is_whitespace)
                    .unwrap_or((trimmed, ""));
                let key = key.to_lowercase();
                if section.get(&key).is_some() {
                    return Err(InputError::DuplicateKey {
                        section: section.name.clone(),
                        key,
                    });
                }
                section.entries.push((key, value.trim().to_string()));
            },
        }
    }
    Ok(sections)
}

fn single_section(text: &str) -> Result<Section, InputError> {
    let mut sections = parse_sections(text)?;
    if sections.len() != 1 {
        return Err(InputError::SectionCount(sections.len()));
    }
    Ok(sections.remove(0))
}

const EMO_KEYS: &[&str] = &["de", "re", "rref", "q", "beta"];
const MLR_KEYS: &[&str] = &[
    "de", "re", "rref", "q", "p", "beta", "cnpow", "cnval", "dampf", "rho", "s",
];
const DELR_KEYS: &[&str] = &[
    "de", "re", "rref", "q", "beta", "cnpow", "cnval", "dampf", "rho", "s",
];
const ORIGIN_KEYS: &[&str] = &["te", "td"];

fn read_long_range(sec: &Section) -> Result<LongRange, InputError> {
    let powers: Vec<i32> = sec.list("cnpow")?;
    let coeffs: Vec<f64> = sec.list("cnval")?;
    if powers.len() != coeffs.len() {
        return Err(InputError::LongRangeTerms {
            powers: powers.len(),
            coefficients: coeffs.len(),
        });
    }
    let damping: Damping = sec.require("dampf")?.parse()?;
    LongRange::new(
        powers.into_iter().zip(coeffs).collect(),
        damping,
        sec.value("rho")?,
        sec.value("s")?,
    )
}

impl Potential {
    /// Parse a parameter record from the contents of a file holding exactly
    /// one `[EMO]`, `[MLR]`, or `[DELR]` section.
    pub fn parse(text: &str) -> Result<Self, InputError> {
        let sec = single_section(text)?;
        let kind = sec.name.to_uppercase();
        let required
            = match kind.as_str() {
                "EMO" => EMO_KEYS,
                "MLR" => MLR_KEYS,
                "DELR" => DELR_KEYS,
                _ => { return Err(InputError::UnknownModel(sec.name)); },
            };
        sec.check_keys(required, ORIGIN_KEYS)?;
        let origin = Origin::from_options(sec.opt_value("te")?, sec.opt_value("td")?)?;
        let de: f64 = sec.value("de")?;
        let re: f64 = sec.value("re")?;
        let rref: f64 = sec.value("rref")?;
        let q: i32 = sec.value("q")?;
        let beta: Vec<f64> = sec.list("beta")?;
        let model
            = match kind.as_str() {
                "EMO" => Model::Emo(Emo { de, re, rref, q, beta }),
                "MLR" => Model::Mlr(Mlr {
                    de, re, rref, q,
                    p: sec.value("p")?,
                    beta,
                    long_range: read_long_range(&sec)?,
                }),
                _ => Model::Delr(Delr {
                    de, re, rref, q, beta,
                    long_range: read_long_range(&sec)?,
                }),
            };
        Self::new(model, origin)
    }

    /// Read and [parse][Self::parse] a parameter file.
    pub fn from_file<P>(path: P) -> Result<Self, Error>
    where P: AsRef<Path>
    {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text)?)
    }
}

/// Purpose of a run, naming the section of a run parameter file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Purpose {
    Energy,
    Spectrum,
    Fit,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Energy => "ENERGY",
            Self::Spectrum => "SPECTRUM",
            Self::Fit => "FIT",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Purpose {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ENERGY" => Ok(Self::Energy),
            "SPECTRUM" => Ok(Self::Spectrum),
            "FIT" => Ok(Self::Fit),
            _ => Err(InputError::UnknownPurpose(s.into())),
        }
    }
}

/// Purpose-specific run settings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Blind level search for `J = 0..=jmax`.
    Energy { jmax: usize },
    /// Levels for `J = 0..=jmax` and transitions `v1 → v2`.
    Spectrum { jmax: usize, v1: usize, v2: usize },
    /// Level search driven by an experimental level set.
    Fit,
}

impl RunMode {
    pub fn purpose(&self) -> Purpose {
        match self {
            Self::Energy { .. } => Purpose::Energy,
            Self::Spectrum { .. } => Purpose::Spectrum,
            Self::Fit => Purpose::Fit,
        }
    }

    /// Maximum J for a blind level search, if there is one.
    pub fn jmax(&self) -> Option<usize> {
        match self {
            Self::Energy { jmax } | Self::Spectrum { jmax, .. } => Some(*jmax),
            Self::Fit => None,
        }
    }
}

/// Masses, radial grid, and purpose-specific settings of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunParameters {
    /// Mass of the first atom (Da).
    pub mass1: f64,
    /// Mass of the second atom (Da).
    pub mass2: f64,
    /// Lower radial bound (Å).
    pub rmin: f64,
    /// Upper radial bound (Å).
    pub rmax: f64,
    /// Number of radial grid points.
    pub ngrid: usize,
    pub mode: RunMode,
}

impl RunParameters {
    /// Create a new record, checking masses and radial bounds.
    pub fn new(
        mass1: f64,
        mass2: f64,
        rmin: f64,
        rmax: f64,
        ngrid: usize,
        mode: RunMode,
    ) -> Result<Self, InputError>
    {
        InputError::check_positive("mass1", mass1)?;
        InputError::check_positive("mass2", mass2)?;
        InputError::check_positive("rmin", rmin)?;
        if rmax.partial_cmp(&rmin) != Some(std::cmp::Ordering::Greater) {
            return Err(InputError::RadialBounds { rmin, rmax });
        }
        Ok(Self { mass1, mass2, rmin, rmax, ngrid, mode })
    }

    /// Parse from the contents of a file holding exactly one section, which
    /// must be named after `purpose`.
    pub fn parse(text: &str, purpose: Purpose) -> Result<Self, InputError> {
        let sec = single_section(text)?;
        let found: Purpose = sec.name.parse()?;
        if found != purpose {
            return Err(InputError::WrongPurpose {
                expected: purpose.to_string(),
                found: sec.name,
            });
        }
        let required: &[&str]
            = match purpose {
                Purpose::Energy => &["mass1", "mass2", "rmin", "rmax", "jmax"],
                Purpose::Spectrum
                    => &["mass1", "mass2", "rmin", "rmax", "jmax", "v1", "v2"],
                Purpose::Fit => &["mass1", "mass2", "rmin", "rmax"],
            };
        sec.check_keys(required, &["ngrid"])?;
        let mode
            = match purpose {
                Purpose::Energy => RunMode::Energy { jmax: sec.value("jmax")? },
                Purpose::Spectrum => RunMode::Spectrum {
                    jmax: sec.value("jmax")?,
                    v1: sec.value("v1")?,
                    v2: sec.value("v2")?,
                },
                Purpose::Fit => RunMode::Fit,
            };
        Self::new(
            sec.value("mass1")?,
            sec.value("mass2")?,
            sec.value("rmin")?,
            sec.value("rmax")?,
            sec.opt_value("ngrid")?.unwrap_or(DEF_NGRID),
            mode,
        )
    }

    /// Read and [parse][Self::parse] a run parameter file.
    pub fn from_file<P>(path: P, purpose: Purpose) -> Result<Self, Error>
    where P: AsRef<Path>
    {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text, purpose)?)
    }
}

/// Measured level energies (cm⁻¹), sparse in both J and v.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExperimentalLevelSet {
    energy: BTreeMap<usize, BTreeMap<usize, f64>>,
}

impl ExperimentalLevelSet {
    /// Build from `(J, v, energy)` triples; later duplicates override earlier
    /// ones.
    pub fn new<I>(levels: I) -> Result<Self, InputError>
    where I: IntoIterator<Item = (usize, usize, f64)>
    {
        let mut energy: BTreeMap<usize, BTreeMap<usize, f64>> = BTreeMap::new();
        for (j, v, e) in levels {
            energy.entry(j).or_default().insert(v, e);
        }
        if energy.is_empty() { return Err(InputError::EmptyLevels); }
        Ok(Self { energy })
    }

    /// Parse from the contents of a file with one section per J, each listing
    /// `v energy` pairs.
    pub fn parse(text: &str) -> Result<Self, InputError> {
        let mut levels: Vec<(usize, usize, f64)> = Vec::new();
        for sec in parse_sections(text)?.iter() {
            let j: usize
                = sec.name.parse()
                .map_err(|_| sec.bad_value("J", &sec.name))?;
            for (v, e) in sec.entries.iter() {
                let vv: usize = v.parse().map_err(|_| sec.bad_value("v", v))?;
                let ee: f64 = e.parse().map_err(|_| sec.bad_value(v, e))?;
                levels.push((j, vv, ee));
            }
        }
        Self::new(levels)
    }

    /// Read and [parse][Self::parse] a level file.
    pub fn from_file<P>(path: P) -> Result<Self, Error>
    where P: AsRef<Path>
    {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text)?)
    }

    /// All J values present, in increasing order.
    pub fn js(&self) -> impl Iterator<Item = usize> + '_ {
        self.energy.keys().copied()
    }

    /// Largest J present.
    pub fn jmax(&self) -> usize {
        self.energy.keys().next_back().copied().unwrap_or(0)
    }

    /// Smallest and largest v listed for `j`.
    pub fn v_range(&self, j: usize) -> Option<(usize, usize)> {
        let vs = self.energy.get(&j)?;
        Some((*vs.keys().next()?, *vs.keys().next_back()?))
    }

    /// Set of all (J, v) pairs.
    pub fn pairs(&self) -> BTreeSet<(usize, usize)> {
        self.iter().map(|(j, v, _)| (j, v)).collect()
    }

    pub fn get(&self, j: usize, v: usize) -> Option<f64> {
        self.energy.get(&j).and_then(|vs| vs.get(&v)).copied()
    }

    /// Iterate over `(J, v, energy)` in (J, v) order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.energy.iter()
            .flat_map(|(j, vs)| vs.iter().map(move |(v, e)| (*j, *v, *e)))
    }

    /// Total number of levels.
    pub fn len(&self) -> usize { self.energy.values().map(|vs| vs.len()).sum() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMO: &str = "
[EMO]
de    37244.0
re    1.2746
rref  1.5
q     3
beta  1.9
      0.1
      -0.02
";

    #[test]
    fn parse_emo() {
        let pot = Potential::parse(EMO).unwrap();
        assert_eq!(pot.kind(), "EMO");
        assert_eq!(pot.de(), 37244.0);
        assert_eq!(pot.q(), 3);
        assert_eq!(pot.beta(), &[1.9, 0.1, -0.02]);
        assert_eq!(pot.origin, Origin::Minimum);
    }

    #[test]
    fn display_parses_back() {
        let text = "
[MLR]
de 5000.0
re 3.0
rref 3.5
q 3
p 5
beta 0.2 -0.1
cnpow 6 8
cnval 1.0e5 3.0e6
dampf ds
rho 0.6
s -1
td 12000.0
";
        let pot = Potential::parse(text).unwrap();
        assert_eq!(pot.origin, Origin::Td(12000.0));
        let again = Potential::parse(&pot.to_string()).unwrap();
        assert_eq!(again, pot);
    }

    #[test]
    fn potential_failures() {
        assert!(matches!(
            Potential::parse("[XYZ]\nde 1\n"),
            Err(InputError::UnknownModel(_))
        ));
        assert!(matches!(
            Potential::parse(&format!("{}te 1.0\ntd 2.0\n", EMO)),
            Err(InputError::AmbiguousOrigin)
        ));
        assert!(matches!(
            Potential::parse("[EMO]\nde 1.0\nre 1.0\nrref 1.0\nbeta 1.0\n"),
            Err(InputError::MissingKey { key, .. }) if key == "q"
        ));
        assert!(matches!(
            Potential::parse(&format!("{}p 5\n", EMO)),
            Err(InputError::UnexpectedKey { key, .. }) if key == "p"
        ));
        assert!(matches!(
            Potential::parse(&format!("{}{}", EMO, EMO)),
            Err(InputError::SectionCount(2))
        ));
        assert!(matches!(
            Potential::parse("[EMO]\nde 1.0\nre x\nrref 1.0\nq 2\nbeta 1.0\n"),
            Err(InputError::Value { .. })
        ));
        let delr = "[DELR]\nde 1.0\nre 1.0\nrref 1.0\nq 2\nbeta 1.0\n\
            cnpow 6 8\ncnval 1.0\ndampf tt\nrho 1.0\ns 0\n";
        assert!(matches!(
            Potential::parse(delr),
            Err(InputError::LongRangeTerms { powers: 2, coefficients: 1 })
        ));
        let bad_damp = delr.replace("cnpow 6 8", "cnpow 6").replace("tt", "xx");
        assert!(matches!(
            Potential::parse(&bad_damp),
            Err(InputError::UnknownDamping(_))
        ));
        assert!(matches!(
            Potential::parse("de 1.0\n"),
            Err(InputError::Syntax { line: 1, .. })
        ));
    }

    #[test]
    fn parse_run_parameters() {
        let text = "[SPECTRUM]\nmass1 1.0\nmass2 35.0\nrmin 0.5\nrmax 5.0\n\
            jmax 3\nv1 0\nv2 1\nngrid 2000\n";
        let run = RunParameters::parse(text, Purpose::Spectrum).unwrap();
        assert_eq!(run.mode, RunMode::Spectrum { jmax: 3, v1: 0, v2: 1 });
        assert_eq!(run.ngrid, 2000);
        assert!(matches!(
            RunParameters::parse(text, Purpose::Energy),
            Err(InputError::WrongPurpose { .. })
        ));
        let fit = "[FIT]\nmass1 1.0\nmass2 35.0\nrmin 0.5\nrmax 5.0\n";
        let run = RunParameters::parse(fit, Purpose::Fit).unwrap();
        assert_eq!(run.ngrid, DEF_NGRID);
        assert_eq!(run.mode.jmax(), None);
        assert!(matches!(
            RunParameters::parse(&format!("{}jmax 3\n", fit), Purpose::Fit),
            Err(InputError::UnexpectedKey { .. })
        ));
        assert!(matches!(
            RunParameters::parse(&fit.replace("rmax 5.0", "rmax 0.1"), Purpose::Fit),
            Err(InputError::RadialBounds { .. })
        ));
        assert!(matches!(
            RunParameters::parse("[WHAT]\n", Purpose::Fit),
            Err(InputError::UnknownPurpose(_))
        ));
    }

    #[test]
    fn parse_levels() {
        let text = "[0]\n0 1000.0\n1 3000.0\n[2]\n1 3060.0\n3 6800.0\n";
        let levels = ExperimentalLevelSet::parse(text).unwrap();
        assert_eq!(levels.len(), 4);
        assert_eq!(levels.jmax(), 2);
        assert_eq!(levels.v_range(2), Some((1, 3)));
        assert_eq!(levels.get(0, 1), Some(3000.0));
        assert_eq!(levels.get(2, 2), None);
        assert!(matches!(
            ExperimentalLevelSet::parse("# nothing\n[1]\n"),
            Err(InputError::EmptyLevels)
        ));
    }
}
