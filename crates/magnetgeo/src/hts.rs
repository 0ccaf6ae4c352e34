//! Stack model of a superconducting (HTS) insert.
//!
//! Tapes are wound into pancakes, two pancakes and an isolation make a double
//! pancake, and double pancakes separated by spacers make an insert. Every
//! level exposes the same dimensional queries (radii, width, height, area,
//! filling factor) and a name expansion whose granularity follows [`Detail`].

use indexmap::IndexMap;
use magnetgeo_ir::Detail;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GeoError, Result};

/// A superconducting tape with its co-wound insulation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tape {
    /// Superconductor width.
    pub w: f64,
    /// Tape height.
    pub h: f64,
    /// Co-wound insulation thickness.
    pub e: f64,
}

impl Tape {
    /// Create a tape.
    pub fn new(w: f64, h: f64, e: f64) -> Self {
        Self { w, h, e }
    }

    /// Total radial width, superconductor plus insulation.
    pub fn width(&self) -> f64 {
        self.w + self.e
    }

    /// Superconductor width.
    pub fn sc_width(&self) -> f64 {
        self.w
    }

    /// Co-wound insulation width.
    pub fn isolation_width(&self) -> f64 {
        self.e
    }

    /// Tape height.
    pub fn height(&self) -> f64 {
        self.h
    }

    /// Cross section.
    pub fn area(&self) -> f64 {
        self.width() * self.h
    }

    /// Superconductor share of the cross section.
    pub fn filling_factor(&self) -> f64 {
        ratio(self.w * self.h, self.area())
    }

    /// Superconductor and insulation solid names.
    pub fn names(&self, name: &str) -> Vec<String> {
        vec![format!("{name}_SC"), format!("{name}_Duromag")]
    }
}

/// A flat spiral winding of `n` tapes around a mandrel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Pancake {
    /// Inner radius.
    pub r0: f64,
    /// Mandrel radius (meshing only).
    pub mandrel: f64,
    /// Wound tape.
    pub tape: Tape,
    /// Number of tapes.
    pub n: usize,
}

impl Pancake {
    /// Create a pancake.
    pub fn new(r0: f64, tape: Tape, n: usize, mandrel: f64) -> Self {
        Self {
            r0,
            mandrel,
            tape,
            n,
        }
    }

    /// Inner radius.
    pub fn r0(&self) -> f64 {
        self.r0
    }

    /// Outer radius.
    pub fn r1(&self) -> f64 {
        self.r0 + self.n as f64 * self.tape.width()
    }

    /// Inner radius of every tape.
    pub fn radii(&self) -> Vec<f64> {
        let dr = self.tape.width();
        (0..self.n).map(|i| self.r0 + i as f64 * dr).collect()
    }

    /// Radial width.
    pub fn width(&self) -> f64 {
        self.r1() - self.r0()
    }

    /// Height.
    pub fn height(&self) -> f64 {
        self.tape.height()
    }

    /// Cross section.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Superconductor share of the cross section (0 for an empty pancake).
    pub fn filling_factor(&self) -> f64 {
        ratio(self.n as f64 * self.tape.w * self.tape.h, self.area())
    }

    /// Solid names: the pancake itself, or its mandrel and tapes at tape detail.
    pub fn names(&self, name: &str, detail: Detail) -> Vec<String> {
        match detail {
            Detail::Tape => {
                let mut names = Vec::with_capacity(1 + 2 * self.n);
                names.push(format!("{name}_Mandrin"));
                for i in 0..self.n {
                    names.extend(self.tape.names(&format!("{name}_t{i}")));
                }
                names
            }
            _ => vec![name.to_string()],
        }
    }
}

/// A layered spacer. `w` and `h` hold one entry per layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Isolation {
    /// Inner radius.
    pub r0: f64,
    /// Layer widths.
    pub w: Vec<f64>,
    /// Layer heights.
    pub h: Vec<f64>,
}

impl Isolation {
    /// Create an isolation.
    pub fn new(r0: f64, w: Vec<f64>, h: Vec<f64>) -> Self {
        Self { r0, w, h }
    }

    /// Inner radius.
    pub fn r0(&self) -> f64 {
        self.r0
    }

    /// Widest layer.
    pub fn width(&self) -> f64 {
        self.w.iter().copied().fold(0.0, f64::max)
    }

    /// Sum of the layer heights.
    pub fn height(&self) -> f64 {
        self.h.iter().sum()
    }

    /// Number of layers.
    pub fn layers(&self) -> usize {
        self.w.len()
    }
}

/// Two identical pancakes around an isolation, centered at `z0`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DblPancake {
    /// Altitude of the center.
    pub z0: f64,
    /// Pancake used for both halves.
    pub pancake: Pancake,
    /// Isolation between the two pancakes.
    pub isolation: Isolation,
}

impl DblPancake {
    /// Create a double pancake.
    pub fn new(z0: f64, pancake: Pancake, isolation: Isolation) -> Self {
        Self {
            z0,
            pancake,
            isolation,
        }
    }

    /// Inner radius.
    pub fn r0(&self) -> f64 {
        self.pancake.r0()
    }

    /// Outer radius.
    pub fn r1(&self) -> f64 {
        self.pancake.r1()
    }

    /// Radial width.
    pub fn width(&self) -> f64 {
        self.pancake.width()
    }

    /// Height: both pancakes and the isolation.
    pub fn height(&self) -> f64 {
        2.0 * self.pancake.height() + self.isolation.height()
    }

    /// Cross section.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Superconductor share of the cross section.
    pub fn filling_factor(&self) -> f64 {
        let p = &self.pancake;
        ratio(2.0 * p.n as f64 * p.tape.w * p.tape.h, self.area())
    }

    /// Solid names: `_p0`, `_p1` then the isolation `_i` below double-pancake detail.
    pub fn names(&self, name: &str, detail: Detail) -> Vec<String> {
        match detail {
            Detail::None | Detail::DblPancake => vec![name.to_string()],
            Detail::Pancake | Detail::Tape => {
                let mut names = self.pancake.names(&format!("{name}_p0"), detail);
                names.extend(self.pancake.names(&format!("{name}_p1"), detail));
                names.push(format!("{name}_i"));
                names
            }
        }
    }
}

/// Mesh length hints of an HTS insert, taken from its first unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HtsMeshSizes {
    /// Spacer between double pancakes.
    pub isolation: f64,
    /// Double pancake.
    pub dblpancake: f64,
    /// Pancake.
    pub pancake: f64,
    /// Isolation inside a double pancake.
    pub dblpancake_isolation: f64,
    /// Mandrel.
    pub mandrel: f64,
    /// Superconductor.
    pub sc: f64,
    /// Co-wound insulation.
    pub duromag: f64,
}

/// A stack of double pancakes separated by spacers.
///
/// `isolations[i]` sits between `dblpancakes[i]` and `dblpancakes[i + 1]`.
/// The stack is centered on `z0`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HtsInsert {
    /// Insert name, the configuration name without its `.json` suffix.
    pub name: String,
    /// Altitude of the stack center.
    pub z0: f64,
    /// Total height.
    pub h: f64,
    /// Smallest inner radius over all units.
    pub r0: f64,
    /// Largest outer radius over all units.
    pub r1: f64,
    /// Double pancakes from bottom to top.
    pub dblpancakes: Vec<DblPancake>,
    /// Spacers between consecutive double pancakes.
    pub isolations: Vec<Isolation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PancakeConfig {
    r0: f64,
    mandrin: f64,
    ntapes: usize,
    tape: Option<Tape>,
}

impl PancakeConfig {
    fn build(&self, fallback: Tape) -> Pancake {
        Pancake::new(self.r0, self.tape.unwrap_or(fallback), self.ntapes, self.mandrin)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UnitsConfig {
    Uniform {
        n: usize,
        #[serde(default)]
        isolation: Option<Isolation>,
    },
    Explicit(IndexMap<String, UnitConfig>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UnitConfig {
    pancake: Option<PancakeConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SpacerConfig {
    isolation: Option<Isolation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StackConfig {
    tape: Option<Tape>,
    pancake: PancakeConfig,
    isolation: Isolation,
    dblpancakes: Option<UnitsConfig>,
    isolations: IndexMap<String, SpacerConfig>,
}

impl HtsInsert {
    /// Create an empty stack centered on `z0`.
    pub fn new(name: impl Into<String>, z0: f64) -> Self {
        Self {
            name: name.into(),
            z0,
            ..Self::default()
        }
    }

    /// Build a stack from its JSON configuration.
    ///
    /// `dblpancakes` either holds `n` (and optionally the spacer
    /// `isolation`) to replicate the top-level pancake, or one entry per
    /// unit. In the per-unit form, `isolations[key].isolation` overrides the
    /// spacer that follows unit `key`.
    pub fn from_config(name: &str, json: &str, z0: f64) -> Result<Self> {
        let invalid = |reason: String| GeoError::InvalidConfig {
            name: name.to_string(),
            reason,
        };
        let cfg: StackConfig = serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
        let tape = cfg.tape.unwrap_or_default();
        let pancake = cfg.pancake.build(tape);

        let mut hts = HtsInsert::new(name.strip_suffix(".json").unwrap_or(name), z0);
        match cfg.dblpancakes {
            None => return Err(invalid("no dblpancakes".into())),
            Some(UnitsConfig::Uniform { n, isolation }) => {
                if n == 0 {
                    return Err(invalid("dblpancakes.n must be positive".into()));
                }
                debug!(name, n, "Loading similar double pancakes");
                let spacer = isolation.unwrap_or_else(|| cfg.isolation.clone());
                for i in 0..n {
                    hts.push_dblpancake(DblPancake::new(0.0, pancake, cfg.isolation.clone()));
                    if i + 1 != n {
                        hts.push_isolation(spacer.clone());
                    }
                }
            }
            Some(UnitsConfig::Explicit(units)) => {
                if units.is_empty() {
                    return Err(invalid("dblpancakes is empty".into()));
                }
                debug!(name, n = units.len(), "Loading distinct double pancakes");
                let count = units.len();
                for (i, (key, unit)) in units.iter().enumerate() {
                    let p = unit
                        .pancake
                        .as_ref()
                        .map_or(pancake, |p| p.build(tape));
                    hts.push_dblpancake(DblPancake::new(0.0, p, cfg.isolation.clone()));
                    if i + 1 != count {
                        let spacer = cfg
                            .isolations
                            .get(key)
                            .and_then(|s| s.isolation.clone())
                            .unwrap_or_else(|| cfg.isolation.clone());
                        hts.push_isolation(spacer);
                    }
                }
            }
        }
        hts.restack()?;
        debug!(
            name = %hts.name,
            r0 = hts.r0,
            r1 = hts.r1,
            h = hts.h,
            n = hts.n(),
            "Loaded HTS stack"
        );
        Ok(hts)
    }

    /// Append a double pancake on top of the stack.
    ///
    /// Call [`HtsInsert::restack`] once the stack is complete.
    pub fn push_dblpancake(&mut self, dp: DblPancake) {
        self.dblpancakes.push(dp);
    }

    /// Append the spacer following the last double pancake.
    pub fn push_isolation(&mut self, isolation: Isolation) {
        self.isolations.push(isolation);
    }

    /// Move the stack center and re-place every unit.
    pub fn set_z0(&mut self, z0: f64) {
        self.z0 = z0;
        self.place();
    }

    /// Recompute height, radii and unit altitudes after assembly.
    pub fn restack(&mut self) -> Result<()> {
        let n = self.dblpancakes.len();
        if n == 0 || self.isolations.len() != n - 1 {
            return Err(GeoError::InvalidConfig {
                name: self.name.clone(),
                reason: format!(
                    "{} double pancakes need {} spacers, got {}",
                    n,
                    n.saturating_sub(1),
                    self.isolations.len()
                ),
            });
        }
        self.h = self.dblpancakes.iter().map(DblPancake::height).sum::<f64>()
            + self.isolations.iter().map(Isolation::height).sum::<f64>();
        self.r0 = self
            .dblpancakes
            .iter()
            .map(DblPancake::r0)
            .fold(f64::INFINITY, f64::min);
        self.r1 = self
            .dblpancakes
            .iter()
            .map(DblPancake::r1)
            .fold(f64::NEG_INFINITY, f64::max);
        self.place();
        Ok(())
    }

    fn place(&mut self) {
        let mut z = self.bottom();
        for (i, dp) in self.dblpancakes.iter_mut().enumerate() {
            let h = dp.height();
            dp.z0 = z + h / 2.0;
            z += h;
            if let Some(spacer) = self.isolations.get(i) {
                z += spacer.height();
            }
        }
    }

    /// Number of double pancakes.
    pub fn n(&self) -> usize {
        self.dblpancakes.len()
    }

    /// Total height.
    pub fn height(&self) -> f64 {
        self.h
    }

    /// Radial width.
    pub fn width(&self) -> f64 {
        self.r1 - self.r0
    }

    /// Altitude of the bottom of the stack.
    pub fn bottom(&self) -> f64 {
        self.z0 - self.h / 2.0
    }

    /// Altitude of the top of the stack.
    pub fn top(&self) -> f64 {
        self.z0 + self.h / 2.0
    }

    /// Cross section of the enclosing rectangle.
    pub fn area(&self) -> f64 {
        self.width() * self.h
    }

    /// Superconductor share of the enclosing rectangle.
    pub fn filling_factor(&self) -> f64 {
        let sc: f64 = self
            .dblpancakes
            .iter()
            .map(|dp| 2.0 * dp.pancake.n as f64 * dp.pancake.tape.w * dp.pancake.tape.h)
            .sum();
        ratio(sc, self.area())
    }

    /// Number of tapes per double pancake.
    pub fn ntapes(&self) -> Vec<usize> {
        self.dblpancakes.iter().map(|dp| dp.pancake.n).collect()
    }

    /// Tape heights per double pancake.
    pub fn tape_heights(&self) -> Vec<f64> {
        self.dblpancakes.iter().map(|dp| dp.pancake.tape.h).collect()
    }

    /// Superconductor widths per double pancake.
    pub fn sc_widths(&self) -> Vec<f64> {
        self.dblpancakes.iter().map(|dp| dp.pancake.tape.w).collect()
    }

    /// Co-wound insulation widths per double pancake.
    pub fn tape_isolation_widths(&self) -> Vec<f64> {
        self.dblpancakes.iter().map(|dp| dp.pancake.tape.e).collect()
    }

    /// Mandrel radii per double pancake.
    pub fn mandrels(&self) -> Vec<f64> {
        self.dblpancakes.iter().map(|dp| dp.pancake.mandrel).collect()
    }

    /// Pancake widths per double pancake.
    pub fn pancake_widths(&self) -> Vec<f64> {
        self.dblpancakes.iter().map(|dp| dp.pancake.width()).collect()
    }

    /// Double pancake heights.
    pub fn dblpancake_heights(&self) -> Vec<f64> {
        self.dblpancakes.iter().map(DblPancake::height).collect()
    }

    /// Spacer heights.
    pub fn isolation_heights(&self) -> Vec<f64> {
        self.isolations.iter().map(Isolation::height).collect()
    }

    /// Spacer widths.
    pub fn isolation_widths(&self) -> Vec<f64> {
        self.isolations.iter().map(Isolation::width).collect()
    }

    /// Solid names: every unit (expanded per `detail`), then every spacer.
    ///
    /// Units are named `{mname}_dp{i}` and spacers `{mname}_i{i}`.
    pub fn names(&self, mname: &str, detail: Detail) -> Vec<String> {
        let prefix = prefix(mname);
        let mut names: Vec<String> = self
            .dblpancakes
            .iter()
            .enumerate()
            .flat_map(|(i, dp)| dp.names(&format!("{prefix}dp{i}"), detail))
            .collect();
        names.extend((0..self.isolations.len()).map(|i| format!("{prefix}i{i}")));
        names
    }

    /// Mesh length hints from the first unit, `None` for an empty stack.
    pub fn mesh_sizes(&self) -> Option<HtsMeshSizes> {
        let dp = self.dblpancakes.first()?;
        let p = &dp.pancake;
        Some(HtsMeshSizes {
            isolation: self.isolations.first().map_or(0.0, Isolation::height) / 3.0,
            dblpancake: dp.height() / 10.0,
            pancake: p.height() / 10.0,
            dblpancake_isolation: dp.isolation.height() / 3.0,
            mandrel: (p.mandrel - p.r0).abs() / 3.0,
            sc: p.tape.sc_width() / 5.0,
            duromag: p.tape.isolation_width() / 3.0,
        })
    }
}

/// `{mname}_`, or nothing for an empty name.
pub(crate) fn prefix(mname: &str) -> String {
    if mname.is_empty() {
        String::new()
    } else {
        format!("{mname}_")
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}
