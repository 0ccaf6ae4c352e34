use std::f64::consts::PI;

use magnetgeo_ir::{Bitter, Range};
use serde::Serialize;
use tracing::debug;

use super::Part;
use crate::bbox::AxiBox;
use crate::error::Result;
use crate::hts::prefix;
use crate::store::Resolver;

/// Hydraulic description of a Bitter magnet's cooling channels.
///
/// Channel 0 is the inner bore, channels `1..=n` the cooling slits and the
/// last one the outer bore.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HydraulicParams {
    /// Number of cooling slits.
    pub nslits: usize,
    /// Axial extent.
    pub z: Range,
    /// Hydraulic diameter per channel.
    pub dh: Vec<f64>,
    /// Cross section per channel.
    pub sh: Vec<f64>,
    /// Altitudes bounding the cut sections, from bottom to top.
    pub zh: Vec<f64>,
}

/// Bitter-specific derivations.
pub trait BitterExt {
    /// Thickness of the annulus with the same section as slit family `i`.
    fn equivalent_eps(&self, i: usize) -> Option<f64>;

    /// Local mesh length: a fifth of the smallest radial gap between slits,
    /// or a tenth of the radial span without slits.
    fn get_lc(&self) -> f64;

    /// Cooling channel names `Slit0 ..= Slit{n+1}`.
    fn channels(&self, mname: &str) -> Vec<String>;

    /// Hydraulic diameters and sections of every channel.
    fn hydraulic_params(&self) -> HydraulicParams;
}

impl BitterExt for Bitter {
    fn equivalent_eps(&self, i: usize) -> Option<f64> {
        let slit = self.coolingslits.get(i)?;
        Some(f64::from(slit.n) * slit.sh / (2.0 * PI * slit.r))
    }

    fn get_lc(&self) -> f64 {
        if self.coolingslits.is_empty() {
            return (self.r[1] - self.r[0]) / 10.0;
        }
        let mut x = self.r[0];
        let mut gap = f64::INFINITY;
        for slit in &self.coolingslits {
            gap = gap.min(slit.r - x);
            x = slit.r;
        }
        gap.min(self.r[1] - x) / 5.0
    }

    fn channels(&self, mname: &str) -> Vec<String> {
        let prefix = prefix(mname);
        let n = self.coolingslits.len();
        let channels: Vec<String> = (0..n + 2).map(|i| format!("{prefix}Slit{i}")).collect();
        debug!(bitter = %self.name, slits = n, "Bitter channels");
        channels
    }

    fn hydraulic_params(&self) -> HydraulicParams {
        let (ib, ob) = (self.innerbore, self.outerbore);
        let (r0, r1) = (self.r[0], self.r[1]);

        let mut dh = vec![2.0 * (r0 - ib)];
        let mut sh = vec![PI * (r0 - ib) * (r0 + ib)];
        for (i, slit) in self.coolingslits.iter().enumerate() {
            dh.push(2.0 * self.equivalent_eps(i).unwrap_or(0.0));
            sh.push(f64::from(slit.n) * slit.sh);
        }
        dh.push(2.0 * (ob - r1));
        sh.push(PI * (ob - r1) * (ob - r1));

        let mut z = -self.axi.h;
        let mut zh = vec![self.z[0], z];
        for (n, p) in self.axi.turns.iter().zip(&self.axi.pitch) {
            z += n * p;
            zh.push(z);
        }
        zh.push(self.z[1]);

        HydraulicParams {
            nslits: self.coolingslits.len(),
            z: self.z,
            dh,
            sh,
            zh,
        }
    }
}

impl Part for Bitter {
    fn part_name(&self) -> &str {
        &self.name
    }

    fn bounding_box(&self, _store: &dyn Resolver) -> Result<AxiBox> {
        Ok(AxiBox::new(self.r, self.z))
    }

    /// 3D: one solid `{mname}_B`. 2D: one solid per slit and cut section,
    /// plus a section below and above the cut when the plate extends past
    /// `±axi.h`.
    fn names(&self, mname: &str, is2d: bool, _store: &dyn Resolver) -> Result<Vec<String>> {
        let prefix = prefix(mname);
        if !is2d {
            return Ok(vec![format!("{prefix}B")]);
        }

        let nslits = self.coolingslits.len();
        let nsection = self.axi.nsections();
        let mut sections = Vec::with_capacity(nsection + 2);
        if self.z[0] < -self.axi.h {
            sections.push(0);
        }
        sections.extend(1..=nsection);
        if self.z[1] > self.axi.h {
            sections.push(nsection + 1);
        }

        let names: Vec<String> = sections
            .into_iter()
            .flat_map(|j| (0..nslits).map(move |i| (j, i)))
            .map(|(j, i)| format!("{prefix}B{j}_Slit{i}"))
            .collect();
        debug!(bitter = %self.name, n = names.len(), "Bitter names");
        Ok(names)
    }

    fn mesh_length(&self, _store: &dyn Resolver) -> Result<f64> {
        Ok(self.get_lc())
    }
}
