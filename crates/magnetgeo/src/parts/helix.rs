use magnetgeo_ir::Helix;
use tracing::debug;

use super::Part;
use crate::bbox::AxiBox;
use crate::error::Result;
use crate::hts::prefix;
use crate::store::Resolver;

/// Material filling the helical cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insulator {
    /// Glued cut: one layer, two for a double cut.
    Glue,
    /// Kapton shims, one per groove shape.
    Kapton,
}

impl Insulator {
    /// Solid name stem.
    pub fn as_str(self) -> &'static str {
        match self {
            Insulator::Glue => "Glue",
            Insulator::Kapton => "Kapton",
        }
    }
}

/// Nearest integer, ties rounded down.
fn nearest_down(x: f64) -> usize {
    let (lo, hi) = (x.floor(), x.ceil());
    let n = if hi - x < x - lo { hi } else { lo };
    n.max(0.0) as usize
}

/// Helix-specific derivations.
pub trait HelixExt {
    /// Whether the cut carries shapes and channels (Kapton insulated).
    fn is_hr(&self) -> bool;

    /// Insulator kind and number of insulating solids.
    fn insulators(&self) -> (Insulator, usize);
}

impl HelixExt for Helix {
    fn is_hr(&self) -> bool {
        self.m3d.with_shapes && self.m3d.with_channels
    }

    fn insulators(&self) -> (Insulator, usize) {
        if self.is_hr() {
            let angle = self.shape.angle.first().copied().unwrap_or(0.0);
            let n = if angle > 0.0 {
                nearest_down(self.axi.nturns() * 360.0 / angle)
            } else {
                0
            };
            (Insulator::Kapton, n)
        } else if self.dble {
            (Insulator::Glue, 2)
        } else {
            (Insulator::Glue, 1)
        }
    }
}

impl Part for Helix {
    fn part_name(&self) -> &str {
        &self.name
    }

    fn bounding_box(&self, _store: &dyn Resolver) -> Result<AxiBox> {
        Ok(AxiBox::new(self.r, self.z))
    }

    fn names(&self, mname: &str, is2d: bool, store: &dyn Resolver) -> Result<Vec<String>> {
        let prefix = prefix(mname);
        let names: Vec<String> = if is2d {
            let nsection = self.axi.nsections();
            (0..nsection + 2).map(|j| format!("{prefix}Cu{j}")).collect()
        } else {
            let mut names = vec![format!("{prefix}Cu")];
            names.extend(self.isolants(mname, store)?);
            names
        };
        debug!(helix = %self.name, hr = self.is_hr(), n = names.len(), "Helix names");
        Ok(names)
    }

    fn isolants(&self, mname: &str, _store: &dyn Resolver) -> Result<Vec<String>> {
        let prefix = prefix(mname);
        let (kind, n) = self.insulators();
        Ok((0..n)
            .map(|j| format!("{prefix}{}{j}", kind.as_str()))
            .collect())
    }

    fn mesh_length(&self, _store: &dyn Resolver) -> Result<f64> {
        Ok((self.r[1] - self.r[0]) / 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::fixtures;
    use crate::store::MemoryStore;
    use approx::assert_relative_eq;

    #[test]
    fn glued_helix_names() {
        let store = MemoryStore::new();
        let mut h = fixtures::helix("H1", [20.0, 30.0], [-200.0, 100.0]);
        assert_eq!(
            h.names("H1", false, &store).unwrap(),
            vec!["H1_Cu", "H1_Glue0", "H1_Glue1"]
        );
        h.dble = false;
        assert_eq!(h.names("", false, &store).unwrap(), vec!["Cu", "Glue0"]);
    }

    #[test]
    fn axisymmetric_helix_names() {
        let store = MemoryStore::new();
        let h = fixtures::helix("H1", [20.0, 30.0], [-200.0, 100.0]);
        assert_eq!(
            h.names("H2", true, &store).unwrap(),
            vec!["H2_Cu0", "H2_Cu1", "H2_Cu2", "H2_Cu3", "H2_Cu4"]
        );
    }

    #[test]
    fn hr_helix_counts_kapton_shims() {
        let store = MemoryStore::new();
        let mut h = fixtures::helix("H1", [20.0, 30.0], [-200.0, 100.0]);
        h.m3d.with_shapes = true;
        h.m3d.with_channels = true;
        // 40 turns, a shim every 90 degrees.
        h.shape.angle = vec![90.0];
        assert_eq!(h.insulators(), (Insulator::Kapton, 160));
        let names = h.names("H1", false, &store).unwrap();
        assert_eq!(names.len(), 161);
        assert_eq!(names[1], "H1_Kapton0");
        assert_eq!(names[160], "H1_Kapton159");
    }

    #[test]
    fn kapton_count_rounds_ties_down() {
        assert_eq!(nearest_down(2.5), 2);
        assert_eq!(nearest_down(2.51), 3);
        assert_eq!(nearest_down(2.49), 2);
        assert_eq!(nearest_down(3.0), 3);
    }

    #[test]
    fn helix_box_and_mesh_length() {
        let store = MemoryStore::new();
        let h = fixtures::helix("H1", [20.0, 30.0], [-200.0, 100.0]);
        assert_eq!(
            h.bounding_box(&store).unwrap(),
            AxiBox::new([20.0, 30.0], [-200.0, 100.0])
        );
        assert_relative_eq!(h.mesh_length(&store).unwrap(), 1.0);
    }
}
