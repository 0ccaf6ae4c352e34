use magnetgeo_ir::{Detail, Supra};
use tracing::{debug, warn};

use super::Part;
use crate::bbox::AxiBox;
use crate::error::{GeoError, Result};
use crate::hts::{prefix, HtsInsert};
use crate::store::Resolver;

/// Superconducting insert derivations.
pub trait SupraExt {
    /// Configuration name without its `.json` suffix.
    fn stem(&self) -> &str;

    /// Load the HTS stack this insert refers to, centered on the insert.
    fn structure(&self, store: &dyn Resolver) -> Result<HtsInsert>;

    /// Copy whose radii, height and unit count follow `hts`.
    fn fitted(&self, hts: &HtsInsert) -> Supra;
}

impl SupraExt for Supra {
    fn stem(&self) -> &str {
        self.structure
            .strip_suffix(".json")
            .unwrap_or(&self.structure)
    }

    fn structure(&self, store: &dyn Resolver) -> Result<HtsInsert> {
        let text = store
            .config(&self.structure)
            .map_err(|e| GeoError::MissingReference {
                name: self.structure.clone(),
                parent: self.name.clone(),
                source: Box::new(e),
            })?;
        let z0 = (self.z[0] + self.z[1]) / 2.0;
        HtsInsert::from_config(&self.structure, &text, z0)
    }

    fn fitted(&self, hts: &HtsInsert) -> Supra {
        let mut fitted = self.clone();
        let r = [hts.r0, hts.r1];
        let z = [hts.bottom(), hts.top()];
        let n = hts.n() as u32;
        if r != self.r {
            warn!(supra = %self.name, from = ?self.r, to = ?r, "Radii adjusted to HTS structure");
            fitted.r = r;
        }
        if z != self.z {
            warn!(supra = %self.name, from = ?self.z, to = ?z, "Height adjusted to HTS structure");
            fitted.z = z;
        }
        if n != self.n {
            warn!(supra = %self.name, from = self.n, to = n, "Double pancake count adjusted to HTS structure");
            fitted.n = n;
        }
        fitted
    }
}

impl Part for Supra {
    fn part_name(&self) -> &str {
        &self.name
    }

    fn bounding_box(&self, _store: &dyn Resolver) -> Result<AxiBox> {
        Ok(AxiBox::new(self.r, self.z))
    }

    /// A single solid `{mname}_S` without detail, the HTS stack names otherwise.
    fn names(&self, mname: &str, _is2d: bool, store: &dyn Resolver) -> Result<Vec<String>> {
        let prefix = prefix(mname);
        if self.detail == Detail::None {
            return Ok(vec![format!("{prefix}S")]);
        }
        let hts = self.structure(store)?;
        let names = hts.names(&format!("{prefix}{}", self.stem()), self.detail);
        debug!(supra = %self.name, detail = ?self.detail, n = names.len(), "Supra names");
        Ok(names)
    }

    fn mesh_length(&self, _store: &dyn Resolver) -> Result<f64> {
        Ok((self.r[1] - self.r[0]) / 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use approx::assert_relative_eq;

    const STACK: &str = r#"{
        "tape": {"w": 0.25, "h": 6.0, "e": 0.25},
        "pancake": {"r0": 20.0, "mandrin": 18.0, "ntapes": 20},
        "isolation": {"r0": 20.0, "w": [10.0], "h": [0.5]},
        "dblpancakes": {"n": 2}
    }"#;

    fn supra(detail: Detail) -> Supra {
        Supra {
            name: "HTS".into(),
            r: [20.0, 30.0],
            z: [-10.0, 20.0],
            n: 2,
            structure: "HTS-dp.json".into(),
            detail,
        }
    }

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_config("HTS-dp.json", STACK);
        store
    }

    #[test]
    fn undetailed_supra_is_one_solid() {
        let store = MemoryStore::new();
        assert_eq!(supra(Detail::None).names("HTS", false, &store).unwrap(), vec!["HTS_S"]);
    }

    #[test]
    fn detailed_supra_uses_stack_names() {
        let names = supra(Detail::DblPancake).names("HTS", false, &store()).unwrap();
        assert_eq!(names, vec!["HTS_HTS-dp_dp0", "HTS_HTS-dp_dp1", "HTS_HTS-dp_i0"]);
    }

    #[test]
    fn missing_structure_is_a_missing_reference() {
        let err = supra(Detail::Pancake)
            .names("", false, &MemoryStore::new())
            .unwrap_err();
        assert!(matches!(err, GeoError::MissingReference { name, .. } if name == "HTS-dp.json"));
    }

    #[test]
    fn fitted_follows_the_stack() {
        let s = supra(Detail::None);
        let hts = s.structure(&store()).unwrap();
        // Two units of 12.5 and a 0.5 spacer, centered on z = 5.
        assert_relative_eq!(hts.h, 25.5);
        let fitted = s.fitted(&hts);
        assert_eq!(fitted.r, [20.0, 30.0]);
        assert_relative_eq!(fitted.z[0], 5.0 - 12.75);
        assert_relative_eq!(fitted.z[1], 5.0 + 12.75);
        assert_eq!(fitted.n, 2);
        assert_eq!(fitted.name, s.name);
    }
}
