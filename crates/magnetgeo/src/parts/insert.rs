use indexmap::IndexMap;
use magnetgeo_ir::{Helix, Insert, Record};
use tracing::debug;

use super::{min_mesh_length, unexpected, Part};
use crate::bbox::AxiBox;
use crate::error::{GeoError, Result};
use crate::hts::prefix;
use crate::store::{resolve_child, Resolver};

/// Helical insert derivations.
pub trait InsertExt {
    /// Number of helices.
    fn nhelices(&self) -> usize;

    /// Number of cooling channels: one more than the helices.
    fn nchannels(&self) -> usize;

    /// Channel names `Channel0 ..= Channel{k}`.
    fn channels(&self, mname: &str) -> Vec<String>;

    /// Child record name to in-assembly tag (`H{k}` for helices, `R{k}` for rings).
    fn ring_ids(&self) -> IndexMap<String, String>;

    /// Load every helix, from inner to outer.
    fn load_helices(&self, store: &dyn Resolver) -> Result<Vec<Helix>>;
}

impl InsertExt for Insert {
    fn nhelices(&self) -> usize {
        self.helices.len()
    }

    fn nchannels(&self) -> usize {
        self.helices.len() + 1
    }

    fn channels(&self, mname: &str) -> Vec<String> {
        let prefix = prefix(mname);
        (0..self.nchannels())
            .map(|i| format!("{prefix}Channel{i}"))
            .collect()
    }

    fn ring_ids(&self) -> IndexMap<String, String> {
        let helices = self
            .helices
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), format!("H{}", i + 1)));
        let rings = self
            .rings
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), format!("R{}", i + 1)));
        helices.chain(rings).collect()
    }

    fn load_helices(&self, store: &dyn Resolver) -> Result<Vec<Helix>> {
        self.helices
            .iter()
            .map(|name| match resolve_child(store, &self.name, name)? {
                Record::Helix(helix) => Ok(helix),
                other => Err(unexpected(name, "Helix", &other)),
            })
            .collect()
    }
}

impl Part for Insert {
    fn part_name(&self) -> &str {
        &self.name
    }

    /// Union of the helices, extended axially by the tallest ring on both ends.
    /// Leads are left out.
    fn bounding_box(&self, store: &dyn Resolver) -> Result<AxiBox> {
        let helices = self.load_helices(store)?;
        let mut bb = AxiBox::union_all(helices.iter().map(|h| AxiBox::new(h.r, h.z)))
            .ok_or_else(|| GeoError::EmptyComposite(self.name.clone()))?;
        let mut dz = 0.0_f64;
        for name in &self.rings {
            match resolve_child(store, &self.name, name)? {
                Record::Ring(ring) => dz = dz.max((ring.z[1] - ring.z[0]).abs()),
                other => return Err(unexpected(name, "Ring", &other)),
            }
        }
        bb.z[0] -= dz;
        bb.z[1] += dz;
        Ok(bb)
    }

    /// Helices `H{i}_*`, rings `R{i}`, then in 3D the leads `iL{i}` / `oL{i}`.
    ///
    /// Solids inside an insert are tagged by position, so `mname` is not used.
    fn names(&self, _mname: &str, is2d: bool, store: &dyn Resolver) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for (i, helix) in self.load_helices(store)?.iter().enumerate() {
            names.extend(helix.names(&format!("H{}", i + 1), is2d, store)?);
        }
        for (i, name) in self.rings.iter().enumerate() {
            match resolve_child(store, &self.name, name)? {
                Record::Ring(ring) => names.extend(ring.names(&format!("R{}", i + 1), is2d, store)?),
                other => return Err(unexpected(name, "Ring", &other)),
            }
        }
        if !is2d {
            for (i, name) in self.currentleads.iter().enumerate() {
                let tag = match resolve_child(store, &self.name, name)? {
                    Record::InnerCurrentLead(_) => "i",
                    Record::OuterCurrentLead(_) => "o",
                    other => return Err(unexpected(name, "CurrentLead", &other)),
                };
                names.push(format!("{tag}L{}", i + 1));
            }
        }
        debug!(insert = %self.name, is2d, n = names.len(), "Insert names");
        Ok(names)
    }

    fn isolants(&self, _mname: &str, store: &dyn Resolver) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for (i, helix) in self.load_helices(store)?.iter().enumerate() {
            names.extend(helix.isolants(&format!("H{}", i + 1), store)?);
        }
        Ok(names)
    }

    fn mesh_length(&self, store: &dyn Resolver) -> Result<f64> {
        min_mesh_length(&self.name, self.helices.iter().map(String::as_str), store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::fixtures;
    use crate::store::MemoryStore;

    fn insert(store: &MemoryStore) -> Insert {
        match store.record("HL").unwrap() {
            Record::Insert(insert) => insert,
            other => panic!("expected an insert, got {other:?}"),
        }
    }

    #[test]
    fn names_count_helices_rings_and_leads() {
        let store = fixtures::insert_store();
        let hl = insert(&store);
        let names = hl.names("ignored", false, &store).unwrap();
        // 3 helices × (Cu + 2 glues), 2 rings, 2 leads.
        assert_eq!(names.len(), 3 * 3 + 2 + 2);
        assert_eq!(&names[..3], ["H1_Cu", "H1_Glue0", "H1_Glue1"]);
        assert_eq!(&names[9..], ["R1", "R2", "iL1", "oL2"]);
    }

    #[test]
    fn names_in_2d_skip_leads() {
        let store = fixtures::insert_store();
        let names = insert(&store).names("", true, &store).unwrap();
        assert_eq!(names.len(), 3 * 5 + 2);
        assert_eq!(names[5], "H2_Cu0");
        assert_eq!(names.last().unwrap(), "R2");
    }

    #[test]
    fn channels_and_ring_ids() {
        let store = fixtures::insert_store();
        let hl = insert(&store);
        assert_eq!(hl.nchannels(), 4);
        assert_eq!(hl.channels(""), vec!["Channel0", "Channel1", "Channel2", "Channel3"]);
        let ids = hl.ring_ids();
        assert_eq!(ids["H2"], "H2");
        assert_eq!(ids["Ring-H1H2"], "R1");
        assert_eq!(ids["Ring-H2H3"], "R2");
    }

    #[test]
    fn box_spans_helices_and_rings() {
        let store = fixtures::insert_store();
        let bb = insert(&store).bounding_box(&store).unwrap();
        assert_eq!(bb, AxiBox::new([20.0, 50.0], [-220.0, 240.0]));
    }

    #[test]
    fn isolants_and_mesh_length() {
        let store = fixtures::insert_store();
        let hl = insert(&store);
        let isolants = hl.isolants("", &store).unwrap();
        assert_eq!(isolants.len(), 6);
        assert_eq!(isolants[2], "H2_Glue0");
        assert_eq!(hl.mesh_length(&store).unwrap(), 0.9);
    }

    #[test]
    fn wrong_child_kind_is_reported() {
        let mut store = fixtures::insert_store();
        store.insert(Record::Ring(fixtures::ring("H2", 31.0, 40.0)));
        let err = insert(&store).names("", false, &store).unwrap_err();
        assert!(matches!(
            err,
            GeoError::UnexpectedKind { expected: "Helix", found: "Ring", .. }
        ));
    }

    #[test]
    fn missing_helix_is_a_missing_reference() {
        let store = fixtures::insert_store();
        let mut hl = insert(&store);
        hl.helices.push("H4".into());
        assert!(matches!(
            hl.names("", false, &store),
            Err(GeoError::MissingReference { name, parent, .. }) if name == "H4" && parent == "HL"
        ));
    }
}
