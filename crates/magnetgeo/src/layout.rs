//! One-pass derivation of everything the mesh backend needs from a record.
//!
//! A [`Layout`] lists the solid names in the order the backend creates the
//! solids, one bounding box per magnet for mesh sizing, and the lookup
//! tables the group reconciliation relies on.

use indexmap::IndexMap;
use magnetgeo_ir::{Detail, Record};
use serde::Serialize;
use tracing::{debug, info};

use crate::bbox::AxiBox;
use crate::error::{GeoError, Result};
use crate::parts::{resolve_part, scoped, unexpected, InsertExt, Part, SupraExt};
use crate::store::{resolve_child, Resolver};

/// Name of the air solid appended after the magnets.
pub const AIR: &str = "Air";

/// Bounding box of one magnet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MagnetBox {
    /// Magnet name, scoped like its solids.
    pub name: String,
    /// Record kind.
    pub kind: &'static str,
    /// Enclosing box.
    pub bbox: AxiBox,
}

/// Derived metadata of a magnet or a site.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    /// Solid names, in backend order.
    pub solid_names: Vec<String>,
    /// Helix count per magnet.
    pub helices: Vec<usize>,
    /// Cooling channel count per magnet.
    pub channels: Vec<usize>,
    /// One box per magnet, in order.
    pub boxes: Vec<MagnetBox>,
    /// Insert child record name to in-assembly tag.
    pub ring_ids: IndexMap<String, String>,
    /// Magnet record names of a site, in order.
    pub compound: Vec<String>,
    /// An inner current lead is modeled.
    pub inner_lead: bool,
    /// An outer current lead is modeled.
    pub outer_lead: bool,
}

impl Layout {
    /// Append the air solid.
    pub fn push_air(&mut self) {
        self.solid_names.push(AIR.to_string());
    }

    /// Whether the air solid was appended.
    pub fn has_air(&self) -> bool {
        self.solid_names.last().is_some_and(|n| n == AIR)
    }

    /// Helix count of the first magnet.
    pub fn nhelices(&self) -> usize {
        self.helices.first().copied().unwrap_or(0)
    }

    /// Channel count of the first magnet.
    pub fn nchannels(&self) -> usize {
        self.channels.first().copied().unwrap_or(0)
    }

    fn push_magnet(
        &mut self,
        record: &Record,
        mname: &str,
        is2d: bool,
        store: &dyn Resolver,
    ) -> Result<()> {
        let name = record.name();
        match record {
            Record::Insert(insert) => {
                // Insert solids and ring tags are not scoped by magnet.
                if let Some(first) = self.boxes.iter().find(|b| b.kind == "Insert") {
                    return Err(GeoError::InvalidConfig {
                        name: name.to_string(),
                        reason: format!("a layout holds a single insert, {} is already laid out", first.name),
                    });
                }
                self.solid_names.extend(insert.names(mname, is2d, store)?);
                self.helices.push(insert.nhelices());
                self.channels.push(insert.nchannels());
                self.ring_ids.extend(insert.ring_ids());
                if !is2d {
                    for lead in &insert.currentleads {
                        match resolve_child(store, name, lead)? {
                            Record::InnerCurrentLead(_) => self.inner_lead = true,
                            Record::OuterCurrentLead(_) => self.outer_lead = true,
                            other => return Err(unexpected(lead, "CurrentLead", &other)),
                        }
                    }
                }
                self.push_box(name, record, store)?;
            }
            Record::Supra(supra) if supra.detail != Detail::None => {
                let hts = supra.structure(store)?;
                let fitted = supra.fitted(&hts);
                let pname = scoped(mname, name);
                self.solid_names.extend(fitted.names(&pname, is2d, store)?);
                self.helices.push(0);
                self.channels.push(0);
                self.boxes.push(MagnetBox {
                    name: pname,
                    kind: record.kind(),
                    bbox: fitted.bounding_box(store)?,
                });
            }
            Record::Helix(_) => {
                self.solid_names.extend(record.names(mname, is2d, store)?);
                self.helices.push(1);
                self.channels.push(2);
                self.push_box(name, record, store)?;
            }
            _ => {
                let pname = scoped(mname, name);
                self.solid_names.extend(record.names(&pname, is2d, store)?);
                self.helices.push(0);
                self.channels.push(0);
                self.push_box(&pname, record, store)?;
            }
        }
        Ok(())
    }

    fn push_box(&mut self, name: &str, record: &Record, store: &dyn Resolver) -> Result<()> {
        self.boxes.push(MagnetBox {
            name: name.to_string(),
            kind: record.kind(),
            bbox: record.bounding_box(store)?,
        });
        Ok(())
    }
}

/// Derive the [`Layout`] of `record`.
///
/// A site lays out each of its magnets in turn under `mname`; any other part
/// is laid out as a single magnet.
pub fn layout(record: &Record, mname: &str, is2d: bool, store: &dyn Resolver) -> Result<Layout> {
    let mut layout = Layout::default();
    match record {
        Record::MSite(site) => {
            for entry in site.magnets.entries() {
                let magnet = resolve_part(store, &site.name, entry.name)?;
                debug!(site = %site.name, magnet = entry.name, key = ?entry.key, "Laying out magnet");
                layout.compound.push(entry.name.to_string());
                layout.push_magnet(&magnet, mname, is2d, store)?;
            }
        }
        _ => layout.push_magnet(record, mname, is2d, store)?,
    }
    info!(
        record = record.name(),
        kind = record.kind(),
        is2d,
        solids = layout.solid_names.len(),
        magnets = layout.boxes.len(),
        "Layout derived"
    );
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::fixtures;
    use crate::store::MemoryStore;
    use indexmap::IndexMap;
    use magnetgeo_ir::{MSite, MagnetRefs, PartRefs, Supra};

    fn site_store() -> MemoryStore {
        let mut store = fixtures::insert_store();
        store.insert(Record::Bitter(fixtures::bitter("Bi", [150.0, 250.0], [-300.0, 300.0])));
        store.insert(Record::MSite(MSite {
            name: "M19".into(),
            magnets: MagnetRefs::Map(IndexMap::from([
                ("Insert".to_string(), PartRefs::One("HL".into())),
                ("Bitters".to_string(), PartRefs::List(vec!["Bi".into()])),
            ])),
        }));
        store
    }

    #[test]
    fn insert_layout() {
        let store = fixtures::insert_store();
        let hl = store.record("HL").unwrap();
        let layout = layout(&hl, "", false, &store).unwrap();
        assert_eq!(layout.solid_names.len(), 13);
        assert_eq!(layout.helices, vec![3]);
        assert_eq!(layout.channels, vec![4]);
        assert!(layout.inner_lead && layout.outer_lead);
        assert_eq!(layout.ring_ids["Ring-H2H3"], "R2");
        assert_eq!(layout.boxes.len(), 1);
        assert_eq!(layout.boxes[0].name, "HL");
        assert_eq!(layout.boxes[0].kind, "Insert");
        assert!(layout.compound.is_empty());
    }

    #[test]
    fn insert_layout_2d_has_no_leads() {
        let store = fixtures::insert_store();
        let hl = store.record("HL").unwrap();
        let layout = layout(&hl, "", true, &store).unwrap();
        assert_eq!(layout.solid_names.len(), 17);
        assert!(!layout.inner_lead && !layout.outer_lead);
    }

    #[test]
    fn site_layout_walks_magnets_in_order() {
        let store = site_store();
        let site = store.record("M19").unwrap();
        let mut layout = layout(&site, "", false, &store).unwrap();
        assert_eq!(layout.compound, vec!["HL", "Bi"]);
        assert_eq!(layout.helices, vec![3, 0]);
        assert_eq!(layout.channels, vec![4, 0]);
        assert_eq!(layout.nchannels(), 4);
        assert_eq!(layout.solid_names.last().unwrap(), "Bi_B");
        let names: Vec<&str> = layout.boxes.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["HL", "Bi"]);

        assert!(!layout.has_air());
        layout.push_air();
        assert!(layout.has_air());
        assert_eq!(layout.solid_names.len(), 13 + 1 + 1);
    }

    #[test]
    fn site_with_two_inserts_is_rejected() {
        let mut store = fixtures::insert_store();
        let Record::Insert(mut second) = store.record("HL").unwrap() else {
            panic!("expected Insert");
        };
        second.name = "HL2".into();
        store.insert(Record::Insert(second));
        store.insert(Record::MSite(MSite {
            name: "M20".into(),
            magnets: MagnetRefs::Map(IndexMap::from([(
                "Insert".to_string(),
                PartRefs::List(vec!["HL".into(), "HL2".into()]),
            )])),
        }));
        let site = store.record("M20").unwrap();
        match layout(&site, "", false, &store) {
            Err(GeoError::InvalidConfig { name, .. }) => assert_eq!(name, "HL2"),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn scoped_magnets_in_a_site() {
        let store = site_store();
        let site = store.record("M19").unwrap();
        let layout = layout(&site, "M19", false, &store).unwrap();
        assert_eq!(layout.solid_names[0], "H1_Cu");
        assert_eq!(layout.solid_names.last().unwrap(), "M19_Bi_B");
        assert_eq!(layout.boxes[1].name, "M19_Bi");
    }

    #[test]
    fn detailed_supra_box_follows_its_stack() {
        let mut store = MemoryStore::new();
        store.insert_config(
            "HTS-dp.json",
            r#"{
                "tape": {"w": 0.25, "h": 6.0, "e": 0.25},
                "pancake": {"r0": 20.0, "ntapes": 20},
                "isolation": {"w": [10.0], "h": [0.5]},
                "dblpancakes": {"n": 1}
            }"#,
        );
        let supra = Record::Supra(Supra {
            name: "HTS".into(),
            r: [19.0, 31.0],
            z: [-10.0, 10.0],
            n: 1,
            structure: "HTS-dp.json".into(),
            detail: Detail::Pancake,
        });
        let layout = layout(&supra, "", false, &store).unwrap();
        assert_eq!(layout.solid_names, vec!["HTS_HTS-dp_dp0_p0", "HTS_HTS-dp_dp0_p1", "HTS_HTS-dp_dp0_i"]);
        assert_eq!(layout.boxes[0].bbox, AxiBox::new([20.0, 30.0], [-6.25, 6.25]));
    }

    #[test]
    fn descriptors_cannot_be_laid_out() {
        let store = MemoryStore::new();
        let shape = Record::Shape2D(fixtures::square());
        assert!(layout(&shape, "", false, &store).is_err());
    }
}
