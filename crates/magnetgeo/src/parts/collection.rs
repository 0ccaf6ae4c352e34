//! Composites over named magnets: `Bitters`, `Supras` and `MSite`.

use indexmap::IndexMap;
use magnetgeo_ir::{Bitter, Bitters, MSite, MagnetRefs, Record, Supras};
use tracing::debug;

use super::{min_mesh_length, resolve_part, scoped, union_of, unexpected, BitterExt, Part};
use crate::bbox::AxiBox;
use crate::error::Result;
use crate::store::{resolve_child, Resolver};

/// Children of a group with the prefix their solids are named under.
///
/// A single child or a mapping names its solids after the group, a list
/// after each child.
fn group_prefixes<'a>(group: &'a str, magnets: &'a MagnetRefs) -> Vec<(&'a str, &'a str)> {
    match magnets {
        MagnetRefs::One(name) => vec![(name.as_str(), group)],
        MagnetRefs::List(names) => names.iter().map(|n| (n.as_str(), n.as_str())).collect(),
        MagnetRefs::Map(_) => magnets.entries().iter().map(|e| (e.name, group)).collect(),
    }
}

fn group_names(
    group: &str,
    magnets: &MagnetRefs,
    is2d: bool,
    store: &dyn Resolver,
) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for (child, prefix) in group_prefixes(group, magnets) {
        names.extend(resolve_part(store, group, child)?.names(prefix, is2d, store)?);
    }
    debug!(group, n = names.len(), "Group names");
    Ok(names)
}

fn group_isolants(group: &str, magnets: &MagnetRefs, store: &dyn Resolver) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for (child, prefix) in group_prefixes(group, magnets) {
        names.extend(resolve_part(store, group, child)?.isolants(prefix, store)?);
    }
    Ok(names)
}

fn children(magnets: &MagnetRefs) -> impl Iterator<Item = &str> {
    magnets.entries().into_iter().map(|e| e.name)
}

/// Bitter group derivations.
pub trait BittersExt {
    /// Channel names per Bitter, keyed by child.
    fn channels(&self, store: &dyn Resolver) -> Result<IndexMap<String, Vec<String>>>;
}

impl BittersExt for Bitters {
    fn channels(&self, store: &dyn Resolver) -> Result<IndexMap<String, Vec<String>>> {
        let load = |name: &str| -> Result<Bitter> {
            match resolve_child(store, &self.name, name)? {
                Record::Bitter(bitter) => Ok(bitter),
                other => Err(unexpected(name, "Bitter", &other)),
            }
        };
        let mut channels = IndexMap::new();
        match &self.magnets {
            MagnetRefs::One(name) => {
                channels.insert(self.name.clone(), load(name.as_str())?.channels(&self.name));
            }
            MagnetRefs::List(names) => {
                for name in names {
                    channels.insert(name.clone(), load(name.as_str())?.channels(name));
                }
            }
            MagnetRefs::Map(_) => {
                for entry in self.magnets.entries() {
                    let key = entry.key.unwrap_or(&self.name);
                    channels.insert(entry.name.to_string(), load(entry.name)?.channels(key));
                }
            }
        }
        Ok(channels)
    }
}

impl Part for Bitters {
    fn part_name(&self) -> &str {
        &self.name
    }

    fn bounding_box(&self, store: &dyn Resolver) -> Result<AxiBox> {
        union_of(&self.name, children(&self.magnets), store)
    }

    fn names(&self, _mname: &str, is2d: bool, store: &dyn Resolver) -> Result<Vec<String>> {
        group_names(&self.name, &self.magnets, is2d, store)
    }

    fn isolants(&self, _mname: &str, store: &dyn Resolver) -> Result<Vec<String>> {
        group_isolants(&self.name, &self.magnets, store)
    }

    fn mesh_length(&self, store: &dyn Resolver) -> Result<f64> {
        min_mesh_length(&self.name, children(&self.magnets), store)
    }
}

impl Part for Supras {
    fn part_name(&self) -> &str {
        &self.name
    }

    fn bounding_box(&self, store: &dyn Resolver) -> Result<AxiBox> {
        union_of(&self.name, children(&self.magnets), store)
    }

    fn names(&self, _mname: &str, is2d: bool, store: &dyn Resolver) -> Result<Vec<String>> {
        group_names(&self.name, &self.magnets, is2d, store)
    }

    fn isolants(&self, _mname: &str, store: &dyn Resolver) -> Result<Vec<String>> {
        group_isolants(&self.name, &self.magnets, store)
    }

    fn mesh_length(&self, store: &dyn Resolver) -> Result<f64> {
        min_mesh_length(&self.name, children(&self.magnets), store)
    }
}

impl Part for MSite {
    fn part_name(&self) -> &str {
        &self.name
    }

    fn bounding_box(&self, store: &dyn Resolver) -> Result<AxiBox> {
        union_of(&self.name, children(&self.magnets), store)
    }

    /// Every magnet names its solids after itself, scoped by `mname`.
    fn names(&self, mname: &str, is2d: bool, store: &dyn Resolver) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for child in children(&self.magnets) {
            let part = resolve_part(store, &self.name, child)?;
            names.extend(part.names(&scoped(mname, child), is2d, store)?);
        }
        debug!(site = %self.name, n = names.len(), "Site names");
        Ok(names)
    }

    fn isolants(&self, mname: &str, store: &dyn Resolver) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for child in children(&self.magnets) {
            let part = resolve_part(store, &self.name, child)?;
            names.extend(part.isolants(&scoped(mname, child), store)?);
        }
        Ok(names)
    }

    fn mesh_length(&self, store: &dyn Resolver) -> Result<f64> {
        min_mesh_length(&self.name, children(&self.magnets), store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeoError;
    use crate::parts::fixtures;
    use magnetgeo_ir::PartRefs;

    fn bitters_store(magnets: MagnetRefs) -> crate::store::MemoryStore {
        let mut store = fixtures::insert_store();
        store.insert(Record::Bitter(fixtures::bitter("Bi", [150.0, 250.0], [-300.0, 300.0])));
        store.insert(Record::Bitter(fixtures::bitter("Be", [260.0, 400.0], [-350.0, 310.0])));
        store.insert(Record::Bitters(Bitters {
            name: "M9Bitters".into(),
            magnets,
            innerbore: 149.0,
            outerbore: 401.0,
        }));
        store
    }

    fn group(store: &crate::store::MemoryStore) -> Bitters {
        match store.record("M9Bitters").unwrap() {
            Record::Bitters(b) => b,
            other => panic!("expected Bitters, got {other:?}"),
        }
    }

    #[test]
    fn list_names_follow_each_child() {
        let store = bitters_store(MagnetRefs::List(vec!["Bi".into(), "Be".into()]));
        let g = group(&store);
        assert_eq!(g.names("", false, &store).unwrap(), vec!["Bi_B", "Be_B"]);
        assert_eq!(
            g.bounding_box(&store).unwrap(),
            AxiBox::new([150.0, 400.0], [-350.0, 310.0])
        );
        let channels = g.channels(&store).unwrap();
        assert_eq!(channels.keys().collect::<Vec<_>>(), vec!["Bi", "Be"]);
        assert_eq!(channels["Be"][0], "Be_Slit0");
    }

    #[test]
    fn single_and_mapped_children_follow_the_group() {
        let store = bitters_store(MagnetRefs::One("Bi".into()));
        let g = group(&store);
        assert_eq!(g.names("", false, &store).unwrap(), vec!["M9Bitters_B"]);
        assert_eq!(g.channels(&store).unwrap()["M9Bitters"].len(), 4);

        let store = bitters_store(MagnetRefs::Map(IndexMap::from([(
            "outer".to_string(),
            PartRefs::List(vec!["Be".into(), "Bi".into()]),
        )])));
        let g = group(&store);
        assert_eq!(
            g.names("", false, &store).unwrap(),
            vec!["M9Bitters_B", "M9Bitters_B"]
        );
        let channels = g.channels(&store).unwrap();
        assert_eq!(channels.keys().collect::<Vec<_>>(), vec!["Be", "Bi"]);
        assert_eq!(channels["Bi"][1], "outer_Slit1");
    }

    #[test]
    fn empty_group_has_no_box() {
        let store = bitters_store(MagnetRefs::List(vec![]));
        assert!(matches!(
            group(&store).bounding_box(&store),
            Err(GeoError::EmptyComposite(_))
        ));
    }

    #[test]
    fn site_concatenates_magnets_in_order() {
        let mut store = bitters_store(MagnetRefs::List(vec!["Bi".into(), "Be".into()]));
        let site = MSite {
            name: "M19".into(),
            magnets: MagnetRefs::Map(IndexMap::from([
                ("Insert".to_string(), PartRefs::One("HL".into())),
                ("Bitters".to_string(), PartRefs::List(vec!["Bi".into(), "Be".into()])),
            ])),
        };
        store.insert(Record::MSite(site.clone()));
        let names = site.names("", false, &store).unwrap();
        assert_eq!(names.len(), 13 + 2);
        assert_eq!(names[0], "H1_Cu");
        assert_eq!(&names[13..], ["Bi_B", "Be_B"]);
        assert_eq!(site.isolants("", &store).unwrap().len(), 6);

        let bb = site.bounding_box(&store).unwrap();
        assert_eq!(bb, AxiBox::new([20.0, 400.0], [-350.0, 310.0]));
        // The first slit gap of a Bitter (0.3) is the finest feature.
        approx::assert_relative_eq!(site.mesh_length(&store).unwrap(), 0.06, epsilon = 1e-9);
    }

    #[test]
    fn site_with_unknown_child_fails() {
        let store = fixtures::insert_store();
        let site = MSite {
            name: "M19".into(),
            magnets: MagnetRefs::List(vec!["HL".into(), "ghost".into()]),
        };
        assert!(matches!(
            site.names("", false, &store),
            Err(GeoError::MissingReference { name, .. }) if name == "ghost"
        ));
    }
}
