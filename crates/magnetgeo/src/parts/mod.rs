//! Capabilities shared by every placeable magnet part.
//!
//! Each record kind that stands for a physical part implements [`Part`].
//! [`Record`] dispatches to them with an exhaustive match, so adding a record
//! kind forces a decision on whether it is a part. Composites only hold child
//! names and resolve them through the [`Resolver`] on every call.

use magnetgeo_ir::{Range, Record};

use crate::bbox::AxiBox;
use crate::error::{GeoError, Result};
use crate::store::{resolve_child, Resolver};

mod bitter;
mod collection;
mod helix;
mod insert;
mod lead;
mod ring;
mod supra;

pub use bitter::{BitterExt, HydraulicParams};
pub use collection::BittersExt;
pub use helix::{HelixExt, Insulator};
pub use insert::InsertExt;
pub use supra::SupraExt;

/// Derivations every magnet part supports.
pub trait Part {
    /// Record name.
    fn part_name(&self) -> &str;

    /// Enclosing `(r, z)` box.
    fn bounding_box(&self, store: &dyn Resolver) -> Result<AxiBox>;

    /// Approximate test of whether the rectangle `r × z` touches the part.
    ///
    /// See [`AxiBox::collides`] for the (lenient) criterion.
    fn intersect(&self, r: Range, z: Range, store: &dyn Resolver) -> Result<bool> {
        Ok(self.bounding_box(store)?.collides(r, z))
    }

    /// Solid names, in the order the backend creates the solids.
    ///
    /// `mname` prefixes the names; `is2d` selects the axisymmetric model.
    fn names(&self, mname: &str, is2d: bool, store: &dyn Resolver) -> Result<Vec<String>>;

    /// Names of the insulating solids.
    fn isolants(&self, _mname: &str, _store: &dyn Resolver) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Characteristic mesh length.
    fn mesh_length(&self, store: &dyn Resolver) -> Result<f64>;
}

fn as_part(record: &Record) -> Result<&dyn Part> {
    match record {
        Record::Helix(x) => Ok(x),
        Record::Ring(x) => Ok(x),
        Record::InnerCurrentLead(x) => Ok(x),
        Record::OuterCurrentLead(x) => Ok(x),
        Record::Insert(x) => Ok(x),
        Record::Bitter(x) => Ok(x),
        Record::Supra(x) => Ok(x),
        Record::Bitters(x) => Ok(x),
        Record::Supras(x) => Ok(x),
        Record::MSite(x) => Ok(x),
        Record::Shape(_)
        | Record::Shape2D(_)
        | Record::ModelAxi(_)
        | Record::Model3D(_)
        | Record::Tierod(_)
        | Record::CoolingSlit(_) => Err(GeoError::NotAPart {
            name: record.name().to_string(),
            kind: record.kind(),
        }),
    }
}

impl Part for Record {
    fn part_name(&self) -> &str {
        self.name()
    }

    fn bounding_box(&self, store: &dyn Resolver) -> Result<AxiBox> {
        as_part(self)?.bounding_box(store)
    }

    fn intersect(&self, r: Range, z: Range, store: &dyn Resolver) -> Result<bool> {
        as_part(self)?.intersect(r, z, store)
    }

    fn names(&self, mname: &str, is2d: bool, store: &dyn Resolver) -> Result<Vec<String>> {
        as_part(self)?.names(mname, is2d, store)
    }

    fn isolants(&self, mname: &str, store: &dyn Resolver) -> Result<Vec<String>> {
        as_part(self)?.isolants(mname, store)
    }

    fn mesh_length(&self, store: &dyn Resolver) -> Result<f64> {
        as_part(self)?.mesh_length(store)
    }
}

/// Resolve `name` as a child of `parent` and check that it is a part.
pub(crate) fn resolve_part(store: &dyn Resolver, parent: &str, name: &str) -> Result<Record> {
    let record = resolve_child(store, parent, name)?;
    as_part(&record)?;
    Ok(record)
}

pub(crate) fn unexpected(name: &str, expected: &'static str, found: &Record) -> GeoError {
    GeoError::UnexpectedKind {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}

/// Name of a part placed under `mname`: `{mname}_{name}`, or `name` alone.
pub(crate) fn scoped(mname: &str, name: &str) -> String {
    if mname.is_empty() {
        name.to_string()
    } else {
        format!("{mname}_{name}")
    }
}

/// Union of the boxes of named children, failing when there is none.
pub(crate) fn union_of<'a>(
    parent: &str,
    children: impl IntoIterator<Item = &'a str>,
    store: &dyn Resolver,
) -> Result<AxiBox> {
    let boxes = children
        .into_iter()
        .map(|name| resolve_part(store, parent, name)?.bounding_box(store))
        .collect::<Result<Vec<_>>>()?;
    AxiBox::union_all(boxes).ok_or_else(|| GeoError::EmptyComposite(parent.to_string()))
}

/// Smallest mesh length over named children.
pub(crate) fn min_mesh_length<'a>(
    parent: &str,
    children: impl IntoIterator<Item = &'a str>,
    store: &dyn Resolver,
) -> Result<f64> {
    let mut lc: Option<f64> = None;
    for name in children {
        let child = resolve_part(store, parent, name)?.mesh_length(store)?;
        lc = Some(lc.map_or(child, |lc| lc.min(child)));
    }
    lc.ok_or_else(|| GeoError::EmptyComposite(parent.to_string()))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn descriptors_are_not_parts() {
        let store = MemoryStore::new();
        let shape = Record::Shape2D(fixtures::square());
        match shape.names("", false, &store) {
            Err(GeoError::NotAPart { name, kind }) => {
                assert_eq!(name, "square");
                assert_eq!(kind, "Shape2D");
            }
            other => panic!("expected NotAPart, got {other:?}"),
        }
    }

    #[test]
    fn record_dispatch_reaches_the_part() {
        let store = fixtures::insert_store();
        let h1 = store.record("H1").unwrap();
        assert_eq!(h1.part_name(), "H1");
        assert_eq!(
            h1.bounding_box(&store).unwrap(),
            AxiBox::new([20.0, 30.0], [-200.0, 100.0])
        );
        assert!(h1.intersect([22.0, 24.0], [-200.0, -190.0], &store).unwrap());
        // Lower bounds 200 apart exceed the lenient z threshold of 155,
        // though the ranges overlap.
        assert!(!h1.intersect([22.0, 24.0], [0.0, 10.0], &store).unwrap());
    }

    #[test]
    fn union_of_nothing_is_an_error() {
        let store = MemoryStore::new();
        assert!(matches!(
            union_of("empty", Vec::new(), &store),
            Err(GeoError::EmptyComposite(n)) if n == "empty"
        ));
    }

    #[test]
    fn scoped_names() {
        assert_eq!(scoped("", "B1"), "B1");
        assert_eq!(scoped("M9", "B1"), "M9_B1");
    }
}
