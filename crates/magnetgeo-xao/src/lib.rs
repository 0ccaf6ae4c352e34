#![warn(missing_docs)]

//! Physical groups for meshing magnet geometries.
//!
//! The CAD backend exports each magnet as an XAO file: a BREP shape, its
//! topology and named face groups. This crate matches that export against a
//! [`magnetgeo::Layout`] and produces the named entity sets a solver expects
//! as material regions and boundary conditions.
//!
//! ```no_run
//! use magnetgeo::{layout, FileStore, Resolver};
//! use magnetgeo_xao::{reconcile, GroupPolicy, XaoDocument};
//!
//! let store = FileStore::new(".");
//! let insert = store.record("HL-31")?;
//! let mut layout = layout(&insert, "", false, &store)?;
//! let doc = XaoDocument::load("HL-31_withAir.xao")?;
//! if doc.geometry.contains("Air") {
//!     layout.push_air();
//! }
//! let groups = reconcile(&doc, &layout, false, &GroupPolicy::default())?;
//! println!("{} solid groups", groups.solids.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod groups;
pub mod mesh;
pub mod xao;

use serde::Serialize;
use tracing::info;

use magnetgeo::Layout;

pub use error::{Result, XaoError};
pub use groups::{channel_fragments, reconcile_boundaries, reconcile_solids, GroupPolicy, Groups, Rules};
pub use mesh::{mesh_sizes, regions, MeshRegion};
pub use xao::{Dimension, Dimensions, Entity, Group, XaoDocument};

/// Solid and boundary groups of one geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicalGroups {
    /// Dimensions the groups were taken from.
    pub dimensions: Dimensions,
    /// Material regions.
    pub solids: Groups,
    /// Boundary conditions.
    pub boundaries: Groups,
}

impl PhysicalGroups {
    /// Pretty JSON rendering.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Build the physical groups of `doc` for `layout`.
///
/// Nothing is returned unless every solid of the geometry is named.
pub fn reconcile(
    doc: &XaoDocument,
    layout: &Layout,
    is2d: bool,
    policy: &GroupPolicy,
) -> Result<PhysicalGroups> {
    if policy.hide_isolants && layout.has_air() {
        return Err(XaoError::AirWithHiddenIsolants);
    }
    let dimensions = Dimensions::for_mode(is2d);
    let rules = Rules::new()?;
    let solids = reconcile_solids(doc, layout, dimensions, policy, &rules)?;
    let boundaries = reconcile_boundaries(doc, layout, dimensions, policy, &rules);
    info!(
        geometry = %doc.geometry,
        solids = solids.len(),
        boundaries = boundaries.len(),
        "Physical groups"
    );
    Ok(PhysicalGroups {
        dimensions,
        solids,
        boundaries,
    })
}
