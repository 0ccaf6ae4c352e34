#![warn(missing_docs)]

//! Geometry derivations for magnet assemblies.
//!
//! Records from [`magnetgeo_ir`] are turned into the metadata a mesh
//! generator needs:
//!
//! - [`hts`]: the tape / pancake / double pancake stack of an HTS insert
//! - [`parts`]: bounding boxes, solid names and mesh lengths per part kind
//! - [`store`]: resolving the records composites refer to by name
//! - [`layout`]: the whole set of names, boxes and lookup tables in one pass
//!
//! ```no_run
//! use magnetgeo::{layout, FileStore, Resolver};
//!
//! let store = FileStore::new("data");
//! let site = store.record("M19061901")?;
//! let layout = layout(&site, "", false, &store)?;
//! println!("{} solids", layout.solid_names.len());
//! # Ok::<(), magnetgeo::GeoError>(())
//! ```

pub mod bbox;
pub mod error;
pub mod hts;
pub mod layout;
pub mod parts;
pub mod store;

pub use bbox::AxiBox;
pub use error::{GeoError, Result};
pub use hts::{DblPancake, HtsInsert, HtsMeshSizes, Isolation, Pancake, Tape};
pub use layout::{layout, Layout, MagnetBox, AIR};
pub use parts::{
    BitterExt, BittersExt, HelixExt, HydraulicParams, InsertExt, Insulator, Part, SupraExt,
};
pub use store::{resolve_child, CachedResolver, FileStore, MemoryStore, Resolver};

pub use magnetgeo_ir as ir;
