//! Records describing the geometry of magnet assemblies.
//!
//! This crate defines the typed, serializable description of resistive Bitter
//! stacks, helical inserts, superconducting inserts and multi-magnet sites.
//! It is shared by every tool that prepares or post-processes meshes for
//! these magnets.
//!
//! The records are purely declarative: composites reference their children by
//! record name and never embed them. Resolving names, deriving solid names and
//! bounding boxes is handled by the `magnetgeo` crate.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub mod error;
pub mod record;

pub use error::{IrError, Result};
pub use record::{Format, Record, REGISTERED_TYPES, TYPE_TAG};

/// A closed `[min, max]` interval, conventionally millimeters.
pub type Range = [f64; 2];

/// Where a groove shape is stacked along a helical cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShapePosition {
    /// Shapes sit above the cut.
    #[default]
    #[serde(rename = "ABOVE")]
    Above,
    /// Shapes sit below the cut.
    #[serde(rename = "BELOW", alias = "BELLOW")]
    Below,
    /// Shapes alternate above and below.
    #[serde(rename = "ALTERNATE")]
    Alternate,
}

/// Level of detail used when naming the solids of a superconducting insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Detail {
    /// The insert is a single solid.
    #[default]
    #[serde(rename = "None")]
    None,
    /// One solid per double pancake.
    #[serde(rename = "dblpancake")]
    DblPancake,
    /// One solid per pancake plus inter-pancake isolations.
    #[serde(rename = "pancake")]
    Pancake,
    /// One solid per tape (superconductor and co-wound insulation).
    #[serde(rename = "tape")]
    Tape,
}

/// A named 2D profile given as an ordered list of points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape2D {
    /// Profile name.
    pub name: String,
    /// Ordered `[x, y]` points.
    pub pts: Vec<[f64; 2]>,
}

/// A groove shape cut along a helix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Shape name.
    pub name: String,
    /// Name of the profile to cut.
    pub profile: String,
    /// Angular length of each shape in degrees.
    pub length: Vec<f64>,
    /// Angle between two consecutive shapes in degrees.
    pub angle: Vec<f64>,
    /// Turns that carry shapes.
    pub onturns: Vec<u32>,
    /// Stacking position relative to the cut.
    pub position: ShapePosition,
}

impl Default for Shape {
    fn default() -> Self {
        Self {
            name: String::new(),
            profile: String::new(),
            length: vec![0.0],
            angle: vec![0.0],
            onturns: vec![1],
            position: ShapePosition::Above,
        }
    }
}

/// Axisymmetric description of a helical cut: turns and pitch per section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAxi {
    /// Model name.
    pub name: String,
    /// Half height of the cut region.
    pub h: f64,
    /// Number of turns per axial section.
    pub turns: Vec<f64>,
    /// Pitch per axial section.
    pub pitch: Vec<f64>,
}

impl ModelAxi {
    /// Total number of turns over all sections.
    pub fn nturns(&self) -> f64 {
        self.turns.iter().sum()
    }

    /// Number of axial sections.
    pub fn nsections(&self) -> usize {
        self.turns.len()
    }
}

/// 3D build options of a helix.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Model3D {
    /// Model name.
    pub name: String,
    /// CAD identifier.
    pub cad: String,
    /// Whether groove shapes are added to the cut.
    pub with_shapes: bool,
    /// Whether micro-channels are added to the cut.
    pub with_channels: bool,
}

/// A helically cut conductor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Helix {
    /// Record name.
    pub name: String,
    /// Radial extent.
    pub r: Range,
    /// Axial extent.
    pub z: Range,
    /// Width of the helical cut.
    pub cutwidth: f64,
    /// Winding direction flag.
    pub odd: bool,
    /// Double cut (two glue layers).
    pub dble: bool,
    /// Helical cut description.
    pub axi: ModelAxi,
    /// 3D build options.
    pub m3d: Model3D,
    /// Groove shape.
    pub shape: Shape,
}

/// A structural ring closing two consecutive helices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    /// Record name.
    pub name: String,
    /// Radii: inner, inner slit edge, outer slit edge, outer.
    pub r: [f64; 4],
    /// Axial extent.
    pub z: Range,
    /// Number of cooling slits.
    pub n: u32,
    /// Angular width of a cooling slit in degrees.
    pub angle: f64,
    /// Ring sits on the bottom plate side.
    pub bpside: bool,
    /// Whether slits are filleted.
    pub fillets: bool,
}

/// Current lead feeding the inner helix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnerCurrentLead {
    /// Record name.
    pub name: String,
    /// Radial extent.
    pub r: Range,
    /// Height.
    pub h: f64,
    /// Hole parameters: height, shift from top, angle zero, angle, angular position, count.
    pub holes: Vec<f64>,
    /// Support parameters: radius, dz.
    pub support: Vec<f64>,
    /// Whether edges are filleted.
    pub fillet: bool,
}

/// Current lead feeding the outer helix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OuterCurrentLead {
    /// Record name.
    pub name: String,
    /// Radial extent.
    pub r: Range,
    /// Height.
    pub h: f64,
    /// Bar parameters: radius, width, height, count.
    pub bar: Vec<f64>,
    /// Support parameters: width, height, angle, count.
    pub support: Vec<f64>,
}

/// A family of cooling slits at a given radius of a Bitter plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoolingSlit {
    /// Record name.
    pub name: String,
    /// Radius of the slit centers.
    pub r: f64,
    /// Angular shift of the first slit in degrees.
    pub angle: f64,
    /// Number of slits.
    pub n: u32,
    /// Hydraulic diameter of one slit.
    pub dh: f64,
    /// Section of one slit.
    pub sh: f64,
    /// Slit profile.
    pub shape: Shape2D,
}

/// Tie rods holding a Bitter stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tierod {
    /// Record name.
    pub name: String,
    /// Radius of the rod centers.
    pub r: f64,
    /// Number of rods.
    pub n: u32,
    /// Rod profile.
    pub shape: Shape2D,
}

/// A stacked-plate resistive conductor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bitter {
    /// Record name.
    pub name: String,
    /// Radial extent.
    pub r: Range,
    /// Axial extent.
    pub z: Range,
    /// Winding direction flag.
    pub odd: bool,
    /// Helical cut description.
    pub axi: ModelAxi,
    /// Cooling slits, from inner to outer radius.
    pub coolingslits: Vec<CoolingSlit>,
    /// Tie rods.
    pub tierod: Tierod,
    /// Radius of the bore on the inner side.
    pub innerbore: f64,
    /// Radius of the bore on the outer side.
    pub outerbore: f64,
}

/// A superconducting insert described by an HTS stack configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supra {
    /// Record name.
    pub name: String,
    /// Radial extent.
    pub r: Range,
    /// Axial extent.
    pub z: Range,
    /// Number of double pancakes.
    pub n: u32,
    /// Name of the HTS stack configuration (JSON).
    #[serde(rename = "struct")]
    pub structure: String,
    /// Level of detail.
    pub detail: Detail,
}

/// A helical insert: helices separated by rings, closed by current leads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insert {
    /// Record name.
    pub name: String,
    /// Helix record names, from inner to outer.
    pub helices: Vec<String>,
    /// Ring record names, from inner to outer.
    pub rings: Vec<String>,
    /// Current lead record names.
    pub currentleads: Vec<String>,
    /// Angular position of each helix.
    pub hangles: Vec<f64>,
    /// Angular position of each ring.
    pub rangles: Vec<f64>,
    /// Radius of the inner bore.
    pub innerbore: f64,
    /// Radius of the outer bore.
    pub outerbore: f64,
}

/// A group of Bitter magnets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bitters {
    /// Record name.
    pub name: String,
    /// Child magnets.
    pub magnets: MagnetRefs,
    /// Radius of the inner bore.
    pub innerbore: f64,
    /// Radius of the outer bore.
    pub outerbore: f64,
}

/// A group of superconducting inserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supras {
    /// Record name.
    pub name: String,
    /// Child magnets.
    pub magnets: MagnetRefs,
    /// Radius of the inner bore.
    pub innerbore: f64,
    /// Radius of the outer bore.
    pub outerbore: f64,
}

/// A site: independent magnets sharing a bore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub struct MSite {
    /// Record name.
    pub name: String,
    /// Child magnets.
    pub magnets: MagnetRefs,
}

/// Value of a mapping entry in [`MagnetRefs::Map`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PartRefs {
    /// A single record name.
    One(String),
    /// Several record names.
    List(Vec<String>),
}

/// The child collection of a composite, by record name.
///
/// Order is significant: it fixes the order in which child solids are named.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MagnetRefs {
    /// A single child.
    One(String),
    /// An ordered list of children.
    List(Vec<String>),
    /// Named entries, each holding one or several children.
    Map(IndexMap<String, PartRefs>),
}

/// One child reference of a [`MagnetRefs`], in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagnetEntry<'a> {
    /// Mapping key the child was listed under, if any.
    pub key: Option<&'a str>,
    /// Record name of the child.
    pub name: &'a str,
}

impl MagnetRefs {
    /// Flatten the collection into its children, in resolution order.
    pub fn entries(&self) -> Vec<MagnetEntry<'_>> {
        match self {
            MagnetRefs::One(name) => vec![MagnetEntry { key: None, name }],
            MagnetRefs::List(names) => names
                .iter()
                .map(|name| MagnetEntry { key: None, name })
                .collect(),
            MagnetRefs::Map(map) => map
                .iter()
                .flat_map(|(key, part)| {
                    let names: Vec<&String> = match part {
                        PartRefs::One(name) => vec![name],
                        PartRefs::List(names) => names.iter().collect(),
                    };
                    names.into_iter().map(move |name| MagnetEntry {
                        key: Some(key.as_str()),
                        name,
                    })
                })
                .collect(),
        }
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether the collection has no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Interpret a loosely typed value as a child collection.
    ///
    /// Anything other than a string, a list of strings or a mapping of
    /// strings to a string or list of strings is rejected with
    /// [`IrError::UnsupportedShape`].
    pub fn from_value(value: &Value) -> Result<Self> {
        let unsupported = || IrError::UnsupportedShape {
            field: "magnets",
            found: value_kind(value).to_string(),
        };
        match value {
            Value::String(name) => Ok(MagnetRefs::One(name.clone())),
            Value::Array(items) => string_list(items)
                .map(MagnetRefs::List)
                .ok_or_else(unsupported),
            Value::Object(map) => {
                let mut refs = IndexMap::with_capacity(map.len());
                for (key, item) in map {
                    let part = match item {
                        Value::String(name) => PartRefs::One(name.clone()),
                        Value::Array(items) => {
                            PartRefs::List(string_list(items).ok_or_else(unsupported)?)
                        }
                        _ => return Err(unsupported()),
                    };
                    refs.insert(key.clone(), part);
                }
                Ok(MagnetRefs::Map(refs))
            }
            _ => Err(unsupported()),
        }
    }
}

impl<'de> Deserialize<'de> for MagnetRefs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        MagnetRefs::from_value(&value).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for PartRefs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(name) => Ok(PartRefs::One(name)),
            Value::Array(items) => string_list(&items)
                .map(PartRefs::List)
                .ok_or_else(|| serde::de::Error::custom("expected a list of record names")),
            other => Err(serde::de::Error::custom(format!(
                "expected a record name or a list of record names, found {}",
                value_kind(&other)
            ))),
        }
    }
}

fn string_list(items: &[Value]) -> Option<Vec<String>> {
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
