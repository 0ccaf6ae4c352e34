//! The closed set of record types and their text encodings.
//!
//! Every record is stored as one document carrying its concrete type under
//! the reserved [`TYPE_TAG`] field. Two encodings are supported: TOML, the
//! human-edited form, and JSON, the exchange form. Both go through the same
//! decoder so that tag and child-collection checks are identical.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IrError, Result};
use crate::{
    Bitter, Bitters, CoolingSlit, Helix, InnerCurrentLead, Insert, MSite, MagnetRefs, Model3D,
    ModelAxi, OuterCurrentLead, Ring, Shape, Shape2D, Supra, Supras, Tierod,
};

/// Reserved field holding the concrete record type.
pub const TYPE_TAG: &str = "__classname__";

/// Type names accepted by the decoder.
pub const REGISTERED_TYPES: &[&str] = &[
    "Shape",
    "Shape2D",
    "ModelAxi",
    "Model3D",
    "Helix",
    "Ring",
    "InnerCurrentLead",
    "OuterCurrentLead",
    "Insert",
    "Bitter",
    "Supra",
    "Bitters",
    "Supras",
    "MSite",
    "Tierod",
    "CoolingSlit",
];

/// Any persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__classname__")]
#[allow(clippy::large_enum_variant)]
pub enum Record {
    /// Groove shape.
    Shape(Shape),
    /// 2D profile.
    Shape2D(Shape2D),
    /// Helical cut description.
    ModelAxi(ModelAxi),
    /// Helix 3D options.
    Model3D(Model3D),
    /// Helix.
    Helix(Helix),
    /// Ring.
    Ring(Ring),
    /// Inner current lead.
    InnerCurrentLead(InnerCurrentLead),
    /// Outer current lead.
    OuterCurrentLead(OuterCurrentLead),
    /// Helical insert.
    Insert(Insert),
    /// Bitter magnet.
    Bitter(Bitter),
    /// Superconducting insert.
    Supra(Supra),
    /// Group of Bitter magnets.
    Bitters(Bitters),
    /// Group of superconducting inserts.
    Supras(Supras),
    /// Magnet site.
    MSite(MSite),
    /// Tie rods.
    Tierod(Tierod),
    /// Cooling slits.
    CoolingSlit(CoolingSlit),
}

/// Text encoding of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Structured text, one record per `{name}.toml`.
    #[default]
    Toml,
    /// Exchange form, one record per `{name}.json`.
    Json,
}

impl Format {
    /// File extension used for records in this format.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }
}

impl Record {
    /// Concrete type name, as written under [`TYPE_TAG`].
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Shape(_) => "Shape",
            Record::Shape2D(_) => "Shape2D",
            Record::ModelAxi(_) => "ModelAxi",
            Record::Model3D(_) => "Model3D",
            Record::Helix(_) => "Helix",
            Record::Ring(_) => "Ring",
            Record::InnerCurrentLead(_) => "InnerCurrentLead",
            Record::OuterCurrentLead(_) => "OuterCurrentLead",
            Record::Insert(_) => "Insert",
            Record::Bitter(_) => "Bitter",
            Record::Supra(_) => "Supra",
            Record::Bitters(_) => "Bitters",
            Record::Supras(_) => "Supras",
            Record::MSite(_) => "MSite",
            Record::Tierod(_) => "Tierod",
            Record::CoolingSlit(_) => "CoolingSlit",
        }
    }

    /// Record name, which is also its storage key.
    pub fn name(&self) -> &str {
        match self {
            Record::Shape(x) => &x.name,
            Record::Shape2D(x) => &x.name,
            Record::ModelAxi(x) => &x.name,
            Record::Model3D(x) => &x.name,
            Record::Helix(x) => &x.name,
            Record::Ring(x) => &x.name,
            Record::InnerCurrentLead(x) => &x.name,
            Record::OuterCurrentLead(x) => &x.name,
            Record::Insert(x) => &x.name,
            Record::Bitter(x) => &x.name,
            Record::Supra(x) => &x.name,
            Record::Bitters(x) => &x.name,
            Record::Supras(x) => &x.name,
            Record::MSite(x) => &x.name,
            Record::Tierod(x) => &x.name,
            Record::CoolingSlit(x) => &x.name,
        }
    }

    /// Serialize to a pretty JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Deserialize from a TOML string.
    pub fn from_toml(text: &str) -> Result<Self> {
        Self::from_value(toml::from_str(text)?)
    }

    /// Encode in the given format.
    pub fn encode(&self, format: Format) -> Result<String> {
        match format {
            Format::Toml => self.to_toml(),
            Format::Json => self.to_json(),
        }
    }

    /// Decode from the given format.
    pub fn decode(text: &str, format: Format) -> Result<Self> {
        match format {
            Format::Toml => Self::from_toml(text),
            Format::Json => Self::from_json(text),
        }
    }

    /// Build a record from an already parsed document.
    ///
    /// The tag is checked against [`REGISTERED_TYPES`] before any field is
    /// looked at, and a `magnets` collection is checked for its shape.
    pub fn from_value(value: Value) -> Result<Self> {
        let tag = value
            .get(TYPE_TAG)
            .and_then(Value::as_str)
            .ok_or(IrError::MissingTag)?;
        if !REGISTERED_TYPES.contains(&tag) {
            return Err(IrError::UnknownType(tag.to_string()));
        }
        if let Some(magnets) = value.get("magnets") {
            MagnetRefs::from_value(magnets)?;
        }
        Ok(serde_json::from_value(value)?)
    }
}
