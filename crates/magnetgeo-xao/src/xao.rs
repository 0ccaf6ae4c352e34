//! XAO geometry documents: topology entities and named groups.
//!
//! Only the topology and the groups are read; the embedded BREP shape is
//! left to the mesher.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, XaoError};

/// Topological dimension of an entity or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Points.
    Vertex,
    /// Curves.
    Edge,
    /// Surfaces.
    Face,
    /// Volumes.
    Solid,
}

impl Dimension {
    /// Name used in XAO files.
    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Vertex => "vertex",
            Dimension::Edge => "edge",
            Dimension::Face => "face",
            Dimension::Solid => "solid",
        }
    }

    /// Topological dimension as a number (0 to 3).
    pub fn tag(self) -> i32 {
        match self {
            Dimension::Vertex => 0,
            Dimension::Edge => 1,
            Dimension::Face => 2,
            Dimension::Solid => 3,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "vertex" => Some(Dimension::Vertex),
            "edge" => Some(Dimension::Edge),
            "face" => Some(Dimension::Face),
            "solid" => Some(Dimension::Solid),
            _ => None,
        }
    }
}

/// Dimensions playing the solid and boundary roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    /// Entities tagged with solid names.
    pub solid: Dimension,
    /// Groups holding boundary conditions.
    pub boundary: Dimension,
}

impl Dimensions {
    /// Solids and faces in 3D, faces and edges for an axisymmetric model.
    pub fn for_mode(is2d: bool) -> Self {
        if is2d {
            Self {
                solid: Dimension::Face,
                boundary: Dimension::Edge,
            }
        } else {
            Self {
                solid: Dimension::Solid,
                boundary: Dimension::Face,
            }
        }
    }
}

/// A topology entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    /// Zero-based index within its dimension.
    pub index: usize,
    /// Label set by the CAD tool, if any.
    pub name: Option<String>,
}

/// A named set of entities of one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    /// Group name.
    pub name: String,
    /// Dimension of the members.
    pub dimension: Dimension,
    /// Zero-based member indices.
    pub elements: Vec<usize>,
}

/// Topology and groups of an XAO file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct XaoDocument {
    /// Geometry name.
    pub geometry: String,
    /// Vertices, in file order.
    pub vertices: Vec<Entity>,
    /// Edges, in file order.
    pub edges: Vec<Entity>,
    /// Faces, in file order.
    pub faces: Vec<Entity>,
    /// Solids, in file order.
    pub solids: Vec<Entity>,
    /// Groups, in file order.
    pub groups: Vec<Group>,
}

impl XaoDocument {
    /// Read and parse an XAO file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path).map_err(|source| XaoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&xml)
    }

    /// Parse XAO text.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut doc = XaoDocument::default();
        let mut group: Option<Group> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    if let Some(g) = doc.open(e, &mut group)? {
                        group = Some(g);
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    if let Some(g) = doc.open(e, &mut group)? {
                        doc.groups.push(g);
                    }
                }
                Ok(Event::End(ref e)) if e.name().as_ref() == b"group" => {
                    if let Some(g) = group.take() {
                        doc.groups.push(g);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(XaoError::Xml(e.to_string())),
            }
            buf.clear();
        }

        debug!(
            geometry = %doc.geometry,
            solids = doc.solids.len(),
            faces = doc.faces.len(),
            edges = doc.edges.len(),
            groups = doc.groups.len(),
            "Parsed XAO"
        );
        Ok(doc)
    }

    /// Handle an opening tag. Returns the group it opens, if any.
    fn open(&mut self, e: &BytesStart, group: &mut Option<Group>) -> Result<Option<Group>> {
        match e.name().as_ref() {
            b"geometry" => {
                self.geometry = get_attribute_opt(e, "name").unwrap_or_default();
            }
            b"vertex" => self.vertices.push(parse_entity(e)?),
            b"edge" => self.edges.push(parse_entity(e)?),
            b"face" => self.faces.push(parse_entity(e)?),
            b"solid" => self.solids.push(parse_entity(e)?),
            b"group" => {
                let name = get_attribute(e, "name")?;
                let value = get_attribute(e, "dimension")?;
                let dimension =
                    Dimension::parse(&value).ok_or_else(|| XaoError::InvalidAttribute {
                        attribute: "dimension",
                        element: element_name(e),
                        value,
                    })?;
                return Ok(Some(Group {
                    name,
                    dimension,
                    elements: Vec::new(),
                }));
            }
            b"element" => {
                if let Some(g) = group.as_mut() {
                    g.elements.push(parse_index(e)?);
                }
            }
            _ => {}
        }
        Ok(None)
    }

    /// Entities of one dimension.
    pub fn entities(&self, dimension: Dimension) -> &[Entity] {
        match dimension {
            Dimension::Vertex => &self.vertices,
            Dimension::Edge => &self.edges,
            Dimension::Face => &self.faces,
            Dimension::Solid => &self.solids,
        }
    }

    /// Groups of one dimension, in file order.
    pub fn groups_of(&self, dimension: Dimension) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(move |g| g.dimension == dimension)
    }
}

fn parse_entity(e: &BytesStart) -> Result<Entity> {
    Ok(Entity {
        index: parse_index(e)?,
        name: get_attribute_opt(e, "name").filter(|n| !n.is_empty()),
    })
}

fn parse_index(e: &BytesStart) -> Result<usize> {
    let value = get_attribute(e, "index")?;
    value.parse().map_err(|_| XaoError::InvalidAttribute {
        attribute: "index",
        element: element_name(e),
        value,
    })
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn get_attribute(e: &BytesStart, name: &'static str) -> Result<String> {
    get_attribute_opt(e, name).ok_or_else(|| XaoError::MissingAttribute {
        attribute: name,
        element: element_name(e),
    })
}

fn get_attribute_opt(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<XAO version="1.0" author="GEOM">
  <geometry name="HL-31">
    <shape format="BREP"><![CDATA[DBRep_DrawableShape ...]]></shape>
    <topology>
      <vertices count="1">
        <vertex index="0" name="" reference="1"/>
      </vertices>
      <edges count="0"/>
      <faces count="2">
        <face index="0" name="" reference="3"/>
        <face index="1" name="" reference="4"/>
      </faces>
      <solids count="2">
        <solid index="0" name="" reference="2"/>
        <solid index="1" name="from_Ring-H1H2" reference="5"/>
      </solids>
    </topology>
  </geometry>
  <groups count="2">
    <group name="HL-31_H1_rInt" dimension="face" count="2">
      <element index="0"/>
      <element index="1"/>
    </group>
    <group name="empty" dimension="edge" count="0"/>
  </groups>
  <fields count="0"/>
</XAO>"#;

    #[test]
    fn parses_topology_and_groups() {
        let doc = XaoDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.geometry, "HL-31");
        assert_eq!(doc.vertices.len(), 1);
        assert!(doc.edges.is_empty());
        assert_eq!(doc.entities(Dimension::Face).len(), 2);
        assert_eq!(doc.solids[0].name, None);
        assert_eq!(doc.solids[1].name.as_deref(), Some("from_Ring-H1H2"));
        assert_eq!(doc.groups.len(), 2);
        assert_eq!(doc.groups[0].name, "HL-31_H1_rInt");
        assert_eq!(doc.groups[0].elements, vec![0, 1]);
        assert_eq!(doc.groups_of(Dimension::Edge).count(), 1);
        assert!(doc.groups[1].elements.is_empty());
    }

    #[test]
    fn dimensions_per_mode() {
        assert_eq!(Dimensions::for_mode(false).solid, Dimension::Solid);
        assert_eq!(Dimensions::for_mode(true).boundary, Dimension::Edge);
        assert_eq!(Dimension::Face.tag(), 2);
    }

    #[test]
    fn rejects_bad_attributes() {
        let bad_dim = r#"<XAO><groups><group name="g" dimension="blob"/></groups></XAO>"#;
        assert!(matches!(
            XaoDocument::parse(bad_dim),
            Err(XaoError::InvalidAttribute { attribute: "dimension", .. })
        ));
        let no_index = r#"<XAO><solids><solid name="x"/></solids></XAO>"#;
        assert!(matches!(
            XaoDocument::parse(no_index),
            Err(XaoError::MissingAttribute { attribute: "index", .. })
        ));
        assert!(matches!(
            XaoDocument::parse("<XAO><solids></XAO>"),
            Err(XaoError::Xml(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = XaoDocument::load(dir.path().join("none.xao")).unwrap_err();
        assert!(matches!(err, XaoError::Io { .. }));
    }
}
