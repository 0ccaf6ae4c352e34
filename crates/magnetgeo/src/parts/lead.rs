//! Current leads. They only exist in the 3D model.

use magnetgeo_ir::{InnerCurrentLead, OuterCurrentLead, Range};

use super::Part;
use crate::bbox::AxiBox;
use crate::error::Result;
use crate::store::Resolver;

fn lead_names(name: &str, mname: &str, is2d: bool) -> Vec<String> {
    if is2d {
        return Vec::new();
    }
    let name = if mname.is_empty() { name } else { mname };
    vec![name.to_string()]
}

fn lead_box(r: Range, h: f64) -> AxiBox {
    AxiBox::new(r, [0.0, h])
}

impl Part for InnerCurrentLead {
    fn part_name(&self) -> &str {
        &self.name
    }

    fn bounding_box(&self, _store: &dyn Resolver) -> Result<AxiBox> {
        Ok(lead_box(self.r, self.h))
    }

    fn names(&self, mname: &str, is2d: bool, _store: &dyn Resolver) -> Result<Vec<String>> {
        Ok(lead_names(&self.name, mname, is2d))
    }

    fn mesh_length(&self, _store: &dyn Resolver) -> Result<f64> {
        Ok((self.r[1] - self.r[0]) / 10.0)
    }
}

impl Part for OuterCurrentLead {
    fn part_name(&self) -> &str {
        &self.name
    }

    fn bounding_box(&self, _store: &dyn Resolver) -> Result<AxiBox> {
        Ok(lead_box(self.r, self.h))
    }

    fn names(&self, mname: &str, is2d: bool, _store: &dyn Resolver) -> Result<Vec<String>> {
        Ok(lead_names(&self.name, mname, is2d))
    }

    fn mesh_length(&self, _store: &dyn Resolver) -> Result<f64> {
        Ok((self.r[1] - self.r[0]) / 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::fixtures;
    use crate::store::MemoryStore;

    #[test]
    fn leads_vanish_in_2d() {
        let store = MemoryStore::new();
        let inner = fixtures::inner_lead();
        assert_eq!(inner.names("iL1", false, &store).unwrap(), vec!["iL1"]);
        assert!(inner.names("iL1", true, &store).unwrap().is_empty());
        let outer = fixtures::outer_lead();
        assert_eq!(outer.names("", false, &store).unwrap(), vec!["Outer"]);
    }

    #[test]
    fn lead_box_starts_at_zero() {
        let store = MemoryStore::new();
        assert_eq!(
            fixtures::inner_lead().bounding_box(&store).unwrap(),
            AxiBox::new([19.3, 24.2], [0.0, 480.0])
        );
    }
}
