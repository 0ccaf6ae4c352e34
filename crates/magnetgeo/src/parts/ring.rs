use magnetgeo_ir::Ring;

use super::Part;
use crate::bbox::AxiBox;
use crate::error::Result;
use crate::store::Resolver;

fn radial_extent(ring: &Ring) -> [f64; 2] {
    [ring.r[0], ring.r[3]]
}

impl Part for Ring {
    fn part_name(&self) -> &str {
        &self.name
    }

    fn bounding_box(&self, _store: &dyn Resolver) -> Result<AxiBox> {
        Ok(AxiBox::new(radial_extent(self), self.z))
    }

    /// A ring is a single solid, named `mname` inside an insert.
    fn names(&self, mname: &str, _is2d: bool, _store: &dyn Resolver) -> Result<Vec<String>> {
        let name = if mname.is_empty() { &self.name } else { mname };
        Ok(vec![name.to_string()])
    }

    fn mesh_length(&self, _store: &dyn Resolver) -> Result<f64> {
        let [r0, r1] = radial_extent(self);
        Ok((r1 - r0) / 10.0)
    }
}
