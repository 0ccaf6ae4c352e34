//! Axisymmetric bounding boxes and the cheap collision proxy used to pick
//! mesh-size regions.

use magnetgeo_ir::Range;
use serde::{Deserialize, Serialize};

/// Bounding box in the `(r, z)` half plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxiBox {
    /// Radial extent.
    pub r: Range,
    /// Axial extent.
    pub z: Range,
}

impl AxiBox {
    /// Create a box from its radial and axial extents.
    pub fn new(r: Range, z: Range) -> Self {
        Self { r, z }
    }

    /// Grow this box to cover `other`.
    pub fn include(&mut self, other: &AxiBox) {
        self.r[0] = self.r[0].min(other.r[0]);
        self.z[0] = self.z[0].min(other.z[0]);
        self.r[1] = self.r[1].max(other.r[1]);
        self.z[1] = self.z[1].max(other.z[1]);
    }

    /// Union of several boxes, seeded by the first one.
    ///
    /// Returns `None` when there is nothing to unite.
    pub fn union_all<I: IntoIterator<Item = AxiBox>>(boxes: I) -> Option<AxiBox> {
        let mut iter = boxes.into_iter();
        let mut acc = iter.next()?;
        for b in iter {
            acc.include(&b);
        }
        Some(acc)
    }

    /// Approximate test of whether the rectangle `r × z` touches this box.
    ///
    /// Along each axis the two ranges are judged to collide when the distance
    /// between their lower bounds is below `|hi - lo + r0 + r1| / 2`. This is
    /// deliberately lenient and differs from [`AxiBox::overlaps`]: a range
    /// lying entirely above this one is usually reported as colliding.
    ///
    /// The threshold grows with `r0 + r1`, so the result depends on absolute
    /// position: shifting both the box and the query along an axis can turn a
    /// miss into a collision.
    pub fn collides(&self, r: Range, z: Range) -> bool {
        let is_r = (self.r[0] - r[0]).abs() < (self.r[1] - self.r[0] + r[0] + r[1]).abs() / 2.0;
        let is_z = (self.z[0] - z[0]).abs() < (self.z[1] - self.z[0] + z[0] + z[1]).abs() / 2.0;
        is_r && is_z
    }

    /// Exact closed-interval overlap test (touching counts as overlap).
    pub fn overlaps(&self, r: Range, z: Range) -> bool {
        self.r[0] <= r[1] && self.r[1] >= r[0] && self.z[0] <= z[1] && self.z[1] >= z[0]
    }
}
