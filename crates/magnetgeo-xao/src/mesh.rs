//! Characteristic mesh lengths per magnet and for the surrounding air.

use serde::Serialize;
use tracing::{debug, info};

use magnetgeo::{AxiBox, MagnetBox, AIR};

use crate::error::{Result, XaoError};

/// Ratio of a magnet's radial width to its default mesh length.
const DIVISOR: f64 = 30.0;

/// Air is meshed this many times coarser than the last magnet.
const AIR_FACTOR: f64 = 20.0;

/// Axial stretch of the region sizing a superconducting magnet.
const SUPRA_STRETCH: f64 = 1.1;

/// Points inside `bbox` are meshed with length `lc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshRegion {
    /// Magnet name.
    pub name: String,
    /// Region box.
    pub bbox: AxiBox,
    /// Characteristic length.
    pub lc: f64,
}

/// One mesh length per magnet box, followed by one for the air when present.
///
/// Without `user` lengths each magnet gets a thirtieth of its radial width
/// and the air twenty times the last magnet's length. User lengths are taken
/// as given once their count matches.
pub fn mesh_sizes(boxes: &[MagnetBox], with_air: bool, user: Option<&[f64]>) -> Result<Vec<f64>> {
    let expected = boxes.len() + usize::from(with_air);
    if let Some(user) = user {
        if user.len() != expected {
            return Err(XaoError::MeshSizeCount {
                expected,
                found: user.len(),
            });
        }
        return Ok(user.to_vec());
    }

    let mut sizes: Vec<f64> = boxes
        .iter()
        .map(|b| {
            let lc = (b.bbox.r[1] - b.bbox.r[0]) / DIVISOR;
            debug!(magnet = %b.name, lc, "Mesh length");
            lc
        })
        .collect();
    if with_air {
        if let Some(&last) = sizes.last() {
            sizes.push(last * AIR_FACTOR);
            debug!(magnet = AIR, lc = last * AIR_FACTOR, "Mesh length");
        }
    }
    info!(regions = sizes.len(), "Mesh lengths");
    Ok(sizes)
}

/// Sizing regions, one per magnet box.
///
/// Superconducting magnets are stretched axially so that their end points
/// fall inside the region.
pub fn regions(boxes: &[MagnetBox], sizes: &[f64]) -> Vec<MeshRegion> {
    boxes
        .iter()
        .zip(sizes)
        .map(|(b, &lc)| {
            let mut bbox = b.bbox;
            if b.kind == "Supra" {
                bbox.z[0] *= SUPRA_STRETCH;
                bbox.z[1] *= SUPRA_STRETCH;
            }
            MeshRegion {
                name: b.name.clone(),
                bbox,
                lc,
            }
        })
        .collect()
}
