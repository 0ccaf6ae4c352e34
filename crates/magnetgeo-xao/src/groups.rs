//! Physical groups: tagging backend entities with the layout's names.
//!
//! Solids are matched positionally against [`Layout::solid_names`], with any
//! label the backend left on an entity taking precedence. Boundary groups
//! come from the XAO group tree and are renamed, filtered and merged by a
//! fixed set of rules over the naming conventions of the parts.
//!
//! Indices are stored one-based, as mesh entity tags.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use magnetgeo::Layout;

use crate::error::{Result, XaoError};
use crate::xao::{Dimensions, XaoDocument};

/// Physical group name to entity tags, in first-seen order.
pub type Groups = IndexMap<String, Vec<usize>>;

/// How insulating parts, leads and cooling channels are grouped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupPolicy {
    /// Drop insulator solids and their interface faces.
    pub hide_isolants: bool,
    /// Merge numbered insulators into one group per part.
    pub group_isolants: bool,
    /// Merge numbered lead solids into `iL` / `oL`.
    pub group_leads: bool,
    /// Merge the faces wetted by each cooling channel into `Channel{i}`.
    pub group_channels: bool,
}

impl GroupPolicy {
    /// Build from `--hide` and `--group` style item lists.
    ///
    /// Recognized items are `Isolants` for hiding, and `Isolants`, `Leads`
    /// and `CoolingChannels` for grouping. Unknown items are ignored.
    pub fn from_options<S: AsRef<str>>(hide: &[S], group: &[S]) -> Self {
        let has = |items: &[S], item: &str| items.iter().any(|s| s.as_ref() == item);
        Self {
            hide_isolants: has(hide, "Isolants"),
            group_isolants: has(group, "Isolants"),
            group_leads: has(group, "Leads"),
            group_channels: has(group, "CoolingChannels"),
        }
    }
}

/// Compiled name patterns.
#[derive(Debug, Clone)]
pub struct Rules {
    ring: Regex,
    start_face: Regex,
    end_face: Regex,
    lead: Regex,
    trailing_digits: Regex,
}

impl Rules {
    /// Compile the patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            ring: Regex::new(r"^R(?:ing)?(\d+)$")?,
            start_face: Regex::new(r"H(\d+)_V0")?,
            end_face: Regex::new(r"H(\d+)_V1")?,
            lead: Regex::new(r"^[io]L\d+$")?,
            trailing_digits: Regex::new(r"\d+$")?,
        })
    }

    fn strip_digits(&self, name: &str) -> String {
        self.trailing_digits.replace(name, "").into_owned()
    }

    /// Ring number of a ring face name, e.g. `R2_BP` → 2.
    fn ring_number(&self, name: &str) -> Option<usize> {
        let head = name.split('_').next()?;
        self.ring.captures(head)?.get(1)?.as_str().parse().ok()
    }

    /// Consecutive rings nest head to foot, so even rings lose their bottom
    /// plate face and odd rings their top one.
    fn skip_ring_face(&self, name: &str) -> bool {
        match self.ring_number(name) {
            Some(n) if n % 2 == 0 => name.contains("BP"),
            Some(_) => name.contains("HP"),
            None => false,
        }
    }

    /// Helix end faces are kept only at the ends of the stack, and only
    /// when no lead closes that end.
    fn skip_end_face(&self, name: &str, layout: &Layout) -> bool {
        let helix = |re: &Regex| -> Option<usize> {
            re.captures(name)?.get(1)?.as_str().parse().ok()
        };
        let mut skip = false;
        if layout.inner_lead {
            if self.start_face.is_match(name) || (name.starts_with("Inner") && name.ends_with("V1")) {
                skip = true;
            }
        } else if helix(&self.start_face).is_some_and(|n| n != 1) {
            skip = true;
        }
        if layout.outer_lead {
            if self.end_face.is_match(name) || (name.starts_with("Outer") && name.ends_with("V1")) {
                skip = true;
            }
        } else if helix(&self.end_face).is_some_and(|n| n != layout.nhelices()) {
            skip = true;
        }
        skip
    }
}

fn is_isolant(name: &str) -> bool {
    name.contains("Isolant") || name.contains("Glue") || name.contains("Kapton")
}

fn is_insulator_face(name: &str) -> bool {
    name.contains("IrInt") || name.contains("IrExt") || name.contains("iRint") || name.contains("iRext")
}

fn is_radial_face(name: &str) -> bool {
    ["_rInt", "_rExt", "_IrInt", "_IrExt", "_iRint", "_iRext"]
        .iter()
        .any(|s| name.contains(s))
}

fn push(groups: &mut Groups, name: String, indices: impl IntoIterator<Item = usize>) {
    let set = groups.entry(name).or_default();
    for index in indices {
        if !set.contains(&index) {
            set.push(index);
        }
    }
}

/// Boundary name fragments wetted by each cooling channel of an insert.
///
/// Channel 0 sees the first ring's inner face and the first helix's inner
/// face. Channel `i` sees the outer face of helix `i`, the rings on both
/// sides and the inner face of helix `i+1`. The last channel sees only the
/// outer face of the last helix. Insulator faces are included unless hidden.
pub fn channel_fragments(nchannels: usize, hide_isolants: bool) -> Vec<Vec<String>> {
    (0..nchannels)
        .map(|i| {
            let mut names = Vec::new();
            if i == 0 {
                names.push(format!("R{}_R0n", i + 1));
            }
            if i >= 1 {
                names.push(format!("H{i}_rExt"));
                if !hide_isolants {
                    names.push(format!("H{i}_IrExt"));
                    names.push(format!("H{i}_kaptonsIrExt"));
                }
            }
            if i >= 2 {
                names.push(format!("R{}_R1n", i - 1));
            }
            if i + 1 < nchannels {
                names.push(format!("H{}_rInt", i + 1));
                if !hide_isolants {
                    names.push(format!("H{}_IrInt", i + 1));
                    names.push(format!("H{}_kaptonsIrInt", i + 1));
                }
            }
            if i != 0 && i + 1 < nchannels {
                names.push(format!("R{i}_CoolingSlits"));
                names.push(format!("R{i}_R0n"));
            }
            names
        })
        .collect()
}

/// Rewrite a child record name at the head of `name` into its in-assembly tag.
///
/// The longest matching record name wins, so `H10` is not read as `H1`.
fn rewrite_head(name: &str, ring_ids: &IndexMap<String, String>) -> String {
    ring_ids
        .iter()
        .filter(|(key, _)| name.starts_with(key.as_str()))
        .max_by_key(|(key, _)| key.len())
        .map(|(key, tag)| format!("{tag}{}", &name[key.len()..]))
        .unwrap_or_else(|| name.to_string())
}

/// Tag the solids of `doc` with the layout's names.
///
/// Fails with [`XaoError::CountMismatch`] when the geometry does not hold
/// exactly one entity per name.
pub fn reconcile_solids(
    doc: &XaoDocument,
    layout: &Layout,
    dims: Dimensions,
    policy: &GroupPolicy,
    rules: &Rules,
) -> Result<Groups> {
    let entities = doc.entities(dims.solid);
    let names = &layout.solid_names;
    if entities.len() != names.len() {
        return Err(XaoError::CountMismatch {
            expected: names.len(),
            found: entities.len(),
            dimension: dims.solid.as_str(),
        });
    }

    let mut groups = Groups::new();
    for (entity, derived) in entities.iter().zip(names) {
        let mut name = derived.clone();
        if let Some(label) = &entity.name {
            name = label.replace("from_", "");
            if name.starts_with("Ring-H") {
                match layout.ring_ids.get(&name) {
                    Some(tag) => name = tag.clone(),
                    None => warn!(label = %name, "Ring label without an assembly tag"),
                }
            }
        }
        let index = entity.index + 1;

        if is_isolant(&name) {
            if policy.hide_isolants {
                debug!(%name, index, "Hiding isolant");
                continue;
            }
            if policy.group_isolants {
                name = rules.strip_digits(&name);
            }
        }
        if policy.group_leads && rules.lead.is_match(&name) {
            name = rules.strip_digits(&name);
        }
        debug!(derived = %derived, %name, index, "Solid");
        push(&mut groups, name, [index]);
    }
    Ok(groups)
}

/// Collect the boundary groups of `doc` under their reconciled names.
pub fn reconcile_boundaries(
    doc: &XaoDocument,
    layout: &Layout,
    dims: Dimensions,
    policy: &GroupPolicy,
    rules: &Rules,
) -> Groups {
    let geometry = doc.geometry.replace("_withAir", "");
    let channels = if policy.group_channels {
        channel_fragments(layout.nchannels(), policy.hide_isolants)
    } else {
        Vec::new()
    };

    let mut groups = Groups::new();
    for group in doc.groups_of(dims.boundary) {
        let mut name = group
            .name
            .replace(&format!("{geometry}_"), "")
            .replace("===", "_");
        if name.ends_with("_rInt") || name.ends_with("_rExt") || name.starts_with("Ring-H") {
            name = rewrite_head(&name, &layout.ring_ids);
        }
        name = name.replace("Air_", "");

        let mut skip = rules.skip_ring_face(&name) || rules.skip_end_face(&name, layout);

        if policy.group_channels {
            if let Some(j) = channels
                .iter()
                .position(|fragments| fragments.iter().any(|f| name.ends_with(f.as_str())))
            {
                name = format!("Channel{j}");
            }
            let in_first_magnet = layout
                .compound
                .first()
                .map_or(true, |first| name.starts_with(first.as_str()));
            if in_first_magnet && is_radial_face(&name) {
                skip = true;
            }
        }

        if policy.hide_isolants {
            if is_insulator_face(&name) {
                skip = true;
            }
            if name.contains("Interface") && policy.group_isolants {
                name = rules.strip_digits(&name);
            }
        }
        if policy.group_isolants {
            if is_insulator_face(&name) {
                name = rules.strip_digits(&name);
            }
            if name.contains("Interface") {
                skip = true;
            }
        }

        debug!(group = %group.name, %name, skip, "Boundary");
        if !skip {
            push(&mut groups, name, group.elements.iter().map(|i| i + 1));
        }
    }
    groups
}
