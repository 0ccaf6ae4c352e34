//! Records in a store, through the layout, against an exported geometry.

use magnetgeo::ir::{Helix, Insert, Model3D, ModelAxi, Record, Ring, Shape};
use magnetgeo::{layout, Layout, MemoryStore, Resolver};
use magnetgeo_xao::{mesh_sizes, reconcile, GroupPolicy, XaoDocument, XaoError};

const NHELICES: usize = 6;

fn helix(i: usize) -> Helix {
    let r0 = 20.0 + 10.0 * (i - 1) as f64;
    Helix {
        name: format!("HL-H{i}"),
        r: [r0, r0 + 8.0],
        z: [-150.0, 150.0],
        cutwidth: 0.2,
        odd: i % 2 == 1,
        dble: false,
        axi: ModelAxi {
            name: format!("HL-H{i}-axi"),
            h: 120.0,
            turns: vec![5.0, 5.0],
            pitch: vec![12.0, 12.0],
        },
        m3d: Model3D::default(),
        shape: Shape::default(),
    }
}

fn ring(i: usize) -> Ring {
    let r0 = 20.0 + 10.0 * (i - 1) as f64;
    Ring {
        name: format!("Ring-H{i}H{}", i + 1),
        r: [r0, r0 + 8.0, r0 + 10.0, r0 + 18.0],
        z: [0.0, 20.0],
        n: 8,
        angle: 30.0,
        bpside: i % 2 == 1,
        fillets: false,
    }
}

fn store() -> MemoryStore {
    let mut store = MemoryStore::new();
    for i in 1..=NHELICES {
        store.insert(Record::Helix(helix(i)));
    }
    for i in 1..NHELICES {
        store.insert(Record::Ring(ring(i)));
    }
    store.insert(Record::Insert(Insert {
        name: "HL".into(),
        helices: (1..=NHELICES).map(|i| format!("HL-H{i}")).collect(),
        rings: (1..NHELICES).map(|i| format!("Ring-H{i}H{}", i + 1)).collect(),
        currentleads: vec![],
        hangles: vec![],
        rangles: vec![],
        innerbore: 18.0,
        outerbore: 90.0,
    }));
    store
}

fn insert_layout(store: &MemoryStore) -> Layout {
    let hl = store.record("HL").unwrap();
    layout(&hl, "", false, store).unwrap()
}

/// An export with `nsolids` unlabelled solids except the rings, which carry
/// their record name, plus the given face groups.
fn export(nsolids: usize, faces: &[&str]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<XAO version=\"1.0\" author=\"GEOM\">\n  <geometry name=\"HL\">\n    <topology>\n",
    );
    xml.push_str(&format!("      <solids count=\"{nsolids}\">\n"));
    for index in 0..nsolids {
        let ring = index.checked_sub(2 * NHELICES).map(|k| k + 1);
        let label = match ring {
            Some(k) if k < NHELICES => format!("from_Ring-H{k}H{}", k + 1),
            _ => String::new(),
        };
        xml.push_str(&format!(
            "        <solid index=\"{index}\" name=\"{label}\" reference=\"{}\"/>\n",
            index + 100
        ));
    }
    xml.push_str("      </solids>\n    </topology>\n  </geometry>\n");
    xml.push_str(&format!("  <groups count=\"{}\">\n", faces.len()));
    for (i, name) in faces.iter().enumerate() {
        xml.push_str(&format!(
            "    <group name=\"{name}\" dimension=\"face\" count=\"1\">\n      <element index=\"{i}\"/>\n    </group>\n"
        ));
    }
    xml.push_str("  </groups>\n</XAO>\n");
    xml
}

const FACES: &[&str] = &[
    "HL_HL-H1_rInt",
    "HL_HL-H1_rExt",
    "HL_HL-H2_rInt",
    "HL_H1_V0",
    "HL_H3_V0",
    "HL_H6_V1",
    "HL_Ring-H1H2===R0n",
    "HL_Ring-H1H2===CoolingSlits",
    "HL_Ring-H2H3===BP",
    "HL_Ring-H2H3===HP",
    "HL_Ring-H3H4===BP",
    "HL_Ring-H3H4===HP",
    "HL_H2_IrInt0",
    "HL_H2_IrInt1",
];

#[test]
fn names_cover_helices_and_rings() {
    let layout = insert_layout(&store());
    // Each helix is a Cu solid plus one glue, and rings fill the gaps.
    assert_eq!(layout.solid_names.len(), 2 * NHELICES + NHELICES - 1);
    assert_eq!(layout.solid_names[..2], ["H1_Cu", "H1_Glue0"]);
    assert_eq!(layout.solid_names[2 * NHELICES], "R1");
    assert_eq!(layout.ring_ids["HL-H4"], "H4");
    assert_eq!(layout.ring_ids["Ring-H3H4"], "R3");
    assert_eq!(layout.nchannels(), NHELICES + 1);
    assert!(!layout.inner_lead && !layout.outer_lead);
}

#[test]
fn solids_and_boundaries() {
    let store = store();
    let layout = insert_layout(&store);
    let doc = XaoDocument::parse(&export(layout.solid_names.len(), FACES)).unwrap();
    let groups = reconcile(&doc, &layout, false, &GroupPolicy::default()).unwrap();

    assert_eq!(groups.solids.len(), layout.solid_names.len());
    assert_eq!(groups.solids["H1_Cu"], vec![1]);
    assert_eq!(groups.solids["R3"], vec![2 * NHELICES + 3]);

    let b = &groups.boundaries;
    assert_eq!(b["H1_rInt"], vec![1]);
    assert_eq!(b["R1_R0n"], vec![7]);
    // Only the ends of the stack keep their end faces.
    assert!(b.contains_key("H1_V0"));
    assert!(!b.contains_key("H3_V0"));
    assert!(b.contains_key("H6_V1"));
    // Rings nest alternately: even rings lose BP, odd rings lose HP.
    assert!(!b.contains_key("R2_BP"));
    assert!(b.contains_key("R2_HP"));
    assert!(b.contains_key("R3_BP"));
    assert!(!b.contains_key("R3_HP"));
    assert!(b.contains_key("H2_IrInt0") && b.contains_key("H2_IrInt1"));
}

#[test]
fn cooling_channels_and_isolants_grouped() {
    let store = store();
    let layout = insert_layout(&store);
    let doc = XaoDocument::parse(&export(layout.solid_names.len(), FACES)).unwrap();
    let policy = GroupPolicy::from_options::<&str>(&[], &["Isolants", "CoolingChannels"]);
    let groups = reconcile(&doc, &layout, false, &policy).unwrap();

    assert_eq!(groups.solids["H1_Glue"], vec![2]);
    let b = &groups.boundaries;
    assert_eq!(b["Channel0"], vec![1, 7]);
    assert_eq!(b["Channel1"], vec![2, 3, 8]);
    assert!(!b.keys().any(|k| k.ends_with("_rInt") || k.ends_with("_rExt")));
    // Numbered insulator faces of the insert are not channel walls.
    assert!(!b.keys().any(|k| k.contains("IrInt")));
    assert!(!b.contains_key("Channel2"));
    assert!(b.contains_key("H1_V0") && b.contains_key("R2_HP"));
}

#[test]
fn reconciliation_is_deterministic() {
    let store = store();
    let layout = insert_layout(&store);
    let xml = export(layout.solid_names.len(), FACES);
    let policy = GroupPolicy::from_options::<&str>(&[], &["Isolants"]);
    let first = reconcile(&XaoDocument::parse(&xml).unwrap(), &layout, false, &policy).unwrap();
    let second = reconcile(&XaoDocument::parse(&xml).unwrap(), &layout, false, &policy).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn solid_count_must_match() {
    let store = store();
    let layout = insert_layout(&store);
    let doc = XaoDocument::parse(&export(layout.solid_names.len() - 1, FACES)).unwrap();
    let err = reconcile(&doc, &layout, false, &GroupPolicy::default()).unwrap_err();
    assert!(matches!(err, XaoError::CountMismatch { expected: 17, found: 16, .. }));
}

#[test]
fn air_cannot_hide_isolants() {
    let store = store();
    let mut layout = insert_layout(&store);
    layout.push_air();
    let doc = XaoDocument::parse(&export(layout.solid_names.len(), FACES)).unwrap();
    let hide = GroupPolicy::from_options::<&str>(&["Isolants"], &[]);
    assert!(matches!(
        reconcile(&doc, &layout, false, &hide),
        Err(XaoError::AirWithHiddenIsolants)
    ));
    let groups = reconcile(&doc, &layout, false, &GroupPolicy::default()).unwrap();
    assert_eq!(groups.solids["Air"], vec![layout.solid_names.len()]);

    let sizes = mesh_sizes(&layout.boxes, layout.has_air(), None).unwrap();
    assert_eq!(sizes.len(), 2);
    approx::assert_relative_eq!(sizes[1], 20.0 * sizes[0]);
}
