//! End-to-end lofting scenarios: spec → rings → soup → render buffers.

use boardkit_core::{BoardDimensions, BoardSpec};
use boardkit_geometry::{HullLoftingEngine, LoftConfig, MeshAssembler};

fn shortboard(rocker: Option<Vec<(f64, f64)>>) -> BoardSpec {
    BoardSpec::new(
        "Shortboard Classic",
        BoardDimensions {
            length: 2000.0,
            width: 360.0,
            thickness: 60.0,
        },
        vec![
            (0.0, 0.0),
            (500.0, 150.0),
            (1000.0, 180.0),
            (1500.0, 150.0),
            (2000.0, 0.0),
        ],
        rocker,
    )
}

fn nose_to_tail_rocker() -> Vec<(f64, f64)> {
    vec![(0.0, 45.0), (600.0, 10.0), (1200.0, 0.0), (2000.0, 25.0)]
}

#[test]
fn flat_rocker_board_meshes_cleanly() {
    let engine = HullLoftingEngine::default();
    let soup = engine.loft(&shortboard(None)).unwrap();
    let mesh = MeshAssembler::default().assemble(&soup).unwrap();
    mesh.check().unwrap();

    assert!(mesh.triangles.len() > 1000);
    assert_eq!(mesh.normals.len(), mesh.vertices.len());

    // Every triangle in the final buffers has real area.
    for tri in &mesh.triangles {
        let [a, b, c] = tri.map(|i| mesh.vertices[i as usize]);
        let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let cross = [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ];
        let area = (cross[0].powi(2) + cross[1].powi(2) + cross[2].powi(2)).sqrt() / 2.0;
        assert!(area > 0.0);
    }

    // Every vertex normal is unit length.
    for n in &mesh.normals {
        let len = (n[0].powi(2) + n[1].powi(2) + n[2].powi(2)).sqrt();
        assert!((len - 1.0).abs() < 1e-9, "normal length {}", len);
    }
}

#[test]
fn tips_weld_to_single_fan_apexes() {
    let engine = HullLoftingEngine::default();
    let soup = engine.loft(&shortboard(None)).unwrap();
    let mesh = MeshAssembler::default().assemble(&soup).unwrap();

    // The nose and tail rings collapse to one point each, so after welding
    // exactly one vertex sits at each end station.
    let nose_vertices = mesh.vertices.iter().filter(|v| v[0].abs() < 1e-9).count();
    let tail_vertices = mesh
        .vertices
        .iter()
        .filter(|v| (v[0] - 2000.0).abs() < 1e-9)
        .count();
    assert_eq!(nose_vertices, 1);
    assert_eq!(tail_vertices, 1);
}

#[test]
fn symmetric_outline_gives_symmetric_mesh() {
    let engine = HullLoftingEngine::default();
    let soup = engine.loft(&shortboard(Some(nose_to_tail_rocker()))).unwrap();
    let mesh = MeshAssembler::default().assemble(&soup).unwrap();

    let quantize =
        |v: &[f64; 3]| ((v[0] * 1e6).round() as i64, (v[1] * 1e6).round() as i64, (v[2] * 1e6).round() as i64);
    let mirrored: std::collections::HashSet<_> = mesh
        .vertices
        .iter()
        .map(|v| quantize(&[v[0], -v[1], v[2]]))
        .collect();
    for v in &mesh.vertices {
        assert!(
            mirrored.contains(&quantize(v)),
            "vertex {:?} has no mirror across the centerline",
            v
        );
    }
}

#[test]
fn rocker_change_leaves_planform_projection_fixed() {
    let engine = HullLoftingEngine::default();
    let flat = engine.loft(&shortboard(None)).unwrap();
    let rockered = engine.loft(&shortboard(Some(nose_to_tail_rocker()))).unwrap();

    assert_eq!(flat.len(), rockered.len());
    let mut z_differs = false;
    for (a, b) in flat.iter().zip(rockered.iter()) {
        for (pa, pb) in a.iter().zip(b.iter()) {
            assert!((pa.x - pb.x).abs() < 1e-12);
            assert!((pa.y - pb.y).abs() < 1e-12);
            if (pa.z - pb.z).abs() > 1e-9 {
                z_differs = true;
            }
        }
    }
    assert!(z_differs, "rocker change should move z somewhere");
}

#[test]
fn outline_change_leaves_station_heights_fixed() {
    let engine = HullLoftingEngine::default();
    let base = engine.loft(&shortboard(None)).unwrap();

    let mut wider = shortboard(None);
    wider.outline_points[1].1 = 165.0;
    wider.outline_points[2].1 = 172.0;
    let changed = engine.loft(&wider).unwrap();

    assert_eq!(base.len(), changed.len());
    let mut y_differs = false;
    for (a, b) in base.iter().zip(changed.iter()) {
        for (pa, pb) in a.iter().zip(b.iter()) {
            assert!((pa.x - pb.x).abs() < 1e-12);
            assert!((pa.z - pb.z).abs() < 1e-9, "z moved at station {}", pa.x);
            if (pa.y - pb.y).abs() > 1e-9 {
                y_differs = true;
            }
        }
    }
    assert!(y_differs, "outline change should move y somewhere");
}

#[test]
fn coarse_config_still_closes_the_mesh() {
    let engine = HullLoftingEngine::new(LoftConfig {
        station_spacing: 100.0,
        ring_points: 12,
        ..LoftConfig::default()
    });
    let soup = engine.loft(&shortboard(None)).unwrap();
    let mesh = MeshAssembler::default().assemble(&soup).unwrap();
    mesh.check().unwrap();

    // Closed surface: positive signed volume under outward winding.
    let volume: f64 = mesh
        .triangles
        .iter()
        .map(|tri| {
            let [a, b, c] = tri.map(|i| mesh.vertices[i as usize]);
            (a[0] * (b[1] * c[2] - b[2] * c[1]) + a[1] * (b[2] * c[0] - b[0] * c[2])
                + a[2] * (b[0] * c[1] - b[1] * c[0]))
                / 6.0
        })
        .sum();
    assert!(volume > 0.0);
}
