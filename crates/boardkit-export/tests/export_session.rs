//! A whole export session: concurrent requests through the pool, shared
//! artifact cache, both export products.

use boardkit_core::{BoardDimensions, BoardSpec, CutterParams};
use boardkit_export::{ExportCache, WorkerPool};
use std::sync::Arc;
use std::time::Duration;

fn board(name: &str, mid_width: f64) -> BoardSpec {
    BoardSpec::new(
        name,
        BoardDimensions {
            length: 2000.0,
            width: 360.0,
            thickness: 60.0,
        },
        vec![
            (0.0, 0.0),
            (500.0, 150.0),
            (1000.0, mid_width),
            (1500.0, 150.0),
            (2000.0, 0.0),
        ],
        Some(vec![(0.0, 45.0), (600.0, 10.0), (1200.0, 0.0), (2000.0, 25.0)]),
    )
}

#[test]
fn concurrent_exports_share_cached_artifacts() {
    let cache = Arc::new(ExportCache::default());
    let pool = WorkerPool::new(4);
    let cutter = CutterParams {
        cutter_diameter: 12.7,
        feed_rate: 1200.0,
    };

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = Arc::clone(&cache);
            // Two distinct boards, four requests each.
            let spec = board(&format!("board-{}", i % 2), 180.0 - (i % 2) as f64 * 10.0);
            pool.submit(move || {
                let mesh = cache.mesh(&spec)?;
                let export = cache.outline_gcode(&spec, &cutter)?;
                Ok::<_, boardkit_core::Error>((mesh.triangles.len(), export))
            })
        })
        .collect();

    for handle in handles {
        let (triangle_count, export) = handle
            .wait_timeout(Duration::from_secs(60))
            .expect("export timed out")
            .expect("export failed");
        assert!(triangle_count > 1000);
        assert!(export.content.ends_with("M30\n"));
        assert!(export.filename.ends_with("_outline.cnc"));
    }

    // Only two distinct inputs were ever computed.
    assert_eq!(cache.artifact_counts(), (2, 2));
}

#[test]
fn invalid_request_fails_without_poisoning_the_cache() {
    let cache = ExportCache::default();
    let mut bad = board("bad", 180.0);
    bad.dimensions.thickness = 0.0;

    assert!(cache.mesh(&bad).is_err());
    assert_eq!(cache.artifact_counts(), (0, 0));

    // The same session still serves valid boards.
    let good = board("good", 180.0);
    assert!(cache.mesh(&good).is_ok());
    assert_eq!(cache.artifact_counts(), (1, 0));
}
