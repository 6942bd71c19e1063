//! Content-hash artifact cache
//!
//! Memoizes derived artifacts keyed by the content hash of their inputs.
//! There is no invalidation: a changed spec hashes to a new key, and stale
//! entries are simply never looked up again within a session.
//!
//! Concurrency model: the outer map is behind a `parking_lot::RwLock` and
//! is only write-locked long enough to insert an empty cell, so readers of
//! unrelated keys never block. Two threads racing on the same missing key
//! may both compute; the first result wins and both observe it. Failed
//! computations are not cached.

use boardkit_camtools::PlannerConfig;
use boardkit_core::{BoardSpec, CutterParams, Result};
use boardkit_geometry::{LoftConfig, SurfaceMesh};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

use crate::pipeline::{self, GcodeExport};

/// Generic memoization map for one artifact type.
pub struct ArtifactCache<T> {
    entries: RwLock<HashMap<u64, Arc<OnceLock<T>>>>,
}

impl<T: Clone> ArtifactCache<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached artifact for `key`, computing and storing it on
    /// a miss.
    pub fn get_or_compute<F>(&self, key: u64, compute: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let cell = {
            let entries = self.entries.read();
            entries.get(&key).cloned()
        };
        let cell = match cell {
            Some(cell) => cell,
            None => {
                let mut entries = self.entries.write();
                entries
                    .entry(key)
                    .or_insert_with(|| Arc::new(OnceLock::new()))
                    .clone()
            }
        };

        if let Some(value) = cell.get() {
            debug!(key, "artifact cache hit");
            return Ok(value.clone());
        }

        let value = compute()?;
        Ok(cell.get_or_init(|| value).clone())
    }

    /// Number of keys with a completed artifact.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for ArtifactCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Session-scoped cache over the export pipeline.
///
/// Holds the loft and planner configurations fixed so artifacts are keyed
/// purely by input content: mesh entries by the board geometry hash,
/// G-code entries by the geometry hash combined with the board name and
/// the cutter parameters.
pub struct ExportCache {
    loft_config: LoftConfig,
    planner_config: PlannerConfig,
    meshes: ArtifactCache<SurfaceMesh>,
    programs: ArtifactCache<GcodeExport>,
}

impl ExportCache {
    pub fn new(loft_config: LoftConfig, planner_config: PlannerConfig) -> Self {
        Self {
            loft_config,
            planner_config,
            meshes: ArtifactCache::new(),
            programs: ArtifactCache::new(),
        }
    }

    /// Render buffers for a spec, memoized by content hash.
    pub fn mesh(&self, spec: &BoardSpec) -> Result<SurfaceMesh> {
        self.meshes
            .get_or_compute(spec.content_hash(), || {
                pipeline::render_mesh(spec, &self.loft_config)
            })
    }

    /// Outline program for a spec and cutter, memoized by content hash.
    pub fn outline_gcode(&self, spec: &BoardSpec, cutter: &CutterParams) -> Result<GcodeExport> {
        self.programs
            .get_or_compute(cutter.content_hash_with(spec), || {
                pipeline::export_outline_gcode(spec, cutter, &self.planner_config)
            })
    }

    /// Completed artifact counts: (meshes, programs).
    pub fn artifact_counts(&self) -> (usize, usize) {
        (self.meshes.len(), self.programs.len())
    }
}

impl Default for ExportCache {
    fn default() -> Self {
        Self::new(LoftConfig::default(), PlannerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardkit_core::BoardDimensions;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn spec(name: &str) -> BoardSpec {
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
                (1000.0, 180.0),
                (1500.0, 150.0),
                (2000.0, 0.0),
            ],
            None,
        )
    }

    #[test]
    fn test_second_lookup_skips_compute() {
        let cache = ArtifactCache::new();
        let computed = AtomicUsize::new(0);
        let compute = || {
            computed.fetch_add(1, Ordering::SeqCst);
            Ok(42u64)
        };
        assert_eq!(cache.get_or_compute(7, compute).unwrap(), 42);
        assert_eq!(
            cache
                .get_or_compute(7, || panic!("should not recompute"))
                .unwrap(),
            42
        );
        assert_eq!(computed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cache: ArtifactCache<u64> = ArtifactCache::new();
        let err = cache.get_or_compute(1, || {
            Err(boardkit_core::Error::other("transient"))
        });
        assert!(err.is_err());
        assert_eq!(cache.get_or_compute(1, || Ok(9)).unwrap(), 9);
    }

    #[test]
    fn test_mesh_keyed_by_spec_content() {
        let cache = ExportCache::default();
        let a = spec("board-a");
        let mut b = a.clone();
        b.outline_points[2].1 = 175.0;

        cache.mesh(&a).unwrap();
        cache.mesh(&a).unwrap();
        cache.mesh(&b).unwrap();
        assert_eq!(cache.artifact_counts().0, 2);
    }

    #[test]
    fn test_respecced_board_hits_the_cache() {
        // Reconstructing the same board content mints a fresh id; the
        // cache must key on content, not identity.
        let cache = ExportCache::default();
        let first = spec("board-a");
        let second = spec("board-a");
        assert_ne!(first.id, second.id);

        cache.mesh(&first).unwrap();
        cache.mesh(&second).unwrap();
        let cutter = CutterParams {
            cutter_diameter: 12.7,
            feed_rate: 1200.0,
        };
        cache.outline_gcode(&first, &cutter).unwrap();
        cache.outline_gcode(&second, &cutter).unwrap();
        assert_eq!(cache.artifact_counts(), (1, 1));
    }

    #[test]
    fn test_gcode_keyed_by_spec_and_cutter() {
        let cache = ExportCache::default();
        let s = spec("board-a");
        let small = CutterParams {
            cutter_diameter: 6.35,
            feed_rate: 1200.0,
        };
        let large = CutterParams {
            cutter_diameter: 12.7,
            feed_rate: 1200.0,
        };

        cache.outline_gcode(&s, &small).unwrap();
        cache.outline_gcode(&s, &large).unwrap();
        cache.outline_gcode(&s, &small).unwrap();
        assert_eq!(cache.artifact_counts().1, 2);
    }

    #[test]
    fn test_concurrent_lookups_agree() {
        let cache = Arc::new(ArtifactCache::<u64>::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get_or_compute(3, || Ok(11)).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 11);
        }
        assert_eq!(cache.len(), 1);
    }
}
