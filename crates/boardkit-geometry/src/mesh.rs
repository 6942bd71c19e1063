//! Mesh assembly
//!
//! Packages lofted triangle soup into renderer-consumable buffers: welds
//! coincident vertices (the deck/bottom rail seam in particular), drops
//! triangles that degenerate under welding, and computes per-vertex normals
//! as the area-weighted average of adjacent face normals. No geometry is
//! generated here; this is bookkeeping between "generate geometry" and
//! "package for a renderer".

use crate::loft::LoftTriangle;
use boardkit_core::{GeometryError, Result};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Immutable render buffers: parallel vertex/normal arrays plus an index
/// buffer. Every index is in range and every normal is unit length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMesh {
    /// Vertex positions.
    pub vertices: Vec<[f64; 3]>,
    /// Counter-clockwise (outward) index triples.
    pub triangles: Vec<[u32; 3]>,
    /// Per-vertex unit normals, parallel to `vertices`.
    pub normals: Vec<[f64; 3]>,
}

impl SurfaceMesh {
    /// Checks the buffer invariants: parallel arrays and in-range indices.
    pub fn check(&self) -> Result<()> {
        if self.normals.len() != self.vertices.len() {
            return Err(GeometryError::EmptyMesh {
                reason: format!(
                    "normal buffer length {} does not match {} vertices",
                    self.normals.len(),
                    self.vertices.len()
                ),
            }
            .into());
        }
        for tri in &self.triangles {
            for &index in tri {
                if index as usize >= self.vertices.len() {
                    return Err(GeometryError::IndexOutOfBounds {
                        index,
                        vertex_count: self.vertices.len(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}

/// Assembles triangle soup into an indexed `SurfaceMesh`.
#[derive(Debug, Clone, Copy)]
pub struct MeshAssembler {
    /// Vertices closer than this weld into one (mm).
    pub weld_tolerance: f64,
    /// Triangles below this area after welding are dropped.
    pub min_triangle_area: f64,
}

impl Default for MeshAssembler {
    fn default() -> Self {
        Self {
            weld_tolerance: 1e-4,
            min_triangle_area: 1e-6,
        }
    }
}

impl MeshAssembler {
    /// Welds, indexes, and computes normals for a triangle soup.
    pub fn assemble(&self, soup: &[LoftTriangle]) -> Result<SurfaceMesh> {
        if soup.is_empty() {
            return Err(GeometryError::EmptyMesh {
                reason: "no triangles to assemble".to_string(),
            }
            .into());
        }

        let mut keys: HashMap<(i64, i64, i64), u32> = HashMap::new();
        let mut vertices: Vec<Point3<f64>> = Vec::new();
        let mut accumulated: Vec<Vector3<f64>> = Vec::new();
        let mut triangles: Vec<[u32; 3]> = Vec::with_capacity(soup.len());

        let mut dropped = 0usize;
        for tri in soup {
            let indices = [
                self.intern(&mut keys, &mut vertices, &mut accumulated, tri[0]),
                self.intern(&mut keys, &mut vertices, &mut accumulated, tri[1]),
                self.intern(&mut keys, &mut vertices, &mut accumulated, tri[2]),
            ];
            if indices[0] == indices[1] || indices[1] == indices[2] || indices[0] == indices[2] {
                dropped += 1;
                continue;
            }

            let a = vertices[indices[0] as usize];
            let e1 = vertices[indices[1] as usize] - a;
            let e2 = vertices[indices[2] as usize] - a;
            // Raw cross product: magnitude 2x area, so summing it is the
            // area weighting.
            let cross = e1.cross(&e2);
            if cross.norm() / 2.0 < self.min_triangle_area {
                dropped += 1;
                continue;
            }

            for &index in &indices {
                accumulated[index as usize] += cross;
            }
            triangles.push(indices);
        }

        if triangles.is_empty() {
            return Err(GeometryError::EmptyMesh {
                reason: "all triangles degenerated during welding".to_string(),
            }
            .into());
        }
        if dropped > 0 {
            debug!(dropped, kept = triangles.len(), "dropped degenerate triangles");
        }

        let normals = accumulated
            .iter()
            .map(|n| {
                let norm = n.norm();
                if norm > f64::EPSILON {
                    let unit = n / norm;
                    [unit.x, unit.y, unit.z]
                } else {
                    // Isolated vertex with no surviving faces.
                    [0.0, 0.0, 1.0]
                }
            })
            .collect();

        let mesh = SurfaceMesh {
            vertices: vertices.iter().map(|p| [p.x, p.y, p.z]).collect(),
            triangles,
            normals,
        };
        mesh.check()?;
        Ok(mesh)
    }

    fn intern(
        &self,
        keys: &mut HashMap<(i64, i64, i64), u32>,
        vertices: &mut Vec<Point3<f64>>,
        accumulated: &mut Vec<Vector3<f64>>,
        p: Point3<f64>,
    ) -> u32 {
        let key = self.quantize(&p);
        *keys.entry(key).or_insert_with(|| {
            vertices.push(p);
            accumulated.push(Vector3::zeros());
            (vertices.len() - 1) as u32
        })
    }

    fn quantize(&self, p: &Point3<f64>) -> (i64, i64, i64) {
        let q = |v: f64| (v / self.weld_tolerance).round() as i64;
        (q(p.x), q(p.y), q(p.z))
    }
}
