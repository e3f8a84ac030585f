// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Unprojection of echo distances into point clouds and quad meshes.
//!
//! A point is the channel direction scaled by the echo distance. A quad is
//! the channel's angular cell: the four corner directions of a
//! [`QuadDirectionTable`] scaled by the same distance.
//!
//! # Quad layout
//!
//! For `k` selected echoes the mesh holds four vertex blocks of `k` vertices,
//! one block per corner, so quad `i` uses vertices `i`, `i + k`, `i + 2k` and
//! `i + 3k`:
//!
//! ```text
//!   +v  i+k ------ i+2k
//!        |      /   |
//!        |    /     |
//!   -v   i ------- i+3k
//!       -h          +h
//! ```
//!
//! Each quad is split into triangles `(i, i+k, i+2k)` and `(i, i+2k, i+3k)`.
//! Both start at vertex `i`, which is how [`triangle_to_echo_index`] recovers
//! the echo.

use crate::{
    directions::{DirectionTable, QUAD_CORNERS, QuadDirectionTable},
    lidar::{Error, Points, check_len},
};

/// Point cloud with one intensity per point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointCloud {
    pub points: Points,
    pub intensity: Vec<f32>,
}

impl PointCloud {
    /// Pair points with their intensities.
    pub fn new(points: Points, intensity: Vec<f32>) -> Result<Self, Error> {
        check_len("intensity", points.len(), intensity.len())?;
        Ok(Self { points, intensity })
    }

    /// Get the current number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Rotate the cloud into the camera axis system of `variant`.
    pub fn rotate_for(&mut self, variant: HardwareVariant) {
        variant.apply(&mut self.points);
    }
}

/// Sensor families whose scan axes map differently onto the camera axes.
///
/// The LCA2 scans along the vertical axis and images along the horizontal
/// one, matching the projection model directly. The LCA3 swaps the two axes,
/// so its clouds need a 90° counter-clockwise rotation about `z`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HardwareVariant {
    #[default]
    Lca2,
    Lca3,
}

impl HardwareVariant {
    /// Apply the variant rotation in place.
    pub fn apply(self, points: &mut Points) {
        match self {
            HardwareVariant::Lca2 => {}
            HardwareVariant::Lca3 => {
                for (x, y) in points.x.iter_mut().zip(points.y.iter_mut()) {
                    let (rx, ry) = (*y, -*x);
                    *x = rx;
                    *y = ry;
                }
            }
        }
    }
}

/// Indexed triangle mesh built from echo quads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuadMesh {
    /// `4k` vertices in corner blocks of `k`.
    pub vertices: Points,
    /// One intensity per vertex.
    pub intensity: Vec<f32>,
    /// `6k` vertex indices, three per triangle.
    pub indices: Vec<u32>,
}

impl QuadMesh {
    /// Number of quads (selected echoes).
    pub fn n_quads(&self) -> usize {
        self.vertices.len() / QUAD_CORNERS
    }

    /// Number of triangles.
    pub fn n_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex indices of triangle `t`.
    pub fn triangle(&self, t: usize) -> Option<[u32; 3]> {
        let tri = self.indices.get(3 * t..3 * t + 3)?;
        Some([tri[0], tri[1], tri[2]])
    }

    /// Expand the indexed mesh into a flat triangle list.
    ///
    /// Returns three vertices and intensities per triangle, in index order.
    pub fn triangle_list(&self) -> PointCloud {
        let mut points = Points::with_capacity(self.indices.len());
        let mut intensity = Vec::with_capacity(self.indices.len());
        for &index in &self.indices {
            let i = index as usize;
            points.push(self.vertices.x[i], self.vertices.y[i], self.vertices.z[i]);
            intensity.push(self.intensity[i]);
        }
        PointCloud { points, intensity }
    }
}

/// Project `selection` through `directions`, scaling by `distances`.
///
/// `point[i] = directions[selection[i]] * distances[i]`. The selection may
/// repeat channels; nothing is filtered.
pub fn to_point_cloud(
    selection: &[u32],
    distances: &[f32],
    directions: &DirectionTable,
) -> Result<Points, Error> {
    check_len("distances", selection.len(), distances.len())?;

    let mut points = Points::with_capacity(selection.len());
    project_into(&mut points, selection, distances, directions, 0, directions.len())?;
    Ok(points)
}

/// Project through the block `[offset, offset + limit)` of `directions`.
fn project_into(
    points: &mut Points,
    selection: &[u32],
    distances: &[f32],
    directions: &DirectionTable,
    offset: usize,
    limit: usize,
) -> Result<(), Error> {
    let vectors = directions.vectors();
    for (&channel, &distance) in selection.iter().zip(distances) {
        if channel as usize >= limit {
            return Err(Error::IndexOutOfBounds {
                index: channel,
                len: limit,
            });
        }
        let row = vectors.row(offset + channel as usize);
        points.push(row[0] * distance, row[1] * distance, row[2] * distance);
    }
    Ok(())
}

/// Triangle indices for `n` quads laid out in corner blocks of `n`.
pub fn generate_quads_indices(n: usize) -> Vec<u32> {
    let n = n as u32;
    let mut indices = Vec::with_capacity(6 * n as usize);
    for i in 0..n {
        indices.extend_from_slice(&[i, i + n, i + 2 * n, i, i + 2 * n, i + 3 * n]);
    }
    indices
}

/// Selection index of the echo a triangle was built from.
///
/// Must stay in step with [`generate_quads_indices`], whose triangles both
/// start at the quad's first-corner vertex.
#[inline]
pub fn triangle_to_echo_index(triangle: [u32; 3]) -> usize {
    triangle[0] as usize
}

/// Repeat a per-quad scalar once per corner block.
pub fn quad_stack<T: Copy>(scalars: &[T]) -> Vec<T> {
    let mut stacked = Vec::with_capacity(QUAD_CORNERS * scalars.len());
    for _ in 0..QUAD_CORNERS {
        stacked.extend_from_slice(scalars);
    }
    stacked
}

/// Build the quad mesh of the selected echoes.
///
/// `v` and `h` are the channel counts the quad table was built for.
pub fn to_quad_cloud(
    selection: &[u32],
    distances: &[f32],
    amplitudes: &[f32],
    quad_directions: &QuadDirectionTable,
    v: u32,
    h: u32,
) -> Result<QuadMesh, Error> {
    let k = selection.len();
    check_len("distances", k, distances.len())?;
    check_len("amplitudes", k, amplitudes.len())?;

    let n = v as usize * h as usize;
    check_len("quad directions", QUAD_CORNERS * n, quad_directions.table().len())?;

    let mut vertices = Points::with_capacity(QUAD_CORNERS * k);
    for corner in 0..QUAD_CORNERS {
        project_into(
            &mut vertices,
            selection,
            distances,
            quad_directions.table(),
            corner * n,
            n,
        )?;
    }

    Ok(QuadMesh {
        vertices,
        intensity: quad_stack(amplitudes),
        indices: generate_quads_indices(k),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        angles::{AngleMode, build_grid},
        directions::{directions, quad_directions},
        lidar::SensorSpecs,
    };

    fn specs() -> SensorSpecs {
        SensorSpecs::new(8, 32, 20.0, 30.0).unwrap()
    }

    #[test]
    fn test_point_cloud_scaling() {
        let specs = specs();
        let table = directions(&build_grid(&specs, &AngleMode::Regular).unwrap());

        let selection = [0u32, 17, 17, 255];
        let distances = [1.0f32, 2.0, 4.0, 10.0];
        let points = to_point_cloud(&selection, &distances, &table).unwrap();
        assert_eq!(points.len(), selection.len());

        for (i, (&s, &d)) in selection.iter().zip(&distances).enumerate() {
            let dir = table.get(s as usize).unwrap();
            let p = points.get(i).unwrap();
            for k in 0..3 {
                assert!((p[k] - dir[k] * d).abs() < 1e-6);
            }
            let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((r - d).abs() < 1e-4);
        }
    }

    #[test]
    fn test_point_cloud_empty() {
        let table = directions(&build_grid(&specs(), &AngleMode::Regular).unwrap());
        let points = to_point_cloud(&[], &[], &table).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_point_cloud_errors() {
        let table = directions(&build_grid(&specs(), &AngleMode::Regular).unwrap());

        assert!(matches!(
            to_point_cloud(&[0, 1], &[1.0], &table),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            to_point_cloud(&[0, 256], &[1.0, 1.0], &table),
            Err(Error::IndexOutOfBounds { index: 256, len: 256 })
        ));
    }

    #[test]
    fn test_quads_indices() {
        assert_eq!(
            generate_quads_indices(2),
            vec![0, 2, 4, 0, 4, 6, 1, 3, 5, 1, 5, 7]
        );
        assert!(generate_quads_indices(0).is_empty());
    }

    #[test]
    fn test_quad_stack() {
        assert_eq!(quad_stack(&[1, 2]), vec![1, 2, 1, 2, 1, 2, 1, 2]);
    }

    #[test]
    fn test_quad_mesh_shapes_and_round_trip() {
        let specs = specs();
        let quads = quad_directions(&specs, &AngleMode::Regular).unwrap();

        let selection = [3u32, 100, 100, 42, 255];
        let distances = [1.0f32, 2.0, 3.0, 4.0, 5.0];
        let amplitudes = [0.1f32, 0.2, 0.3, 0.4, 0.5];
        let k = selection.len();

        let mesh = to_quad_cloud(&selection, &distances, &amplitudes, &quads, specs.v(), specs.h())
            .unwrap();
        assert_eq!(mesh.vertices.len(), 4 * k);
        assert_eq!(mesh.intensity.len(), 4 * k);
        assert_eq!(mesh.indices.len(), 6 * k);
        assert_eq!(mesh.n_quads(), k);
        assert_eq!(mesh.n_triangles(), 2 * k);

        for t in 0..mesh.n_triangles() {
            let triangle = mesh.triangle(t).unwrap();
            let echo = triangle_to_echo_index(triangle);
            assert_eq!(echo, t / 2);
            // All vertices of the triangle belong to the same quad.
            for &vertex in &triangle {
                assert_eq!(vertex as usize % k, echo);
                assert_eq!(mesh.intensity[vertex as usize], amplitudes[echo]);
            }
        }
    }

    #[test]
    fn test_quad_mesh_vertices() {
        let specs = specs();
        let quads = quad_directions(&specs, &AngleMode::Regular).unwrap();
        let n = specs.n_channels();

        let mesh = to_quad_cloud(&[7, 9], &[2.0, 3.0], &[1.0, 1.0], &quads, 8, 32).unwrap();
        for corner in 0..4 {
            for (i, (&s, &d)) in [7usize, 9].iter().zip(&[2.0f32, 3.0]).enumerate() {
                let dir = quads.table().get(corner * n + s).unwrap();
                let p = mesh.vertices.get(corner * 2 + i).unwrap();
                for k in 0..3 {
                    assert!((p[k] - dir[k] * d).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_quad_mesh_winding_is_consistent() {
        let specs = specs();
        let quads = quad_directions(&specs, &AngleMode::Regular).unwrap();
        let selection: Vec<u32> = (0..specs.n_channels() as u32).collect();
        let distances = vec![5.0f32; selection.len()];
        let amplitudes = vec![1.0f32; selection.len()];
        let mesh = to_quad_cloud(&selection, &distances, &amplitudes, &quads, 8, 32).unwrap();

        // Every triangle normal faces the same side relative to the sensor.
        let mut signs = Vec::new();
        for t in 0..mesh.n_triangles() {
            let [a, b, c] = mesh
                .triangle(t)
                .unwrap()
                .map(|i| mesh.vertices.get(i as usize).unwrap());
            let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let w = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            let normal = [
                u[1] * w[2] - u[2] * w[1],
                u[2] * w[0] - u[0] * w[2],
                u[0] * w[1] - u[1] * w[0],
            ];
            let dot = normal[0] * a[0] + normal[1] * a[1] + normal[2] * a[2];
            signs.push(dot > 0.0);
        }
        assert!(signs.iter().all(|&s| s == signs[0]));
    }

    #[test]
    fn test_quad_mesh_errors() {
        let specs = specs();
        let quads = quad_directions(&specs, &AngleMode::Regular).unwrap();

        assert!(matches!(
            to_quad_cloud(&[0, 1], &[1.0, 1.0], &[1.0], &quads, 8, 32),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            to_quad_cloud(&[0], &[1.0, 1.0], &[1.0], &quads, 8, 32),
            Err(Error::ShapeMismatch { .. })
        ));
        // Indices past v * h must not leak into the next corner block.
        assert!(matches!(
            to_quad_cloud(&[256], &[1.0], &[1.0], &quads, 8, 32),
            Err(Error::IndexOutOfBounds { index: 256, len: 256 })
        ));
        // Table built for other specs.
        assert!(matches!(
            to_quad_cloud(&[0], &[1.0], &[1.0], &quads, 8, 16),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_triangle_list() {
        let specs = SensorSpecs::new(2, 2, 90.0, 90.0).unwrap();
        let quads = quad_directions(&specs, &AngleMode::Regular).unwrap();
        let mesh = to_quad_cloud(&[1], &[2.0], &[0.7], &quads, 2, 2).unwrap();

        let list = mesh.triangle_list();
        assert_eq!(list.len(), 6);
        assert!(list.intensity.iter().all(|&a| a == 0.7));
        assert_eq!(list.points.get(0), mesh.vertices.get(0));
        assert_eq!(list.points.get(5), mesh.vertices.get(3));
    }

    #[test]
    fn test_lca3_rotation() {
        let mut cloud = PointCloud::new(
            Points {
                x: vec![1.0, 0.0],
                y: vec![0.0, 2.0],
                z: vec![3.0, 4.0],
            },
            vec![0.5, 0.5],
        )
        .unwrap();

        cloud.rotate_for(HardwareVariant::Lca2);
        assert_eq!(cloud.points.get(0), Some([1.0, 0.0, 3.0]));

        cloud.rotate_for(HardwareVariant::Lca3);
        assert_eq!(cloud.points.get(0), Some([0.0, -1.0, 3.0]));
        assert_eq!(cloud.points.get(1), Some([2.0, 0.0, 4.0]));
    }
}
