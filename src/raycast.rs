// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Dense ray oversampling for simulation.
//!
//! A simulator casts `density²` rays per physical channel to approximate the
//! channel's solid angle, then folds the hits back to channel resolution. The
//! dense grid has `v * density` rows and `h * density` columns spanning the
//! full field of view, endpoints included. Dense ray `i` belongs to channel
//!
//! ```text
//! ((i / (h * density)) / density) * h + (i % (h * density)) / density
//! ```
//!
//! so each channel owns a `density × density` block of the dense grid.

use crate::{
    angles::{AngleGrid, grid},
    lidar::{Error, SensorSpecs, check_len},
};
use ndarray::{Array2, ArrayView1};
use tracing::debug;

/// Dense ray grid with its mapping to physical channels.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseRayMap {
    grid: AngleGrid,
    density: usize,
    to_sparse: Vec<u32>,
    to_dense: Array2<u32>,
}

impl DenseRayMap {
    /// Build the dense grid and index maps for `specs`.
    ///
    /// Fails with [`Error::InvalidSpecs`] when `density` is zero.
    pub fn new(specs: &SensorSpecs, density: u32) -> Result<Self, Error> {
        if density == 0 {
            return Err(Error::InvalidSpecs("ray density must be positive".to_string()));
        }

        let d = density as usize;
        let v = specs.v() as usize;
        let h = specs.h() as usize;
        let v_fov = specs.v_fov().to_radians();
        let h_fov = specs.h_fov().to_radians();

        let dense_grid = grid(
            v * d,
            h * d,
            -v_fov / 2.0,
            v_fov / 2.0,
            -h_fov / 2.0,
            h_fov / 2.0,
        )?;

        let dense_cols = h * d;
        let n_dense = dense_grid.len();
        let mut to_sparse = Vec::with_capacity(n_dense);
        let mut to_dense = Array2::<u32>::zeros((v * h, d * d));
        let mut filled = vec![0usize; v * h];

        for i in 0..n_dense {
            let dense_v = (i / dense_cols) / d;
            let dense_h = (i % dense_cols) / d;
            let parent = dense_v * h + dense_h;

            to_sparse.push(parent as u32);
            to_dense[[parent, filled[parent]]] = i as u32;
            filled[parent] += 1;
        }

        debug!(
            "dense ray map: {} rays for {} channels (density {})",
            n_dense,
            v * h,
            density
        );

        Ok(Self {
            grid: dense_grid,
            density: d,
            to_sparse,
            to_dense,
        })
    }

    /// Rays per axis per channel.
    #[inline]
    pub fn density(&self) -> usize {
        self.density
    }

    /// Dense angle grid, row-major over `(v * density, h * density)`.
    #[inline]
    pub fn grid(&self) -> &AngleGrid {
        &self.grid
    }

    /// Number of dense rays.
    #[inline]
    pub fn len(&self) -> usize {
        self.to_sparse.len()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.to_sparse.is_empty()
    }

    /// Channel of every dense ray.
    #[inline]
    pub fn to_sparse(&self) -> &[u32] {
        &self.to_sparse
    }

    /// Dense rays of every channel, `(v * h, density²)`, ascending per row.
    #[inline]
    pub fn to_dense(&self) -> &Array2<u32> {
        &self.to_dense
    }

    /// Channel owning dense ray `ray`.
    #[inline]
    pub fn parent(&self, ray: usize) -> Option<u32> {
        self.to_sparse.get(ray).copied()
    }

    /// Dense rays of `channel`.
    pub fn children(&self, channel: usize) -> Option<ArrayView1<'_, u32>> {
        (channel < self.to_dense.nrows()).then(|| self.to_dense.row(channel))
    }

    /// Fold per-ray distances into the nearest hit of each channel.
    ///
    /// Non-finite values count as misses; a channel without hits gets
    /// `f32::INFINITY`.
    pub fn aggregate_min(&self, values: &[f32]) -> Result<Vec<f32>, Error> {
        check_len("dense values", self.len(), values.len())?;

        let mut nearest = vec![f32::INFINITY; self.to_dense.nrows()];
        for (&channel, &value) in self.to_sparse.iter().zip(values) {
            let slot = &mut nearest[channel as usize];
            if value.is_finite() && value < *slot {
                *slot = value;
            }
        }
        Ok(nearest)
    }
}
