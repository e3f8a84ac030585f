// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Angle grids for the spherical projection model.
//!
//! A grid holds one `(theta_x, theta_y)` pair per channel, in radians:
//! `theta_x` is the elevation along the vertical axis (`v` channels) and
//! `theta_y` the azimuth along the horizontal axis (`h` channels). Pairs are
//! stored row-major, so channel `v_i * h + h_i` sits at row `v_i`, column
//! `h_i`.
//!
//! ```text
//!  theta_x
//!    ^   (v-1, 0) ... (v-1, h-1)    +v_fov/2
//!    |      ...          ...
//!    |   (0, 0)   ...  (0, h-1)     -v_fov/2
//!    +------------------------> theta_y
//!     -h_fov/2          +h_fov/2
//! ```
//!
//! Regular grids sample each axis at cell centers. Calibrated grids replace the
//! elevations with the per-row angles of a [`CalibrationTable`].

use crate::{
    calibration::CalibrationTable,
    lidar::{Error, SensorSpecs},
};
use ndarray::{Array2, ArrayView1};
use std::path::Path;

/// How elevations are sampled.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum AngleMode {
    /// Uniform cell-centered sampling on both axes.
    #[default]
    Regular,
    /// Elevations from a calibration table, scaled after conversion to radians.
    Calibrated { table: CalibrationTable, scale: f64 },
}

impl AngleMode {
    /// Load a calibration file and wrap it as a calibrated mode.
    pub fn calibrated_from_file<P: AsRef<Path>>(path: P, scale: f64) -> Result<Self, Error> {
        Ok(AngleMode::Calibrated {
            table: CalibrationTable::load(path)?,
            scale,
        })
    }
}

/// Row-major grid of `(theta_x, theta_y)` pairs in radians.
#[derive(Clone, Debug, PartialEq)]
pub struct AngleGrid {
    angles: Array2<f32>,
}

impl AngleGrid {
    /// Outer product of per-row elevations and per-column azimuths.
    pub fn from_axes(elevations: &[f64], azimuths: &[f64]) -> Result<Self, Error> {
        let mut data = Vec::with_capacity(elevations.len() * azimuths.len() * 2);
        for &theta_x in elevations {
            for &theta_y in azimuths {
                data.push(theta_x as f32);
                data.push(theta_y as f32);
            }
        }
        let angles = Array2::from_shape_vec((elevations.len() * azimuths.len(), 2), data)?;
        Ok(Self { angles })
    }

    /// Number of channels in the grid.
    #[inline]
    pub fn len(&self) -> usize {
        self.angles.nrows()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.angles.nrows() == 0
    }

    /// The `(n, 2)` angle array.
    #[inline]
    pub fn angles(&self) -> &Array2<f32> {
        &self.angles
    }

    /// Elevation column.
    pub fn theta_x(&self) -> ArrayView1<'_, f32> {
        self.angles.column(0)
    }

    /// Azimuth column.
    pub fn theta_y(&self) -> ArrayView1<'_, f32> {
        self.angles.column(1)
    }

    /// Angle pair for channel `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<(f32, f32)> {
        (index < self.len()).then(|| (self.angles[[index, 0]], self.angles[[index, 1]]))
    }
}

/// `count` evenly spaced values from `start` to `stop` inclusive.
///
/// A single sample sits at `start`.
pub(crate) fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Cell-centered samples over a field of view given in degrees.
pub(crate) fn centered_axis(count: u32, fov_degrees: f64) -> Vec<f64> {
    let fov = fov_degrees.to_radians();
    let offset = fov / count as f64 / 2.0;
    linspace(-fov / 2.0 + offset, fov / 2.0 - offset, count as usize)
}

/// Grid of `count` samples per axis spanning `[from, to]` inclusive.
pub(crate) fn grid(
    v: usize,
    h: usize,
    v_from: f64,
    v_to: f64,
    h_from: f64,
    h_to: f64,
) -> Result<AngleGrid, Error> {
    AngleGrid::from_axes(&linspace(v_from, v_to, v), &linspace(h_from, h_to, h))
}

/// Per-row elevations for `mode`, in radians.
pub(crate) fn elevations(specs: &SensorSpecs, mode: &AngleMode) -> Result<Vec<f64>, Error> {
    match mode {
        AngleMode::Regular => Ok(centered_axis(specs.v(), specs.v_fov())),
        AngleMode::Calibrated { table, scale } => table.elevations(specs, *scale),
    }
}

/// Build the angle grid of every channel of `specs`.
pub fn build_grid(specs: &SensorSpecs, mode: &AngleMode) -> Result<AngleGrid, Error> {
    let azimuths = centered_axis(specs.h(), specs.h_fov());
    AngleGrid::from_axes(&elevations(specs, mode)?, &azimuths)
}
