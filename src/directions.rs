// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Unit direction vectors for every channel.
//!
//! # Axis convention
//!
//! Directions follow the camera axis system. `z` points forward out of the
//! sensor, `x` to the right and `y` down:
//!
//! ```text
//!      z (into the page)
//!     /
//!    +-------> x
//!    |
//!    |
//!    v y
//! ```
//!
//! The azimuth `theta_y` rotates in the x–z plane and the elevation `theta_x`
//! in the y–z plane, positive elevation pointing up (towards `-y`):
//!
//! ```text
//! x = sin(theta_y)
//! y = -sin(theta_x) * cos(theta_y)
//! z = cos(theta_x) * cos(theta_y)
//! ```
//!
//! Point cloud and mesh consumers rely on this convention. Sensors whose scan
//! axes are swapped are handled after projection, see
//! [`crate::cloud::HardwareVariant`].

use crate::{
    angles::{AngleGrid, AngleMode, centered_axis, elevations},
    lidar::{Error, SensorSpecs},
};
use ndarray::{Array2, ArrayView2, s};
use tracing::debug;

/// Number of corners of a quad.
pub const QUAD_CORNERS: usize = 4;

/// Corner offsets as (vertical, horizontal) signs, in table order:
/// (-v,-h), (+v,-h), (+v,+h), (-v,+h).
const CORNER_SIGNS: [(f64, f64); QUAD_CORNERS] =
    [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

/// Convert one angle pair into a unit vector.
#[inline]
pub fn direction(theta_x: f32, theta_y: f32) -> [f32; 3] {
    let (sin_x, cos_x) = (theta_x as f64).sin_cos();
    let (sin_y, cos_y) = (theta_y as f64).sin_cos();
    [
        sin_y as f32,
        (-sin_x * cos_y) as f32,
        (cos_x * cos_y) as f32,
    ]
}

/// Table of `(n, 3)` unit vectors, one per channel.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionTable {
    vectors: Array2<f32>,
}

impl DirectionTable {
    /// Number of directions.
    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.nrows() == 0
    }

    /// The `(n, 3)` vector array.
    #[inline]
    pub fn vectors(&self) -> &Array2<f32> {
        &self.vectors
    }

    /// Direction of entry `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<[f32; 3]> {
        (index < self.len()).then(|| {
            [
                self.vectors[[index, 0]],
                self.vectors[[index, 1]],
                self.vectors[[index, 2]],
            ]
        })
    }
}

/// Convert an angle grid into directions, preserving order.
pub fn directions(grid: &AngleGrid) -> DirectionTable {
    let mut vectors = Array2::<f32>::zeros((grid.len(), 3));
    for (mut row, angles) in vectors.rows_mut().into_iter().zip(grid.angles().rows()) {
        let [x, y, z] = direction(angles[0], angles[1]);
        row[0] = x;
        row[1] = y;
        row[2] = z;
    }
    DirectionTable { vectors }
}

/// Four direction tables, one per quad corner, stacked in corner order.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadDirectionTable {
    table: DirectionTable,
    n_channels: usize,
}

impl QuadDirectionTable {
    /// Channels per corner block (`v * h`).
    #[inline]
    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// All `4 * v * h` directions.
    #[inline]
    pub fn table(&self) -> &DirectionTable {
        &self.table
    }

    /// Directions of one corner block, `None` if `corner >= 4`.
    pub fn corner(&self, corner: usize) -> Option<ArrayView2<'_, f32>> {
        if corner >= QUAD_CORNERS {
            return None;
        }
        let start = corner * self.n_channels;
        Some(
            self.table
                .vectors
                .slice(s![start..start + self.n_channels, ..]),
        )
    }
}

/// Lower and upper bound per row or column of an axis.
struct AxisBounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl AxisBounds {
    fn centered(samples: Vec<f64>, cell: f64) -> Self {
        let half = cell / 2.0;
        Self {
            lower: samples.iter().map(|a| a - half).collect(),
            upper: samples.iter().map(|a| a + half).collect(),
        }
    }

    /// Row angle to row angle plus the step to the next row. The last row
    /// reuses the previous step.
    fn forward(samples: Vec<f64>, fallback_cell: f64) -> Self {
        let n = samples.len();
        let upper = (0..n)
            .map(|i| {
                let step = if i + 1 < n {
                    samples[i + 1] - samples[i]
                } else if n >= 2 {
                    samples[n - 1] - samples[n - 2]
                } else {
                    fallback_cell
                };
                samples[i] + step
            })
            .collect();
        Self {
            lower: samples,
            upper,
        }
    }

    fn pick(&self, sign: f64) -> &[f64] {
        if sign < 0.0 { &self.lower } else { &self.upper }
    }
}

/// Build the quad corner directions of every channel of `specs`.
///
/// In regular mode each corner is the channel's cell center shifted by half a
/// cell on both axes. In calibrated mode the vertical edges of row `r` are the
/// calibrated angle of `r` and the angle reached by stepping forward to row
/// `r + 1`.
pub fn quad_directions(
    specs: &SensorSpecs,
    mode: &AngleMode,
) -> Result<QuadDirectionTable, Error> {
    let v_cell = specs.v_fov().to_radians() / specs.v() as f64;
    let h_cell = specs.h_fov().to_radians() / specs.h() as f64;

    let v_bounds = match mode {
        AngleMode::Regular => AxisBounds::centered(elevations(specs, mode)?, v_cell),
        AngleMode::Calibrated { scale, .. } => {
            AxisBounds::forward(elevations(specs, mode)?, v_cell * scale)
        }
    };
    let h_bounds = AxisBounds::centered(centered_axis(specs.h(), specs.h_fov()), h_cell);

    let n_channels = specs.n_channels();
    let mut vectors = Array2::<f32>::zeros((QUAD_CORNERS * n_channels, 3));
    for (corner, &(v_sign, h_sign)) in CORNER_SIGNS.iter().enumerate() {
        let grid = AngleGrid::from_axes(v_bounds.pick(v_sign), h_bounds.pick(h_sign))?;
        let block = directions(&grid);
        let start = corner * n_channels;
        vectors
            .slice_mut(s![start..start + n_channels, ..])
            .assign(block.vectors());
    }

    debug!(
        "built {} quad corner directions for {}",
        vectors.nrows(),
        specs
    );

    Ok(QuadDirectionTable {
        table: DirectionTable { vectors },
        n_channels,
    })
}
