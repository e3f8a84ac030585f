// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Packed binary point formats.
//!
//! Point clouds and triangle lists are handed to publishers as packed records
//! matching a ROS `sensor_msgs/PointCloud2` layout:
//!
//! ```text
//! ┌───────┬───────┬───────┬───────────────┐
//! │ x:f32 │ y:f32 │ z:f32 │ intensity:f32 │
//! │ 4B    │ 4B    │ 4B    │ 4B            │
//! └───────┴───────┴───────┴───────────────┘
//! ```

use crate::{
    cloud::PointCloud,
    lidar::{Error, check_len},
};
use itertools::izip;

/// Bytes per packed point.
pub const POINT_STRIDE: usize = 16;

/// Format point cloud data into the 16-byte packed format.
///
/// # Arguments
///
/// * `x`, `y`, `z` - Coordinate arrays
/// * `intensity` - Intensity array
///
/// Fails with [`Error::ShapeMismatch`] if the arrays differ in length.
pub fn format_points_16byte(
    x: &[f32],
    y: &[f32],
    z: &[f32],
    intensity: &[f32],
) -> Result<Vec<u8>, Error> {
    let n_points = x.len();
    check_len("y", n_points, y.len())?;
    check_len("z", n_points, z.len())?;
    check_len("intensity", n_points, intensity.len())?;

    let mut data = vec![0u8; POINT_STRIDE * n_points];
    format_points_16byte_into(x, y, z, intensity, &mut data);
    Ok(data)
}

/// Format a [`PointCloud`] into the 16-byte packed format.
pub fn format_cloud(cloud: &PointCloud) -> Result<Vec<u8>, Error> {
    format_points_16byte(
        &cloud.points.x,
        &cloud.points.y,
        &cloud.points.z,
        &cloud.intensity,
    )
}

/// Format point cloud data into a pre-allocated buffer (16-byte format).
///
/// Callers check that every array has `x.len()` entries and that `out` holds
/// `16 * x.len()` bytes.
#[inline(never)]
fn format_points_16byte_into(
    x: &[f32],
    y: &[f32],
    z: &[f32],
    intensity: &[f32],
    out: &mut [u8],
) {
    let records = out.chunks_exact_mut(POINT_STRIDE);
    for (record, x, y, z, intensity) in izip!(records, x, y, z, intensity) {
        record[0..4].copy_from_slice(&x.to_le_bytes());
        record[4..8].copy_from_slice(&y.to_le_bytes());
        record[8..12].copy_from_slice(&z.to_le_bytes());
        record[12..16].copy_from_slice(&intensity.to_le_bytes());
    }
}
