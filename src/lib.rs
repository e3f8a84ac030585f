// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! LeddarTech echo projection library
//!
//! This library turns the per-channel echoes of a LeddarTech sensor into 3D
//! point clouds and quad meshes using the sensor's spherical projection model.
//!
//! # Architecture
//!
//! Tables are built once per sensor and only read afterwards:
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────────────┐
//! │ SensorSpecs │ ──► │  AngleGrid  │ ──► │ DirectionTable       │
//! │ (+ calib.)  │     │ (v*h pairs) │     │ QuadDirectionTable   │
//! └─────────────┘     └─────────────┘     └──────────────────────┘
//!                                                    │
//!                      ┌─────────────┐               ▼
//!                      │ EchoPackage │ ──► to_point_cloud / to_quad_cloud
//!                      │ (per frame) │
//!                      └─────────────┘
//! ```
//!
//! [`ProjectionSession`] bundles the tables of one sensor. [`DenseRayMap`] is
//! independent and serves simulators that oversample each channel.
//!
//! # Modules
//!
//! - [`lidar`]: Sensor specs, point storage and errors
//! - [`angles`]: Regular and calibrated angle grids
//! - [`calibration`]: Per-unit vertical calibration files
//! - [`directions`]: Direction and quad corner tables
//! - [`cloud`]: Point cloud and quad mesh projection
//! - [`raycast`]: Dense ray oversampling maps
//! - [`echoes`]: Echo package codec
//! - [`formats`]: Packed binary point formats
//! - [`session`]: Per-sensor table cache
//!
//! # Example
//!
//! ```
//! use leddar_clouds::{
//!     AngleMode, EchoMetadata, ProjectionSession, SensorSpecs, to_echo_package,
//! };
//!
//! let specs = SensorSpecs::new(8, 32, 20.0, 30.0)?;
//! let session = ProjectionSession::new(specs, AngleMode::Regular)?;
//!
//! let package = to_echo_package(
//!     vec![0, 17],
//!     vec![1.0, 2.5],
//!     vec![0.4, 0.8],
//!     None,
//!     None,
//!     EchoMetadata::new(specs),
//! )?;
//!
//! let cloud = session.point_cloud(&package)?;
//! assert_eq!(cloud.len(), 2);
//!
//! let mesh = session.quad_mesh(&package)?;
//! assert_eq!(mesh.indices.len(), 12);
//! # Ok::<(), leddar_clouds::Error>(())
//! ```

pub mod angles;
pub mod calibration;
pub mod cloud;
pub mod directions;
pub mod echoes;
pub mod formats;
pub mod lidar;
pub mod raycast;
pub mod session;

// Re-exports for convenience
pub use angles::{AngleGrid, AngleMode, build_grid};
pub use calibration::CalibrationTable;
pub use cloud::{
    HardwareVariant, PointCloud, QuadMesh, generate_quads_indices, to_point_cloud,
    to_quad_cloud, triangle_to_echo_index,
};
pub use directions::{DirectionTable, QuadDirectionTable, directions, quad_directions};
pub use echoes::{EchoMetadata, EchoPackage, EchoSample, RawEcho, to_echo_package};
pub use lidar::{Error, Points, SensorSpecs};
pub use raycast::DenseRayMap;
pub use session::ProjectionSession;
