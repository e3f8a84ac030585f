// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Per-connection projection tables.
//!
//! A [`ProjectionSession`] builds the direction tables once when a sensor
//! connects and reuses them for every echo package of that sensor. The
//! tables are never mutated after construction, so a session can be shared
//! between an acquisition thread and on-demand queries behind an `Arc`
//! without locking.

use crate::{
    angles::{AngleGrid, AngleMode, build_grid},
    cloud::{PointCloud, QuadMesh, to_point_cloud, to_quad_cloud},
    directions::{DirectionTable, QuadDirectionTable, directions, quad_directions},
    echoes::EchoPackage,
    lidar::{Error, SensorSpecs},
};
use tracing::{info, instrument, trace};

/// Cached projection tables for one sensor.
#[derive(Clone, Debug)]
pub struct ProjectionSession {
    specs: SensorSpecs,
    mode: AngleMode,
    grid: AngleGrid,
    directions: DirectionTable,
    quad_directions: QuadDirectionTable,
}

impl ProjectionSession {
    /// Build every table for `specs`.
    #[instrument(skip_all, fields(specs = %specs))]
    pub fn new(specs: SensorSpecs, mode: AngleMode) -> Result<Self, Error> {
        let grid = build_grid(&specs, &mode)?;
        let directions = directions(&grid);
        let quad_directions = quad_directions(&specs, &mode)?;

        info!(
            "projection tables ready: {} channels, {} mode",
            grid.len(),
            match mode {
                AngleMode::Regular => "regular",
                AngleMode::Calibrated { .. } => "calibrated",
            }
        );

        Ok(Self {
            specs,
            mode,
            grid,
            directions,
            quad_directions,
        })
    }

    /// Geometry the tables were built for.
    pub fn specs(&self) -> &SensorSpecs {
        &self.specs
    }

    /// Sampling mode the tables were built with.
    pub fn mode(&self) -> &AngleMode {
        &self.mode
    }

    /// Channel angles.
    pub fn grid(&self) -> &AngleGrid {
        &self.grid
    }

    /// Channel directions.
    pub fn directions(&self) -> &DirectionTable {
        &self.directions
    }

    /// Quad corner directions.
    pub fn quad_directions(&self) -> &QuadDirectionTable {
        &self.quad_directions
    }

    fn check_specs(&self, package: &EchoPackage) -> Result<(), Error> {
        if *package.specs() != self.specs {
            return Err(Error::InvalidSpecs(format!(
                "echo package built for {} but session uses {}",
                package.specs(),
                self.specs
            )));
        }
        Ok(())
    }

    /// Point cloud of the valid echoes of `package`.
    #[instrument(level = "trace", skip_all, fields(echoes = package.len()))]
    pub fn point_cloud(&self, package: &EchoPackage) -> Result<PointCloud, Error> {
        self.check_specs(package)?;
        let valid = package.valid();
        let points = to_point_cloud(valid.indices(), valid.distances(), &self.directions)?;
        trace!("projected {} of {} echoes", points.len(), package.len());
        PointCloud::new(points, valid.amplitudes().to_vec())
    }

    /// Quad mesh of the valid echoes of `package`.
    #[instrument(level = "trace", skip_all, fields(echoes = package.len()))]
    pub fn quad_mesh(&self, package: &EchoPackage) -> Result<QuadMesh, Error> {
        self.check_specs(package)?;
        let valid = package.valid();
        let mesh = to_quad_cloud(
            valid.indices(),
            valid.distances(),
            valid.amplitudes(),
            &self.quad_directions,
            self.specs.v(),
            self.specs.h(),
        )?;
        trace!("meshed {} quads", mesh.n_quads());
        Ok(mesh)
    }
}
