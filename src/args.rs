// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::{Parser, ValueEnum};
use leddar_clouds::{AngleMode, Error, HardwareVariant, SensorSpecs};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Echo record file: packed 16-byte records (index, distance, amplitude,
    /// timestamp, flag) as written by the acquisition layer.
    #[arg(env)]
    pub input: PathBuf,

    /// Sensor specs as a JSON file with keys v, h, v_fov and h_fov.  Takes
    /// precedence over the individual geometry flags.
    #[arg(long, env)]
    pub specs: Option<PathBuf>,

    /// Vertical channel count
    #[arg(long, env, default_value = "8")]
    pub v: u32,

    /// Horizontal channel count
    #[arg(long, env, default_value = "32")]
    pub h: u32,

    /// Vertical field of view in degrees
    #[arg(long, env, default_value = "20")]
    pub v_fov: f64,

    /// Horizontal field of view in degrees
    #[arg(long, env, default_value = "30")]
    pub h_fov: f64,

    /// Vertical calibration file, one hexadecimal code per line.
    #[arg(long, env)]
    pub calibration: Option<PathBuf>,

    /// Scale applied to calibrated elevations
    #[arg(long, env, default_value = "1.0")]
    pub calibration_scale: f64,

    /// Sensor family, selects the axis rotation applied to the point cloud
    #[arg(long, env, default_value = "lca2")]
    pub variant: Variant,

    /// Output file for the packed point cloud (x, y, z, intensity as f32)
    #[arg(long, env, default_value = "points.bin")]
    pub output: PathBuf,

    /// Output file for the packed triangle list of the quad mesh
    #[arg(long, env)]
    pub mesh_output: Option<PathBuf>,

    /// Application log level
    #[arg(long, env, default_value = "info")]
    pub rust_log: LevelFilter,
}

/// Command line names of [`HardwareVariant`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// LCA2: scan axis vertical
    #[default]
    Lca2,
    /// LCA3: scan axis horizontal
    Lca3,
}

impl From<Variant> for HardwareVariant {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Lca2 => HardwareVariant::Lca2,
            Variant::Lca3 => HardwareVariant::Lca3,
        }
    }
}

impl Args {
    /// Sensor specs from the JSON file if given, else from the flags.
    pub fn sensor_specs(&self) -> Result<SensorSpecs, Box<dyn std::error::Error>> {
        match &self.specs {
            Some(path) => {
                let file = std::fs::File::open(path)?;
                Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
            }
            None => Ok(SensorSpecs::new(self.v, self.h, self.v_fov, self.h_fov)?),
        }
    }

    /// Angle sampling mode, loading the calibration file if given.
    pub fn angle_mode(&self) -> Result<AngleMode, Error> {
        match &self.calibration {
            Some(path) => AngleMode::calibrated_from_file(path, self.calibration_scale),
            None => Ok(AngleMode::Regular),
        }
    }
}
