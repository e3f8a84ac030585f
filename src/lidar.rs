// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Common LiDAR types: sensor specifications, point storage and errors.
//!
//! Every table in this crate derives from a [`SensorSpecs`]. The specs are
//! validated once at construction and never change afterwards, so the tables
//! built from them can be shared freely between frames.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Angular geometry of a LeddarTech sensor.
///
/// `v` and `h` are the vertical and horizontal channel counts, `v_fov` and
/// `h_fov` the matching fields of view in degrees. Channel `i` sits at row
/// `i / h` and column `i % h`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSpecs", into = "RawSpecs")]
pub struct SensorSpecs {
    v: u32,
    h: u32,
    v_fov: f64,
    h_fov: f64,
}

/// Unvalidated mirror of [`SensorSpecs`] used by serde.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct RawSpecs {
    v: u32,
    h: u32,
    v_fov: f64,
    h_fov: f64,
}

impl SensorSpecs {
    /// Validate and build a new set of specs.
    ///
    /// Fails with [`Error::InvalidSpecs`] when a channel count is zero or a
    /// field of view lies outside `(0, 180]` degrees.
    pub fn new(v: u32, h: u32, v_fov: f64, h_fov: f64) -> Result<Self, Error> {
        if v == 0 || h == 0 {
            return Err(Error::InvalidSpecs(format!(
                "channel counts must be positive, got v={} h={}",
                v, h
            )));
        }
        for (name, fov) in [("v_fov", v_fov), ("h_fov", h_fov)] {
            // NaN fails this comparison as well.
            if !(fov > 0.0 && fov <= 180.0) {
                return Err(Error::InvalidSpecs(format!(
                    "{} must be in (0, 180] degrees, got {}",
                    name, fov
                )));
            }
        }

        Ok(Self { v, h, v_fov, h_fov })
    }

    /// Vertical channel count.
    #[inline]
    pub fn v(&self) -> u32 {
        self.v
    }

    /// Horizontal channel count.
    #[inline]
    pub fn h(&self) -> u32 {
        self.h
    }

    /// Vertical field of view in degrees.
    #[inline]
    pub fn v_fov(&self) -> f64 {
        self.v_fov
    }

    /// Horizontal field of view in degrees.
    #[inline]
    pub fn h_fov(&self) -> f64 {
        self.h_fov
    }

    /// Total number of channels, `v * h`.
    #[inline]
    pub fn n_channels(&self) -> usize {
        self.v as usize * self.h as usize
    }
}

impl fmt::Display for SensorSpecs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}x{} channels, {}°x{}° fov",
            self.v, self.h, self.v_fov, self.h_fov
        )
    }
}

impl TryFrom<RawSpecs> for SensorSpecs {
    type Error = Error;

    fn try_from(raw: RawSpecs) -> Result<Self, Self::Error> {
        SensorSpecs::new(raw.v, raw.h, raw.v_fov, raw.h_fov)
    }
}

impl From<SensorSpecs> for RawSpecs {
    fn from(specs: SensorSpecs) -> Self {
        RawSpecs {
            v: specs.v,
            h: specs.h,
            v_fov: specs.v_fov,
            h_fov: specs.h_fov,
        }
    }
}

/// 3D points in a structure-of-arrays layout.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Points {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
}

impl Points {
    /// Create a zero-filled structure holding `len` points.
    pub fn new(len: usize) -> Self {
        Self {
            x: vec![0.0; len],
            y: vec![0.0; len],
            z: vec![0.0; len],
        }
    }

    /// Create an empty structure with room for `capacity` points.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            z: Vec::with_capacity(capacity),
        }
    }

    /// Append a point.
    #[inline]
    pub fn push(&mut self, x: f32, y: f32, z: f32) {
        self.x.push(x);
        self.y.push(y);
        self.z.push(z);
    }

    /// Get point `index` as an `[x, y, z]` triple.
    #[inline]
    pub fn get(&self, index: usize) -> Option<[f32; 3]> {
        Some([
            *self.x.get(index)?,
            *self.y.get(index)?,
            *self.z.get(index)?,
        ])
    }

    /// Get the current number of points
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Common error type for projection operations.
#[derive(Debug)]
pub enum Error {
    /// Channel counts or fields of view out of range
    InvalidSpecs(String),
    /// Parallel arrays of unequal length
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Channel index outside the direction table
    IndexOutOfBounds { index: u32, len: usize },
    /// Calibration file missing, malformed or too short
    CalibrationLoad(String),
    /// I/O error (file operations)
    Io(std::io::Error),
    /// Shape error from ndarray operations
    Shape(ndarray::ShapeError),
    /// Echo record bytes that cannot be decoded
    InvalidPacket(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidSpecs(msg) => write!(f, "invalid sensor specs: {}", msg),
            Error::ShapeMismatch {
                what,
                expected,
                actual,
            } => write!(
                f,
                "shape mismatch: {} has {} entries, expected {}",
                what, actual, expected
            ),
            Error::IndexOutOfBounds { index, len } => {
                write!(f, "channel index {} out of bounds for {} channels", index, len)
            }
            Error::CalibrationLoad(msg) => write!(f, "calibration load error: {}", msg),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Shape(err) => write!(f, "shape error: {}", err),
            Error::InvalidPacket(msg) => write!(f, "invalid packet: {}", msg),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<ndarray::ShapeError> for Error {
    fn from(err: ndarray::ShapeError) -> Self {
        Error::Shape(err)
    }
}

/// Check that a parallel array has the expected length.
#[inline]
pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), Error> {
    if expected != actual {
        return Err(Error::ShapeMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}
