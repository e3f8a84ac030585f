// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Per-unit vertical calibration tables.
//!
//! Some units scan the vertical axis at non-uniform angles. Their calibration
//! file lists one 16-bit code per vertical channel, written in hexadecimal,
//! one per line, top to bottom for channels `0..v`. A code maps to an angle
//! through `code / 65536 * v_fov - v_fov / 2` degrees.

use crate::lidar::{Error, SensorSpecs};
use std::path::Path;
use tracing::{debug, instrument};

/// Full scale of a calibration code.
const CODE_RANGE: f64 = 65536.0;

/// Raw elevation codes read from a calibration file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalibrationTable {
    codes: Vec<u16>,
}

impl CalibrationTable {
    /// Wrap already decoded codes.
    pub fn from_codes(codes: Vec<u16>) -> Self {
        Self { codes }
    }

    /// Read and parse a calibration file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::CalibrationLoad(format!("cannot read {}: {}", path.display(), err))
        })?;
        let table = Self::parse(&text)?;
        debug!("loaded {} calibration codes", table.len());
        Ok(table)
    }

    /// Parse the text form of a calibration file.
    ///
    /// Blank lines are skipped and an optional `0x` prefix is accepted.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut codes = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let digits = line
                .strip_prefix("0x")
                .or_else(|| line.strip_prefix("0X"))
                .unwrap_or(line);
            let code = u16::from_str_radix(digits, 16).map_err(|err| {
                Error::CalibrationLoad(format!(
                    "line {}: invalid code {:?}: {}",
                    line_no + 1,
                    line,
                    err
                ))
            })?;
            codes.push(code);
        }
        Ok(Self { codes })
    }

    /// Number of codes in the table.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// The raw codes in file order.
    pub fn codes(&self) -> &[u16] {
        &self.codes
    }

    /// Elevation angles in radians for the first `v` channels of `specs`.
    ///
    /// `scale` multiplies the angles after conversion to radians. Fails with
    /// [`Error::CalibrationLoad`] when the table holds fewer than `v` codes.
    pub fn elevations(&self, specs: &SensorSpecs, scale: f64) -> Result<Vec<f64>, Error> {
        let v = specs.v() as usize;
        if self.codes.len() < v {
            return Err(Error::CalibrationLoad(format!(
                "calibration holds {} codes but the sensor has {} vertical channels",
                self.codes.len(),
                v
            )));
        }

        let v_fov = specs.v_fov();
        Ok(self.codes[..v]
            .iter()
            .map(|&code| {
                let degrees = code as f64 / CODE_RANGE * v_fov - v_fov / 2.0;
                degrees.to_radians() * scale
            })
            .collect())
    }
}
