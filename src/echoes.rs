// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Echo packages exchanged with the native acquisition layer.
//!
//! An [`EchoPackage`] stores one frame of echoes as parallel arrays plus the
//! frame metadata. The acquisition layer packs each echo as a 16-byte
//! little-endian record with no padding:
//!
//! ```text
//! ┌────────────┬──────────────┬───────────────┬───────────────┬──────────┐
//! │ index: u32 │ distance:f32 │ amplitude:f32 │ timestamp:u16 │ flag:u16 │
//! │ 4B         │ 4B           │ 4B            │ 2B            │ 2B       │
//! └────────────┴──────────────┴───────────────┴───────────────┴──────────┘
//! ```
//!
//! Field names and widths are shared with the native packager and must change
//! in lock-step with it.

use crate::lidar::{Error, SensorSpecs, check_len};
use itertools::izip;
use ndarray::{Array2, ArrayView2};

/// Flag bit set on echoes the sensor reports as valid.
pub const FLAG_VALID: u16 = 0x01;

/// One echo in array-of-structs form.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct EchoSample {
    /// Channel index, `v_i * h + h_i`
    pub index: u32,
    /// Distance in meters
    pub distance: f32,
    /// Amplitude, already divided by the amplitude scale
    pub amplitude: f32,
    /// Per-echo timestamp
    pub timestamp: u16,
    /// Sensor flags, bit 0 marks a valid echo
    pub flag: u16,
}

impl EchoSample {
    /// Length of a packed record in bytes/octets.
    pub const LEN: usize = 16;

    /// Decode one packed record.
    pub fn from_le_bytes(bytes: &[u8; Self::LEN]) -> Self {
        EchoSample {
            index: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            distance: f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            amplitude: f32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            timestamp: u16::from_le_bytes([bytes[12], bytes[13]]),
            flag: u16::from_le_bytes([bytes[14], bytes[15]]),
        }
    }

    /// Encode as a packed record.
    pub fn to_le_bytes(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[0..4].copy_from_slice(&self.index.to_le_bytes());
        out[4..8].copy_from_slice(&self.distance.to_le_bytes());
        out[8..12].copy_from_slice(&self.amplitude.to_le_bytes());
        out[12..14].copy_from_slice(&self.timestamp.to_le_bytes());
        out[14..16].copy_from_slice(&self.flag.to_le_bytes());
        out
    }

    /// Check the valid flag bit.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.flag & FLAG_VALID != 0
    }
}

/// Echo as reported by the sensor, before scaling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawEcho {
    pub channel_index: u32,
    /// Distance in sensor counts
    pub distance: i32,
    /// Amplitude in sensor counts
    pub amplitude: u32,
    pub timestamp: u16,
    pub flag: u16,
}

/// Frame-level metadata of an echo package.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EchoMetadata {
    /// Frame timestamp
    pub timestamp: u64,
    /// Counts per distance unit
    pub distance_scale: f32,
    /// Counts per amplitude unit
    pub amplitude_scale: f32,
    /// LED power in percent
    pub led_power: f32,
    /// Scan direction reported by the sensor
    pub scan_direction: u32,
    /// Geometry the channel indices refer to
    pub specs: SensorSpecs,
}

impl EchoMetadata {
    /// Metadata with unit scales, full LED power and a zero timestamp.
    pub fn new(specs: SensorSpecs) -> Self {
        Self {
            timestamp: 0,
            distance_scale: 1.0,
            amplitude_scale: 1.0,
            led_power: 1.0,
            scan_direction: 0,
            specs,
        }
    }
}

/// One frame of echoes in struct-of-arrays form.
///
/// The five arrays always have the same length. Packages are only built
/// through [`to_echo_package`], [`EchoPackage::from_bytes`],
/// [`EchoPackage::from_raw`] and [`EchoPackage::from_legacy`], which all
/// enforce it.
#[derive(Clone, Debug, PartialEq)]
pub struct EchoPackage {
    indices: Vec<u32>,
    distances: Vec<f32>,
    amplitudes: Vec<f32>,
    timestamps: Vec<u16>,
    flags: Vec<u16>,
    metadata: EchoMetadata,
}

/// Assemble an echo package from parallel arrays.
///
/// Missing timestamps default to `0` and missing flags to [`FLAG_VALID`].
/// Fails with [`Error::ShapeMismatch`] if any provided array differs in
/// length from `indices`.
pub fn to_echo_package(
    indices: Vec<u32>,
    distances: Vec<f32>,
    amplitudes: Vec<f32>,
    timestamps: Option<Vec<u16>>,
    flags: Option<Vec<u16>>,
    metadata: EchoMetadata,
) -> Result<EchoPackage, Error> {
    let n = indices.len();
    check_len("distances", n, distances.len())?;
    check_len("amplitudes", n, amplitudes.len())?;

    let timestamps = match timestamps {
        Some(timestamps) => {
            check_len("timestamps", n, timestamps.len())?;
            timestamps
        }
        None => vec![0; n],
    };
    let flags = match flags {
        Some(flags) => {
            check_len("flags", n, flags.len())?;
            flags
        }
        None => vec![FLAG_VALID; n],
    };

    Ok(EchoPackage {
        indices,
        distances,
        amplitudes,
        timestamps,
        flags,
        metadata,
    })
}

impl EchoPackage {
    /// Package raw sensor echoes, dividing counts by the metadata scales.
    pub fn from_raw(echoes: &[RawEcho], metadata: EchoMetadata) -> Self {
        let mut package = Self::with_capacity(echoes.len(), metadata);
        for echo in echoes {
            package.push(EchoSample {
                index: echo.channel_index,
                distance: echo.distance as f32 / metadata.distance_scale,
                amplitude: echo.amplitude as f32 / metadata.amplitude_scale,
                timestamp: echo.timestamp,
                flag: echo.flag,
            });
        }
        package
    }

    /// Convert a package in the legacy matrix layout.
    ///
    /// `data` holds one row per echo with the timestamp, distance and
    /// amplitude in its first three columns. Scales and LED power are unit.
    /// Without an explicit `timestamp` the frame takes the timestamp of the
    /// first echo.
    pub fn from_legacy(
        indices: Vec<u32>,
        data: ArrayView2<'_, f64>,
        flags: Vec<u16>,
        timestamp: Option<u64>,
        specs: SensorSpecs,
    ) -> Result<Self, Error> {
        if data.ncols() < 3 {
            return Err(Error::ShapeMismatch {
                what: "legacy data columns",
                expected: 3,
                actual: data.ncols(),
            });
        }

        let mut metadata = EchoMetadata::new(specs);
        metadata.timestamp = match timestamp {
            Some(timestamp) => timestamp,
            None => data.get([0, 0]).map_or(0, |&t| t as u64),
        };

        to_echo_package(
            indices,
            data.column(1).iter().map(|&d| d as f32).collect(),
            data.column(2).iter().map(|&a| a as f32).collect(),
            Some(data.column(0).iter().map(|&t| t as u16).collect()),
            Some(flags),
            metadata,
        )
    }

    /// Decode a buffer of packed records.
    ///
    /// Fails with [`Error::InvalidPacket`] if the length is not a multiple of
    /// [`EchoSample::LEN`].
    pub fn from_bytes(data: &[u8], metadata: EchoMetadata) -> Result<Self, Error> {
        if data.len() % EchoSample::LEN != 0 {
            return Err(Error::InvalidPacket(format!(
                "{} bytes is not a whole number of {}-byte echo records",
                data.len(),
                EchoSample::LEN
            )));
        }

        let mut package = Self::with_capacity(data.len() / EchoSample::LEN, metadata);
        for record in data.chunks_exact(EchoSample::LEN) {
            let record = record
                .try_into()
                .map_err(|_| Error::InvalidPacket("truncated echo record".to_string()))?;
            package.push(EchoSample::from_le_bytes(record));
        }
        Ok(package)
    }

    /// Encode every echo as a packed record.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len() * EchoSample::LEN);
        for sample in self.samples() {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }

    fn with_capacity(n: usize, metadata: EchoMetadata) -> Self {
        EchoPackage {
            indices: Vec::with_capacity(n),
            distances: Vec::with_capacity(n),
            amplitudes: Vec::with_capacity(n),
            timestamps: Vec::with_capacity(n),
            flags: Vec::with_capacity(n),
            metadata,
        }
    }

    fn push(&mut self, sample: EchoSample) {
        self.indices.push(sample.index);
        self.distances.push(sample.distance);
        self.amplitudes.push(sample.amplitude);
        self.timestamps.push(sample.timestamp);
        self.flags.push(sample.flag);
    }

    /// Number of echoes.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Geometry of the package.
    pub fn specs(&self) -> &SensorSpecs {
        &self.metadata.specs
    }

    /// Channel index of every echo.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Distances in meters.
    pub fn distances(&self) -> &[f32] {
        &self.distances
    }

    pub fn amplitudes(&self) -> &[f32] {
        &self.amplitudes
    }

    pub fn timestamps(&self) -> &[u16] {
        &self.timestamps
    }

    pub fn flags(&self) -> &[u16] {
        &self.flags
    }

    /// Frame metadata.
    pub fn metadata(&self) -> &EchoMetadata {
        &self.metadata
    }

    /// Iterate over echoes in array-of-structs form.
    pub fn samples(&self) -> impl Iterator<Item = EchoSample> + '_ {
        izip!(
            &self.indices,
            &self.distances,
            &self.amplitudes,
            &self.timestamps,
            &self.flags
        )
        .map(|(&index, &distance, &amplitude, &timestamp, &flag)| EchoSample {
            index,
            distance,
            amplitude,
            timestamp,
            flag,
        })
    }

    /// Copy of the package holding only echoes flagged valid.
    pub fn valid(&self) -> EchoPackage {
        let mut package = Self::with_capacity(0, self.metadata);
        for sample in self.samples().filter(EchoSample::is_valid) {
            package.push(sample);
        }
        package
    }

    /// Amplitude image of the frame, `(v, h)`, row 0 at the top.
    ///
    /// Channel rows grow upwards, so rows are flipped to follow the image
    /// convention. Channels without an echo stay at zero; when a channel
    /// repeats, the last echo wins.
    pub fn amplitude_image(&self) -> Result<Array2<f32>, Error> {
        let specs = self.specs();
        let (v, h) = (specs.v() as usize, specs.h() as usize);
        let mut image = Array2::<f32>::zeros((v, h));
        for (&index, &amplitude) in self.indices.iter().zip(&self.amplitudes) {
            let i = index as usize;
            if i >= v * h {
                return Err(Error::IndexOutOfBounds {
                    index,
                    len: v * h,
                });
            }
            image[[v - 1 - i / h, i % h]] = amplitude;
        }
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> EchoMetadata {
        EchoMetadata::new(SensorSpecs::new(2, 3, 20.0, 30.0).unwrap())
    }

    #[test]
    fn test_defaults() {
        let package = to_echo_package(
            vec![0, 1],
            vec![1.0, 2.0],
            vec![0.5, 0.9],
            None,
            None,
            metadata(),
        )
        .unwrap();
        assert_eq!(package.timestamps, vec![0, 0]);
        assert_eq!(package.flags, vec![1, 1]);
        assert_eq!(package.len(), 2);
    }

    #[test]
    fn test_shape_mismatch() {
        let cases = [
            (vec![0, 1], vec![1.0], vec![0.5, 0.9], None, None),
            (vec![0, 1], vec![1.0, 2.0], vec![0.5], None, None),
            (vec![0, 1], vec![1.0, 2.0], vec![0.5, 0.9], Some(vec![0]), None),
            (vec![0, 1], vec![1.0, 2.0], vec![0.5, 0.9], None, Some(vec![1, 1, 1])),
        ];
        for (indices, distances, amplitudes, timestamps, flags) in cases {
            assert!(matches!(
                to_echo_package(indices, distances, amplitudes, timestamps, flags, metadata()),
                Err(Error::ShapeMismatch { .. })
            ));
        }
    }

    #[test]
    fn test_record_layout() {
        assert_eq!(std::mem::size_of::<EchoSample>(), EchoSample::LEN);

        let sample = EchoSample {
            index: 0x0102_0304,
            distance: 1.5,
            amplitude: -2.0,
            timestamp: 0x0a0b,
            flag: 0x0001,
        };
        let bytes = sample.to_le_bytes();
        assert_eq!(&bytes[0..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&bytes[4..8], &1.5f32.to_le_bytes());
        assert_eq!(&bytes[8..12], &(-2.0f32).to_le_bytes());
        assert_eq!(&bytes[12..14], &[0x0b, 0x0a]);
        assert_eq!(&bytes[14..16], &[0x01, 0x00]);
        assert_eq!(EchoSample::from_le_bytes(&bytes), sample);
    }

    #[test]
    fn test_bytes_codec() {
        let package = to_echo_package(
            vec![5, 2, 0],
            vec![1.0, 2.5, 3.0],
            vec![10.0, 20.0, 30.0],
            Some(vec![7, 8, 9]),
            Some(vec![1, 0, 3]),
            metadata(),
        )
        .unwrap();

        let bytes = package.to_bytes();
        assert_eq!(bytes.len(), 3 * EchoSample::LEN);
        assert_eq!(EchoPackage::from_bytes(&bytes, metadata()).unwrap(), package);

        assert!(matches!(
            EchoPackage::from_bytes(&bytes[..20], metadata()),
            Err(Error::InvalidPacket(_))
        ));
    }

    #[test]
    fn test_valid_filter() {
        let package = to_echo_package(
            vec![0, 1, 2, 3],
            vec![1.0, 2.0, 3.0, 4.0],
            vec![0.1, 0.2, 0.3, 0.4],
            None,
            Some(vec![1, 0, 3, 2]),
            metadata(),
        )
        .unwrap();

        let valid = package.valid();
        assert_eq!(valid.indices, vec![0, 2]);
        assert_eq!(valid.distances, vec![1.0, 3.0]);
        assert_eq!(valid.flags, vec![1, 3]);
        assert_eq!(valid.metadata, package.metadata);
    }

    #[test]
    fn test_from_raw_scales() {
        let mut meta = metadata();
        meta.distance_scale = 65536.0;
        meta.amplitude_scale = 64.0;

        let raw = [
            RawEcho {
                channel_index: 4,
                distance: 65536 * 3,
                amplitude: 128,
                timestamp: 11,
                flag: 1,
            },
            RawEcho {
                channel_index: 1,
                distance: 32768,
                amplitude: 32,
                timestamp: 12,
                flag: 0,
            },
        ];
        let package = EchoPackage::from_raw(&raw, meta);
        assert_eq!(package.indices, vec![4, 1]);
        assert_eq!(package.distances, vec![3.0, 0.5]);
        assert_eq!(package.amplitudes, vec![2.0, 0.5]);
        assert_eq!(package.timestamps, vec![11, 12]);
        assert_eq!(package.flags, vec![1, 0]);
    }

    #[test]
    fn test_constructors_keep_arrays_parallel() {
        fn assert_parallel(package: &EchoPackage) {
            let n = package.len();
            assert_eq!(package.indices().len(), n);
            assert_eq!(package.distances().len(), n);
            assert_eq!(package.amplitudes().len(), n);
            assert_eq!(package.timestamps().len(), n);
            assert_eq!(package.flags().len(), n);
        }

        let package = to_echo_package(
            vec![0, 1, 2],
            vec![1.0, 2.0, 3.0],
            vec![0.1, 0.2, 0.3],
            None,
            Some(vec![1, 0, 1]),
            metadata(),
        )
        .unwrap();
        assert_parallel(&package);
        assert_parallel(&package.valid());
        assert_eq!(package.to_bytes().len(), 3 * EchoSample::LEN);

        let decoded = EchoPackage::from_bytes(&package.to_bytes(), metadata()).unwrap();
        assert_parallel(&decoded);
        assert_eq!(decoded.len(), 3);

        let raw = EchoPackage::from_raw(&[RawEcho::default(); 4], metadata());
        assert_parallel(&raw);
        assert_eq!(raw.len(), 4);

        // Unequal arrays never yield a shortened package.
        assert!(matches!(
            to_echo_package(
                vec![0, 1, 2],
                vec![1.0, 2.0],
                vec![0.1; 3],
                None,
                None,
                metadata()
            ),
            Err(Error::ShapeMismatch {
                expected: 3,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_from_legacy() {
        let specs = metadata().specs;
        let data = ndarray::array![[100.0, 1.5, 0.25], [101.0, 2.5, 0.5]];
        let package =
            EchoPackage::from_legacy(vec![3, 4], data.view(), vec![1, 0], None, specs).unwrap();

        assert_eq!(package.indices(), &[3u32, 4]);
        assert_eq!(package.distances(), &[1.5f32, 2.5]);
        assert_eq!(package.amplitudes(), &[0.25f32, 0.5]);
        assert_eq!(package.timestamps(), &[100u16, 101]);
        assert_eq!(package.flags(), &[1u16, 0]);
        assert_eq!(package.metadata().timestamp, 100);
        assert_eq!(package.metadata().distance_scale, 1.0);

        let explicit =
            EchoPackage::from_legacy(vec![3, 4], data.view(), vec![1, 0], Some(7), specs).unwrap();
        assert_eq!(explicit.metadata().timestamp, 7);

        let narrow = ndarray::array![[100.0, 1.5], [101.0, 2.5]];
        assert!(matches!(
            EchoPackage::from_legacy(vec![3, 4], narrow.view(), vec![1, 0], None, specs),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            EchoPackage::from_legacy(vec![3], data.view(), vec![1, 0], None, specs),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_amplitude_image() {
        // v = 2, h = 3: channel 0 is the bottom-left pixel.
        let package = to_echo_package(
            vec![0, 4, 5],
            vec![1.0; 3],
            vec![0.1, 0.2, 0.3],
            None,
            None,
            metadata(),
        )
        .unwrap();

        let image = package.amplitude_image().unwrap();
        assert_eq!(image.shape(), &[2, 3]);
        assert_eq!(image[[1, 0]], 0.1);
        assert_eq!(image[[0, 1]], 0.2);
        assert_eq!(image[[0, 2]], 0.3);
        assert_eq!(image[[0, 0]], 0.0);

        let bad = to_echo_package(vec![6], vec![1.0], vec![1.0], None, None, metadata()).unwrap();
        assert!(matches!(
            bad.amplitude_image(),
            Err(Error::IndexOutOfBounds { index: 6, len: 6 })
        ));
    }
}
