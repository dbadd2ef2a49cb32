// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Access to visibility data. Reading and writing measurement sets is not done
//! here; a [`VisDataStore`] hands over columns keyed by row index and accepts
//! predicted visibilities back.

mod error;
mod memory;

pub use error::{VisReadError, VisWriteError};
pub use memory::MemoryVisStore;

use marlu::{c32, RADec, UVW};
use ndarray::prelude::*;

/// Frequency information on the (single) spectral window of the data.
#[derive(Debug, Clone)]
pub struct SpectralWindow {
    /// \[Hz\]
    pub reference_frequency: f64,

    /// The centre frequency of each channel \[Hz\].
    pub channel_frequencies: Vec<f64>,

    /// The width of each channel \[Hz\].
    pub channel_widths: Vec<f64>,
}

/// The metadata columns of every row of a measurement. Per-channel columns are
/// shaped `(row, channel, correlation)`.
#[derive(Debug, Clone)]
pub struct VisColumns {
    pub antenna1: Vec<i32>,
    pub antenna2: Vec<i32>,
    /// \[metres\]
    pub uvw: Vec<UVW>,
    /// \[seconds\]
    pub time: Vec<f64>,
    /// \[seconds\]
    pub time_centroid: Vec<f64>,
    pub flag_row: Vec<bool>,
    pub flag: Array3<bool>,
    pub weight_spectrum: Array3<f32>,
}

impl VisColumns {
    pub fn num_rows(&self) -> usize {
        self.antenna1.len()
    }

    /// The `(row, channel, correlation)` shape of the per-channel columns.
    pub fn vis_shape(&self) -> (usize, usize, usize) {
        self.flag.dim()
    }

    /// Check that all columns describe the same number of rows, and that the
    /// per-channel columns agree in shape.
    pub fn validate(&self) -> Result<(), VisReadError> {
        let expected = self.antenna1.len();
        for (column, got) in [
            ("ANTENNA2", self.antenna2.len()),
            ("UVW", self.uvw.len()),
            ("TIME", self.time.len()),
            ("TIME_CENTROID", self.time_centroid.len()),
            ("FLAG_ROW", self.flag_row.len()),
            ("FLAG", self.flag.len_of(Axis(0))),
            ("WEIGHT_SPECTRUM", self.weight_spectrum.len_of(Axis(0))),
        ] {
            if got != expected {
                return Err(VisReadError::ColumnLengthMismatch {
                    column,
                    expected,
                    got,
                });
            }
        }

        if self.flag.dim() != self.weight_spectrum.dim() {
            return Err(VisReadError::BadArraySize {
                array_type: "WEIGHT_SPECTRUM",
                expected: self.flag.dim(),
                got: self.weight_spectrum.dim(),
            });
        }

        Ok(())
    }
}

/// A store of visibility rows, e.g. a filtered view of a measurement set.
pub trait VisDataStore: Sync + Send {
    /// The number of rows available.
    fn num_rows(&self) -> usize;

    /// Frequency information of the data.
    fn spectral_window(&self) -> &SpectralWindow;

    /// The phase centre of the data (assumed J2000).
    fn phase_reference(&self) -> RADec;

    /// Read all metadata columns.
    fn read_columns(&self) -> Result<VisColumns, VisReadError>;

    /// Read a visibility data column, e.g. "CORRECTED_DATA". The returned array
    /// is shaped `(row, channel, correlation)`. Stores that can't supply the
    /// column return [`VisReadError::NoSuchColumn`].
    fn read_data(&self, column: &str) -> Result<Array3<c32>, VisReadError>;

    /// Write (or replace) a visibility data column.
    fn write_data(&mut self, column: &str, data: ArrayView3<c32>) -> Result<(), VisWriteError>;
}
