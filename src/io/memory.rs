// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Visibilities held entirely in memory.

use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use log::debug;
use marlu::{c32, RADec, UVW};
use ndarray::prelude::*;
use serde::Deserialize;

use super::{SpectralWindow, VisColumns, VisDataStore, VisReadError, VisWriteError};

/// A [`VisDataStore`] backed by arrays in memory. Data columns that have never
/// been written read back as zeros.
#[derive(Debug, Clone)]
pub struct MemoryVisStore {
    spw: SpectralWindow,
    phase_reference: RADec,
    columns: VisColumns,
    data: HashMap<String, Array3<c32>>,
}

impl MemoryVisStore {
    pub fn new(
        spw: SpectralWindow,
        phase_reference: RADec,
        columns: VisColumns,
    ) -> Result<MemoryVisStore, VisReadError> {
        columns.validate()?;
        if spw.channel_frequencies.len() != spw.channel_widths.len() {
            return Err(VisReadError::ChannelMismatch {
                num_freqs: spw.channel_frequencies.len(),
                num_widths: spw.channel_widths.len(),
            });
        }
        let (_, num_chans, num_corrs) = columns.vis_shape();
        if num_chans != spw.channel_frequencies.len() {
            return Err(VisReadError::BadArraySize {
                array_type: "FLAG",
                expected: (columns.num_rows(), spw.channel_frequencies.len(), num_corrs),
                got: columns.vis_shape(),
            });
        }

        Ok(MemoryVisStore {
            spw,
            phase_reference,
            columns,
            data: HashMap::new(),
        })
    }

    /// Set a visibility data column, replacing any existing one of the same
    /// name.
    pub fn with_data_column(
        mut self,
        column: &str,
        data: Array3<c32>,
    ) -> Result<MemoryVisStore, VisReadError> {
        if data.dim() != self.columns.vis_shape() {
            return Err(VisReadError::BadArraySize {
                array_type: "data",
                expected: self.columns.vis_shape(),
                got: data.dim(),
            });
        }
        self.data.insert(column.to_string(), data);
        Ok(self)
    }

    /// Read visibilities from a JSON file. See [`MemoryVisStore::from_json_str`]
    /// for the layout.
    pub fn from_json_file<P: AsRef<Path>>(file: P) -> Result<MemoryVisStore, VisReadError> {
        let file = file.as_ref();
        debug!("Reading visibilities from {}", file.display());
        let reader = BufReader::new(File::open(file)?);
        let json: JsonVis = serde_json::from_reader(reader).map_err(|err| VisReadError::Json {
            file: file.to_path_buf(),
            err,
        })?;
        json.into_store()
    }

    /// Read visibilities from a JSON string. The layout is:
    ///
    /// ```json
    /// {
    ///   "phase_reference": [0.0, -0.47],
    ///   "reference_frequency": 150e6,
    ///   "channel_frequencies": [150e6],
    ///   "channel_widths": [40e3],
    ///   "num_correlations": 4,
    ///   "rows": [
    ///     { "antenna1": 0, "antenna2": 1, "uvw": [10.0, 20.0, 1.0], "time": 0.0 }
    ///   ]
    /// }
    /// ```
    ///
    /// Per row, `time_centroid` defaults to `time`, `flag_row` to false, and
    /// `weight` (applied to all channels and correlations) to 1. The phase
    /// reference is (RA, Dec) in radians.
    pub fn from_json_str(s: &str) -> Result<MemoryVisStore, VisReadError> {
        let json: JsonVis = serde_json::from_str(s).map_err(|err| VisReadError::Json {
            file: "<string>".into(),
            err,
        })?;
        json.into_store()
    }
}

impl VisDataStore for MemoryVisStore {
    fn num_rows(&self) -> usize {
        self.columns.num_rows()
    }

    fn spectral_window(&self) -> &SpectralWindow {
        &self.spw
    }

    fn phase_reference(&self) -> RADec {
        self.phase_reference
    }

    fn read_columns(&self) -> Result<VisColumns, VisReadError> {
        Ok(self.columns.clone())
    }

    fn read_data(&self, column: &str) -> Result<Array3<c32>, VisReadError> {
        Ok(match self.data.get(column) {
            Some(d) => d.clone(),
            None => Array3::zeros(self.columns.vis_shape()),
        })
    }

    fn write_data(&mut self, column: &str, data: ArrayView3<c32>) -> Result<(), VisWriteError> {
        if data.dim() != self.columns.vis_shape() {
            return Err(VisWriteError::BadArraySize {
                array_type: "data",
                expected: self.columns.vis_shape(),
                got: data.dim(),
            });
        }
        self.data.insert(column.to_string(), data.to_owned());
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonVis {
    phase_reference: [f64; 2],
    reference_frequency: f64,
    channel_frequencies: Vec<f64>,
    channel_widths: Vec<f64>,
    num_correlations: usize,
    rows: Vec<JsonRow>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonRow {
    antenna1: i32,
    antenna2: i32,
    uvw: [f64; 3],
    time: f64,
    time_centroid: Option<f64>,
    #[serde(default)]
    flag_row: bool,
    weight: Option<f32>,
}

impl JsonVis {
    fn into_store(self) -> Result<MemoryVisStore, VisReadError> {
        let JsonVis {
            phase_reference: [ra, dec],
            reference_frequency,
            channel_frequencies,
            channel_widths,
            num_correlations,
            rows,
        } = self;

        let num_rows = rows.len();
        let shape = (num_rows, channel_frequencies.len(), num_correlations);
        let mut columns = VisColumns {
            antenna1: Vec::with_capacity(num_rows),
            antenna2: Vec::with_capacity(num_rows),
            uvw: Vec::with_capacity(num_rows),
            time: Vec::with_capacity(num_rows),
            time_centroid: Vec::with_capacity(num_rows),
            flag_row: Vec::with_capacity(num_rows),
            flag: Array3::from_elem(shape, false),
            weight_spectrum: Array3::ones(shape),
        };
        for (i_row, row) in rows.into_iter().enumerate() {
            let [u, v, w] = row.uvw;
            columns.antenna1.push(row.antenna1);
            columns.antenna2.push(row.antenna2);
            columns.uvw.push(UVW { u, v, w });
            columns.time.push(row.time);
            columns
                .time_centroid
                .push(row.time_centroid.unwrap_or(row.time));
            columns.flag_row.push(row.flag_row);
            if row.flag_row {
                columns.flag.slice_mut(s![i_row, .., ..]).fill(true);
            }
            if let Some(weight) = row.weight {
                columns
                    .weight_spectrum
                    .slice_mut(s![i_row, .., ..])
                    .fill(weight);
            }
        }

        MemoryVisStore::new(
            SpectralWindow {
                reference_frequency,
                channel_frequencies,
                channel_widths,
            },
            RADec::from_radians(ra, dec),
            columns,
        )
    }
}
