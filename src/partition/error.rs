// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with filtering and partitioning visibility rows.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PartitionError {
    #[error("The reference frequency ({0} Hz) must be positive and finite")]
    InvalidReferenceFrequency(f64),

    #[error("The time window ({0} s) must be non-negative and finite")]
    InvalidTimeWindow(f64),

    #[error("Row {row} has a non-finite time ({time})")]
    InvalidTime { row: usize, time: f64 },

    #[error("Got {got} W-plane indices for {expected} rows")]
    WIndexCountMismatch { expected: usize, got: usize },

    #[error("Got {got} {column} values for {expected} rows")]
    ColumnLengthMismatch {
        column: &'static str,
        expected: usize,
        got: usize,
    },
}
