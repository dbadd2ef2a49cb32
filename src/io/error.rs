// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from reading and writing visibility data.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisReadError {
    #[error("Data column '{0}' doesn't exist")]
    NoSuchColumn(String),

    #[error("Column {column} has {got} rows, but {expected} were expected")]
    ColumnLengthMismatch {
        column: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{array_type} array has shape {got:?}, but {expected:?} was expected")]
    BadArraySize {
        array_type: &'static str,
        expected: (usize, usize, usize),
        got: (usize, usize, usize),
    },

    #[error("The spectral window has {num_freqs} channel frequencies but {num_widths} channel widths")]
    ChannelMismatch { num_freqs: usize, num_widths: usize },

    #[error("Couldn't decode visibilities from {file}: {err}")]
    Json {
        file: PathBuf,
        err: serde_json::Error,
    },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum VisWriteError {
    #[error("Tried to write a {array_type} array with shape {got:?}, but {expected:?} was expected")]
    BadArraySize {
        array_type: &'static str,
        expected: (usize, usize, usize),
        got: (usize, usize, usize),
    },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
