// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with degridding.

use thiserror::Error;

use crate::{engine::EngineError, partition::PartitionError};

#[derive(Error, Debug)]
pub enum DegridError {
    #[error("The model image has no pixels (shape {0:?})")]
    EmptyModel([usize; 4]),

    #[error("The spheroid has shape {got:?}, but the model's pixel shape is {expected:?}")]
    SpheroidShape {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("Got {got} channel frequencies, but the data has {expected} channels")]
    ChannelCount { expected: usize, got: usize },

    #[error("Degridding needs at least one thread")]
    NoThreads,

    #[error("Row {row} belongs to more than one span")]
    RowClaimedTwice { row: usize },

    #[error("Row {row} is out of range; there are only {num_rows} rows")]
    RowOutOfRange { row: usize, num_rows: usize },

    #[error("Couldn't build the degridding thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
