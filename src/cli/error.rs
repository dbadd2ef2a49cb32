// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all gyimager-related errors. This should be the *only*
//! error enum that is publicly visible from the command-line interface.

use thiserror::Error;

use super::partition::PartitionArgsError;
use crate::{
    degrid::DegridError,
    io::{VisReadError, VisWriteError},
    params::{ImagingOptionsError, PartitionRunError},
    partition::PartitionError,
    processor::ProcessorError,
};

/// The *only* publicly visible error from the gyimager CLI. Each error message
/// should suggest where to look next, unless it's "generic".
#[derive(Error, Debug)]
pub enum GyimagerError {
    /// An error related to imaging options.
    #[error("{0}\n\nSee the IMAGING section of `gyimager partition --help` for the available options.")]
    ImagingOptions(String),

    /// An error related to partitioning visibilities into spans.
    #[error("{0}\n\nTry checking the uv and w limits, and the time window.")]
    Partition(String),

    /// An error related to degridding.
    #[error("{0}\n\nTry turning up verbosity (-v or -vv) for more information on the failing W-plane.")]
    Degrid(String),

    /// An error related to reading visibilities.
    #[error("{0}\n\nVisibility files are JSON; see `gyimager partition --help` for the expected layout.")]
    VisRead(String),

    /// An error related to writing visibilities.
    #[error("{0}")]
    VisWrite(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files must be toml or json, with the same names as the command-line arguments.")]
    ArgFile(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

// Binary sub-command errors.

impl From<PartitionArgsError> for GyimagerError {
    fn from(e: PartitionArgsError) -> Self {
        let s = e.to_string();
        match e {
            PartitionArgsError::NoData | PartitionArgsError::NumWPlanesZero => {
                Self::Partition(s)
            }
            PartitionArgsError::ImagingOptions(e) => Self::from(e),
            PartitionArgsError::VisRead(e) => Self::from(e),
        }
    }
}

impl From<PartitionRunError> for GyimagerError {
    fn from(e: PartitionRunError) -> Self {
        let s = e.to_string();
        match e {
            PartitionRunError::VisRead(e) => Self::from(e),
            PartitionRunError::Split(e) => Self::from(e),
            PartitionRunError::Json(_) | PartitionRunError::IO(_) => Self::Generic(s),
        }
    }
}

// Library errors.

impl From<ImagingOptionsError> for GyimagerError {
    fn from(e: ImagingOptionsError) -> Self {
        Self::ImagingOptions(e.to_string())
    }
}

impl From<PartitionError> for GyimagerError {
    fn from(e: PartitionError) -> Self {
        Self::Partition(e.to_string())
    }
}

impl From<DegridError> for GyimagerError {
    fn from(e: DegridError) -> Self {
        let s = e.to_string();
        match e {
            DegridError::Partition(e) => Self::from(e),
            DegridError::ThreadPool(_) => Self::Generic(s),
            DegridError::EmptyModel(_)
            | DegridError::SpheroidShape { .. }
            | DegridError::ChannelCount { .. }
            | DegridError::NoThreads
            | DegridError::RowClaimedTwice { .. }
            | DegridError::RowOutOfRange { .. }
            | DegridError::Engine(_) => Self::Degrid(s),
        }
    }
}

impl From<ProcessorError> for GyimagerError {
    fn from(e: ProcessorError) -> Self {
        let s = e.to_string();
        match e {
            ProcessorError::Degrid(e) => Self::from(e),
            ProcessorError::VisRead(e) => Self::from(e),
            ProcessorError::VisWrite(e) => Self::from(e),
            ProcessorError::AsGridUnsupported
            | ProcessorError::ShapeMismatch { .. }
            | ProcessorError::Engine(_) => Self::Generic(s),
        }
    }
}

impl From<VisReadError> for GyimagerError {
    fn from(e: VisReadError) -> Self {
        let s = e.to_string();
        match e {
            VisReadError::NoSuchColumn(_)
            | VisReadError::ColumnLengthMismatch { .. }
            | VisReadError::BadArraySize { .. }
            | VisReadError::ChannelMismatch { .. }
            | VisReadError::Json { .. } => Self::VisRead(s),
            VisReadError::IO(_) => Self::Generic(s),
        }
    }
}

impl From<VisWriteError> for GyimagerError {
    fn from(e: VisWriteError) -> Self {
        Self::VisWrite(e.to_string())
    }
}

impl From<std::io::Error> for GyimagerError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
