// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with the W-split data processor.

use thiserror::Error;

use crate::{
    degrid::DegridError,
    engine::EngineError,
    io::{VisReadError, VisWriteError},
};

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Images in the uv domain (as_grid) are not supported by the W-split processor")]
    AsGridUnsupported,

    #[error("The observed visibilities have shape {observed:?}, but the predicted visibilities have shape {predicted:?}")]
    ShapeMismatch {
        observed: (usize, usize, usize),
        predicted: (usize, usize, usize),
    },

    #[error(transparent)]
    Degrid(#[from] DegridError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    VisRead(#[from] VisReadError),

    #[error(transparent)]
    VisWrite(#[from] VisWriteError),
}
