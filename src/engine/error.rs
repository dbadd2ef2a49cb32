// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors coming out of an imaging engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Couldn't make a convolution kernel for baseline ({antenna1}, {antenna2}): {msg}")]
    Kernel {
        antenna1: i32,
        antenna2: i32,
        msg: String,
    },

    #[error("Degridding failed: {0}")]
    Degrid(String),

    #[error("Gridding failed: {0}")]
    Grid(String),

    #[error("Couldn't apply the W-term for W-plane {w_index}: {msg}")]
    WTerm { w_index: i32, msg: String },

    #[error("Couldn't compute imaging weights: {0}")]
    Weighting(String),

    #[error("The engine hasn't been initialised: {0}")]
    NotInitialised(&'static str),

    #[error("{0}")]
    Generic(String),
}
