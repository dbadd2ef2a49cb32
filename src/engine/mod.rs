// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The interface to the native imaging engine. The engine owns all of the
//! heavy numerical machinery (convolution-function synthesis, per-sample
//! (de)gridding, W-term application and polarisation conversion); this crate
//! only decides what to ask it for, and in what order.

mod error;
#[cfg(test)]
pub(crate) mod stub;
mod wplanes;

pub use error::EngineError;
pub use wplanes::WPlaneScheme;

use marlu::{c32, c64, UVW};
use ndarray::prelude::*;

use crate::{coord::CoordinateSystem, io::VisColumns};

/// The products of gridding.
#[derive(Debug, Clone)]
pub struct GridResult {
    /// The gridded image, shaped like the requested image.
    pub image: Array4<f64>,

    /// The sum of weights per (image channel, polarisation).
    pub weight: Array2<f64>,
}

/// Everything the engine needs to grid a set of visibilities.
pub struct GridArgs<'a> {
    pub columns: &'a VisColumns,

    /// Imaging weights per (row, channel).
    pub imaging_weight: Array2<f32>,

    /// The visibilities to grid, shaped `(row, channel, correlation)`.
    pub data: Array3<c32>,
}

/// Everything the engine needs to degrid a single span.
pub struct DegridSpanArgs<'a, K> {
    /// The pixel increment along RA \[radians\].
    pub ra_increment: f64,
    /// The pixel increment along Dec \[radians\].
    pub dec_increment: f64,
    /// Kernel oversampling factor. Always odd.
    pub oversample: u32,
    /// The Fourier-domain W-corrected model of this span's W-plane.
    pub operand: ArrayView4<'a, c32>,
    /// The convolution kernel built for this span.
    pub kernel: &'a K,
    /// UVWs of *all* rows \[metres\]. U and V are already negated.
    pub uvw: &'a [UVW],
    /// \[Hz\]
    pub channel_frequencies: &'a [f64],
    /// Flags of *all* rows, shaped `(row, channel, correlation)`.
    pub flag: ArrayView3<'a, bool>,
}

/// An imaging engine. Methods taking `&self` may be called from many threads
/// at once; methods taking `&mut self` set up state for later calls.
pub trait ImagingEngine: Sync + Send {
    /// An opaque convolution kernel for a single span. A kernel is only ever
    /// used by the thread that created it.
    type Kernel: Send;

    /// Get the W-plane index of each of the supplied w values \[metres\].
    /// This must be deterministic.
    fn w_index(&self, w: &[f64]) -> Result<Vec<i32>, EngineError>;

    /// Prepare convolution functions for images of `shape` (frequency,
    /// polarisation, y, x) in `coords`.
    fn init_convolution_functions(
        &mut self,
        shape: [usize; 4],
        coords: &CoordinateSystem,
    ) -> Result<(), EngineError>;

    /// Prepare the A-term for the supplied time centroids \[seconds\].
    fn init_aterm(&mut self, time_centroid: &[f64]) -> Result<(), EngineError>;

    /// The spheroidal taper applied during AW-projection, shaped (y, x).
    fn spheroid(&self) -> Result<Array2<f64>, EngineError>;

    /// Convert a Stokes image into linear correlations.
    fn stokes_to_linear(
        &self,
        coords: &CoordinateSystem,
        image: ArrayView4<f64>,
    ) -> Result<Array4<c32>, EngineError>;

    /// Get a copy of `model` with the W-term of W-plane `w_index` applied.
    /// This must not depend on anything other than the arguments.
    fn corrected_model_for_w_plane(
        &self,
        model: ArrayView4<c32>,
        w_index: i32,
    ) -> Result<Array4<c64>, EngineError>;

    /// Build a convolution kernel for a baseline at a time \[seconds\] and w
    /// \[metres\]. `thread` is the index of the calling worker; it is advisory.
    fn make_convolution_kernel(
        &self,
        thread: usize,
        antenna1: i32,
        antenna2: i32,
        time: f64,
        w: f64,
    ) -> Result<Self::Kernel, EngineError>;

    /// Predict visibilities for `rows`. `out` has one `(channel, correlation)`
    /// view per row, in the same order as `rows`.
    fn degrid_span(
        &self,
        args: &DegridSpanArgs<'_, Self::Kernel>,
        rows: &[usize],
        out: &mut [ArrayViewMut2<c32>],
    ) -> Result<(), EngineError>;

    /// Compute imaging weights per (row, channel) with whatever weighting
    /// scheme the engine has been configured with.
    fn imaging_weight(
        &self,
        columns: &VisColumns,
        channel_frequencies: &[f64],
    ) -> Result<Array2<f32>, EngineError>;

    /// Set the uv density used by density-based weighting schemes.
    fn set_density(
        &mut self,
        density: Array2<f64>,
        coords: &CoordinateSystem,
    ) -> Result<(), EngineError>;

    /// Grid visibilities onto an image of `shape`. Gridding is finished with
    /// [`ImagingEngine::end_grid`].
    fn begin_grid(
        &mut self,
        shape: [usize; 4],
        coords: &CoordinateSystem,
        as_psf: bool,
        args: GridArgs,
    ) -> Result<(), EngineError>;

    /// Finish gridding, returning the image and weights. The meaning of
    /// `flatten` is engine specific.
    fn end_grid(&mut self, flatten: bool) -> Result<GridResult, EngineError>;

    /// The average primary-beam response of the last gridding run, shaped (y,
    /// x).
    fn average_response(&self) -> Result<Array2<f64>, EngineError>;
}
