// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The W-split data processor: everything an imager needs from a set of
//! visibilities (gridding, degridding, residuals, PSFs and uv density) on
//! top of a [`VisDataStore`] and an [`ImagingEngine`].

mod error;
#[cfg(test)]
mod tests;

pub use error::ProcessorError;

use log::{debug, trace};
use marlu::{c32, constants::VEL_C, RADec};
use ndarray::prelude::*;

use crate::{
    coord::CoordinateSystem,
    degrid::degrid,
    engine::{GridArgs, GridResult, ImagingEngine},
    io::{VisColumns, VisDataStore},
    params::ImagingParams,
};

/// Optional features of a data processor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Can images be exchanged in the uv domain (`as_grid`)?
    pub as_grid: bool,
}

/// Compute `observed - predicted`.
pub fn compute_residual(
    observed: ArrayView3<c32>,
    predicted: ArrayView3<c32>,
) -> Result<Array3<c32>, ProcessorError> {
    if observed.dim() != predicted.dim() {
        return Err(ProcessorError::ShapeMismatch {
            observed: observed.dim(),
            predicted: predicted.dim(),
        });
    }
    Ok(&observed - &predicted)
}

pub struct WSplitProcessor<S: VisDataStore, E: ImagingEngine> {
    store: S,
    engine: E,
    params: ImagingParams,

    /// The coordinates and shape of the last image configuration.
    image_config: Option<(CoordinateSystem, [usize; 4])>,
    /// Does the engine hold an average response for the current image
    /// configuration?
    response_available: bool,
}

impl<S: VisDataStore, E: ImagingEngine> WSplitProcessor<S, E> {
    pub fn new(store: S, engine: E, params: ImagingParams) -> WSplitProcessor<S, E> {
        debug!(
            "W-split processor for image '{}' over {} rows",
            params.image,
            store.num_rows()
        );
        WSplitProcessor {
            store,
            engine,
            params,
            image_config: None,
            response_available: false,
        }
    }

    pub fn params(&self) -> &ImagingParams {
        &self.params
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_parts(self) -> (S, E) {
        (self.store, self.engine)
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    pub fn phase_reference(&self) -> RADec {
        self.store.phase_reference()
    }

    /// \[Hz\]
    pub fn reference_frequency(&self) -> f64 {
        self.store.spectral_window().reference_frequency
    }

    /// \[Hz\]
    pub fn channel_frequency(&self) -> &[f64] {
        &self.store.spectral_window().channel_frequencies
    }

    /// \[Hz\]
    pub fn channel_width(&self) -> &[f64] {
        &self.store.spectral_window().channel_widths
    }

    /// The length of the longest baseline \[metres\]. If there are no rows,
    /// this is 0.
    pub fn maximum_baseline_length(&self) -> Result<f64, ProcessorError> {
        let columns = self.store.read_columns()?;
        Ok(columns
            .uvw
            .iter()
            .map(|uvw| (uvw.u * uvw.u + uvw.v * uvw.v + uvw.w * uvw.w).sqrt())
            .fold(0.0, f64::max))
    }

    /// The natural-weighting density of the visibilities on a `(y, x)` grid
    /// matching `shape` in `coords`. Every sample contributes to its own cell
    /// and that of its conjugate.
    pub fn density(
        &self,
        coords: &CoordinateSystem,
        shape: [usize; 4],
    ) -> Result<Array2<f64>, ProcessorError> {
        let [_, _, ny, nx] = shape;
        let columns = self.store.read_columns()?;
        let freqs = self.channel_frequency();

        let u_origin = (nx / 2) as i64;
        let v_origin = (ny / 2) as i64;
        let u_scale = nx as f64 * coords.ra_increment();
        let v_scale = ny as f64 * coords.dec_increment();

        let mut density = Array2::zeros((ny, nx));
        for (i_row, uvw) in columns.uvw.iter().enumerate() {
            let u_row = uvw.u * u_scale;
            let v_row = uvw.v * v_scale;
            for (i_chan, freq) in freqs.iter().enumerate() {
                let f = freq / VEL_C;
                let u = (u_row * f) as i64;
                let v = (v_row * f) as i64;
                if u.abs() < u_origin && v.abs() < v_origin {
                    let weight: f64 = columns
                        .weight_spectrum
                        .slice(s![i_row, i_chan, ..])
                        .iter()
                        .map(|&w| f64::from(w))
                        .sum();
                    density[((v_origin + v) as usize, (u_origin + u) as usize)] += weight;
                    density[((v_origin - v) as usize, (u_origin - u) as usize)] += weight;
                }
            }
        }
        Ok(density)
    }

    /// Hand a density grid to the engine's weighting scheme.
    pub fn set_density(
        &mut self,
        density: Array2<f64>,
        coords: &CoordinateSystem,
    ) -> Result<(), ProcessorError> {
        self.engine.set_density(density, coords)?;
        Ok(())
    }

    /// The average primary-beam response of the last gridding run.
    ///
    /// # Panics
    ///
    /// Panics if nothing has been gridded with this image configuration.
    pub fn response(
        &mut self,
        coords: &CoordinateSystem,
        shape: [usize; 4],
    ) -> Result<Array2<f64>, ProcessorError> {
        self.update_image_configuration(coords, shape);
        assert!(self.response_available, "Response not available");
        Ok(self.engine.average_response()?)
    }

    pub fn point_spread_function(
        &mut self,
        coords: &CoordinateSystem,
        shape: [usize; 4],
        as_grid: bool,
    ) -> Result<GridResult, ProcessorError> {
        if as_grid {
            return Err(ProcessorError::AsGridUnsupported);
        }
        self.update_image_configuration(coords, shape);

        let columns = self.store.read_columns()?;
        let imaging_weight = self
            .engine
            .imaging_weight(&columns, self.channel_frequency())?;
        let data = Array3::ones(columns.vis_shape());
        self.grid_inner(coords, shape, true, &columns, imaging_weight, data)
    }

    /// Grid the data column.
    pub fn grid(
        &mut self,
        coords: &CoordinateSystem,
        shape: [usize; 4],
        as_grid: bool,
    ) -> Result<GridResult, ProcessorError> {
        if as_grid {
            return Err(ProcessorError::AsGridUnsupported);
        }
        self.update_image_configuration(coords, shape);

        let columns = self.store.read_columns()?;
        let data = self.store.read_data(&self.params.data_column)?;
        let result = self.grid_inner(coords, shape, false, &columns, unit_weights(&columns), data)?;
        self.response_available = true;
        Ok(result)
    }

    /// Predict visibilities from `model` and write them to the output column.
    pub fn degrid(
        &mut self,
        coords: &CoordinateSystem,
        model: ArrayView4<f64>,
        as_grid: bool,
    ) -> Result<(), ProcessorError> {
        if as_grid {
            return Err(ProcessorError::AsGridUnsupported);
        }
        let columns = self.store.read_columns()?;
        let predicted = self.predict(coords, model, &columns)?;
        self.store
            .write_data(&self.params.output_column, predicted.view())?;
        debug!(
            "Wrote predicted visibilities to {}",
            self.params.output_column
        );
        Ok(())
    }

    /// Grid the difference between the data column and visibilities predicted
    /// from `model`.
    pub fn residual(
        &mut self,
        coords: &CoordinateSystem,
        model: ArrayView4<f64>,
        as_grid: bool,
    ) -> Result<GridResult, ProcessorError> {
        if as_grid {
            return Err(ProcessorError::AsGridUnsupported);
        }
        let (f, p, y, x) = model.dim();
        let shape = [f, p, y, x];
        self.update_image_configuration(coords, shape);

        let columns = self.store.read_columns()?;
        let predicted = self.predict(coords, model, &columns)?;
        let observed = self.store.read_data(&self.params.data_column)?;
        let residual = compute_residual(observed.view(), predicted.view())?;

        let result = self.grid_inner(
            coords,
            shape,
            false,
            &columns,
            unit_weights(&columns),
            residual,
        )?;
        self.response_available = true;
        Ok(result)
    }

    fn predict(
        &mut self,
        coords: &CoordinateSystem,
        model: ArrayView4<f64>,
        columns: &VisColumns,
    ) -> Result<Array3<c32>, ProcessorError> {
        let params = self.params.degrid_params();
        Ok(degrid(
            &mut self.engine,
            &params,
            coords,
            model,
            columns,
            self.store.spectral_window(),
        )?)
    }

    fn grid_inner(
        &mut self,
        coords: &CoordinateSystem,
        shape: [usize; 4],
        as_psf: bool,
        columns: &VisColumns,
        imaging_weight: Array2<f32>,
        data: Array3<c32>,
    ) -> Result<GridResult, ProcessorError> {
        self.engine.begin_grid(
            shape,
            coords,
            as_psf,
            GridArgs {
                columns,
                imaging_weight,
                data,
            },
        )?;
        // TODO: Find out what `flatten` means to the engine; it's always off
        // for now.
        Ok(self.engine.end_grid(false)?)
    }

    /// Forget the average response if the image configuration has changed.
    fn update_image_configuration(&mut self, coords: &CoordinateSystem, shape: [usize; 4]) {
        let unchanged = matches!(
            &self.image_config,
            Some((old_coords, old_shape)) if *old_shape == shape && old_coords.is_equivalent(coords)
        );
        if !unchanged {
            trace!("Image configuration changed; shape is now {shape:?}");
            self.image_config = Some((coords.clone(), shape));
            self.response_available = false;
        }
    }
}

/// An imaging weight of 1 for every (row, channel).
fn unit_weights(columns: &VisColumns) -> Array2<f32> {
    let (num_rows, num_chans, _) = columns.vis_shape();
    Array2::ones((num_rows, num_chans))
}
