// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A deterministic stand-in for a native imaging engine, for tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use marlu::{c32, c64};
use ndarray::prelude::*;

use super::*;

#[derive(Debug)]
pub(crate) struct StubKernel {
    pub(crate) antenna1: i32,
    pub(crate) antenna2: i32,
    pub(crate) time: f64,
    pub(crate) w: f64,
}

pub(crate) struct StubEngine {
    pub(crate) scheme: WPlaneScheme,
    /// If set, these are the W-plane indices of the rows rather than those of
    /// `scheme`.
    pub(crate) w_indices: Option<Vec<i32>>,
    /// If set, degridding "predicts" exactly these visibilities.
    pub(crate) observed: Option<Array3<c32>>,
    /// Kernel construction fails for this baseline.
    pub(crate) fail_baseline: Option<(i32, i32)>,

    pub(crate) kernel_calls: AtomicUsize,
    pub(crate) prepared_planes: Mutex<Vec<i32>>,
    pub(crate) kernels: Mutex<Vec<(i32, i32, f64, f64)>>,
    pub(crate) grid_calls: usize,

    shape: Option<[usize; 4]>,
    num_time_centroids: Option<usize>,
    pending_grid: Option<GridResult>,
    gridded_shape: Option<[usize; 4]>,
}

impl StubEngine {
    pub(crate) fn new(scheme: WPlaneScheme) -> StubEngine {
        StubEngine {
            scheme,
            w_indices: None,
            observed: None,
            fail_baseline: None,
            kernel_calls: AtomicUsize::new(0),
            prepared_planes: Mutex::new(vec![]),
            kernels: Mutex::new(vec![]),
            grid_calls: 0,
            shape: None,
            num_time_centroids: None,
            pending_grid: None,
            gridded_shape: None,
        }
    }

    pub(crate) fn with_w_indices(mut self, w_indices: Vec<i32>) -> StubEngine {
        self.w_indices = Some(w_indices);
        self
    }

    pub(crate) fn num_kernel_calls(&self) -> usize {
        self.kernel_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn prepared_planes(&self) -> Vec<i32> {
        self.prepared_planes.lock().unwrap().clone()
    }
}

impl ImagingEngine for StubEngine {
    type Kernel = StubKernel;

    fn w_index(&self, w: &[f64]) -> Result<Vec<i32>, EngineError> {
        match &self.w_indices {
            Some(w_indices) => Ok(w_indices.clone()),
            None => Ok(self.scheme.indices(w)),
        }
    }

    fn init_convolution_functions(
        &mut self,
        shape: [usize; 4],
        _coords: &CoordinateSystem,
    ) -> Result<(), EngineError> {
        self.shape = Some(shape);
        Ok(())
    }

    fn init_aterm(&mut self, time_centroid: &[f64]) -> Result<(), EngineError> {
        self.num_time_centroids = Some(time_centroid.len());
        Ok(())
    }

    fn spheroid(&self) -> Result<Array2<f64>, EngineError> {
        let [_, _, ny, nx] = self
            .shape
            .ok_or(EngineError::NotInitialised("convolution functions"))?;
        // Unity everywhere except for the first pixel, which is below any
        // sensible primary-beam cut.
        let mut spheroid = Array2::ones((ny, nx));
        spheroid[(0, 0)] = 1e-3;
        Ok(spheroid)
    }

    fn stokes_to_linear(
        &self,
        _coords: &CoordinateSystem,
        image: ArrayView4<f64>,
    ) -> Result<Array4<c32>, EngineError> {
        Ok(image.mapv(|v| c32::new(v as f32, 0.0)))
    }

    fn corrected_model_for_w_plane(
        &self,
        model: ArrayView4<c32>,
        w_index: i32,
    ) -> Result<Array4<c64>, EngineError> {
        self.prepared_planes.lock().unwrap().push(w_index);
        let phase = c64::new(1.0, 0.1 * f64::from(w_index));
        Ok(model.mapv(|v| c64::new(f64::from(v.re), f64::from(v.im)) * phase))
    }

    fn make_convolution_kernel(
        &self,
        _thread: usize,
        antenna1: i32,
        antenna2: i32,
        time: f64,
        w: f64,
    ) -> Result<StubKernel, EngineError> {
        self.kernel_calls.fetch_add(1, Ordering::SeqCst);
        if self.num_time_centroids.is_none() {
            return Err(EngineError::NotInitialised("A-term"));
        }
        if self.fail_baseline == Some((antenna1, antenna2)) {
            return Err(EngineError::Kernel {
                antenna1,
                antenna2,
                msg: "stub failure".to_string(),
            });
        }
        self.kernels
            .lock()
            .unwrap()
            .push((antenna1, antenna2, time, w));
        Ok(StubKernel {
            antenna1,
            antenna2,
            time,
            w,
        })
    }

    fn degrid_span(
        &self,
        args: &DegridSpanArgs<'_, StubKernel>,
        rows: &[usize],
        out: &mut [ArrayViewMut2<c32>],
    ) -> Result<(), EngineError> {
        if rows.len() != out.len() {
            return Err(EngineError::Degrid(format!(
                "{} rows but {} output views",
                rows.len(),
                out.len()
            )));
        }

        if let Some(observed) = &self.observed {
            for (&row, out) in rows.iter().zip(out.iter_mut()) {
                out.assign(&observed.slice(s![row, .., ..]));
            }
            return Ok(());
        }

        let plane_sum: c32 = args.operand.sum();
        let kernel = args.kernel;
        let kernel_term = c32::new(
            (kernel.w + f64::from(kernel.antenna1)) as f32,
            (kernel.time * 1e-3 + f64::from(kernel.antenna2)) as f32,
        );
        for (&row, out) in rows.iter().zip(out.iter_mut()) {
            let uvw = args.uvw[row];
            for ((i_chan, i_corr), vis) in out.indexed_iter_mut() {
                if args.flag[(row, i_chan, i_corr)] {
                    continue;
                }
                let scale = (uvw.u * args.channel_frequencies[i_chan] * 1e-9) as f32
                    + (uvw.v * args.ra_increment.abs()) as f32
                    + i_corr as f32;
                *vis = plane_sum * scale + kernel_term * args.oversample as f32;
            }
        }
        Ok(())
    }

    fn imaging_weight(
        &self,
        columns: &VisColumns,
        _channel_frequencies: &[f64],
    ) -> Result<Array2<f32>, EngineError> {
        let (num_rows, num_chans, _) = columns.vis_shape();
        Ok(Array2::from_shape_fn((num_rows, num_chans), |(r, c)| {
            columns
                .weight_spectrum
                .slice(s![r, c, ..])
                .iter()
                .zip(columns.flag.slice(s![r, c, ..]).iter())
                .filter(|(_, &f)| !f)
                .map(|(&w, _)| w)
                .sum()
        }))
    }

    fn set_density(
        &mut self,
        _density: Array2<f64>,
        _coords: &CoordinateSystem,
    ) -> Result<(), EngineError> {
        Ok(())
    }

    fn begin_grid(
        &mut self,
        shape: [usize; 4],
        _coords: &CoordinateSystem,
        as_psf: bool,
        args: GridArgs,
    ) -> Result<(), EngineError> {
        let GridArgs {
            columns,
            imaging_weight,
            data,
        } = args;
        let mut total = 0.0;
        let mut weight_sum = 0.0;
        for ((row, chan, corr), vis) in data.indexed_iter() {
            if columns.flag[(row, chan, corr)] {
                continue;
            }
            let weight = f64::from(imaging_weight[(row, chan)]);
            let value = if as_psf { 1.0 } else { f64::from(vis.norm()) };
            total += value * weight;
            weight_sum += weight;
        }
        self.grid_calls += 1;
        self.gridded_shape = Some(shape);
        self.pending_grid = Some(GridResult {
            image: Array4::from_elem(shape, total),
            weight: Array2::from_elem((shape[0], shape[1]), weight_sum),
        });
        Ok(())
    }

    fn end_grid(&mut self, _flatten: bool) -> Result<GridResult, EngineError> {
        self.pending_grid
            .take()
            .ok_or(EngineError::NotInitialised("gridder"))
    }

    fn average_response(&self) -> Result<Array2<f64>, EngineError> {
        match self.gridded_shape {
            Some([_, _, ny, nx]) => Ok(Array2::ones((ny, nx))),
            None => Err(EngineError::NotInitialised("gridder")),
        }
    }
}
