// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Predict visibilities from a model image, one W-plane at a time.
//!
//! For each W-plane with anything in it, the engine's W-corrected model is
//! Fourier transformed once and then shared by every span of that W-plane.
//! Spans are degridded in parallel; all spans of a W-plane finish before the
//! next W-plane is prepared.

mod error;
mod fft;

pub use error::DegridError;
pub(crate) use fft::centred_fft2;

use crossbeam_utils::atomic::AtomicCell;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, trace};
use marlu::{c32, UVW};
use ndarray::prelude::*;
use rayon::prelude::*;
use scopeguard::defer_on_unwind;

use crate::{
    coord::CoordinateSystem,
    engine::{DegridSpanArgs, EngineError, ImagingEngine},
    io::{SpectralWindow, VisColumns},
    partition::{partition_columns, Partition, Span, VisFilter, WPlaneBucket},
    PROGRESS_BARS,
};

/// Parameters controlling degridding.
#[derive(Debug, Clone)]
pub struct DegridParams {
    /// Rows with |w| at or above this are excluded \[metres\].
    pub w_max: f64,
    /// \[kilolambda\]
    pub uv_min: f64,
    /// \[kilolambda\]
    pub uv_max: f64,
    /// The maximum time spanned by a single span \[seconds\].
    pub time_window: f64,
    /// Kernel oversampling factor. Even values are bumped up by one.
    pub oversample: u32,
    /// Spheroid values below this are treated as zero.
    pub pb_cut: f64,
    pub num_threads: usize,
}

impl DegridParams {
    /// The oversampling factor actually used; always odd.
    pub fn odd_oversample(&self) -> u32 {
        if self.oversample % 2 == 0 {
            self.oversample + 1
        } else {
            self.oversample
        }
    }
}

/// Get the operand for degridding all spans of a W-plane: the engine's
/// W-corrected copy of `model` (linear correlations), Fourier transformed.
pub fn prepare_w_plane<E: ImagingEngine>(
    engine: &E,
    model: ArrayView4<c32>,
    w_index: i32,
) -> Result<Array4<c32>, EngineError> {
    let corrected = engine.corrected_model_for_w_plane(model, w_index)?;
    Ok(centred_fft2(corrected))
}

/// Divide every plane of `model` by the square of `spheroid`, zeroing pixels
/// where the spheroid is below `pb_cut`.
fn remove_spheroid(model: ArrayView4<f64>, spheroid: ArrayView2<f64>, pb_cut: f64) -> Array4<f64> {
    let taper = spheroid.mapv(|s| if s >= pb_cut { 1.0 / (s * s) } else { 0.0 });
    &model * &taper
}

/// Things every span task of a W-plane reads, but none modifies.
struct SpanContext<'a> {
    ra_increment: f64,
    dec_increment: f64,
    oversample: u32,
    operand: ArrayView4<'a, c32>,
    antenna1: &'a [i32],
    antenna2: &'a [i32],
    time_centroid: &'a [f64],
    uvw: &'a [UVW],
    channel_frequencies: &'a [f64],
    flag: ArrayView3<'a, bool>,
}

/// A single span and exclusive access to its rows of the output buffer.
struct SpanTask<'a, 'b> {
    rows: &'a [usize],
    first: usize,
    last: usize,
    out: Vec<ArrayViewMut2<'b, c32>>,
}

impl<'a, 'b> SpanTask<'a, 'b> {
    /// Take the output views of the span's rows. A view can only be taken
    /// once, so no two tasks can write to the same row.
    fn claim(
        span: &'a Span,
        row_views: &mut [Option<ArrayViewMut2<'b, c32>>],
    ) -> Result<Option<SpanTask<'a, 'b>>, DegridError> {
        let (first, last) = match span.ends() {
            Some(ends) => ends,
            None => return Ok(None),
        };
        let num_rows = row_views.len();
        let mut out = Vec::with_capacity(span.len());
        for &row in span.rows() {
            let view = row_views
                .get_mut(row)
                .ok_or(DegridError::RowOutOfRange { row, num_rows })?
                .take()
                .ok_or(DegridError::RowClaimedTwice { row })?;
            out.push(view);
        }
        Ok(Some(SpanTask {
            rows: span.rows(),
            first,
            last,
            out,
        }))
    }

    fn run<E: ImagingEngine>(mut self, engine: &E, ctx: &SpanContext) -> Result<(), EngineError> {
        let (first, last) = (self.first, self.last);
        let time = 0.5 * (ctx.time_centroid[first] + ctx.time_centroid[last]);
        let w = 0.5 * (ctx.uvw[first].w + ctx.uvw[last].w);
        let thread = rayon::current_thread_index().unwrap_or(0);

        let kernel = engine.make_convolution_kernel(
            thread,
            ctx.antenna1[first],
            ctx.antenna2[first],
            time,
            w,
        )?;
        let args = DegridSpanArgs {
            ra_increment: ctx.ra_increment,
            dec_increment: ctx.dec_increment,
            oversample: ctx.oversample,
            operand: ctx.operand.view(),
            kernel: &kernel,
            uvw: ctx.uvw,
            channel_frequencies: ctx.channel_frequencies,
            flag: ctx.flag.view(),
        };
        engine.degrid_span(&args, self.rows, &mut self.out)
    }
}

/// Predict visibilities for every row of `columns` from a Stokes `model`
/// image. Rows excluded by the uv/w filter are left as zero. The returned
/// array is shaped `(row, channel, correlation)`.
pub fn degrid<E: ImagingEngine>(
    engine: &mut E,
    params: &DegridParams,
    coords: &CoordinateSystem,
    model: ArrayView4<f64>,
    columns: &VisColumns,
    spw: &SpectralWindow,
) -> Result<Array3<c32>, DegridError> {
    let (num_freqs, num_pols, ny, nx) = model.dim();
    let shape = [num_freqs, num_pols, ny, nx];
    if model.is_empty() {
        return Err(DegridError::EmptyModel(shape));
    }
    if params.num_threads == 0 {
        return Err(DegridError::NoThreads);
    }
    let (num_rows, num_chans, _) = columns.vis_shape();
    if spw.channel_frequencies.len() != num_chans {
        return Err(DegridError::ChannelCount {
            expected: num_chans,
            got: spw.channel_frequencies.len(),
        });
    }

    // Work out the spans before anything expensive happens.
    let filter = VisFilter::new(
        params.w_max,
        params.uv_min,
        params.uv_max,
        spw.reference_frequency,
    )?;
    let ws: Vec<f64> = columns.uvw.iter().map(|uvw| uvw.w).collect();
    let w_index = engine.w_index(&ws)?;
    let partition = partition_columns(&filter, columns, &w_index, params.time_window)?;
    let mut vis = Array3::zeros(columns.vis_shape());
    if partition.buckets.iter().all(WPlaneBucket::is_empty) {
        debug!("No rows to degrid");
        return Ok(vis);
    }

    engine.init_convolution_functions(shape, coords)?;
    engine.init_aterm(&columns.time_centroid)?;

    // Undo the spheroidal taper that AW-projection applies, where the taper
    // is big enough to be trusted.
    let spheroid = engine.spheroid()?;
    if spheroid.dim() != (ny, nx) {
        return Err(DegridError::SpheroidShape {
            expected: (ny, nx),
            got: spheroid.dim(),
        });
    }
    let model = remove_spheroid(model, spheroid.view(), params.pb_cut);
    let model = engine.stokes_to_linear(coords, model.view())?;

    let engine = &*engine;
    degrid_partition(
        engine,
        params,
        coords,
        model.view(),
        columns,
        spw,
        &partition,
        vis.view_mut(),
    )?;
    debug!("Degridded {} of {num_rows} rows", partition.num_rows());
    Ok(vis)
}

/// Degrid each non-empty bucket of `partition` into `vis`.
#[allow(clippy::too_many_arguments)]
fn degrid_partition<E: ImagingEngine>(
    engine: &E,
    params: &DegridParams,
    coords: &CoordinateSystem,
    model: ArrayView4<c32>,
    columns: &VisColumns,
    spw: &SpectralWindow,
    partition: &Partition,
    mut vis: ArrayViewMut3<c32>,
) -> Result<(), DegridError> {
    // Hand out each row of the output exactly once, up front.
    let mut row_views: Vec<Option<ArrayViewMut2<c32>>> = vis.outer_iter_mut().map(Some).collect();
    let mut buckets = vec![];
    for bucket in partition.buckets.iter().filter(|b| !b.is_empty()) {
        let mut tasks = Vec::with_capacity(bucket.spans.len());
        for span in &bucket.spans {
            if let Some(task) = SpanTask::claim(span, &mut row_views)? {
                tasks.push(task);
            }
        }
        buckets.push((bucket.w_index, tasks));
    }
    if buckets.is_empty() {
        debug!("No rows to degrid");
        return Ok(());
    }

    // The image is inverted with respect to the engine's u and v.
    let uvw: Vec<UVW> = columns
        .uvw
        .iter()
        .map(|&UVW { u, v, w }| UVW { u: -u, v: -v, w })
        .collect();
    let oversample = params.odd_oversample();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(params.num_threads)
        .build()?;

    let progress = ProgressBar::with_draw_target(
        Some(buckets.len() as _),
        if PROGRESS_BARS.load() {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        },
    )
    .with_style(
        ProgressStyle::default_bar()
            .template("{msg}: [{wide_bar:.blue}] {pos:3}/{len:3} ({elapsed_precise}<{eta_precise})")
            .unwrap()
            .progress_chars("=> "),
    )
    .with_position(0)
    .with_message("Degridding W-planes");

    let error = AtomicCell::new(false);
    for (i_plane, (w_index, tasks)) in buckets.into_iter().enumerate() {
        trace!(
            "W-plane {i_plane} (index {w_index}): {} spans",
            tasks.len()
        );
        let operand = prepare_w_plane(engine, model, w_index)?;
        let ctx = SpanContext {
            ra_increment: coords.ra_increment(),
            dec_increment: coords.dec_increment(),
            oversample,
            operand: operand.view(),
            antenna1: &columns.antenna1,
            antenna2: &columns.antenna2,
            time_centroid: &columns.time_centroid,
            uvw: &uvw,
            channel_frequencies: &spw.channel_frequencies,
            flag: columns.flag.view(),
        };

        // Returns only once every span of this W-plane is done.
        pool.install(|| {
            tasks.into_par_iter().try_for_each(|task| {
                // If a panic happens, update our atomic error.
                defer_on_unwind! { error.store(true); }
                if error.load() {
                    return Ok(());
                }
                let result = task.run(engine, &ctx);
                if result.is_err() {
                    error.store(true);
                }
                result
            })
        })?;
        progress.inc(1);
    }
    progress.abandon_with_message("Finished degridding");

    Ok(())
}
