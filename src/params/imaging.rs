// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Options controlling W-split imaging.

use clap::Args;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{constants::*, degrid::DegridParams};

lazy_static::lazy_static! {
    static ref PADDING_HELP: String =
        format!("The image padding factor. Default: {DEFAULT_PADDING}");

    static ref UV_MIN_HELP: String =
        format!("Exclude baselines shorter than this [kilolambda]. Default: {DEFAULT_UV_MIN}");

    static ref UV_MAX_HELP: String =
        format!("Exclude baselines longer than this [kilolambda]. Default: {DEFAULT_UV_MAX}");

    static ref TIME_WINDOW_HELP: String =
        format!("The longest time a single convolution kernel is used for [seconds]. Default: {DEFAULT_TIME_WINDOW}");

    static ref OVERSAMPLE_HELP: String =
        format!("The convolution kernel oversampling factor. Even values are bumped up to the next odd number. Default: {DEFAULT_OVERSAMPLE}");

    static ref PB_CUT_HELP: String =
        format!("Spheroid values below this level are treated as zero when correcting the model. Default: {DEFAULT_PB_CUT}");

    static ref THREADS_HELP: String =
        format!("The number of threads used to degrid spans. Default: {DEFAULT_NUM_THREADS}");

    static ref DATA_COLUMN_HELP: String =
        format!("The visibility column to image. Default: {DEFAULT_DATA_COLUMN}");
}

/// User-facing imaging options. Everything is optional so that options can be
/// merged from multiple sources (e.g. command-line arguments over an
/// arguments file); [`ImagingOptions::parse`] fills in defaults and checks
/// that everything makes sense.
#[derive(Args, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImagingOptions {
    /// Exclude visibilities with |w| at or beyond this [metres]. Required.
    #[clap(long, help_heading = "IMAGING")]
    pub w_max: Option<f64>,

    /// The name of the image being made. Required.
    #[clap(long, help_heading = "IMAGING")]
    pub image: Option<String>,

    #[clap(long, help = PADDING_HELP.as_str(), help_heading = "IMAGING")]
    pub padding: Option<f64>,

    #[clap(long, help = UV_MIN_HELP.as_str(), help_heading = "IMAGING")]
    pub uv_min: Option<f64>,

    #[clap(long, help = UV_MAX_HELP.as_str(), help_heading = "IMAGING")]
    pub uv_max: Option<f64>,

    #[clap(long, help = TIME_WINDOW_HELP.as_str(), help_heading = "IMAGING")]
    pub time_window: Option<f64>,

    #[clap(long, help = OVERSAMPLE_HELP.as_str(), help_heading = "IMAGING")]
    pub oversample: Option<u32>,

    #[clap(long, help = PB_CUT_HELP.as_str(), help_heading = "IMAGING")]
    pub pb_cut: Option<f64>,

    #[clap(long, help = THREADS_HELP.as_str(), help_heading = "IMAGING")]
    pub threads: Option<usize>,

    #[clap(long, help = DATA_COLUMN_HELP.as_str(), help_heading = "IMAGING")]
    pub data_column: Option<String>,

    /// The visibility column that predicted visibilities are written to. The
    /// default is the data column.
    #[clap(long, help_heading = "IMAGING")]
    pub output_column: Option<String>,
}

impl ImagingOptions {
    /// Consolidate two sets of options, preferring `self` wherever both have
    /// a value.
    pub fn merge(self, other: ImagingOptions) -> ImagingOptions {
        ImagingOptions {
            w_max: self.w_max.or(other.w_max),
            image: self.image.or(other.image),
            padding: self.padding.or(other.padding),
            uv_min: self.uv_min.or(other.uv_min),
            uv_max: self.uv_max.or(other.uv_max),
            time_window: self.time_window.or(other.time_window),
            oversample: self.oversample.or(other.oversample),
            pb_cut: self.pb_cut.or(other.pb_cut),
            threads: self.threads.or(other.threads),
            data_column: self.data_column.or(other.data_column),
            output_column: self.output_column.or(other.output_column),
        }
    }

    pub fn parse(self) -> Result<ImagingParams, ImagingOptionsError> {
        debug!("{:#?}", self);

        let ImagingOptions {
            w_max,
            image,
            padding,
            uv_min,
            uv_max,
            time_window,
            oversample,
            pb_cut,
            threads,
            data_column,
            output_column,
        } = self;

        let w_max = w_max.ok_or(ImagingOptionsError::NoWMax)?;
        if w_max.is_nan() || w_max <= 0.0 {
            return Err(ImagingOptionsError::WMaxNotPositive(w_max));
        }
        let image = image.ok_or(ImagingOptionsError::NoImage)?;

        let padding = padding.unwrap_or(DEFAULT_PADDING);
        if !padding.is_finite() || padding < 1.0 {
            return Err(ImagingOptionsError::BadPadding(padding));
        }

        let uv_min = uv_min.unwrap_or(DEFAULT_UV_MIN);
        let uv_max = uv_max.unwrap_or(DEFAULT_UV_MAX);
        if uv_min.is_nan() || uv_max.is_nan() || uv_min < 0.0 || uv_min >= uv_max {
            return Err(ImagingOptionsError::BadUvRange { uv_min, uv_max });
        }

        let time_window = time_window.unwrap_or(DEFAULT_TIME_WINDOW);
        if !time_window.is_finite() || time_window < 0.0 {
            return Err(ImagingOptionsError::BadTimeWindow(time_window));
        }

        let oversample = oversample.unwrap_or(DEFAULT_OVERSAMPLE);
        if oversample == 0 {
            return Err(ImagingOptionsError::OversampleZero);
        }

        let pb_cut = pb_cut.unwrap_or(DEFAULT_PB_CUT);
        if !(0.0..=1.0).contains(&pb_cut) {
            return Err(ImagingOptionsError::BadPbCut(pb_cut));
        }

        let num_threads = threads.unwrap_or(DEFAULT_NUM_THREADS);
        if num_threads == 0 {
            return Err(ImagingOptionsError::ThreadsZero);
        }

        let data_column = data_column.unwrap_or_else(|| DEFAULT_DATA_COLUMN.to_string());
        let output_column = output_column.unwrap_or_else(|| data_column.clone());

        Ok(ImagingParams {
            w_max,
            image,
            padding,
            uv_min,
            uv_max,
            time_window,
            oversample,
            pb_cut,
            num_threads,
            data_column,
            output_column,
        })
    }
}

/// Parsed imaging options.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagingParams {
    /// \[metres\]
    pub w_max: f64,
    pub image: String,
    pub padding: f64,
    /// \[kilolambda\]
    pub uv_min: f64,
    /// \[kilolambda\]
    pub uv_max: f64,
    /// \[seconds\]
    pub time_window: f64,
    pub oversample: u32,
    pub pb_cut: f64,
    pub num_threads: usize,
    pub data_column: String,
    pub output_column: String,
}

impl ImagingParams {
    pub fn degrid_params(&self) -> DegridParams {
        DegridParams {
            w_max: self.w_max,
            uv_min: self.uv_min,
            uv_max: self.uv_max,
            time_window: self.time_window,
            oversample: self.oversample,
            pb_cut: self.pb_cut,
            num_threads: self.num_threads,
        }
    }
}

#[derive(Error, Debug)]
pub enum ImagingOptionsError {
    #[error("No maximum |w| was specified; this is required")]
    NoWMax,

    #[error("The maximum |w| ({0} m) must be positive")]
    WMaxNotPositive(f64),

    #[error("No image name was specified; this is required")]
    NoImage,

    #[error("The padding factor ({0}) must be at least 1")]
    BadPadding(f64),

    #[error("The uv range {uv_min} to {uv_max} klambda is invalid; the minimum must be non-negative and less than the maximum")]
    BadUvRange { uv_min: f64, uv_max: f64 },

    #[error("The time window ({0} s) must be non-negative and finite")]
    BadTimeWindow(f64),

    #[error("The oversampling factor cannot be 0")]
    OversampleZero,

    #[error("The primary-beam cut ({0}) must be between 0 and 1")]
    BadPbCut(f64),

    #[error("The number of threads cannot be 0")]
    ThreadsZero,
}
