// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All constants *must* be double precision. Calculations should happen in double
precision before converting to a lower precision, if it is ever required.
 */

/// Speed of light \[metres/second\].
pub use marlu::constants::VEL_C;

/// Default lower limit on baseline length \[kilolambda\]. Rows must be strictly
/// longer than this.
pub const DEFAULT_UV_MIN: f64 = 0.0;

/// Default upper limit on baseline length \[kilolambda\].
pub const DEFAULT_UV_MAX: f64 = 100000.0;

/// Default width of the sliding time window used to group rows of a baseline
/// into spans \[seconds\].
pub const DEFAULT_TIME_WINDOW: f64 = 300.0;

/// Default oversampling factor of convolution kernels. Even values get bumped
/// to the next odd number before use.
pub const DEFAULT_OVERSAMPLE: u32 = 8;

/// Default image padding factor.
pub const DEFAULT_PADDING: f64 = 1.0;

/// Spheroid values below this are considered outside the primary beam.
pub const DEFAULT_PB_CUT: f64 = 5e-2;

/// The default number of worker threads used to degrid spans.
pub const DEFAULT_NUM_THREADS: usize = 1;

/// The visibility column that is gridded (and compared against when computing
/// residuals) unless the user says otherwise.
pub const DEFAULT_DATA_COLUMN: &str = "CORRECTED_DATA";

/// The default number of W-planes used by the square-root W-plane scheme.
pub const DEFAULT_NUM_W_PLANES: u32 = 32;
