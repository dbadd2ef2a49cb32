// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! W-split imaging backend. Visibility rows are partitioned into spans (runs of
//! rows sharing a baseline, a time window and a W-plane) and model images are
//! degridded span-by-span in parallel, one W-plane at a time. The numerical
//! imaging kernels live behind the [`ImagingEngine`] trait.

mod cli;
pub mod constants;
pub mod coord;
pub mod degrid;
pub mod engine;
pub mod io;
pub(crate) mod params;
pub mod partition;
pub mod processor;

// Re-exports.
pub use cli::{Gyimager, GyimagerError};
pub use coord::CoordinateSystem;
pub use degrid::{degrid, prepare_w_plane, DegridError, DegridParams};
pub use engine::{
    DegridSpanArgs, EngineError, GridArgs, GridResult, ImagingEngine, WPlaneScheme,
};
pub use io::{
    MemoryVisStore, SpectralWindow, VisColumns, VisDataStore, VisReadError, VisWriteError,
};
pub use params::{ImagingOptions, ImagingOptionsError, ImagingParams};
pub use partition::{
    partition_by_time, partition_columns, partition_rows, sort_keys, Partition, PartitionError,
    SortKey, Span, VisFilter, WPlaneBucket,
};
pub use processor::{compute_residual, Capabilities, ProcessorError, WSplitProcessor};

use crossbeam_utils::atomic::AtomicCell;

/// Should progress bars be drawn? This is set by the command-line interface;
/// library users get no progress bars unless they ask for them.
pub static PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
