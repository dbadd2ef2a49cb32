// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parameters that are kept modular to be used in multiple aspects of
//! `gyimager`.
//!
//! The code here is kind of "mirroring" the code within the `cli` module; the
//! idea is that options are unparsed and user-facing, whereas parameters have
//! been parsed and are ready to be used directly.

mod imaging;
mod partition;

pub use imaging::{ImagingOptions, ImagingOptionsError, ImagingParams};
pub(crate) use partition::{PartitionError as PartitionRunError, PartitionParams};
