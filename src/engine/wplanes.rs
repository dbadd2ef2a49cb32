// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Square-root spacing of W-planes.

use serde::{Deserialize, Serialize};

/// W-planes spaced evenly in `sqrt(|w|)` between 0 and `w_max`, so that short
/// baselines (where the W-term changes quickly) get finer sampling. The sign
/// of w carries over to the index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WPlaneScheme {
    /// \[metres\]
    pub w_max: f64,
    pub num_planes: u32,
}

impl WPlaneScheme {
    pub fn new(w_max: f64, num_planes: u32) -> WPlaneScheme {
        WPlaneScheme { w_max, num_planes }
    }

    /// Planes per sqrt(metre).
    fn w_step(&self) -> f64 {
        if self.num_planes > 1 && self.w_max > 0.0 {
            f64::from(self.num_planes - 1) / self.w_max.sqrt()
        } else {
            0.0
        }
    }

    /// The W-plane index of `w` \[metres\].
    pub fn index(&self, w: f64) -> i32 {
        let index = (w.abs().sqrt() * self.w_step()).round() as i32;
        if w < 0.0 {
            -index
        } else {
            index
        }
    }

    /// The W-plane indices of all of `ws` \[metres\].
    pub fn indices(&self, ws: &[f64]) -> Vec<i32> {
        ws.iter().map(|&w| self.index(w)).collect()
    }

    /// The central w value of W-plane `index` \[metres\].
    pub fn w_of_plane(&self, index: i32) -> f64 {
        let w_step = self.w_step();
        if w_step == 0.0 {
            return 0.0;
        }
        let sqrt_w = f64::from(index.unsigned_abs()) / w_step;
        f64::from(index.signum()) * sqrt_w * sqrt_w
    }
}
