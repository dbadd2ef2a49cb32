// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Image coordinate systems.
//!
//! Two independently-constructed coordinate systems frequently describe the
//! same image configuration, so equality here is a value comparison with a
//! floating-point tolerance (see the [`approx`] implementations), not identity.


use approx::{AbsDiffEq, RelativeEq};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// A polarisation product of an image plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum Stokes {
    I,
    Q,
    U,
    V,
    XX,
    XY,
    YX,
    YY,
}

/// The coordinate system of a 4D image with axes (frequency, polarisation,
/// declination, right ascension). The direction axes are always the last two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSystem {
    /// The direction reference value (RA, Dec) \[radians\].
    pub reference_direction: [f64; 2],

    /// The (y, x) pixel corresponding to the reference direction.
    pub reference_pixel: [f64; 2],

    /// The (Dec, RA) increment between pixels \[radians\]. The RA increment is
    /// usually negative.
    pub direction_increment: [f64; 2],

    /// The direction projection, e.g. "SIN".
    pub projection: String,

    /// The polarisations along the polarisation axis.
    pub stokes: Vec<Stokes>,

    /// The reference frequency of the spectral axis \[Hz\].
    pub reference_frequency: f64,

    /// The increment of the spectral axis \[Hz\].
    pub frequency_increment: f64,
}

impl CoordinateSystem {
    /// The pixel increment along the RA (last) axis \[radians\].
    pub fn ra_increment(&self) -> f64 {
        self.direction_increment[1]
    }

    /// The pixel increment along the Dec (second-to-last) axis \[radians\].
    pub fn dec_increment(&self) -> f64 {
        self.direction_increment[0]
    }

    /// Do `self` and `other` describe the same configuration? Floating-point
    /// values are compared with a relative tolerance.
    pub fn is_equivalent(&self, other: &CoordinateSystem) -> bool {
        self.relative_eq(other, f64::EPSILON, 1e-9)
    }

    fn same_labels(&self, other: &CoordinateSystem) -> bool {
        self.projection == other.projection && self.stokes == other.stokes
    }

    fn float_fields(&self) -> [f64; 8] {
        [
            self.reference_direction[0],
            self.reference_direction[1],
            self.reference_pixel[0],
            self.reference_pixel[1],
            self.direction_increment[0],
            self.direction_increment[1],
            self.reference_frequency,
            self.frequency_increment,
        ]
    }
}

impl AbsDiffEq for CoordinateSystem {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.same_labels(other)
            && self
                .float_fields()
                .iter()
                .zip(other.float_fields().iter())
                .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

impl RelativeEq for CoordinateSystem {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.same_labels(other)
            && self
                .float_fields()
                .iter()
                .zip(other.float_fields().iter())
                .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
    }
}
