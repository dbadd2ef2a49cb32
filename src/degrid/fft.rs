// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Centred 2D FFTs of image cubes.

use marlu::{c32, c64};
use ndarray::prelude::*;
use rustfft::FftPlanner;

/// Circularly shift the last two axes of `image` by (`dy`, `dx`) pixels.
fn roll_2d(image: &Array4<c64>, dy: usize, dx: usize) -> Array4<c64> {
    let (_, _, ny, nx) = image.dim();
    Array4::from_shape_fn(image.dim(), |(f, p, y, x)| {
        image[(f, p, (y + ny - dy) % ny, (x + nx - dx) % nx)]
    })
}

/// Forward-FFT every 2D plane of `image` with the origin at the centre pixel
/// (`fftshift`, FFT, `ifftshift` over the last two axes). The result is
/// narrowed to single precision.
pub(crate) fn centred_fft2(image: Array4<c64>) -> Array4<c32> {
    let (_, _, ny, nx) = image.dim();
    let mut image = roll_2d(&image, ny / 2, nx / 2);

    let mut planner = FftPlanner::<f64>::new();
    for (axis, n) in [(3, nx), (2, ny)] {
        if n == 0 {
            continue;
        }
        let fft = planner.plan_fft_forward(n);
        let mut buffer = vec![c64::default(); n];
        let mut scratch = vec![c64::default(); fft.get_inplace_scratch_len()];
        for mut lane in image.lanes_mut(Axis(axis)) {
            buffer
                .iter_mut()
                .zip(lane.iter())
                .for_each(|(b, &v)| *b = v);
            fft.process_with_scratch(&mut buffer, &mut scratch);
            lane.iter_mut().zip(buffer.iter()).for_each(|(v, &b)| *v = b);
        }
    }

    roll_2d(&image, ny - ny / 2, nx - nx / 2).mapv(|v| c32::new(v.re as f32, v.im as f32))
}
