// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use marlu::c32;
use ndarray::prelude::*;

use super::*;
use crate::{
    coord::tests::get_coords,
    engine::{stub::StubEngine, WPlaneScheme},
    io::{tests::*, MemoryVisStore},
    params::{ImagingOptions, ImagingParams},
};

const SHAPE: [usize; 4] = [1, 4, 8, 8];

fn get_rows() -> Vec<TestRow> {
    (0..40)
        .map(|i| {
            let u = 50.0 + (i * 17 % 300) as f64;
            let v = 80.0 - (i * 29 % 160) as f64;
            let w = (i * 7 % 100) as f64 - 50.0;
            ((i % 4) as i32, 4 + (i % 2) as i32, [u, v, w], (i / 8) as f64 * 20.0)
        })
        .collect()
}

fn get_observed(num_rows: usize) -> Array3<c32> {
    Array3::from_shape_fn((num_rows, 2, 4), |(r, c, p)| {
        c32::new(r as f32 + 0.5, c as f32 - p as f32)
    })
}

fn processor_params(options: ImagingOptions) -> ImagingParams {
    options
        .merge(ImagingOptions {
            w_max: Some(100.0),
            image: Some("test".to_string()),
            threads: Some(3),
            time_window: Some(30.0),
            ..Default::default()
        })
        .parse()
        .unwrap()
}

fn get_data_store() -> MemoryVisStore {
    let rows = get_rows();
    get_store(&rows, 2, 4)
        .with_data_column("CORRECTED_DATA", get_observed(rows.len()))
        .unwrap()
}

fn get_engine() -> StubEngine {
    StubEngine::new(WPlaneScheme::new(100.0, 6))
}

fn get_processor(options: ImagingOptions) -> WSplitProcessor<MemoryVisStore, StubEngine> {
    WSplitProcessor::new(get_data_store(), get_engine(), processor_params(options))
}

fn get_model() -> Array4<f64> {
    Array4::from_shape_fn(SHAPE, |(_, p, y, x)| (p + x * y) as f64 * 0.25)
}

#[test]
fn test_pass_through_metadata() {
    let processor = get_processor(ImagingOptions::default());
    assert_eq!(processor.capabilities(), Capabilities { as_grid: false });
    assert_abs_diff_eq!(processor.reference_frequency(), 150e6);
    assert_eq!(processor.channel_frequency(), &[150e6, 151e6]);
    assert_eq!(processor.channel_width(), &[1e6, 1e6]);
    assert_abs_diff_eq!(processor.phase_reference().dec, (-27.0_f64).to_radians());
}

#[test]
fn test_maximum_baseline_length() {
    let store = get_store(
        &[(0, 1, [3.0, 4.0, 0.0], 0.0), (0, 2, [1.0, 2.0, -12.0], 0.0)],
        1,
        1,
    );
    let processor = WSplitProcessor::new(
        store,
        get_engine(),
        processor_params(ImagingOptions::default()),
    );
    assert_abs_diff_eq!(
        processor.maximum_baseline_length().unwrap(),
        149.0_f64.sqrt()
    );
}

#[test]
fn test_density() {
    // With 8x8 pixels of ~6 arcsec at 150 MHz, (20000 m, 10000 m) is at
    // (u, v) = (-2, 1) pixels; the RA increment is negative. 100 km is off the
    // grid.
    let rows = [
        (0, 1, [20000.0, 10000.0, 0.0], 0.0),
        (0, 2, [100000.0, 0.0, 0.0], 0.0),
        (1, 2, [0.0, 0.0, 0.0], 0.0),
    ];
    let store = get_store(&rows, 1, 2);
    let processor = WSplitProcessor::new(
        store,
        get_engine(),
        processor_params(ImagingOptions::default()),
    );
    let density = processor.density(&get_coords(), SHAPE).unwrap();

    let mut expected = Array2::zeros((8, 8));
    expected[(5, 2)] = 2.0;
    expected[(3, 6)] = 2.0;
    expected[(4, 4)] = 4.0;
    assert_abs_diff_eq!(density, expected);
}

#[test]
fn test_residual_of_perfect_model_is_zero() {
    let mut engine = get_engine();
    engine.observed = Some(get_observed(get_rows().len()));
    let mut processor = WSplitProcessor::new(
        get_data_store(),
        engine,
        processor_params(ImagingOptions::default()),
    );

    let result = processor
        .residual(&get_coords(), get_model().view(), false)
        .unwrap();
    assert_eq!(result.image.dim(), (1, 4, 8, 8));
    assert!(result.image.iter().all(|&v| v == 0.0));
    // The weights are unaffected.
    assert!(result.weight.iter().all(|&w| w > 0.0));
}

#[test]
fn test_compute_residual() {
    let observed = get_observed(3);
    let predicted = observed.mapv(|v| v * 0.5);
    let residual = compute_residual(observed.view(), predicted.view()).unwrap();
    assert_eq!(residual, predicted);

    let result = compute_residual(observed.view(), Array3::zeros((2, 2, 4)).view());
    assert!(matches!(result, Err(ProcessorError::ShapeMismatch { .. })));
}

#[test]
fn test_residual_of_zero_prediction_is_the_data() {
    let coords = get_coords();
    let mut processor = get_processor(ImagingOptions::default());
    let grid = processor.grid(&coords, SHAPE, false).unwrap();
    let residual = processor
        .residual(&coords, get_model().view(), false)
        .unwrap();
    // The stub's predictions aren't zero.
    assert!(residual.image != grid.image);

    let mut engine = get_engine();
    engine.observed = Some(Array3::zeros((get_rows().len(), 2, 4)));
    let mut processor = WSplitProcessor::new(
        get_data_store(),
        engine,
        processor_params(ImagingOptions::default()),
    );
    let residual = processor
        .residual(&coords, get_model().view(), false)
        .unwrap();
    assert_abs_diff_eq!(residual.image, grid.image, epsilon = 1e-9);
}

#[test]
fn test_degrid_writes_the_output_column() {
    let mut processor = get_processor(ImagingOptions {
        output_column: Some("MODEL_DATA".to_string()),
        ..Default::default()
    });
    processor
        .degrid(&get_coords(), get_model().view(), false)
        .unwrap();

    let model_data = processor.store().read_data("MODEL_DATA").unwrap();
    assert_eq!(model_data.dim(), (40, 2, 4));
    assert!(model_data.iter().any(|v| *v != c32::default()));
    // The data column is untouched.
    let data = processor.store().read_data("CORRECTED_DATA").unwrap();
    assert_eq!(data, get_observed(40));
}

#[test]
fn test_as_grid_is_unsupported() {
    let mut processor = get_processor(ImagingOptions::default());
    let coords = get_coords();
    let model = get_model();
    assert!(matches!(
        processor.grid(&coords, SHAPE, true),
        Err(ProcessorError::AsGridUnsupported)
    ));
    assert!(matches!(
        processor.point_spread_function(&coords, SHAPE, true),
        Err(ProcessorError::AsGridUnsupported)
    ));
    assert!(matches!(
        processor.degrid(&coords, model.view(), true),
        Err(ProcessorError::AsGridUnsupported)
    ));
    assert!(matches!(
        processor.residual(&coords, model.view(), true),
        Err(ProcessorError::AsGridUnsupported)
    ));
}

#[test]
fn test_point_spread_function_uses_imaging_weights() {
    let mut processor = get_processor(ImagingOptions::default());
    let psf = processor
        .point_spread_function(&get_coords(), SHAPE, false)
        .unwrap();
    // The stub's imaging weight is the sum of the 4 correlations' weights.
    assert_abs_diff_eq!(psf.image[(0, 0, 0, 0)], 4.0 * 40.0 * 2.0 * 4.0);
    assert_eq!(processor.engine().grid_calls, 1);
}

#[test]
#[should_panic(expected = "Response not available")]
fn test_response_before_gridding_panics() {
    let mut processor = get_processor(ImagingOptions::default());
    let _ = processor.response(&get_coords(), SHAPE);
}

#[test]
#[should_panic(expected = "Response not available")]
fn test_psf_does_not_make_a_response() {
    let mut processor = get_processor(ImagingOptions::default());
    let coords = get_coords();
    processor
        .point_spread_function(&coords, SHAPE, false)
        .unwrap();
    let _ = processor.response(&coords, SHAPE);
}

#[test]
fn test_response_survives_equivalent_coordinates() {
    let mut processor = get_processor(ImagingOptions::default());
    processor.grid(&get_coords(), SHAPE, false).unwrap();

    // A different but equivalent coordinate system.
    let mut coords = get_coords();
    coords.reference_frequency *= 1.0 + 1e-14;
    let response = processor.response(&coords, SHAPE).unwrap();
    assert_eq!(response.dim(), (8, 8));
}

#[test]
#[should_panic(expected = "Response not available")]
fn test_response_is_invalidated_by_new_coordinates() {
    let mut processor = get_processor(ImagingOptions::default());
    processor.grid(&get_coords(), SHAPE, false).unwrap();

    let mut coords = get_coords();
    coords.direction_increment[1] *= 2.0;
    let _ = processor.response(&coords, SHAPE);
}

#[test]
#[should_panic(expected = "Response not available")]
fn test_response_is_invalidated_by_new_shape() {
    let mut processor = get_processor(ImagingOptions::default());
    let coords = get_coords();
    processor.grid(&coords, SHAPE, false).unwrap();
    let _ = processor.response(&coords, [1, 4, 16, 16]);
}

#[test]
fn test_residual_makes_a_response() {
    let mut processor = get_processor(ImagingOptions::default());
    let coords = get_coords();
    processor
        .residual(&coords, get_model().view(), false)
        .unwrap();
    assert!(processor.response(&coords, SHAPE).is_ok());
}
