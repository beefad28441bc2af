// tests/field_properties.rs

use beamsim::apodization::tukey;
use beamsim::color::{map_to_color, DisplayMode};
use beamsim::config::Limits;
use beamsim::delay::{delay, diverging_wave_distance, focused_wave_distance, VirtualSource, WaveType};
use beamsim::error::ConfigError;
use beamsim::field::FieldModel;
use beamsim::params::Params;
use beamsim::probe::ProbeParams;
use beamsim::pulse::pulse;
use beamsim::transform::{Affine, Point, Viewport};
use num_complex::Complex64;
use test_log::test;

#[test]
fn no_wave_type_delays_the_origin() {
    let origin = Point::new(-0.0004, 0.0002);
    for vs in [Point::new(0.002, 0.01), Point::new(0.0, -0.02), Point::new(-0.01, 0.001)] {
        let source = VirtualSource::new(vs, origin);
        for wave in [WaveType::Focused, WaveType::Plane, WaveType::Diverging] {
            assert_eq!(delay(wave, &source, origin, origin), 0.0);
        }
    }
}

#[test]
fn diverging_mirrors_focused() {
    let origin = Point::new(0.0, 0.0);
    for vs in [Point::new(0.002, 0.01), Point::new(-0.003, 0.02)] {
        for x in [-0.003, -0.0015, 0.0, 0.0015, 0.003] {
            let el = Point::new(x, 0.0);
            let mirrored = Point::new(-vs.x, -vs.z);
            assert_eq!(
                diverging_wave_distance(vs, origin, el),
                -focused_wave_distance(mirrored, origin, el)
            );
        }
    }
}

#[test]
fn pulse_peak_is_real_unity() {
    for len in [0.25, 1.0, 1.5, 3.0, 10.0] {
        assert_eq!(pulse(0.0, len), Complex64::new(1.0, 0.0));
    }
}

#[test]
fn hidden_mode_is_invisible() {
    for re in [-3.0, -0.1, 0.0, 0.2, 8.0] {
        for gain in [-20.0, 0.0, 40.0] {
            let c = map_to_color(Complex64::new(re, 1.0 - re), gain, DisplayMode::Hidden);
            assert_eq!(c.alpha, 0.0);
        }
    }
}

#[test]
fn tukey_window_shape() {
    let flat = tukey(16, 0.0).unwrap();
    assert!(flat.iter().all(|&w| (w - flat[0]).abs() < 1e-12));

    for ratio in [0.25, 0.5, 1.0] {
        for n in [5, 16, 64] {
            let w = tukey(n, ratio).unwrap();
            for i in 0..n {
                assert!((w[i] - w[n - 1 - i]).abs() < 1e-12, "n={n} ratio={ratio} i={i}");
            }
            let mean = w.iter().sum::<f64>() / n as f64;
            assert!((mean - 1.0).abs() < 1e-12);
        }
    }
}

#[test]
fn four_element_focused_delays() {
    let params = Params {
        probe: ProbeParams {
            num_elements: 4,
            left: Point::new(-0.003, 0.0),
            right: Point::new(0.003, 0.0),
        },
        wave_type: WaveType::Focused,
        virtual_sources: vec![Point::new(0.0, 0.01)],
        ..Params::default()
    };
    let model = FieldModel::new(&params, &Limits::default()).unwrap();
    let xs: Vec<f64> = model.geometry().active().iter().map(|e| e.position.x).collect();
    let delays = model.transmit_delays(0).unwrap();

    let mut by_offset: Vec<(f64, f64)> = xs.iter().map(|x| x.abs()).zip(delays.iter().copied()).collect();
    by_offset.sort_by(|a, b| a.0.total_cmp(&b.0));
    for pair in by_offset.windows(2) {
        assert!(pair[1].1 >= pair[0].1 - 1e-18);
    }
    assert!((delays[0] - delays[3]).abs() < 1e-18);
    assert!((delays[1] - delays[2]).abs() < 1e-18);
}

#[test]
fn anisotropic_viewport_has_no_scalar_length() {
    let base = Affine::scale_translate(100.0, 50.0, 0.0, 0.0);
    let viewport = Viewport::new(base, Affine::IDENTITY).unwrap();
    assert!(matches!(
        viewport.to_raster_length(0.01),
        Err(ConfigError::AnisotropicScale { .. })
    ));

    let iso = Viewport::new(Viewport::base_for_raster(512, 12_800.0), Affine::IDENTITY).unwrap();
    assert!((iso.to_raster_length(0.01).unwrap() - 128.0).abs() < 1e-9);
}
