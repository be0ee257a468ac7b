use anasig::lifecycle::{self, ProviderConfig};
use anasig::{
    analytic_signal, analytic_signal_into, envelope, envelope_with_layout, BufferLayout,
    Complex64, EngineCache, HilbertError,
};

const FIXTURE_INPUT: [f64; 10] = [
    -0.999984, -0.736924, 0.511211, -0.0826997, 0.0655345, -0.562082, -0.905911, 0.357729,
    0.358593, 0.869386,
];
const FIXTURE_ENVELOPE: [f64; 10] = [
    1.45197493, 1.15365169, 0.54703078, 0.27346519, 0.15097965, 0.83696245, 1.1476185,
    0.71885109, 0.46089151, 1.07384968,
];

fn setup() {
    lifecycle::initialize(ProviderConfig::default()).expect("provider init");
}

/// Envelope computed with a direct DFT.
fn reference_envelope(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    let tau = 2.0 * std::f64::consts::PI / n as f64;
    let spectrum: Vec<(f64, f64)> = (0..n)
        .map(|k| {
            x.iter().enumerate().fold((0.0, 0.0), |(re, im), (t, &v)| {
                let theta = tau * (k * t) as f64;
                (re + v * theta.cos(), im - v * theta.sin())
            })
        })
        .collect();
    let weight = |k: usize| match k {
        0 => 1.0,
        k if k <= (n - 1) / 2 => 2.0,
        _ => 0.0,
    };
    (0..n)
        .map(|t| {
            let quad: f64 = spectrum
                .iter()
                .enumerate()
                .map(|(k, &(re, im))| {
                    let theta = tau * (k * t) as f64;
                    weight(k) * (re * theta.sin() + im * theta.cos())
                })
                .sum::<f64>()
                / n as f64;
            (x[t] * x[t] + quad * quad).sqrt()
        })
        .collect()
}

fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() <= tol, "index {}: {} vs {}", i, a, e);
    }
}

#[test]
fn known_vector_f64_every_layout() {
    setup();
    for layout in BufferLayout::ALL {
        let mut out = [0.0f64; 10];
        envelope_with_layout(&FIXTURE_INPUT, &mut out, layout).unwrap();
        assert_close(&out, &FIXTURE_ENVELOPE, 1e-6);
    }
}

#[test]
fn known_vector_f32() {
    setup();
    let input: Vec<f32> = FIXTURE_INPUT.iter().map(|&x| x as f32).collect();
    for layout in BufferLayout::ALL {
        let mut out = vec![0.0f32; input.len()];
        envelope_with_layout(&input, &mut out, layout).unwrap();
        for (a, e) in out.iter().zip(FIXTURE_ENVELOPE) {
            assert!((*a as f64 - e).abs() < 1e-5, "{:?}: {} vs {}", layout, a, e);
        }
    }
}

#[test]
fn odd_lengths_match_direct_dft() {
    setup();
    for n in [3usize, 5, 7, 9, 11, 13, 97] {
        let input: Vec<f64> = (0..n)
            .map(|i| ((i * 7 + 3) % 11) as f64 / 5.0 - 1.0)
            .collect();
        let expected = reference_envelope(&input);
        for layout in BufferLayout::ALL {
            let mut out = vec![0.0; n];
            envelope_with_layout(&input, &mut out, layout).unwrap();
            assert_close(&out, &expected, 1e-9);
        }
    }
}

#[test]
fn small_odd_length_values() {
    setup();
    let mut out = [0.0f64; 3];
    envelope(&[1.0, 2.0, 3.0], &mut out).unwrap();
    assert_close(
        &out,
        &[1.1547005383792512, 2.3094010767585034, 3.0550504633038935],
        1e-12,
    );
}

#[test]
fn degenerate_lengths() {
    setup();
    for layout in BufferLayout::ALL {
        let mut one = [0.0f64; 1];
        envelope_with_layout(&[-3.5], &mut one, layout).unwrap();
        assert_close(&one, &[3.5], 1e-12);

        let mut two = [0.0f64; 2];
        envelope_with_layout(&[1.0, 2.0], &mut two, layout).unwrap();
        assert_close(&two, &[1.0, 2.0], 1e-12);
    }
}

#[test]
fn constant_input_is_flat() {
    setup();
    for n in [4usize, 8, 64] {
        let input = vec![-2.0f64; n];
        let mut out = vec![0.0; n];
        envelope(&input, &mut out).unwrap();
        for &e in &out[1..n - 1] {
            assert!((e - 2.0).abs() < 1e-9, "{}", e);
        }
    }
}

#[test]
fn cosine_has_unit_envelope() {
    setup();
    let n = 256;
    let input: Vec<f64> = (0..n)
        .map(|i| (2.0 * std::f64::consts::PI * 8.0 * i as f64 / n as f64).cos())
        .collect();
    let mut out = vec![0.0; n];
    envelope_with_layout(&input, &mut out, BufferLayout::SplitComplex).unwrap();
    for &e in &out {
        assert!((e - 1.0).abs() < 1e-9);
    }
}

#[test]
fn envelope_is_non_negative() {
    setup();
    let input: Vec<f32> = (0..333).map(|i| ((i * 37) % 101) as f32 - 50.0).collect();
    let mut out = vec![0.0f32; input.len()];
    for layout in BufferLayout::ALL {
        envelope_with_layout(&input, &mut out, layout).unwrap();
        assert!(out.iter().all(|&e| e >= 0.0));
    }
}

#[test]
fn interleaved_and_split_agree() {
    setup();
    let input: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.01).sin() * (i as f64 * 0.37).cos()).collect();
    let mut a = vec![0.0; input.len()];
    let mut b = vec![0.0; input.len()];
    envelope_with_layout(&input, &mut a, BufferLayout::Interleaved).unwrap();
    envelope_with_layout(&input, &mut b, BufferLayout::SplitComplex).unwrap();
    assert_close(&a, &b, 1e-6);
}

#[test]
fn repeated_calls_do_not_leak_state() {
    setup();
    let mut cache = EngineCache::<f64>::new();
    let first: Vec<f64> = (0..10).map(|i| i as f64 * 10.0).collect();
    let mut scratch = [0.0f64; 10];
    let mut out = [0.0f64; 10];
    for layout in BufferLayout::ALL {
        cache.envelope(&first, &mut scratch, layout).unwrap();
        cache.envelope(&FIXTURE_INPUT, &mut out, layout).unwrap();
        assert_close(&out, &FIXTURE_ENVELOPE, 1e-6);
    }
    assert_eq!(cache.len(), 3);
}

#[test]
fn analytic_real_part_is_input() {
    setup();
    let analytic = analytic_signal(&FIXTURE_INPUT).unwrap();
    for (c, &x) in analytic.iter().zip(&FIXTURE_INPUT) {
        assert!((c.re - x).abs() < 1e-12);
    }
    let magnitudes: Vec<f64> = analytic.iter().map(|c| c.norm()).collect();
    assert_close(&magnitudes, &FIXTURE_ENVELOPE, 1e-6);
}

#[test]
fn analytic_layouts_agree() {
    setup();
    let input: Vec<f64> = (0..17).map(|i| ((i * i) % 13) as f64).collect();
    let reference = analytic_signal(&input).unwrap();
    for layout in BufferLayout::ALL {
        let mut out = vec![Complex64::new(0.0, 0.0); input.len()];
        analytic_signal_into(&input, &mut out, layout).unwrap();
        for (a, b) in out.iter().zip(&reference) {
            assert!((a - b).norm() < 1e-9, "{:?}", layout);
        }
    }
}

#[test]
fn nan_propagates() {
    setup();
    let mut input = FIXTURE_INPUT;
    input[4] = f64::NAN;
    let mut out = [0.0f64; 10];
    envelope(&input, &mut out).unwrap();
    assert!(out[4].is_nan());
}

#[test]
fn rejects_invalid_arguments() {
    setup();
    let mut empty: [f64; 0] = [];
    assert_eq!(envelope(&[], &mut empty), Err(HilbertError::EmptyInput));

    let mut out = [7.0f64; 3];
    assert_eq!(
        envelope(&[1.0, 2.0], &mut out),
        Err(HilbertError::MismatchedLengths)
    );
    assert_eq!(out, [7.0; 3]);

    assert_eq!(
        analytic_signal::<f32>(&[]).unwrap_err(),
        HilbertError::EmptyInput
    );
}
