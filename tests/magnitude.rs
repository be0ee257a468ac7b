use anasig::magnitude::{detect_kernel, reduce_magnitude, reduce_magnitude_with, scalar_kernel};
use anasig::HilbertError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Lengths around every vector width, including ones that leave a tail.
const LENGTHS: [usize; 12] = [0, 1, 3, 4, 5, 7, 8, 9, 15, 17, 63, 1029];

#[test]
fn scalar_and_vector_agree_f32() {
    let mut rng = StdRng::seed_from_u64(42);
    let vector = detect_kernel();
    for &n in &LENGTHS {
        let real: Vec<f32> = (0..n).map(|_| rng.gen_range(-10.0..10.0)).collect();
        let imag: Vec<f32> = (0..n).map(|_| rng.gen_range(-1000.0..1000.0)).collect();
        let scale = 1.0 / n.max(1) as f32;
        let mut a = vec![0.0f32; n];
        let mut b = vec![0.0f32; n];
        reduce_magnitude_with(scalar_kernel(), &real, &imag, scale, &mut a).unwrap();
        reduce_magnitude_with(vector, &real, &imag, scale, &mut b).unwrap();
        for (i, (x, y)) in a.iter().zip(&b).enumerate() {
            assert!(
                (x - y).abs() <= 1e-6 * x.abs().max(1.0),
                "{} n={} i={}: {} vs {}",
                vector.name(),
                n,
                i,
                x,
                y
            );
        }
    }
}

#[test]
fn scalar_and_vector_agree_f64() {
    let mut rng = StdRng::seed_from_u64(42);
    let vector = detect_kernel();
    for &n in &LENGTHS {
        let real: Vec<f64> = (0..n).map(|_| rng.gen_range(-10.0..10.0)).collect();
        let imag: Vec<f64> = (0..n).map(|_| rng.gen_range(-1000.0..1000.0)).collect();
        let scale = 1.0 / n.max(1) as f64;
        let mut a = vec![0.0f64; n];
        let mut b = vec![0.0f64; n];
        reduce_magnitude_with(scalar_kernel(), &real, &imag, scale, &mut a).unwrap();
        reduce_magnitude_with(vector, &real, &imag, scale, &mut b).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() <= 1e-6);
        }
    }
}

#[test]
fn known_magnitudes() {
    let real = [3.0f64, -6.0, 0.0, 5.0, 8.0];
    let imag = [8.0f64, 16.0, -2.0, 24.0, 30.0];
    let mut out = [0.0f64; 5];
    reduce_magnitude(&real, &imag, 0.5, &mut out).unwrap();
    assert_eq!(out, [5.0, 10.0, 1.0, 13.0, 17.0]);
}

#[test]
fn rejects_mismatched_lengths() {
    let mut out = [0.0f32; 3];
    assert_eq!(
        reduce_magnitude(&[1.0f32, 2.0], &[1.0, 2.0, 3.0], 1.0, &mut out),
        Err(HilbertError::MismatchedLengths)
    );
}
