// Test intent: verifies magnitude kernel detection picks the best strategy for the target.
use anasig::magnitude::{detect_kernel, kernel, scalar_kernel};

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[test]
fn selects_x86_kernel() {
    let expected = if std::arch::is_x86_feature_detected!("avx2") {
        "avx2"
    } else {
        "sse2"
    };
    assert_eq!(detect_kernel().name(), expected);
    assert_eq!(detect_kernel().lanes_f64(), if expected == "avx2" { 4 } else { 2 });
}

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
#[test]
fn selects_aarch64_kernel() {
    assert_eq!(detect_kernel().name(), "neon");
    assert_eq!(detect_kernel().lanes_f32(), 4);
}

#[cfg(not(all(feature = "simd", any(target_arch = "x86_64", target_arch = "aarch64"))))]
#[test]
fn falls_back_to_scalar() {
    assert_eq!(detect_kernel().name(), "scalar");
}

#[test]
fn process_kernel_is_stable() {
    assert_eq!(kernel().name(), detect_kernel().name());
    assert_eq!(kernel().name(), kernel().name());
    assert_eq!(scalar_kernel().name(), "scalar");
    assert_eq!(scalar_kernel().lanes_f32(), 1);
}
