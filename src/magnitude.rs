//! Magnitude reduction kernels.
//!
//! Every strategy computes `sqrt(re^2 + (im * scale)^2)` elementwise with the
//! same sequence of IEEE operations, so scalar and vector results are
//! identical under default rounding. Vector strategies process full register
//! chunks and finish the `n % lanes` tail with the scalar formula.
//!
//! The best strategy for the running CPU is picked by [`detect_kernel`];
//! [`kernel`] caches that choice for the life of the process.

use std::sync::OnceLock;

use crate::error::HilbertError;
use crate::num::Float;

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use core::arch::x86_64::*;

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
use core::arch::aarch64::*;

/// A magnitude reduction strategy.
///
/// The in-place entry points overwrite `buf` (holding the unscaled
/// imaginary component) with the magnitude. `real` must be at least as long
/// as `buf`.
pub trait MagnitudeKernel: Send + Sync {
    /// Short identifier, e.g. `"scalar"` or `"avx2"`.
    fn name(&self) -> &'static str;
    /// Elements processed per vector step for `f32`.
    fn lanes_f32(&self) -> usize;
    /// Elements processed per vector step for `f64`.
    fn lanes_f64(&self) -> usize;
    fn magnitude_in_place_f32(&self, real: &[f32], buf: &mut [f32], scale: f32);
    fn magnitude_in_place_f64(&self, real: &[f64], buf: &mut [f64], scale: f64);
}

#[inline(always)]
fn magnitude_f32(re: f32, im: f32, scale: f32) -> f32 {
    let im = im * scale;
    (re * re + im * im).sqrt()
}

#[inline(always)]
fn magnitude_f64(re: f64, im: f64, scale: f64) -> f64 {
    let im = im * scale;
    (re * re + im * im).sqrt()
}

/// Portable per-element loop. Always available; the correctness baseline.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScalarKernel;

impl MagnitudeKernel for ScalarKernel {
    fn name(&self) -> &'static str {
        "scalar"
    }
    fn lanes_f32(&self) -> usize {
        1
    }
    fn lanes_f64(&self) -> usize {
        1
    }
    fn magnitude_in_place_f32(&self, real: &[f32], buf: &mut [f32], scale: f32) {
        let real = &real[..buf.len()];
        for (b, &re) in buf.iter_mut().zip(real) {
            *b = magnitude_f32(re, *b, scale);
        }
    }
    fn magnitude_in_place_f64(&self, real: &[f64], buf: &mut [f64], scale: f64) {
        let real = &real[..buf.len()];
        for (b, &re) in buf.iter_mut().zip(real) {
            *b = magnitude_f64(re, *b, scale);
        }
    }
}

/// 128-bit SSE2 kernel: 4 x `f32` or 2 x `f64` per step.
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct Sse2Kernel;

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "sse2")]
unsafe fn magnitude_f32_sse2(real: *const f32, buf: *mut f32, scale: f32, n: usize) {
    let vscale = _mm_set1_ps(scale);
    let chunks = n / 4;
    for c in 0..chunks {
        let i = c * 4;
        let re = _mm_loadu_ps(real.add(i));
        let im = _mm_mul_ps(_mm_loadu_ps(buf.add(i)), vscale);
        let sum = _mm_add_ps(_mm_mul_ps(re, re), _mm_mul_ps(im, im));
        _mm_storeu_ps(buf.add(i), _mm_sqrt_ps(sum));
    }
    for i in chunks * 4..n {
        *buf.add(i) = magnitude_f32(*real.add(i), *buf.add(i), scale);
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "sse2")]
unsafe fn magnitude_f64_sse2(real: *const f64, buf: *mut f64, scale: f64, n: usize) {
    let vscale = _mm_set1_pd(scale);
    let chunks = n / 2;
    for c in 0..chunks {
        let i = c * 2;
        let re = _mm_loadu_pd(real.add(i));
        let im = _mm_mul_pd(_mm_loadu_pd(buf.add(i)), vscale);
        let sum = _mm_add_pd(_mm_mul_pd(re, re), _mm_mul_pd(im, im));
        _mm_storeu_pd(buf.add(i), _mm_sqrt_pd(sum));
    }
    for i in chunks * 2..n {
        *buf.add(i) = magnitude_f64(*real.add(i), *buf.add(i), scale);
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
impl MagnitudeKernel for Sse2Kernel {
    fn name(&self) -> &'static str {
        "sse2"
    }
    fn lanes_f32(&self) -> usize {
        4
    }
    fn lanes_f64(&self) -> usize {
        2
    }
    fn magnitude_in_place_f32(&self, real: &[f32], buf: &mut [f32], scale: f32) {
        let n = buf.len();
        assert!(real.len() >= n);
        // SAFETY: sse2 is part of the x86_64 baseline; both pointers cover `n` elements.
        unsafe { magnitude_f32_sse2(real.as_ptr(), buf.as_mut_ptr(), scale, n) }
    }
    fn magnitude_in_place_f64(&self, real: &[f64], buf: &mut [f64], scale: f64) {
        let n = buf.len();
        assert!(real.len() >= n);
        // SAFETY: sse2 is part of the x86_64 baseline; both pointers cover `n` elements.
        unsafe { magnitude_f64_sse2(real.as_ptr(), buf.as_mut_ptr(), scale, n) }
    }
}

/// 256-bit AVX2 kernel: 8 x `f32` or 4 x `f64` per step.
///
/// Only handed out by [`detect_kernel`] when the CPU reports AVX2.
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[derive(Debug, Clone, Copy)]
pub struct Avx2Kernel {
    _detected: (),
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
impl Avx2Kernel {
    /// Returns the kernel if the running CPU supports AVX2.
    pub fn detect() -> Option<Self> {
        if std::arch::is_x86_feature_detected!("avx2") {
            Some(Self { _detected: () })
        } else {
            None
        }
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "avx2")]
unsafe fn magnitude_f32_avx2(real: *const f32, buf: *mut f32, scale: f32, n: usize) {
    let vscale = _mm256_set1_ps(scale);
    let chunks = n / 8;
    for c in 0..chunks {
        let i = c * 8;
        let re = _mm256_loadu_ps(real.add(i));
        let im = _mm256_mul_ps(_mm256_loadu_ps(buf.add(i)), vscale);
        let sum = _mm256_add_ps(_mm256_mul_ps(re, re), _mm256_mul_ps(im, im));
        _mm256_storeu_ps(buf.add(i), _mm256_sqrt_ps(sum));
    }
    for i in chunks * 8..n {
        *buf.add(i) = magnitude_f32(*real.add(i), *buf.add(i), scale);
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "avx2")]
unsafe fn magnitude_f64_avx2(real: *const f64, buf: *mut f64, scale: f64, n: usize) {
    let vscale = _mm256_set1_pd(scale);
    let chunks = n / 4;
    for c in 0..chunks {
        let i = c * 4;
        let re = _mm256_loadu_pd(real.add(i));
        let im = _mm256_mul_pd(_mm256_loadu_pd(buf.add(i)), vscale);
        let sum = _mm256_add_pd(_mm256_mul_pd(re, re), _mm256_mul_pd(im, im));
        _mm256_storeu_pd(buf.add(i), _mm256_sqrt_pd(sum));
    }
    for i in chunks * 4..n {
        *buf.add(i) = magnitude_f64(*real.add(i), *buf.add(i), scale);
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
impl MagnitudeKernel for Avx2Kernel {
    fn name(&self) -> &'static str {
        "avx2"
    }
    fn lanes_f32(&self) -> usize {
        8
    }
    fn lanes_f64(&self) -> usize {
        4
    }
    fn magnitude_in_place_f32(&self, real: &[f32], buf: &mut [f32], scale: f32) {
        let n = buf.len();
        assert!(real.len() >= n);
        // SAFETY: constructed only through `detect`; both pointers cover `n` elements.
        unsafe { magnitude_f32_avx2(real.as_ptr(), buf.as_mut_ptr(), scale, n) }
    }
    fn magnitude_in_place_f64(&self, real: &[f64], buf: &mut [f64], scale: f64) {
        let n = buf.len();
        assert!(real.len() >= n);
        // SAFETY: constructed only through `detect`; both pointers cover `n` elements.
        unsafe { magnitude_f64_avx2(real.as_ptr(), buf.as_mut_ptr(), scale, n) }
    }
}

/// 128-bit NEON kernel: 4 x `f32` or 2 x `f64` per step.
#[cfg(all(feature = "simd", target_arch = "aarch64"))]
#[derive(Debug, Clone, Copy)]
pub struct NeonKernel {
    _detected: (),
}

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
impl NeonKernel {
    /// Returns the kernel if the running CPU supports NEON.
    pub fn detect() -> Option<Self> {
        if std::arch::is_aarch64_feature_detected!("neon") {
            Some(Self { _detected: () })
        } else {
            None
        }
    }
}

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
#[target_feature(enable = "neon")]
unsafe fn magnitude_f32_neon(real: *const f32, buf: *mut f32, scale: f32, n: usize) {
    let vscale = vdupq_n_f32(scale);
    let chunks = n / 4;
    for c in 0..chunks {
        let i = c * 4;
        let re = vld1q_f32(real.add(i));
        let im = vmulq_f32(vld1q_f32(buf.add(i)), vscale);
        let sum = vaddq_f32(vmulq_f32(re, re), vmulq_f32(im, im));
        vst1q_f32(buf.add(i), vsqrtq_f32(sum));
    }
    for i in chunks * 4..n {
        *buf.add(i) = magnitude_f32(*real.add(i), *buf.add(i), scale);
    }
}

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
#[target_feature(enable = "neon")]
unsafe fn magnitude_f64_neon(real: *const f64, buf: *mut f64, scale: f64, n: usize) {
    let vscale = vdupq_n_f64(scale);
    let chunks = n / 2;
    for c in 0..chunks {
        let i = c * 2;
        let re = vld1q_f64(real.add(i));
        let im = vmulq_f64(vld1q_f64(buf.add(i)), vscale);
        let sum = vaddq_f64(vmulq_f64(re, re), vmulq_f64(im, im));
        vst1q_f64(buf.add(i), vsqrtq_f64(sum));
    }
    for i in chunks * 2..n {
        *buf.add(i) = magnitude_f64(*real.add(i), *buf.add(i), scale);
    }
}

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
impl MagnitudeKernel for NeonKernel {
    fn name(&self) -> &'static str {
        "neon"
    }
    fn lanes_f32(&self) -> usize {
        4
    }
    fn lanes_f64(&self) -> usize {
        2
    }
    fn magnitude_in_place_f32(&self, real: &[f32], buf: &mut [f32], scale: f32) {
        let n = buf.len();
        assert!(real.len() >= n);
        // SAFETY: constructed only through `detect`; both pointers cover `n` elements.
        unsafe { magnitude_f32_neon(real.as_ptr(), buf.as_mut_ptr(), scale, n) }
    }
    fn magnitude_in_place_f64(&self, real: &[f64], buf: &mut [f64], scale: f64) {
        let n = buf.len();
        assert!(real.len() >= n);
        // SAFETY: constructed only through `detect`; both pointers cover `n` elements.
        unsafe { magnitude_f64_neon(real.as_ptr(), buf.as_mut_ptr(), scale, n) }
    }
}

static SCALAR: ScalarKernel = ScalarKernel;

/// Returns the best available kernel for the current CPU and enabled features.
pub fn detect_kernel() -> &'static dyn MagnitudeKernel {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    {
        static AVX2: OnceLock<Option<Avx2Kernel>> = OnceLock::new();
        static SSE2: Sse2Kernel = Sse2Kernel;
        if let Some(avx2) = AVX2.get_or_init(Avx2Kernel::detect) {
            return avx2;
        }
        if std::arch::is_x86_feature_detected!("sse2") {
            return &SSE2;
        }
    }
    #[cfg(all(feature = "simd", target_arch = "aarch64"))]
    {
        static NEON: OnceLock<Option<NeonKernel>> = OnceLock::new();
        if let Some(neon) = NEON.get_or_init(NeonKernel::detect) {
            return neon;
        }
    }
    // Fall back to the portable scalar loop on unsupported targets.
    &SCALAR
}

/// The scalar kernel.
pub fn scalar_kernel() -> &'static dyn MagnitudeKernel {
    &SCALAR
}

/// Kernel selected once per process by [`detect_kernel`].
pub fn kernel() -> &'static dyn MagnitudeKernel {
    static SELECTED: OnceLock<&'static dyn MagnitudeKernel> = OnceLock::new();
    *SELECTED.get_or_init(|| {
        let selected = detect_kernel();
        log::debug!("magnitude kernel: {}", selected.name());
        selected
    })
}

/// `out[i] = sqrt(real[i]^2 + (imag[i] * scale)^2)` on the process kernel.
pub fn reduce_magnitude<T: Float>(
    real: &[T],
    imag: &[T],
    scale: T,
    out: &mut [T],
) -> Result<(), HilbertError> {
    reduce_magnitude_with(kernel(), real, imag, scale, out)
}

/// [`reduce_magnitude`] on an explicit kernel.
pub fn reduce_magnitude_with<T: Float>(
    kernel: &dyn MagnitudeKernel,
    real: &[T],
    imag: &[T],
    scale: T,
    out: &mut [T],
) -> Result<(), HilbertError> {
    if real.len() != out.len() || imag.len() != out.len() {
        return Err(HilbertError::MismatchedLengths);
    }
    out.copy_from_slice(imag);
    T::magnitude_in_place(kernel, real, out, scale);
    Ok(())
}

#[cfg(all(feature = "internal-tests", test))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn scalar_known_values() {
        let real = [3.0f32, 0.0, -5.0];
        let mut buf = [8.0f32, 2.0, 24.0];
        ScalarKernel.magnitude_in_place_f32(&real, &mut buf, 0.5);
        assert_eq!(buf, [5.0, 1.0, 13.0]);
    }

    #[test]
    fn detected_kernel_handles_every_tail() {
        let k = detect_kernel();
        for n in 0..=19usize {
            let real: Vec<f64> = (0..n).map(|i| i as f64 - 4.5).collect();
            let imag: Vec<f64> = (0..n).map(|i| (i as f64).sin() * 3.0).collect();
            let mut scalar = imag.clone();
            let mut vector = imag.clone();
            ScalarKernel.magnitude_in_place_f64(&real, &mut scalar, 0.25);
            k.magnitude_in_place_f64(&real, &mut vector, 0.25);
            assert_eq!(scalar, vector, "n = {}", n);
        }
    }

    proptest! {
        #[test]
        fn prop_vector_matches_scalar_f32(
            ref real in proptest::collection::vec(-1.0e3f32..1.0e3, 0..67),
            scale in 1.0e-4f32..1.0,
        ) {
            let imag: Vec<f32> = real.iter().rev().map(|x| x * 0.5 + 1.0).collect();
            let mut scalar = imag.clone();
            let mut vector = imag.clone();
            ScalarKernel.magnitude_in_place_f32(real, &mut scalar, scale);
            detect_kernel().magnitude_in_place_f32(real, &mut vector, scale);
            for (a, b) in scalar.iter().zip(&vector) {
                prop_assert!((a - b).abs() <= 1e-6 * a.abs().max(1.0));
                prop_assert!(*b >= 0.0);
            }
        }
    }
}
