//! Analytic signal and envelope computation.
//!
//! For a real input `x` of length `N` the analytic signal is
//! `x + j·H{x}`, where the Hilbert transform `H{x}` is obtained by a
//! forward transform, a rewrite of the spectrum and a backward transform
//! scaled by `1/N`:
//!
//! * DC is kept as is,
//! * positive-frequency bins are doubled,
//! * the Nyquist bin (even `N` only) and every negative-frequency bin are
//!   zeroed.
//!
//! For odd `N` there is no Nyquist bin and bin `⌊N/2⌋` counts as a positive
//! frequency. The half-spectrum layout builds `H{x}` directly by rotating
//! the positive bins by `-j` and running a complex-to-real transform.
//!
//! The envelope is the magnitude `sqrt(x² + H{x}²)`, reduced by the
//! magnitude kernel selected for the cache.

use crate::engine::{EngineCache, EngineHandle};
use crate::error::HilbertError;
use crate::layout::{BufferLayout, BuffersMut, EngineBuffers, SpectrumBins};
use crate::num::{try_filled, Complex, Float};
use crate::provider::TransformProvider;

/// Validated input/output pair for one envelope computation.
#[derive(Debug)]
pub struct EnvelopeRequest<'a, T: Float> {
    input: &'a [T],
    output: &'a mut [T],
}

impl<'a, T: Float> EnvelopeRequest<'a, T> {
    pub fn new(input: &'a [T], output: &'a mut [T]) -> Result<Self, HilbertError> {
        if input.is_empty() {
            return Err(HilbertError::EmptyInput);
        }
        if input.len() != output.len() {
            return Err(HilbertError::MismatchedLengths);
        }
        Ok(Self { input, output })
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }
}

fn analytic_full<T: Float>(spectrum: &mut [Complex<T>]) {
    let bins = SpectrumBins::new(spectrum.len());
    let two = T::one() + T::one();
    let zero = Complex::new(T::zero(), T::zero());
    for bin in &mut spectrum[bins.positive()] {
        *bin = *bin * two;
    }
    if let Some(nyquist) = bins.nyquist() {
        spectrum[nyquist] = zero;
    }
    spectrum[bins.negative()].fill(zero);
}

fn analytic_split<T: Float>(re: &mut [T], im: &mut [T]) {
    let bins = SpectrumBins::new(re.len());
    let two = T::one() + T::one();
    for k in bins.positive() {
        re[k] = re[k] * two;
        im[k] = im[k] * two;
    }
    if let Some(nyquist) = bins.nyquist() {
        re[nyquist] = T::zero();
        im[nyquist] = T::zero();
    }
    re[bins.negative()].fill(T::zero());
    im[bins.negative()].fill(T::zero());
}

/// Rotate the half spectrum of a length-`len` signal so that its
/// complex-to-real transform is `len · H{x}`.
fn quadrature_half<T: Float>(len: usize, spectrum: &mut [Complex<T>]) {
    let bins = SpectrumBins::new(len);
    let zero = Complex::new(T::zero(), T::zero());
    spectrum[0] = zero;
    for bin in &mut spectrum[bins.positive()] {
        *bin = Complex::new(bin.im, -bin.re);
    }
    if let Some(nyquist) = bins.nyquist() {
        spectrum[nyquist] = zero;
    }
}

fn rewrite_spectrum<T: Float>(buffers: BuffersMut<'_, T>) {
    match buffers {
        BuffersMut::Interleaved { output, .. } => analytic_full(output),
        BuffersMut::Split {
            real_out, imag_out, ..
        } => analytic_split(real_out, imag_out),
        BuffersMut::HalfSpectrum { real, spectrum } => quadrature_half(real.len(), spectrum),
    }
}

fn fill_analytic<T: Float>(out: &mut [Complex<T>], input: &[T], quadrature: &[T], scale: T) {
    for ((dst, &x), &q) in out.iter_mut().zip(input).zip(quadrature) {
        *dst = Complex::new(x, q * scale);
    }
}

/// `out[i] = input[i] + j·quadrature[i]·scale`.
fn write_analytic<T: Float>(
    buffers: &EngineBuffers<T>,
    input: &[T],
    scale: T,
    out: &mut [Complex<T>],
) {
    match buffers {
        EngineBuffers::Interleaved { input: time, .. } => {
            for ((dst, &x), c) in out.iter_mut().zip(input).zip(time) {
                *dst = Complex::new(x, c.im * scale);
            }
        }
        EngineBuffers::Split { imag_in, .. } => fill_analytic(out, input, imag_in, scale),
        EngineBuffers::HalfSpectrum { real, .. } => fill_analytic(out, input, real, scale),
    }
}

fn inverse_len<T: Float>(len: usize, layout: BufferLayout) -> Result<T, HilbertError> {
    T::from_usize(len)
        .map(|n| T::one() / n)
        .ok_or(HilbertError::Unplannable { len, layout })
}

impl<T: Float, P: TransformProvider<T>> EngineCache<T, P> {
    /// Forward transform, spectrum rewrite and backward transform of
    /// `input`. The quadrature component is left unscaled in the engine's
    /// buffers.
    fn quadrature(
        &mut self,
        input: &[T],
        layout: BufferLayout,
    ) -> Result<EngineHandle<'_, T, P>, HilbertError> {
        let mut handle = self.acquire(input.len(), layout)?;
        handle.load_real(input)?;
        handle.forward()?;
        rewrite_spectrum(handle.buffers_mut());
        handle.backward()?;
        Ok(handle)
    }

    /// Write the envelope of `input` into `output` using the engine for
    /// `(input.len(), layout)`.
    ///
    /// On error `output` is left untouched.
    pub fn envelope(
        &mut self,
        input: &[T],
        output: &mut [T],
        layout: BufferLayout,
    ) -> Result<(), HilbertError> {
        self.compute_envelope(EnvelopeRequest::new(input, output)?, layout)
    }

    /// [`EngineCache::envelope`] for an already validated request.
    pub fn compute_envelope(
        &mut self,
        request: EnvelopeRequest<'_, T>,
        layout: BufferLayout,
    ) -> Result<(), HilbertError> {
        let EnvelopeRequest { input, output } = request;
        let scale = inverse_len::<T>(input.len(), layout)?;
        let kernel = self.kernel;
        let handle = self.quadrature(input, layout)?;
        handle.buffers().copy_quadrature(output);
        T::magnitude_in_place(kernel, input, output, scale);
        Ok(())
    }

    /// Write the analytic signal of `input` into `out`.
    ///
    /// On error `out` is left untouched.
    pub fn analytic_signal_into(
        &mut self,
        input: &[T],
        out: &mut [Complex<T>],
        layout: BufferLayout,
    ) -> Result<(), HilbertError> {
        if input.is_empty() {
            return Err(HilbertError::EmptyInput);
        }
        if input.len() != out.len() {
            return Err(HilbertError::MismatchedLengths);
        }
        let scale = inverse_len::<T>(input.len(), layout)?;
        let handle = self.quadrature(input, layout)?;
        write_analytic(handle.buffers(), input, scale, out);
        Ok(())
    }
}

/// Envelope of `input` into `output` on the calling thread's cache, with
/// the default layout.
///
/// # Example
/// ```
/// use anasig::lifecycle::{self, ProviderConfig};
///
/// lifecycle::initialize(ProviderConfig::default()).unwrap();
/// let input = [1.0f64, 0.0, -1.0, 0.0];
/// let mut env = [0.0; 4];
/// anasig::envelope(&input, &mut env).unwrap();
/// assert!(env.iter().all(|&e| (e - 1.0).abs() < 1e-12));
/// ```
pub fn envelope<T: Float>(input: &[T], output: &mut [T]) -> Result<(), HilbertError> {
    envelope_with_layout(input, output, BufferLayout::default())
}

/// [`envelope`] with an explicit layout.
pub fn envelope_with_layout<T: Float>(
    input: &[T],
    output: &mut [T],
    layout: BufferLayout,
) -> Result<(), HilbertError> {
    T::with_thread_cache(|cache| cache.envelope(input, output, layout))
}

/// Analytic signal of `input` on the calling thread's cache.
pub fn analytic_signal<T: Float>(input: &[T]) -> Result<Vec<Complex<T>>, HilbertError> {
    if input.is_empty() {
        return Err(HilbertError::EmptyInput);
    }
    let mut out = try_filled(input.len(), Complex::new(T::zero(), T::zero()))?;
    analytic_signal_into(input, &mut out, BufferLayout::default())?;
    Ok(out)
}

/// Analytic signal of `input` into `out` on the calling thread's cache.
pub fn analytic_signal_into<T: Float>(
    input: &[T],
    out: &mut [Complex<T>],
    layout: BufferLayout,
) -> Result<(), HilbertError> {
    T::with_thread_cache(|cache| cache.analytic_signal_into(input, out, layout))
}

/// Drop every engine in the calling thread's `T` cache.
pub fn clear_thread_cache<T: Float>() {
    T::with_thread_cache(|cache| cache.clear())
}

/// Number of engines in the calling thread's `T` cache.
pub fn thread_cache_len<T: Float>() -> usize {
    T::with_thread_cache(|cache| cache.len())
}

#[cfg(all(feature = "internal-tests", test))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn full_rewrite_even() {
        let mut spectrum: Vec<Complex<f64>> = (0..6).map(|k| Complex::new(k as f64, 1.0)).collect();
        analytic_full(&mut spectrum);
        let re: Vec<f64> = spectrum.iter().map(|c| c.re).collect();
        assert_eq!(re, vec![0.0, 2.0, 4.0, 0.0, 0.0, 0.0]);
        assert_eq!(spectrum[0].im, 1.0);
        assert_eq!(spectrum[1].im, 2.0);
    }

    #[test]
    fn full_rewrite_odd_doubles_middle_bin() {
        let mut spectrum = vec![Complex::new(1.0f32, 0.0); 5];
        analytic_full(&mut spectrum);
        let re: Vec<f32> = spectrum.iter().map(|c| c.re).collect();
        assert_eq!(re, vec![1.0, 2.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn split_rewrite_matches_full() {
        let full: Vec<Complex<f64>> = (0..7)
            .map(|k| Complex::new(k as f64 - 2.0, (k * k) as f64))
            .collect();
        let mut re: Vec<f64> = full.iter().map(|c| c.re).collect();
        let mut im: Vec<f64> = full.iter().map(|c| c.im).collect();
        let mut expected = full.clone();
        analytic_full(&mut expected);
        analytic_split(&mut re, &mut im);
        for k in 0..7 {
            assert_eq!(Complex::new(re[k], im[k]), expected[k]);
        }
    }

    #[test]
    fn half_rotation_clears_dc_and_nyquist() {
        let mut spectrum = vec![Complex::new(3.0f64, 0.0), Complex::new(1.0, 2.0), Complex::new(5.0, 0.0)];
        quadrature_half(4, &mut spectrum);
        assert_eq!(spectrum[0], Complex::new(0.0, 0.0));
        assert_eq!(spectrum[1], Complex::new(2.0, -1.0));
        assert_eq!(spectrum[2], Complex::new(0.0, 0.0));

        let mut odd = vec![Complex::new(3.0f64, 0.0), Complex::new(1.0, 2.0), Complex::new(4.0, -1.0)];
        quadrature_half(5, &mut odd);
        assert_eq!(odd[2], Complex::new(-1.0, -4.0));
    }

    #[test]
    fn request_validation_order() {
        let mut empty: [f64; 0] = [];
        assert_eq!(
            EnvelopeRequest::new(&[], &mut empty).unwrap_err(),
            HilbertError::EmptyInput
        );
        let mut short = [0.0f64; 2];
        assert_eq!(
            EnvelopeRequest::new(&[1.0, 2.0, 3.0], &mut short).unwrap_err(),
            HilbertError::MismatchedLengths
        );
    }

    proptest! {
        #[test]
        fn prop_envelope_non_negative(
            ref input in proptest::collection::vec(-1.0e3f64..1.0e3, 1..48),
        ) {
            crate::lifecycle::initialize(crate::lifecycle::ProviderConfig::default()).unwrap();
            let mut out = vec![0.0; input.len()];
            for layout in BufferLayout::ALL {
                envelope_with_layout(input.as_slice(), &mut out, layout).unwrap();
                prop_assert!(out.iter().all(|&e| e >= 0.0));
            }
        }
    }
}
