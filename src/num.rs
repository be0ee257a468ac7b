use core::cell::RefCell;

use rustfft::num_traits;
use rustfft::FftNum;

use crate::engine::EngineCache;
use crate::magnitude::MagnitudeKernel;

pub use rustfft::num_complex::Complex;

pub type Complex32 = Complex<f32>;
pub type Complex64 = Complex<f64>;

/// Element types the engine is generic over.
///
/// Implemented for `f32` and `f64`. The associated items select the
/// precision-specific pieces at compile time: the wisdom tag, the magnitude
/// kernel entry point and the thread-local engine cache.
pub trait Float: FftNum + num_traits::Float {
    /// Precision tag used in wisdom entries and log lines.
    const NAME: &'static str;
    /// Lanes of a 128-bit vector register.
    const LANES: usize;

    /// `buf[i] = sqrt(real[i]^2 + (buf[i] * scale)^2)` on `kernel`.
    fn magnitude_in_place(kernel: &dyn MagnitudeKernel, real: &[Self], buf: &mut [Self], scale: Self);

    /// Run `f` against the calling thread's engine cache for this precision.
    fn with_thread_cache<R>(f: impl FnOnce(&mut EngineCache<Self>) -> R) -> R;
}

impl Float for f32 {
    const NAME: &'static str = "f32";
    const LANES: usize = 4;

    #[inline]
    fn magnitude_in_place(kernel: &dyn MagnitudeKernel, real: &[f32], buf: &mut [f32], scale: f32) {
        kernel.magnitude_in_place_f32(real, buf, scale)
    }

    fn with_thread_cache<R>(f: impl FnOnce(&mut EngineCache<f32>) -> R) -> R {
        thread_local! {
            static CACHE: RefCell<EngineCache<f32>> = RefCell::new(EngineCache::new());
        }
        CACHE.with(|cache| f(&mut cache.borrow_mut()))
    }
}

impl Float for f64 {
    const NAME: &'static str = "f64";
    const LANES: usize = 2;

    #[inline]
    fn magnitude_in_place(kernel: &dyn MagnitudeKernel, real: &[f64], buf: &mut [f64], scale: f64) {
        kernel.magnitude_in_place_f64(real, buf, scale)
    }

    fn with_thread_cache<R>(f: impl FnOnce(&mut EngineCache<f64>) -> R) -> R {
        thread_local! {
            static CACHE: RefCell<EngineCache<f64>> = RefCell::new(EngineCache::new());
        }
        CACHE.with(|cache| f(&mut cache.borrow_mut()))
    }
}

/// `Vec` of `len` zeros, reporting allocation failure instead of aborting.
pub(crate) fn try_filled<V: Clone>(len: usize, value: V) -> Result<Vec<V>, crate::HilbertError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| crate::HilbertError::Allocation { elements: len })?;
    buf.resize(len, value);
    Ok(buf)
}

#[cfg(all(feature = "internal-tests", test))]
mod tests {
    use super::*;

    #[test]
    fn precision_tags() {
        assert_eq!(<f32 as Float>::NAME, "f32");
        assert_eq!(<f64 as Float>::NAME, "f64");
        assert_eq!(<f32 as Float>::LANES * 4, 16);
        assert_eq!(<f64 as Float>::LANES * 8, 16);
    }

    #[test]
    fn try_filled_allocates() {
        let buf = try_filled(5, Complex64::new(0.0, 0.0)).unwrap();
        assert_eq!(buf.len(), 5);
        assert!(buf.iter().all(|c| c.re == 0.0 && c.im == 0.0));
    }

    #[test]
    fn try_filled_reports_exhaustion() {
        assert_eq!(
            try_filled(usize::MAX, 0u8),
            Err(crate::HilbertError::Allocation {
                elements: usize::MAX
            })
        );
    }
}
