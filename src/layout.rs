//! Buffer layouts, transform descriptors and the spectrum bin partition.
//!
//! An engine picks one [`BufferLayout`] at construction and keeps it for its
//! whole lifetime. The layout decides which buffers the engine owns
//! ([`EngineBuffers`]) and how the transform provider moves data between
//! them.

use core::ops::Range;

use crate::error::HilbertError;
use crate::num::{Complex, Float};

/// Memory layout of the data an engine transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BufferLayout {
    /// One buffer of `N` interleaved `(re, im)` pairs per direction.
    #[default]
    Interleaved,
    /// Four real arrays: real-in, imag-in, real-out, imag-out.
    SplitComplex,
    /// One real array of length `N` and one complex array of `N/2 + 1` bins.
    HalfSpectrumRealToComplex,
}

impl BufferLayout {
    /// All layouts, in declaration order.
    pub const ALL: [BufferLayout; 3] = [
        BufferLayout::Interleaved,
        BufferLayout::SplitComplex,
        BufferLayout::HalfSpectrumRealToComplex,
    ];

    /// Whether the forward transform materializes negative frequencies.
    pub fn is_full_spectrum(self) -> bool {
        !matches!(self, BufferLayout::HalfSpectrumRealToComplex)
    }
}

/// Direction of a transform plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Forward,
    Backward,
}

/// Describes the buffers a plan will be executed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferDescriptor {
    /// Number of time-domain samples.
    pub len: usize,
    pub layout: BufferLayout,
}

impl BufferDescriptor {
    pub fn new(len: usize, layout: BufferLayout) -> Self {
        Self { len, layout }
    }

    /// Number of frequency bins stored for this layout.
    pub fn complex_len(&self) -> usize {
        if self.layout.is_full_spectrum() {
            self.len
        } else {
            self.len / 2 + 1
        }
    }
}

/// Partition of the bin index space `[0, N)` for a transform of length `N`.
///
/// DC is bin `0`. For even `N` the Nyquist bin sits at `N/2`; for odd `N`
/// there is no exact Nyquist bin and `⌊N/2⌋` belongs to the positive
/// frequencies. Everything above is a negative frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpectrumBins {
    len: usize,
}

impl SpectrumBins {
    pub fn new(len: usize) -> Self {
        Self { len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `⌊N/2⌋`.
    pub fn half(&self) -> usize {
        self.len / 2
    }

    /// Bins that are doubled by the analytic-signal rewrite.
    pub fn positive(&self) -> Range<usize> {
        let half = self.half();
        if self.len % 2 == 0 {
            1.min(half)..half
        } else {
            // `N == 1` leaves this empty: only DC exists.
            1..half + 1
        }
    }

    /// The Nyquist bin, present only for even lengths.
    pub fn nyquist(&self) -> Option<usize> {
        if self.len > 0 && self.len % 2 == 0 {
            Some(self.half())
        } else {
            None
        }
    }

    /// Bins mirrored from the positive frequencies; discarded.
    pub fn negative(&self) -> Range<usize> {
        (self.half() + 1).min(self.len)..self.len
    }
}

/// Buffers owned by a transform engine, one variant per [`BufferLayout`].
///
/// Buffers are sized once at construction and never resized.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineBuffers<T: Float> {
    /// Forward transforms `input → output`, backward `output → input`.
    Interleaved {
        input: Vec<Complex<T>>,
        output: Vec<Complex<T>>,
    },
    /// Forward transforms `(real_in, imag_in) → (real_out, imag_out)`,
    /// backward the reverse.
    Split {
        real_in: Vec<T>,
        imag_in: Vec<T>,
        real_out: Vec<T>,
        imag_out: Vec<T>,
    },
    /// Forward transforms `real → spectrum`, backward `spectrum → real`.
    HalfSpectrum {
        real: Vec<T>,
        spectrum: Vec<Complex<T>>,
    },
}

impl<T: Float> EngineBuffers<T> {
    pub fn layout(&self) -> BufferLayout {
        match self {
            EngineBuffers::Interleaved { .. } => BufferLayout::Interleaved,
            EngineBuffers::Split { .. } => BufferLayout::SplitComplex,
            EngineBuffers::HalfSpectrum { .. } => BufferLayout::HalfSpectrumRealToComplex,
        }
    }

    /// Number of time-domain samples the buffers hold.
    pub fn len(&self) -> usize {
        match self {
            EngineBuffers::Interleaved { input, .. } => input.len(),
            EngineBuffers::Split { real_in, .. } => real_in.len(),
            EngineBuffers::HalfSpectrum { real, .. } => real.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every buffer has the size `descriptor` calls for.
    pub fn fits(&self, descriptor: &BufferDescriptor) -> bool {
        if self.layout() != descriptor.layout {
            return false;
        }
        let n = descriptor.len;
        match self {
            EngineBuffers::Interleaved { input, output } => input.len() == n && output.len() == n,
            EngineBuffers::Split {
                real_in,
                imag_in,
                real_out,
                imag_out,
            } => [real_in, imag_in, real_out, imag_out]
                .iter()
                .all(|buf| buf.len() == n),
            EngineBuffers::HalfSpectrum { real, spectrum } => {
                real.len() == n && spectrum.len() == descriptor.complex_len()
            }
        }
    }

    /// Mutable slice views of the buffers. The views can change contents
    /// but never sizes.
    pub fn as_slices_mut(&mut self) -> BuffersMut<'_, T> {
        match self {
            EngineBuffers::Interleaved { input, output } => BuffersMut::Interleaved { input, output },
            EngineBuffers::Split {
                real_in,
                imag_in,
                real_out,
                imag_out,
            } => BuffersMut::Split {
                real_in,
                imag_in,
                real_out,
                imag_out,
            },
            EngineBuffers::HalfSpectrum { real, spectrum } => {
                BuffersMut::HalfSpectrum { real, spectrum }
            }
        }
    }

    /// Copy real samples into the forward transform's input, clearing any
    /// imaginary input.
    pub fn load_real(&mut self, samples: &[T]) -> Result<(), HilbertError> {
        if samples.len() != self.len() {
            return Err(HilbertError::MismatchedLengths);
        }
        match self {
            EngineBuffers::Interleaved { input, .. } => {
                for (dst, &x) in input.iter_mut().zip(samples) {
                    *dst = Complex::new(x, T::zero());
                }
            }
            EngineBuffers::Split {
                real_in, imag_in, ..
            } => {
                real_in.copy_from_slice(samples);
                imag_in.fill(T::zero());
            }
            EngineBuffers::HalfSpectrum { real, .. } => real.copy_from_slice(samples),
        }
        Ok(())
    }

    /// Copy the imaginary component of the backward transform's result
    /// into `out`. For the half-spectrum layout the backward transform is
    /// real-valued and carries the quadrature component itself.
    pub(crate) fn copy_quadrature(&self, out: &mut [T]) {
        match self {
            EngineBuffers::Interleaved { input, .. } => {
                for (dst, c) in out.iter_mut().zip(input) {
                    *dst = c.im;
                }
            }
            EngineBuffers::Split { imag_in, .. } => out.copy_from_slice(imag_in),
            EngineBuffers::HalfSpectrum { real, .. } => out.copy_from_slice(real),
        }
    }
}

/// Fixed-size views of an engine's buffers, one variant per layout.
#[derive(Debug)]
pub enum BuffersMut<'a, T: Float> {
    Interleaved {
        input: &'a mut [Complex<T>],
        output: &'a mut [Complex<T>],
    },
    Split {
        real_in: &'a mut [T],
        imag_in: &'a mut [T],
        real_out: &'a mut [T],
        imag_out: &'a mut [T],
    },
    HalfSpectrum {
        real: &'a mut [T],
        spectrum: &'a mut [Complex<T>],
    },
}

#[cfg(all(feature = "internal-tests", test))]
mod tests {
    use super::*;

    #[test]
    fn partition_even_length() {
        let bins = SpectrumBins::new(10);
        assert_eq!(bins.positive(), 1..5);
        assert_eq!(bins.nyquist(), Some(5));
        assert_eq!(bins.negative(), 6..10);
    }

    #[test]
    fn partition_odd_length() {
        let bins = SpectrumBins::new(7);
        assert_eq!(bins.positive(), 1..4);
        assert_eq!(bins.nyquist(), None);
        assert_eq!(bins.negative(), 4..7);
    }

    #[test]
    fn partition_degenerate_lengths() {
        let one = SpectrumBins::new(1);
        assert!(one.positive().is_empty());
        assert_eq!(one.nyquist(), None);
        assert!(one.negative().is_empty());

        let two = SpectrumBins::new(2);
        assert!(two.positive().is_empty());
        assert_eq!(two.nyquist(), Some(1));
        assert!(two.negative().is_empty());
    }

    #[test]
    fn load_real_checks_length() {
        let mut buffers = EngineBuffers::HalfSpectrum {
            real: vec![0.0f64; 4],
            spectrum: vec![Complex::new(0.0, 0.0); 3],
        };
        assert_eq!(
            buffers.load_real(&[1.0, 2.0]),
            Err(HilbertError::MismatchedLengths)
        );
        assert_eq!(buffers.load_real(&[1.0, 2.0, 3.0, 4.0]), Ok(()));
        assert!(buffers.fits(&BufferDescriptor::new(4, BufferLayout::HalfSpectrumRealToComplex)));
        assert!(!buffers.fits(&BufferDescriptor::new(4, BufferLayout::Interleaved)));
    }

    #[test]
    fn descriptor_complex_len() {
        assert_eq!(
            BufferDescriptor::new(9, BufferLayout::HalfSpectrumRealToComplex).complex_len(),
            5
        );
        assert_eq!(
            BufferDescriptor::new(9, BufferLayout::SplitComplex).complex_len(),
            9
        );
    }
}
