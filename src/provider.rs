//! Transform provider contract and its `rustfft`/`realfft` implementation.
//!
//! The engine never computes a spectral transform itself. It asks a
//! [`TransformProvider`] for a forward and a backward plan bound to a
//! [`BufferDescriptor`], then executes them against its own buffers. Plans
//! are built once and executed many times.

use std::sync::Arc;
use std::time::{Duration, Instant};

use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftDirection, FftPlanner, FftPlannerScalar};

use crate::error::HilbertError;
use crate::layout::{BufferDescriptor, BufferLayout, Direction, EngineBuffers};
use crate::lifecycle::{self, PlanningPolicy};
use crate::num::{try_filled, Complex, Float};
use crate::wisdom::{Algorithm, TransformKind, WisdomKey};

/// Largest transform length a provider is asked to plan.
pub const MAX_TRANSFORM_LEN: usize = i32::MAX as usize;

/// Executions per candidate when measuring.
const MEASURE_ROUNDS: usize = 4;

/// Source of transform plans and buffers.
///
/// Buffers are released by dropping them.
pub trait TransformProvider<T: Float> {
    /// Opaque, reusable execution-ready transform.
    type Plan;

    fn plan_forward(&self, descriptor: &BufferDescriptor) -> Result<Self::Plan, HilbertError>;
    fn plan_backward(&self, descriptor: &BufferDescriptor) -> Result<Self::Plan, HilbertError>;

    /// Run `plan` over `buffers`, moving data in the plan's direction.
    fn execute(
        &self,
        plan: &mut Self::Plan,
        buffers: &mut EngineBuffers<T>,
    ) -> Result<(), HilbertError>;

    fn allocate_real(&self, len: usize) -> Result<Vec<T>, HilbertError> {
        try_filled(len, T::zero())
    }

    fn allocate_complex(&self, len: usize) -> Result<Vec<Complex<T>>, HilbertError> {
        try_filled(len, Complex::new(T::zero(), T::zero()))
    }
}

enum Transform<T: Float> {
    Complex(Arc<dyn Fft<T>>),
    RealToComplex(Arc<dyn RealToComplex<T>>),
    ComplexToReal(Arc<dyn ComplexToReal<T>>),
}

/// A plan built by [`RustFftProvider`].
///
/// Owns its scratch space, plus a staging buffer for the split layout, so
/// execution never allocates.
pub struct RustFftPlan<T: Float> {
    descriptor: BufferDescriptor,
    direction: Direction,
    algorithm: Algorithm,
    transform: Transform<T>,
    scratch: Vec<Complex<T>>,
    staging: Vec<Complex<T>>,
}

impl<T: Float> RustFftPlan<T> {
    pub fn descriptor(&self) -> BufferDescriptor {
        self.descriptor
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Algorithm picked for this plan (from wisdom, measurement or estimate).
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

impl<T: Float> core::fmt::Debug for RustFftPlan<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RustFftPlan")
            .field("descriptor", &self.descriptor)
            .field("direction", &self.direction)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Provider backed by `rustfft` (complex layouts) and `realfft`
/// (half-spectrum layout).
///
/// Requires [`lifecycle::initialize`] before the first plan is built.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustFftProvider;

fn fft_direction(direction: Direction) -> FftDirection {
    match direction {
        Direction::Forward => FftDirection::Forward,
        Direction::Backward => FftDirection::Inverse,
    }
}

fn complex_fft<T: Float>(algorithm: Algorithm, len: usize, direction: Direction) -> Arc<dyn Fft<T>> {
    let direction = fft_direction(direction);
    match algorithm {
        Algorithm::Vectorized => FftPlanner::<T>::new().plan_fft(len, direction),
        Algorithm::Scalar => FftPlannerScalar::<T>::new().plan_fft(len, direction),
    }
}

/// Time each complex candidate on a zeroed buffer and return the fastest.
fn measure<T: Float>(len: usize, direction: Direction) -> Result<Algorithm, HilbertError> {
    let zero = Complex::new(T::zero(), T::zero());
    let mut best = (Algorithm::Vectorized, Duration::MAX);
    for algorithm in [Algorithm::Vectorized, Algorithm::Scalar] {
        let fft = complex_fft::<T>(algorithm, len, direction);
        let mut buf = try_filled(len, zero)?;
        let mut scratch = try_filled(fft.get_inplace_scratch_len(), zero)?;
        let start = Instant::now();
        for _ in 0..MEASURE_ROUNDS {
            fft.process_with_scratch(&mut buf, &mut scratch);
        }
        let elapsed = start.elapsed();
        log::trace!(
            "measured {} {:?} len {} with {:?}: {:?}",
            T::NAME,
            direction,
            len,
            algorithm,
            elapsed
        );
        if elapsed < best.1 {
            best = (algorithm, elapsed);
        }
    }
    Ok(best.0)
}

impl RustFftProvider {
    fn plan<T: Float>(
        &self,
        descriptor: &BufferDescriptor,
        direction: Direction,
    ) -> Result<RustFftPlan<T>, HilbertError> {
        let len = descriptor.len;
        if len == 0 || len > MAX_TRANSFORM_LEN {
            return Err(HilbertError::Unplannable {
                len,
                layout: descriptor.layout,
            });
        }
        lifecycle::with_planner(|state| {
            let kind = TransformKind::of(descriptor.layout);
            let zero = Complex::new(T::zero(), T::zero());
            let (algorithm, transform, scratch_len, staging_len) = match kind {
                TransformKind::Complex => {
                    let key = WisdomKey::new(T::NAME, kind, direction, len);
                    let algorithm = match state.wisdom.get(&key) {
                        Some(algorithm) => algorithm,
                        None => match state.config.policy {
                            PlanningPolicy::Estimate => Algorithm::Vectorized,
                            PlanningPolicy::Measure => {
                                let algorithm = measure::<T>(len, direction)?;
                                state.record(key, algorithm);
                                algorithm
                            }
                        },
                    };
                    let fft = complex_fft::<T>(algorithm, len, direction);
                    let (scratch_len, staging_len) = match descriptor.layout {
                        BufferLayout::Interleaved => (fft.get_outofplace_scratch_len(), 0),
                        _ => (fft.get_inplace_scratch_len(), len),
                    };
                    (algorithm, Transform::Complex(fft), scratch_len, staging_len)
                }
                TransformKind::Real => {
                    let mut planner = RealFftPlanner::<T>::new();
                    match direction {
                        Direction::Forward => {
                            let r2c = planner.plan_fft_forward(len);
                            let scratch_len = r2c.get_scratch_len();
                            (Algorithm::Vectorized, Transform::RealToComplex(r2c), scratch_len, 0)
                        }
                        Direction::Backward => {
                            let c2r = planner.plan_fft_inverse(len);
                            let scratch_len = c2r.get_scratch_len();
                            (Algorithm::Vectorized, Transform::ComplexToReal(c2r), scratch_len, 0)
                        }
                    }
                }
            };
            log::debug!(
                "planned {} {:?} {:?} len {} ({:?})",
                T::NAME,
                descriptor.layout,
                direction,
                len,
                algorithm
            );
            Ok(RustFftPlan {
                descriptor: *descriptor,
                direction,
                algorithm,
                transform,
                scratch: try_filled(scratch_len, zero)?,
                staging: try_filled(staging_len, zero)?,
            })
        })
    }
}

impl<T: Float> TransformProvider<T> for RustFftProvider {
    type Plan = RustFftPlan<T>;

    fn plan_forward(&self, descriptor: &BufferDescriptor) -> Result<RustFftPlan<T>, HilbertError> {
        self.plan(descriptor, Direction::Forward)
    }

    fn plan_backward(&self, descriptor: &BufferDescriptor) -> Result<RustFftPlan<T>, HilbertError> {
        self.plan(descriptor, Direction::Backward)
    }

    fn execute(
        &self,
        plan: &mut RustFftPlan<T>,
        buffers: &mut EngineBuffers<T>,
    ) -> Result<(), HilbertError> {
        if !buffers.fits(&plan.descriptor) {
            return Err(HilbertError::LayoutMismatch);
        }
        let RustFftPlan {
            direction,
            transform,
            scratch,
            staging,
            ..
        } = plan;
        match (transform, buffers) {
            (Transform::Complex(fft), EngineBuffers::Interleaved { input, output }) => {
                let (src, dst) = match *direction {
                    Direction::Forward => (input, output),
                    Direction::Backward => (output, input),
                };
                fft.process_outofplace_with_scratch(src, dst, scratch);
            }
            (
                Transform::Complex(fft),
                EngineBuffers::Split {
                    real_in,
                    imag_in,
                    real_out,
                    imag_out,
                },
            ) => {
                let (src_re, src_im, dst_re, dst_im) = match *direction {
                    Direction::Forward => (real_in, imag_in, real_out, imag_out),
                    Direction::Backward => (real_out, imag_out, real_in, imag_in),
                };
                for ((s, &re), &im) in staging.iter_mut().zip(src_re.iter()).zip(src_im.iter()) {
                    *s = Complex::new(re, im);
                }
                fft.process_with_scratch(staging, scratch);
                for ((s, re), im) in staging.iter().zip(dst_re.iter_mut()).zip(dst_im.iter_mut()) {
                    *re = s.re;
                    *im = s.im;
                }
            }
            (Transform::RealToComplex(r2c), EngineBuffers::HalfSpectrum { real, spectrum }) => {
                r2c.process_with_scratch(real, spectrum, scratch)
                    .map_err(|_| HilbertError::Execution)?;
            }
            (Transform::ComplexToReal(c2r), EngineBuffers::HalfSpectrum { real, spectrum }) => {
                c2r.process_with_scratch(spectrum, real, scratch)
                    .map_err(|_| HilbertError::Execution)?;
            }
            _ => return Err(HilbertError::LayoutMismatch),
        }
        Ok(())
    }
}
