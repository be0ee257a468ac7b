//! # anasig - Analytic-signal envelope engine
//!
//! Computes the Hilbert transform, analytic signal and amplitude envelope of
//! real `f32`/`f64` signals. Transform plans and buffers are built once per
//! `(length, layout)` and reused from a per-thread cache, and the final
//! magnitude reduction runs on a SIMD kernel picked at runtime.
//!
//! ## Features
//!
//! - **Three buffer layouts**: interleaved complex, split complex and
//!   real-to-complex half spectrum ([`BufferLayout`])
//! - **Per-thread engine cache** with explicit [`EngineCache::clear`]
//! - **Runtime SIMD dispatch** for the magnitude kernel (SSE2/AVX2 on
//!   x86_64, NEON on AArch64, scalar elsewhere)
//! - **Wisdom import/export** so measured planning decisions survive restarts
//!
//! ## Cargo Features
//!
//! - `simd` (default): Enable the vector magnitude kernels
//! - `internal-tests`: Build the in-module unit and property tests
//!
//! ## Usage
//!
//! ```
//! use anasig::lifecycle::{self, ProviderConfig};
//! use anasig::{BufferLayout, EngineCache};
//!
//! lifecycle::initialize(ProviderConfig::default()).unwrap();
//!
//! let input: Vec<f32> = (0..64).map(|i| (i as f32 * 0.3).sin()).collect();
//! let mut env = vec![0.0f32; input.len()];
//!
//! let mut cache = EngineCache::<f32>::new();
//! cache.envelope(&input, &mut env, BufferLayout::HalfSpectrumRealToComplex).unwrap();
//! assert!(env.iter().all(|&e| e >= 0.0));
//! ```
//!
//! ## License
//!
//! Licensed under either of Apache License, Version 2.0 or MIT license,
//! at your option.

/// Error types
pub mod error;
/// Buffer layouts, descriptors and the spectrum bin partition
pub mod layout;
/// Float bundle and complex number re-exports
pub mod num;

/// Transform provider contract and the `rustfft`-backed implementation
pub mod provider;

/// Transform engines and the engine cache
pub mod engine;

/// Hilbert transform, analytic signal and envelope
pub mod hilbert;

/// Scalar and SIMD magnitude reduction kernels
pub mod magnitude;

/// Provider initialization, configuration and teardown
pub mod lifecycle;
/// Persisted planning decisions
pub mod wisdom;

pub use engine::{CacheStats, EngineCache, EngineHandle, TransformEngine};
pub use error::{HilbertError, WisdomError};
pub use hilbert::{
    analytic_signal, analytic_signal_into, clear_thread_cache, envelope, envelope_with_layout,
    thread_cache_len, EnvelopeRequest,
};
pub use layout::{
    BufferDescriptor, BufferLayout, BuffersMut, Direction, EngineBuffers, SpectrumBins,
};
pub use lifecycle::{initialize, shutdown, PlanningPolicy, ProviderConfig};
pub use magnitude::{reduce_magnitude, reduce_magnitude_with, MagnitudeKernel};
pub use num::{Complex, Complex32, Complex64, Float};
pub use provider::{RustFftProvider, TransformProvider, MAX_TRANSFORM_LEN};
