//! Transform engines and the per-thread engine cache.
//!
//! A [`TransformEngine`] owns the buffers and the forward/backward plan pair
//! for one `(length, layout)` combination. An [`EngineCache`] keeps at most
//! one engine per combination and hands out [`EngineHandle`]s that borrow
//! it exclusively, so an engine is never used by two computations at once.
//!
//! The cache itself is not synchronized. Each thread owns its own caches
//! (see [`Float::with_thread_cache`]); nothing is shared between threads
//! except plan construction, which the provider serializes.

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;

use crate::error::HilbertError;
use crate::layout::{BufferDescriptor, BufferLayout, BuffersMut, EngineBuffers};
use crate::magnitude::{self, MagnitudeKernel};
use crate::num::Float;
use crate::provider::{RustFftProvider, TransformProvider};

/// Buffers plus forward and backward plans for one size and layout.
pub struct TransformEngine<T: Float, P: TransformProvider<T> = RustFftProvider> {
    descriptor: BufferDescriptor,
    buffers: EngineBuffers<T>,
    forward: P::Plan,
    backward: P::Plan,
}

impl<T: Float, P: TransformProvider<T>> TransformEngine<T, P> {
    /// Allocate the layout's buffers, then plan both directions.
    ///
    /// Nothing is retained if any step fails.
    pub fn new(provider: &P, len: usize, layout: BufferLayout) -> Result<Self, HilbertError> {
        let descriptor = BufferDescriptor::new(len, layout);
        let buffers = match layout {
            BufferLayout::Interleaved => EngineBuffers::Interleaved {
                input: provider.allocate_complex(len)?,
                output: provider.allocate_complex(len)?,
            },
            BufferLayout::SplitComplex => EngineBuffers::Split {
                real_in: provider.allocate_real(len)?,
                imag_in: provider.allocate_real(len)?,
                real_out: provider.allocate_real(len)?,
                imag_out: provider.allocate_real(len)?,
            },
            BufferLayout::HalfSpectrumRealToComplex => EngineBuffers::HalfSpectrum {
                real: provider.allocate_real(len)?,
                spectrum: provider.allocate_complex(descriptor.complex_len())?,
            },
        };
        let forward = provider.plan_forward(&descriptor)?;
        let backward = provider.plan_backward(&descriptor)?;
        Ok(Self {
            descriptor,
            buffers,
            forward,
            backward,
        })
    }

    pub fn len(&self) -> usize {
        self.descriptor.len
    }

    pub fn is_empty(&self) -> bool {
        self.descriptor.len == 0
    }

    pub fn layout(&self) -> BufferLayout {
        self.descriptor.layout
    }

    pub fn descriptor(&self) -> BufferDescriptor {
        self.descriptor
    }

    pub fn buffers(&self) -> &EngineBuffers<T> {
        &self.buffers
    }

    /// Contents of the buffers, at their planned sizes.
    pub fn buffers_mut(&mut self) -> BuffersMut<'_, T> {
        self.buffers.as_slices_mut()
    }

    /// Load real samples into the forward input.
    pub fn load_real(&mut self, samples: &[T]) -> Result<(), HilbertError> {
        self.buffers.load_real(samples)
    }

    /// Execute the forward plan on the engine's buffers.
    pub fn forward(&mut self, provider: &P) -> Result<(), HilbertError> {
        provider.execute(&mut self.forward, &mut self.buffers)
    }

    /// Execute the backward plan on the engine's buffers.
    pub fn backward(&mut self, provider: &P) -> Result<(), HilbertError> {
        provider.execute(&mut self.backward, &mut self.buffers)
    }
}

/// Exclusive access to a cached engine for one computation.
pub struct EngineHandle<'a, T: Float, P: TransformProvider<T> = RustFftProvider> {
    engine: &'a mut TransformEngine<T, P>,
    provider: &'a P,
}

impl<'a, T: Float, P: TransformProvider<T>> EngineHandle<'a, T, P> {
    pub fn len(&self) -> usize {
        self.engine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engine.is_empty()
    }

    pub fn layout(&self) -> BufferLayout {
        self.engine.layout()
    }

    pub fn buffers(&self) -> &EngineBuffers<T> {
        self.engine.buffers()
    }

    pub fn buffers_mut(&mut self) -> BuffersMut<'_, T> {
        self.engine.buffers_mut()
    }

    pub fn load_real(&mut self, samples: &[T]) -> Result<(), HilbertError> {
        self.engine.load_real(samples)
    }

    pub fn forward(&mut self) -> Result<(), HilbertError> {
        self.engine.forward(self.provider)
    }

    pub fn backward(&mut self) -> Result<(), HilbertError> {
        self.engine.backward(self.provider)
    }
}

/// Hit/miss counters of an [`EngineCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Map from `(length, layout)` to a reusable [`TransformEngine`].
///
/// Entries live until [`EngineCache::clear`] or until the cache is dropped.
/// A failed construction leaves the cache unchanged, so the next
/// [`EngineCache::acquire`] for the same key retries from scratch.
pub struct EngineCache<T: Float, P: TransformProvider<T> = RustFftProvider> {
    engines: HashMap<(usize, BufferLayout), TransformEngine<T, P>>,
    provider: P,
    pub(crate) kernel: &'static dyn MagnitudeKernel,
    stats: CacheStats,
}

impl<T: Float> EngineCache<T> {
    /// Empty cache backed by [`RustFftProvider`] and the detected
    /// magnitude kernel.
    pub fn new() -> Self {
        Self::with_provider(RustFftProvider)
    }
}

impl<T: Float> Default for EngineCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float, P: TransformProvider<T>> EngineCache<T, P> {
    pub fn with_provider(provider: P) -> Self {
        Self {
            engines: HashMap::new(),
            provider,
            kernel: magnitude::kernel(),
            stats: CacheStats::default(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Return the engine for `(len, layout)`, building it on first use.
    pub fn acquire(
        &mut self,
        len: usize,
        layout: BufferLayout,
    ) -> Result<EngineHandle<'_, T, P>, HilbertError> {
        let engine = match self.engines.entry((len, layout)) {
            Entry::Occupied(entry) => {
                self.stats.hits += 1;
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                let engine = TransformEngine::new(&self.provider, len, layout).map_err(|err| {
                    log::debug!("{} engine {:?} len {} failed: {}", T::NAME, layout, len, err);
                    err
                })?;
                self.stats.misses += 1;
                log::debug!("{} engine {:?} len {} built", T::NAME, layout, len);
                entry.insert(engine)
            }
        };
        Ok(EngineHandle {
            engine,
            provider: &self.provider,
        })
    }

    pub fn contains(&self, len: usize, layout: BufferLayout) -> bool {
        self.engines.contains_key(&(len, layout))
    }

    /// Number of cached engines.
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Drop every cached engine. Counters are kept.
    pub fn clear(&mut self) {
        if !self.engines.is_empty() {
            log::debug!("dropping {} cached {} engines", self.engines.len(), T::NAME);
        }
        self.engines.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Magnitude kernel used by this cache's envelope computations.
    pub fn kernel(&self) -> &'static dyn MagnitudeKernel {
        self.kernel
    }

    pub fn set_kernel(&mut self, kernel: &'static dyn MagnitudeKernel) {
        self.kernel = kernel;
    }
}
