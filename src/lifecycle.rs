//! Process-wide setup and teardown of the transform provider.
//!
//! Call [`initialize`] once near process start, before any engine is built,
//! and [`shutdown`] near process end. Plan construction from any thread goes
//! through the provider's planning lock owned by this module, so concurrent
//! cache misses on different threads are serialized here while cache hits
//! never touch it.
//!
//! Configuration comes from [`ProviderConfig`], either built explicitly or
//! read from the environment with [`ProviderConfig::from_env`]:
//!
//! | Variable          | Meaning                                   |
//! |-------------------|-------------------------------------------|
//! | `ANASIG_WISDOM`   | Path of the wisdom file to import/export  |
//! | `ANASIG_PLANNING` | `estimate` (default) or `measure`         |

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::HilbertError;
use crate::wisdom::{Algorithm, Wisdom, WisdomKey};

/// Well-known wisdom file name, relative to the working directory.
pub const DEFAULT_WISDOM_FILE: &str = ".anasig_wisdom";

const WISDOM_ENV: &str = "ANASIG_WISDOM";
const PLANNING_ENV: &str = "ANASIG_PLANNING";

/// How the provider chooses a transform algorithm for a new size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanningPolicy {
    /// Use the vectorized algorithm without measuring.
    #[default]
    Estimate,
    /// Time every candidate once per size and keep the fastest.
    Measure,
}

impl PlanningPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "estimate" => Some(PlanningPolicy::Estimate),
            "measure" => Some(PlanningPolicy::Measure),
            _ => None,
        }
    }
}

/// Provider configuration applied by [`initialize`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProviderConfig {
    /// Wisdom file imported on initialize and exported on shutdown.
    pub wisdom_path: Option<PathBuf>,
    pub policy: PlanningPolicy,
}

impl ProviderConfig {
    /// Read `ANASIG_WISDOM` and `ANASIG_PLANNING`. Unset or unparsable
    /// values keep their defaults.
    pub fn from_env() -> Self {
        let wisdom_path = std::env::var_os(WISDOM_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let policy = std::env::var(PLANNING_ENV)
            .ok()
            .and_then(|v| PlanningPolicy::parse(&v))
            .unwrap_or_default();
        Self {
            wisdom_path,
            policy,
        }
    }

    pub fn with_wisdom_file(mut self, path: impl AsRef<Path>) -> Self {
        self.wisdom_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use [`DEFAULT_WISDOM_FILE`].
    pub fn with_default_wisdom(self) -> Self {
        self.with_wisdom_file(DEFAULT_WISDOM_FILE)
    }

    pub fn with_policy(mut self, policy: PlanningPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// State guarded by the planning lock.
#[derive(Debug)]
pub(crate) struct ProviderState {
    pub(crate) config: ProviderConfig,
    pub(crate) wisdom: Wisdom,
    /// Entries recorded since import.
    pub(crate) recorded: usize,
}

impl ProviderState {
    pub(crate) fn record(&mut self, key: WisdomKey, algorithm: Algorithm) {
        if self.wisdom.insert(key, algorithm) != Some(algorithm) {
            self.recorded += 1;
        }
    }
}

static INITIALIZED: AtomicBool = AtomicBool::new(false);
static STATE: Mutex<Option<ProviderState>> = Mutex::new(None);

fn lock_state() -> MutexGuard<'static, Option<ProviderState>> {
    STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Initialize the provider. Returns `true` if this call performed the
/// setup and `false` if the provider was already initialized, in which case
/// `config` is ignored.
///
/// A missing wisdom file is not an error. An unreadable or corrupt one is
/// logged and skipped; planning then starts from an empty table.
pub fn initialize(config: ProviderConfig) -> Result<bool, HilbertError> {
    let mut state = lock_state();
    if state.is_some() {
        return Ok(false);
    }
    let wisdom = match &config.wisdom_path {
        Some(path) if path.exists() => match Wisdom::load(path) {
            Ok(wisdom) => {
                log::info!(
                    "imported {} wisdom entries from {}",
                    wisdom.len(),
                    path.display()
                );
                wisdom
            }
            Err(err) => {
                log::warn!("ignoring wisdom file {}: {}", path.display(), err);
                Wisdom::new()
            }
        },
        _ => Wisdom::new(),
    };
    log::info!("transform provider initialized ({:?} planning)", config.policy);
    *state = Some(ProviderState {
        config,
        wisdom,
        recorded: 0,
    });
    INITIALIZED.store(true, Ordering::Release);
    Ok(true)
}

/// Tear the provider down, exporting wisdom if a path is configured and new
/// decisions were recorded. Calling it while uninitialized is a no-op.
///
/// Engines already built stay usable; building new ones requires another
/// [`initialize`].
pub fn shutdown() -> Result<(), HilbertError> {
    let mut guard = lock_state();
    let Some(state) = guard.take() else {
        return Ok(());
    };
    INITIALIZED.store(false, Ordering::Release);
    if let Some(path) = &state.config.wisdom_path {
        if state.recorded > 0 {
            state.wisdom.save(path)?;
            log::info!(
                "exported {} wisdom entries to {}",
                state.wisdom.len(),
                path.display()
            );
        }
    }
    log::info!("transform provider shut down");
    Ok(())
}

pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Copy of the current wisdom table, if initialized.
pub fn wisdom_snapshot() -> Option<Wisdom> {
    lock_state().as_ref().map(|state| state.wisdom.clone())
}

/// Run `f` under the planning lock.
pub(crate) fn with_planner<R>(
    f: impl FnOnce(&mut ProviderState) -> Result<R, HilbertError>,
) -> Result<R, HilbertError> {
    let mut guard = lock_state();
    match guard.as_mut() {
        Some(state) => f(state),
        None => Err(HilbertError::ProviderUninitialized),
    }
}

#[cfg(all(feature = "internal-tests", test))]
mod tests {
    use super::*;

    #[test]
    fn parses_policy_names() {
        assert_eq!(PlanningPolicy::parse("Measure"), Some(PlanningPolicy::Measure));
        assert_eq!(PlanningPolicy::parse(" estimate "), Some(PlanningPolicy::Estimate));
        assert_eq!(PlanningPolicy::parse("patient"), None);
    }

    #[test]
    fn builder_sets_fields() {
        let cfg = ProviderConfig::default()
            .with_default_wisdom()
            .with_policy(PlanningPolicy::Measure);
        assert_eq!(cfg.wisdom_path.as_deref(), Some(Path::new(DEFAULT_WISDOM_FILE)));
        assert_eq!(cfg.policy, PlanningPolicy::Measure);
    }
}
