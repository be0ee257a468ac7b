// Provider state is process-wide, so the whole lifecycle runs as one test.
use anasig::lifecycle::{self, PlanningPolicy, ProviderConfig};
use anasig::wisdom::{Algorithm, TransformKind, Wisdom, WisdomKey};
use anasig::{BufferLayout, Direction, EngineCache, HilbertError};

#[test]
fn initialize_plan_shutdown_reimport() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("anasig.wisdom");

    // No plans before initialization.
    assert!(!lifecycle::is_initialized());
    let mut cache = EngineCache::<f64>::new();
    assert_eq!(
        cache.acquire(64, BufferLayout::Interleaved).err(),
        Some(HilbertError::ProviderUninitialized)
    );
    assert!(cache.is_empty());
    assert_eq!(lifecycle::shutdown(), Ok(()));

    let config = ProviderConfig::default()
        .with_wisdom_file(&path)
        .with_policy(PlanningPolicy::Measure);
    assert_eq!(lifecycle::initialize(config.clone()), Ok(true));
    assert!(lifecycle::is_initialized());
    assert_eq!(lifecycle::initialize(ProviderConfig::default()), Ok(false));
    assert!(lifecycle::wisdom_snapshot().unwrap().is_empty());

    // Measuring records one decision per complex direction.
    cache.acquire(64, BufferLayout::Interleaved).unwrap();
    cache.acquire(64, BufferLayout::SplitComplex).unwrap();
    cache.acquire(64, BufferLayout::HalfSpectrumRealToComplex).unwrap();
    let snapshot = lifecycle::wisdom_snapshot().unwrap();
    assert_eq!(snapshot.len(), 2);
    let forward = WisdomKey::new("f64", TransformKind::Complex, Direction::Forward, 64);
    let chosen: Algorithm = snapshot.get(&forward).unwrap();

    assert!(!path.exists());
    assert_eq!(lifecycle::shutdown(), Ok(()));
    assert!(!lifecycle::is_initialized());
    assert_eq!(Wisdom::load(&path).unwrap(), snapshot);

    // Engines built earlier keep working after shutdown.
    let mut out = [0.0f64; 64];
    cache
        .envelope(&[0.5; 64], &mut out, BufferLayout::SplitComplex)
        .unwrap();
    assert!(out.iter().all(|&e| (e - 0.5).abs() < 1e-12));

    // Re-initializing imports the exported decisions.
    assert_eq!(lifecycle::initialize(config), Ok(true));
    assert_eq!(lifecycle::wisdom_snapshot().unwrap().get(&forward), Some(chosen));
    let mut fresh = EngineCache::<f64>::new();
    fresh.acquire(64, BufferLayout::Interleaved).unwrap();
    assert_eq!(lifecycle::wisdom_snapshot().unwrap().len(), 2);

    // Nothing new was recorded, so shutdown leaves the file as is.
    std::fs::write(&path, "stale").unwrap();
    assert_eq!(lifecycle::shutdown(), Ok(()));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "stale");

    // A corrupt file is skipped, not fatal.
    assert_eq!(lifecycle::initialize(ProviderConfig::default().with_wisdom_file(&path)), Ok(true));
    assert!(lifecycle::wisdom_snapshot().unwrap().is_empty());
    assert_eq!(lifecycle::shutdown(), Ok(()));
}

#[test]
fn config_from_env() {
    // Only reads variables this test owns.
    std::env::set_var("ANASIG_PLANNING", "measure");
    std::env::set_var("ANASIG_WISDOM", "/tmp/anasig-env.wisdom");
    let config = ProviderConfig::from_env();
    assert_eq!(config.policy, PlanningPolicy::Measure);
    assert_eq!(
        config.wisdom_path.as_deref(),
        Some(std::path::Path::new("/tmp/anasig-env.wisdom"))
    );

    std::env::set_var("ANASIG_PLANNING", "sometimes");
    std::env::remove_var("ANASIG_WISDOM");
    let config = ProviderConfig::from_env();
    assert_eq!(config, ProviderConfig::default());
}
