//! Envelope of a short cosine burst on every buffer layout, with verbose logging.
use anasig::lifecycle::{self, ProviderConfig};
use anasig::{BufferLayout, EngineCache};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();

    lifecycle::initialize(ProviderConfig::from_env())?;

    let n = 10;
    let signal: Vec<f64> = (0..n)
        .map(|i| (std::f64::consts::PI * 4.0 * i as f64 / (n - 1) as f64).cos())
        .collect();
    let mut envelope = vec![0.0; n];
    let mut cache = EngineCache::<f64>::new();

    println!("=== Envelope example ===\n");
    println!("signal:   {:?}", signal);
    for layout in BufferLayout::ALL {
        cache.envelope(&signal, &mut envelope, layout)?;
        println!("{:<28} {:?}", format!("{:?}:", layout), envelope);
    }
    println!("\ncache: {:?}", cache.stats());

    lifecycle::shutdown()?;
    Ok(())
}
