//! MIMO-OFDM BER Simulator Main Application
//!
//! Sweeps Eb/N0 over a spatial-multiplexing MIMO-OFDM link through a
//! tapped-delay-line fading channel and writes the BER curve to a result
//! file.

mod config;
mod results;

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use config::SimConfig;
use link::SimulationDriver;

/// MIMO-OFDM link BER simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a YAML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Result file path, overriding the configuration
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// RNG seed for reproducible runs, overriding the configuration
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt().with_env_filter(env_filter).with_target(true).init();

    let mut sim_config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            SimConfig::from_yaml_file(path)?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        sim_config.seed = Some(seed);
    }
    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&sim_config.output_path));

    let link_config = sim_config.to_link_config()?;
    info!("Link configuration:");
    info!(
        "  OFDM: {} subcarriers, {}-sample cyclic prefix",
        link_config.num_subcarriers, link_config.cp_len
    );
    info!(
        "  Antennas: {} tx, {} rx",
        link_config.num_tx_antennas, link_config.num_rx_antennas
    );
    info!(
        "  Frames: {} in batches of {}",
        link_config.num_ofdm_frames, link_config.batch_size
    );
    info!(
        "  Channel: {} taps, normalized Doppler {:.1e}",
        link_config.profile.num_taps(),
        link_config.norm_doppler
    );
    info!(
        "  Eb/N0 sweep: {} points ({} .. {} dB)",
        link_config.ebno_db.len(),
        link_config.ebno_db.first().copied().unwrap_or(f64::NAN),
        link_config.ebno_db.last().copied().unwrap_or(f64::NAN)
    );

    // Preconditions are checked here, before any simulation work
    let driver = SimulationDriver::new(link_config)?;

    let mut rng = match sim_config.seed {
        Some(seed) => {
            info!("Using fixed RNG seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };

    let start = Instant::now();
    let points = driver.run(&mut rng)?;
    info!("Sweep finished in {:.1} s", start.elapsed().as_secs_f64());

    info!("Saving results to {}", output_path.display());
    results::write_results(&output_path, &points)?;

    Ok(())
}
