//! Result-File Serialization
//!
//! Writes the swept Eb/N0 values and BER estimates as two named JSON
//! arrays ("ebno_dB" and "ber"), retrievable by name for plotting.

use anyhow::Context;
use common::{BerPoint, SweepResults};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Write the sweep results to a JSON file
pub fn write_results(path: &Path, points: &[BerPoint]) -> anyhow::Result<()> {
    let results = SweepResults::from_points(points);
    let file = File::create(path)
        .with_context(|| format!("failed to create result file {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &results)
        .with_context(|| format!("failed to write results to {}", path.display()))?;
    Ok(())
}

/// Read results back, mainly for downstream tooling and tests
pub fn read_results(path: &Path) -> anyhow::Result<SweepResults> {
    let file = File::open(path)
        .with_context(|| format!("failed to open result file {}", path.display()))?;
    let results = serde_json::from_reader(file)
        .with_context(|| format!("failed to parse results from {}", path.display()))?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_array_roundtrip() {
        let points = vec![
            BerPoint::new(0.0, 1500, 10_000),
            BerPoint::new(1.0, 900, 10_000),
        ];
        let path = std::env::temp_dir().join("mimo_ofdm_results_test.json");

        write_results(&path, &points).unwrap();
        let results = read_results(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(results.ebno_db, vec![0.0, 1.0]);
        assert_eq!(results.ber, vec![0.15, 0.09]);
    }

    #[test]
    fn test_field_names_on_the_wire() {
        let points = vec![BerPoint::new(5.0, 1, 100)];
        let json = serde_json::to_string(&SweepResults::from_points(&points)).unwrap();
        assert!(json.contains("\"ebno_dB\""));
        assert!(json.contains("\"ber\""));
    }
}
