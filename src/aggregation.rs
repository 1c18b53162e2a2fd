use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::binning::{bin_stats, partition_by_diameter, BinHeader, SelectionConfig};
use crate::particle::{round_to, Particle, TrajectoryDocument};
use crate::AnalysisError;

/// One averaged curve sample: (time_s, value)
pub type CurvePoint = (f64, f64);

/// One selection: a diameter bin's statistics, averaged curves and members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinEntry {
    pub header: BinHeader,
    /// Mean travelled distance per time step (s, cm)
    pub averaged_distances: Vec<CurvePoint>,
    /// Mean speed per time step (s, cm/s)
    pub averaged_speeds: Vec<CurvePoint>,
    pub particles: Vec<Particle>,
}

/// Index-aligned mean of member trajectories.
///
/// The series is as long as the longest member trajectory; shorter members
/// simply stop contributing, so later means rest on fewer samples. Times are
/// labelled `i * dt` and each mean is rounded to four decimals. Empty when
/// no member carries distance samples.
pub fn average_distances(particles: &[Particle], dt: f64) -> Vec<CurvePoint> {
    let max_len = particles
        .iter()
        .map(|p| p.distance.len())
        .max()
        .unwrap_or(0);
    if max_len == 0 {
        return Vec::new();
    }

    let mut sums = vec![0.0; max_len];
    let mut counts = vec![0usize; max_len];
    for particle in particles {
        for (i, &d) in particle.distance.iter().enumerate() {
            sums[i] += d;
            counts[i] += 1;
        }
    }

    (0..max_len)
        .map(|i| (i as f64 * dt, round_to(sums[i] / counts[i] as f64, 4)))
        .collect()
}

/// Time-keyed mean of member speed curves.
///
/// Samples are grouped by their time stamp, so members of different lengths
/// contribute exactly where they have data. Output is sorted by time with
/// both fields rounded to five decimals.
pub fn average_speeds(particles: &[Particle]) -> Vec<CurvePoint> {
    // Speed times carry five decimals, so scaling by 1e5 gives an exact
    // integer key.
    let mut by_time: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for particle in particles {
        for &(t, v) in particle.speed.as_deref().unwrap_or(&[]) {
            let key = (t * 1e5).round() as i64;
            by_time.entry(key).or_default().push(v);
        }
    }

    by_time
        .into_iter()
        .map(|(key, values)| {
            let avg = values.iter().sum::<f64>() / values.len() as f64;
            (key as f64 / 1e5, round_to(avg, 5))
        })
        .collect()
}

/// Build the per-bin selections for a trajectory document.
///
/// Filters and bins the particles, attaches a derived speed curve to every
/// member and averages the member curves. Every bin appears in the output,
/// including empty ones.
pub fn build_selections(
    doc: TrajectoryDocument,
    config: &SelectionConfig,
) -> Result<Vec<BinEntry>, AnalysisError> {
    let bins = partition_by_diameter(doc.particles, config)?;

    let mut entries = Vec::with_capacity(bins.len());
    for mut bin in bins {
        let header = bin_stats(&bin);
        for particle in &mut bin.particles {
            particle.derive_speeds(config.sample_dt);
        }
        let averaged_distances = average_distances(&bin.particles, config.sample_dt);
        let averaged_speeds = average_speeds(&bin.particles);
        entries.push(BinEntry {
            header,
            averaged_distances,
            averaged_speeds,
            particles: bin.particles,
        });
    }
    Ok(entries)
}
