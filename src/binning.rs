use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BIN_COUNT, DEFAULT_SAMPLE_DT_S};
use crate::particle::{round_to, Particle};
use crate::AnalysisError;

/// Settings for the selection stage: which particles to keep and how to bin them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionConfig {
    /// Number of equal-width diameter bins
    pub bin_count: usize,
    /// Keep particles that struck the pan
    pub include_hit: bool,
    /// Keep particles that never struck the pan
    pub include_unhit: bool,
    /// Spacing between recorded distance samples (s)
    pub sample_dt: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        SelectionConfig {
            bin_count: DEFAULT_BIN_COUNT,
            include_hit: true,
            include_unhit: true,
            sample_dt: DEFAULT_SAMPLE_DT_S,
        }
    }
}

/// Summary statistics for one diameter bin.
///
/// All diameter fields are absent for a bin that received no particles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinHeader {
    /// Smallest member diameter (µm)
    pub min_diameter: Option<f64>,
    /// Largest member diameter (µm)
    pub max_diameter: Option<f64>,
    /// Mean member diameter (µm), rounded to two decimals
    pub average_diameter: Option<f64>,
    /// Number of particles assigned to the bin
    pub particle_count: usize,
}

/// One diameter interval and the particles assigned to it.
///
/// The interval is half-open; only the last bin also admits its upper edge.
#[derive(Debug, Clone, PartialEq)]
pub struct DiameterBin {
    /// Inclusive lower edge (µm)
    pub low: f64,
    /// Upper edge (µm)
    pub high: f64,
    pub particles: Vec<Particle>,
}

fn passes_filter(particle: &Particle, config: &SelectionConfig) -> bool {
    match particle.hit {
        Some(true) => config.include_hit,
        Some(false) | None => config.include_unhit,
    }
}

/// Equal-width bin edges spanning the observed diameters.
///
/// `bin_count` intervals produce `bin_count + 1` edges, the last of which is
/// exactly the largest diameter. A degenerate range (all diameters equal) is
/// widened by half a micron on each side; an empty slice falls back to the
/// unit interval.
pub fn bin_edges(diameters: &[f64], bin_count: usize) -> Vec<f64> {
    let (mut low, mut high) = match diameters.split_first() {
        None => (0.0, 1.0),
        Some((&first, rest)) => rest
            .iter()
            .fold((first, first), |(lo, hi), &d| (lo.min(d), hi.max(d))),
    };
    if low == high {
        low -= 0.5;
        high += 0.5;
    }

    let step = (high - low) / bin_count as f64;
    let mut edges: Vec<f64> = (0..bin_count).map(|i| low + step * i as f64).collect();
    edges.push(high);
    edges
}

/// Split a run's particles into diameter bins.
///
/// Particles are filtered by hit status first, so the bin range spans only
/// the surviving diameters. Returns an error when the configuration excludes
/// every particle category or asks for zero bins.
pub fn partition_by_diameter(
    particles: Vec<Particle>,
    config: &SelectionConfig,
) -> Result<Vec<DiameterBin>, AnalysisError> {
    if !config.include_hit && !config.include_unhit {
        return Err(AnalysisError::from(
            "selection excludes both hit and unhit particles; nothing to analyze",
        ));
    }
    if config.bin_count == 0 {
        return Err(AnalysisError::from("bin count must be at least 1"));
    }

    let filtered: Vec<Particle> = particles
        .into_iter()
        .filter(|p| passes_filter(p, config))
        .collect();

    let diameters: Vec<f64> = filtered.iter().map(|p| p.diameter).collect();
    let edges = bin_edges(&diameters, config.bin_count);

    let mut bins: Vec<DiameterBin> = edges
        .windows(2)
        .map(|w| DiameterBin {
            low: w[0],
            high: w[1],
            particles: Vec::new(),
        })
        .collect();

    let last = bins.len() - 1;
    let top_edge = edges[edges.len() - 1];
    for particle in filtered {
        let d = particle.diameter;
        let slot = (0..bins.len())
            .find(|&i| (edges[i] <= d && d < edges[i + 1]) || (i == last && d == top_edge));
        if let Some(i) = slot {
            bins[i].particles.push(particle);
        }
    }

    Ok(bins)
}

/// Diameter statistics for one bin: min, max, two-decimal average and count.
pub fn bin_stats(bin: &DiameterBin) -> BinHeader {
    if bin.particles.is_empty() {
        return BinHeader {
            min_diameter: None,
            max_diameter: None,
            average_diameter: None,
            particle_count: 0,
        };
    }

    let diameters: Vec<f64> = bin.particles.iter().map(|p| p.diameter).collect();
    let min = diameters.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max = diameters.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let avg = diameters.iter().sum::<f64>() / diameters.len() as f64;

    BinHeader {
        min_diameter: Some(min),
        max_diameter: Some(max),
        average_diameter: Some(round_to(avg, 2)),
        particle_count: diameters.len(),
    }
}
