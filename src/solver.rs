use std::f64::consts::PI;

use crate::aggregation::{BinEntry, CurvePoint};
use crate::constants::{
    CMPS_TO_MPS, DEFAULT_POLY_DT_S, GAS_DENSITY_KG_M3, GAS_VISCOSITY_PA_S, G_ACCEL_MPS2,
    MICRONS_TO_METERS, PARTICLE_DENSITY_KG_M3, SPEED_POLY_DEGREE,
};
use crate::polyfit::{polyfit, polyval};
use crate::results::{DragSeries, ResultEntry};

/// Gas and particle medium properties for the drag solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Medium {
    /// Particle material density (kg/m³)
    pub particle_density: f64,
    /// Carrier gas density (kg/m³)
    pub gas_density: f64,
    /// Carrier gas dynamic viscosity (Pa·s)
    pub gas_viscosity: f64,
    /// Gravitational acceleration (m/s²)
    pub gravity: f64,
}

impl Default for Medium {
    fn default() -> Self {
        Medium {
            particle_density: PARTICLE_DENSITY_KG_M3,
            gas_density: GAS_DENSITY_KG_M3,
            gas_viscosity: GAS_VISCOSITY_PA_S,
            gravity: G_ACCEL_MPS2,
        }
    }
}

/// Settings for the drag solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    pub medium: Medium,
    /// Resampling step along the fitted polynomial (s)
    pub poly_dt: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            medium: Medium::default(),
            poly_dt: DEFAULT_POLY_DT_S,
        }
    }
}

/// Mass (kg), cross-section (m²) and diameter (m) of the representative
/// sphere for a bin, from its average diameter in µm.
pub fn sphere_geometry(average_diameter_um: f64, particle_density: f64) -> (f64, f64, f64) {
    let d = average_diameter_um * MICRONS_TO_METERS;
    let mass = particle_density * PI / 6.0 * d.powi(3);
    let area = PI * d.powi(2) / 4.0;
    (mass, area, d)
}

/// Cubic least-squares fit of a bin's averaged speed curve.
///
/// Returns an empty coefficient set when the curve has three or fewer
/// samples, leaving the polynomial method without output for that bin.
pub fn fit_speed_polynomial(samples: &[CurvePoint]) -> Vec<f64> {
    if samples.len() <= SPEED_POLY_DEGREE {
        return Vec::new();
    }
    let times: Vec<f64> = samples.iter().map(|&(t, _)| t).collect();
    let speeds: Vec<f64> = samples.iter().map(|&(_, v)| v).collect();
    polyfit(&times, &speeds, SPEED_POLY_DEGREE).unwrap_or_default()
}

/// One step of the drag relation: Cd from the deceleration balance, Re from
/// the speed magnitude, and their product A. Speeds are in m/s.
fn drag_step(
    u: f64,
    u_prev: f64,
    dt: f64,
    mass: f64,
    area: f64,
    diameter: f64,
    medium: &Medium,
) -> (f64, f64, f64) {
    let cd = -2.0 * mass / (area * medium.gas_density * u) * ((u - u_prev) / dt - medium.gravity);
    let re = medium.gas_density * u.abs() * diameter / medium.gas_viscosity;
    (cd, re, re * cd)
}

/// Drag series sampled along the fitted polynomial.
///
/// Walks the averaged curve's time span in `poly_dt` steps, differentiating
/// backwards over one step. Steps where the polynomial speed is exactly zero
/// are skipped. Empty when no polynomial was fitted.
fn polynomial_series(
    coeffs: &[f64],
    samples: &[CurvePoint],
    mass: f64,
    area: f64,
    diameter: f64,
    config: &SolverConfig,
) -> DragSeries {
    let mut series = DragSeries::default();
    if coeffs.is_empty() || samples.is_empty() {
        return series;
    }

    let t_min = samples.iter().map(|&(t, _)| t).fold(f64::INFINITY, f64::min);
    let t_max = samples
        .iter()
        .map(|&(t, _)| t)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut t = t_min + config.poly_dt;
    while t <= t_max {
        let t_prev = t - config.poly_dt;
        let u = polyval(coeffs, t) * CMPS_TO_MPS;
        let u_prev = polyval(coeffs, t_prev) * CMPS_TO_MPS;

        if u != 0.0 {
            let (cd, re, a) = drag_step(
                u,
                u_prev,
                config.poly_dt,
                mass,
                area,
                diameter,
                &config.medium,
            );
            series.push(cd, re, a);
        }
        t += config.poly_dt;
    }
    series
}

/// Drag series over the averaged curve's own samples.
///
/// Differentiates across each consecutive sample pair at its actual spacing.
/// Pairs whose later speed is exactly zero are skipped.
fn discrete_series(
    samples: &[CurvePoint],
    mass: f64,
    area: f64,
    diameter: f64,
    medium: &Medium,
) -> DragSeries {
    let mut series = DragSeries::default();
    for pair in samples.windows(2) {
        let (t_prev, v_prev) = pair[0];
        let (t, v) = pair[1];
        let u = v * CMPS_TO_MPS;
        let u_prev = v_prev * CMPS_TO_MPS;

        if u == 0.0 {
            continue;
        }
        let (cd, re, a) = drag_step(u, u_prev, t - t_prev, mass, area, diameter, medium);
        series.push(cd, re, a);
    }
    series
}

/// Solve the drag relation for one selection.
///
/// Returns `None` for bins that received no particles; those carry no
/// average diameter to size the representative sphere.
pub fn solve_bin(entry: &BinEntry, config: &SolverConfig) -> Option<ResultEntry> {
    let average_diameter = entry.header.average_diameter?;
    let (mass, area, diameter) = sphere_geometry(average_diameter, config.medium.particle_density);

    let coeffs = fit_speed_polynomial(&entry.averaged_speeds);
    let poly = polynomial_series(&coeffs, &entry.averaged_speeds, mass, area, diameter, config);
    let disc = discrete_series(&entry.averaged_speeds, mass, area, diameter, &config.medium);

    Some(ResultEntry::from_series(&entry.header, poly, disc))
}

/// Solve every selection in input order, skipping empty bins.
pub fn solve_selections(entries: &[BinEntry], config: &SolverConfig) -> Vec<ResultEntry> {
    entries.iter().filter_map(|e| solve_bin(e, config)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::BinHeader;

    fn entry(average_diameter: Option<f64>, speeds: Vec<CurvePoint>) -> BinEntry {
        BinEntry {
            header: BinHeader {
                min_diameter: average_diameter.map(|d| d - 5.0),
                max_diameter: average_diameter.map(|d| d + 5.0),
                average_diameter,
                particle_count: usize::from(average_diameter.is_some()),
            },
            averaged_distances: Vec::new(),
            averaged_speeds: speeds,
            particles: Vec::new(),
        }
    }

    #[test]
    fn test_sphere_geometry_for_thirty_microns() {
        let (mass, area, diameter) = sphere_geometry(30.0, PARTICLE_DENSITY_KG_M3);
        assert!((diameter - 3.0e-5).abs() < 1e-12);
        assert!((mass - 3.3929200658769764e-11).abs() < 1e-15);
        assert!((area - 7.0685834705770345e-10).abs() < 1e-15);
    }

    #[test]
    fn test_fit_needs_more_than_three_samples() {
        let short = vec![(0.0, 10.0), (0.04, 9.0), (0.08, 8.0)];
        assert!(fit_speed_polynomial(&short).is_empty());

        let enough = vec![(0.0, 10.0), (0.04, 9.0), (0.08, 8.5), (0.12, 8.0)];
        assert_eq!(fit_speed_polynomial(&enough).len(), 4);
    }

    #[test]
    fn test_discrete_series_is_one_shorter_than_the_curve() {
        let e = entry(30.0.into(), vec![(0.0, 10.0), (0.04, 10.0), (0.08, 8.0)]);
        let result = solve_bin(&e, &SolverConfig::default()).unwrap();
        assert_eq!(result.data.cd_disc.len(), 2);
        // only three samples, so no polynomial method
        assert!(result.data.cd_poly.is_empty());
        assert_eq!(result.avg_cd.poly, None);
        assert!(result.avg_cd.disc.is_some());
        assert_eq!(result.avg_cd.all, None);
    }

    #[test]
    fn test_product_series_equals_reynolds_times_drag() {
        let e = entry(
            30.0.into(),
            vec![(0.0, 10.0), (0.04, 9.5), (0.08, 9.1), (0.12, 8.8), (0.16, 8.6)],
        );
        let result = solve_bin(&e, &SolverConfig::default()).unwrap();
        assert!(!result.data.cd_poly.is_empty());
        assert!(!result.data.cd_disc.is_empty());

        for i in 0..result.data.cd_poly.len() {
            assert_eq!(
                result.data.a_poly[i],
                result.data.re_poly[i] * result.data.cd_poly[i]
            );
        }
        for i in 0..result.data.cd_disc.len() {
            assert_eq!(
                result.data.a_disc[i],
                result.data.re_disc[i] * result.data.cd_disc[i]
            );
        }
    }

    #[test]
    fn test_decelerating_particle_has_positive_drag() {
        let e = entry(30.0.into(), vec![(0.0, 10.0), (0.04, 9.0), (0.08, 8.0)]);
        let result = solve_bin(&e, &SolverConfig::default()).unwrap();
        for &cd in &result.data.cd_disc {
            assert!(cd > 0.0);
        }
        for &re in &result.data.re_disc {
            assert!(re > 0.0);
        }
    }

    #[test]
    fn test_reynolds_uses_the_speed_magnitude() {
        let e = entry(30.0.into(), vec![(0.0, -10.0), (0.04, -10.0)]);
        let result = solve_bin(&e, &SolverConfig::default()).unwrap();
        assert_eq!(result.data.re_disc.len(), 1);
        assert!(result.data.re_disc[0] > 0.0);
    }

    #[test]
    fn test_zero_speed_samples_are_skipped() {
        let e = entry(30.0.into(), vec![(0.0, 0.0), (0.04, 0.0), (0.08, 10.0)]);
        let result = solve_bin(&e, &SolverConfig::default()).unwrap();
        // the pair ending at zero speed is dropped, the pair ending at 10 stays
        assert_eq!(result.data.cd_disc.len(), 1);
    }

    #[test]
    fn test_polynomial_series_walks_the_time_span() {
        let speeds: Vec<CurvePoint> = (0..5).map(|i| (i as f64 * 0.04, 10.0)).collect();
        let e = entry(15.0.into(), speeds);
        let result = solve_bin(&e, &SolverConfig::default()).unwrap();

        // 0.16 s span at 0.001 s steps
        let n = result.data.cd_poly.len();
        assert!(n >= 150 && n <= 161, "unexpected sample count {}", n);
        for &re in &result.data.re_poly {
            assert!(re > 0.0);
        }
    }

    #[test]
    fn test_empty_bins_are_skipped_entirely() {
        assert!(solve_bin(&entry(None, Vec::new()), &SolverConfig::default()).is_none());
    }

    #[test]
    fn test_occupied_bin_with_no_speed_curve_still_reports() {
        let result = solve_bin(&entry(30.0.into(), Vec::new()), &SolverConfig::default()).unwrap();
        assert_eq!(result.reynolds, [None, None]);
        assert_eq!(result.avg_cd.poly, None);
        assert_eq!(result.avg_cd.disc, None);
        assert_eq!(result.avg_cd.all, None);
        assert!(result.data.cd_poly.is_empty() && result.data.cd_disc.is_empty());
    }

    #[test]
    fn test_selections_solve_in_order() {
        let entries = vec![
            entry(10.0.into(), vec![(0.0, 10.0), (0.04, 9.0)]),
            entry(None, Vec::new()),
            entry(30.0.into(), vec![(0.0, 5.0), (0.04, 4.0)]),
        ];
        let results = solve_selections(&entries, &SolverConfig::default());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].diameter[2], Some(10.0));
        assert_eq!(results[1].diameter[2], Some(30.0));
    }
}
