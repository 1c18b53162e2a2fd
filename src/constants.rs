/// Physical constants used in drag-coefficient analysis

/// Density of the particle material (kg/m³)
///
/// Bulk density of the solid propellant-residue particles tracked by the
/// recording rig. All particle masses are derived from this value and the
/// measured diameter assuming spherical geometry.
pub const PARTICLE_DENSITY_KG_M3: f64 = 2400.0;

/// Density of the combustion gas surrounding the particles (kg/m³)
///
/// Value: 0.17066 kg/m³
///
/// Consistent with ideal-gas air at atmospheric pressure near 2070 K,
/// the bulk gas temperature in the observation column. The low density
/// relative to ambient air (1.225 kg/m³) reflects the elevated temperature.
pub const GAS_DENSITY_KG_M3: f64 = 0.17066;

/// Dynamic viscosity of the combustion gas (Pa·s)
///
/// Value: 6.98e-5 Pa·s, matching hot combustion products at the same
/// conditions as [`GAS_DENSITY_KG_M3`]. Used for Reynolds numbers only.
pub const GAS_VISCOSITY_PA_S: f64 = 6.98e-5;

/// Gravitational acceleration in m/s²
///
/// Rounded value used throughout the drag solve.
pub const G_ACCEL_MPS2: f64 = 9.81;

// Sampling defaults

/// Spacing between recorded distance samples (seconds)
///
/// One video frame at the 25 fps recording rate.
pub const DEFAULT_SAMPLE_DT_S: f64 = 0.04;

/// Resampling step for the fitted velocity polynomial (seconds)
pub const DEFAULT_POLY_DT_S: f64 = 0.001;

/// Default number of equal-width diameter bins
pub const DEFAULT_BIN_COUNT: usize = 20;

/// Degree of the least-squares polynomial fitted to averaged speed curves
pub const SPEED_POLY_DEGREE: usize = 3;

// Numerical stability constants

/// Singular-value cutoff for the least-squares polynomial solve
pub const SVD_EPSILON: f64 = 1e-12;

// Unit conversions

/// Conversion factor: centimeters per second to meters per second
pub const CMPS_TO_MPS: f64 = 0.01;

/// Conversion factor: micrometers to meters
pub const MICRONS_TO_METERS: f64 = 1.0e-6;
