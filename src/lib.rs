//! # Dragfit Engine
//!
//! Drag-coefficient analysis for recorded particle trajectories: groups tracked
//! particles into diameter bins, averages their kinematic curves and solves the
//! drag/Reynolds relation for each bin by polynomial and discrete methods.

// Re-export the main types and functions
pub use aggregation::{average_distances, average_speeds, build_selections, BinEntry, CurvePoint};
pub use binning::{
    bin_edges, bin_stats, partition_by_diameter, BinHeader, DiameterBin, SelectionConfig,
};
pub use impact_log::{normalize_name, parse_impact_log, ImpactEvent};
pub use particle::{derive_speed_curve, Particle, SpeedSample, TrajectoryDocument};
pub use prepare::{apply_impacts, PrepareSummary, RawRecording, RecordingInfo};
pub use results::{
    summarize_results, DragSeries, MethodAverages, ResultEntry, RunSummary, SeriesData,
};
pub use solver::{solve_bin, solve_selections, Medium, SolverConfig};

// Module declarations
pub mod aggregation;
pub mod binning;
pub mod constants;
pub mod impact_log;
pub mod particle;
pub mod polyfit;
pub mod prepare;
pub mod results;
pub mod solver;

use std::error::Error;
use std::fmt;

// Error type for analysis operations
#[derive(Debug)]
pub struct AnalysisError {
    message: String,
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for AnalysisError {}

impl From<String> for AnalysisError {
    fn from(msg: String) -> Self {
        AnalysisError { message: msg }
    }
}

impl From<&str> for AnalysisError {
    fn from(msg: &str) -> Self {
        AnalysisError {
            message: msg.to_string(),
        }
    }
}
