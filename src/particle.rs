use serde::{Deserialize, Serialize};

/// One derived speed sample: (time_s, speed_cm_per_s)
pub type SpeedSample = (f64, f64);

/// Round `value` to `decimals` decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// A single tracked particle from one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Identifier assigned by the tracking software
    pub name: String,
    /// Measured diameter (µm)
    pub diameter: f64,
    /// Travelled distance at each frame (cm), one sample per frame interval
    #[serde(default)]
    pub distance: Vec<f64>,
    /// How long the particle burned (s)
    pub burn_time: f64,
    /// True when the particle struck the pan; absent when never observed hitting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit: Option<bool>,
    /// Derived speed curve, attached during selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<Vec<SpeedSample>>,
}

impl Particle {
    /// Attach the derived speed curve for this particle's trajectory.
    pub fn derive_speeds(&mut self, dt: f64) {
        self.speed = Some(derive_speed_curve(&self.distance, dt));
    }
}

/// Finite-difference speed curve for a recorded trajectory.
///
/// Each sample pairs the elapsed time of the earlier frame with the forward
/// difference of consecutive distance samples over `dt`. Times and speeds are
/// rounded to five decimals. A trajectory with fewer than two samples has no
/// measurable speed and yields an empty curve.
pub fn derive_speed_curve(distance: &[f64], dt: f64) -> Vec<SpeedSample> {
    if distance.len() < 2 {
        return Vec::new();
    }
    let mut speeds = Vec::with_capacity(distance.len() - 1);
    for i in 0..distance.len() - 1 {
        let v = (distance[i + 1] - distance[i]) / dt;
        let t = i as f64 * dt;
        speeds.push((round_to(t, 5), round_to(v, 5)));
    }
    speeds
}

/// Top-level trajectory document: every tracked particle from one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryDocument {
    pub particles: Vec<Particle>,
}
