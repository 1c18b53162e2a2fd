use serde::{Deserialize, Serialize};

use crate::impact_log::ImpactEvent;
use crate::particle::{round_to, Particle, TrajectoryDocument};

/// Recording metadata carried by a raw capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordingInfo {
    /// Seconds per video frame
    pub spf: f64,
}

/// A raw capture straight from the tracking software: recording metadata
/// plus untrimmed particle trajectories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecording {
    pub description: RecordingInfo,
    pub particles: Vec<Particle>,
}

/// Counters reported after impact application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrepareSummary {
    /// Events that matched a particle by name
    pub matched: usize,
    /// Trajectories shortened by the impact cut
    pub trimmed: usize,
    /// Matched particles whose trajectory had already ended by the impact
    pub extinguished: usize,
}

/// Apply observed pan impacts to a raw recording.
///
/// Each event marks its particle as hit and truncates the trajectory to the
/// samples recorded up to and including the impact time; sample times follow
/// from the frame index and the recording's seconds-per-frame, rounded to
/// five decimals like the log times. Events are applied in order, and events
/// matching no particle are ignored.
pub fn apply_impacts(
    recording: RawRecording,
    events: &[ImpactEvent],
) -> (TrajectoryDocument, PrepareSummary) {
    let spf = recording.description.spf;
    let mut particles = recording.particles;
    let mut summary = PrepareSummary::default();

    for event in events {
        if let Some(particle) = particles.iter_mut().find(|p| p.name == event.particle) {
            let old_len = particle.distance.len();
            let keep = (0..old_len)
                .take_while(|&i| round_to(i as f64 * spf, 5) <= event.time_s)
                .count();

            particle.hit = Some(true);
            particle.distance.truncate(keep);

            summary.matched += 1;
            if keep != old_len {
                summary.trimmed += 1;
            } else {
                summary.extinguished += 1;
            }
        }
    }

    (TrajectoryDocument { particles }, summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(particles: Vec<Particle>) -> RawRecording {
        RawRecording {
            description: RecordingInfo { spf: 0.04 },
            particles,
        }
    }

    fn particle(name: &str, samples: usize) -> Particle {
        Particle {
            name: name.to_string(),
            diameter: 20.0,
            distance: (0..samples).map(|i| i as f64 * 0.1).collect(),
            burn_time: 0.5,
            hit: None,
            speed: None,
        }
    }

    fn event(name: &str, time_s: f64) -> ImpactEvent {
        ImpactEvent {
            particle: name.to_string(),
            time_s,
            distance_cm: 1.0,
        }
    }

    #[test]
    fn test_impact_truncates_at_the_frame_boundary() {
        let (doc, summary) = apply_impacts(recording(vec![particle("p_1", 10)]), &[event("p_1", 0.12)]);

        // frames at 0.00, 0.04, 0.08 and 0.12 survive
        assert_eq!(doc.particles[0].distance.len(), 4);
        assert_eq!(doc.particles[0].hit, Some(true));
        assert_eq!(
            summary,
            PrepareSummary {
                matched: 1,
                trimmed: 1,
                extinguished: 0
            }
        );
    }

    #[test]
    fn test_late_impact_leaves_the_trajectory_whole() {
        let (doc, summary) = apply_impacts(recording(vec![particle("p_1", 3)]), &[event("p_1", 0.5)]);

        assert_eq!(doc.particles[0].distance.len(), 3);
        assert_eq!(doc.particles[0].hit, Some(true));
        assert_eq!(summary.trimmed, 0);
        assert_eq!(summary.extinguished, 1);
    }

    #[test]
    fn test_impact_before_the_first_frame_empties_the_trajectory() {
        let (doc, summary) = apply_impacts(recording(vec![particle("p_1", 5)]), &[event("p_1", -0.1)]);

        assert!(doc.particles[0].distance.is_empty());
        assert_eq!(summary.trimmed, 1);
    }

    #[test]
    fn test_unmatched_events_change_nothing() {
        let (doc, summary) = apply_impacts(recording(vec![particle("p_1", 5)]), &[event("ghost", 0.1)]);

        assert_eq!(doc.particles[0].distance.len(), 5);
        assert_eq!(doc.particles[0].hit, None);
        assert_eq!(summary, PrepareSummary::default());
    }

    #[test]
    fn test_counters_add_up_across_events() {
        let particles = vec![particle("p_1", 10), particle("p_2", 2), particle("p_3", 10)];
        let events = vec![event("p_1", 0.08), event("p_2", 0.9), event("nobody", 0.1)];
        let (doc, summary) = apply_impacts(recording(particles), &events);

        assert_eq!(summary.matched, 2);
        assert_eq!(summary.matched, summary.trimmed + summary.extinguished);
        assert_eq!(doc.particles[2].hit, None);
    }

    #[test]
    fn test_raw_recording_parses_from_capture_json() {
        let json = r#"{
            "description": {"spf": 0.04, "camera": "left"},
            "particles": [
                {"name": "p_1", "diameter": 35.5, "distance": [0.0, 0.2], "burn_time": 0.72}
            ]
        }"#;
        let raw: RawRecording = serde_json::from_str(json).unwrap();
        assert_eq!(raw.description.spf, 0.04);
        assert_eq!(raw.particles.len(), 1);
    }
}
