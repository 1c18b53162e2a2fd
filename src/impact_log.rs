use once_cell::sync::Lazy;
use regex::Regex;

use crate::particle::round_to;
use crate::AnalysisError;

/// Annotation marking the row where a particle first appears in the log.
const FIRST_SEEN_MARKER: &str = "(первое появление)";

/// Annotations marking a pan impact, plain and rebound variants.
const IMPACT_MARKERS: [&str; 2] = ["(удар о поддон)", "(удар о поддон, отскочила)"];

static UNDERSCORE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new("_+").expect("valid regex"));

/// A pan impact recovered from the observation log.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactEvent {
    /// Normalized particle name
    pub particle: String,
    /// Impact time relative to the particle's first appearance (s)
    pub time_s: f64,
    /// Distance recorded on the impact row (cm)
    pub distance_cm: f64,
}

/// Collapse underscore runs and trim leading and trailing underscores,
/// matching how the tracking software normalizes particle names.
pub fn normalize_name(raw: &str) -> String {
    UNDERSCORE_RUNS
        .replace_all(raw.trim(), "_")
        .trim_matches('_')
        .to_string()
}

fn parse_number(token: &str, row: &str) -> Result<f64, AnalysisError> {
    token.parse::<f64>().map_err(|_| {
        AnalysisError::from(format!("invalid number {:?} in {} row", token, row))
    })
}

/// Parse the free-text observation log into impact events.
///
/// The log is a sequence of blank-line separated blocks, one per tracked
/// particle: a name line followed by annotated table rows. A block yields an
/// event only when it has both a first-appearance row and an impact row, and
/// only the first row of each kind counts. Impact times are reported
/// relative to the first appearance, rounded to five decimals.
pub fn parse_impact_log(content: &str) -> Result<Vec<ImpactEvent>, AnalysisError> {
    let mut events = Vec::new();

    for block in content.trim().split("\n\n") {
        let lines: Vec<&str> = block.trim().lines().collect();
        let name = match lines.first() {
            Some(first) => normalize_name(first),
            None => continue,
        };

        let first_seen = lines
            .iter()
            .find(|line| line.to_lowercase().contains(FIRST_SEEN_MARKER));
        let first_time = match first_seen {
            Some(line) => {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 2 {
                    continue;
                }
                parse_number(parts[0], "first appearance")?
            }
            None => continue,
        };

        let impact = lines.iter().find(|line| {
            let lower = line.to_lowercase();
            IMPACT_MARKERS.iter().any(|marker| lower.contains(marker))
        });
        if let Some(line) = impact {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 2 {
                let hit_time = parse_number(parts[0], "impact")?;
                let distance = parse_number(parts[1], "impact")?;
                events.push(ImpactEvent {
                    particle: name,
                    time_s: round_to(hit_time - first_time, 5),
                    distance_cm: distance,
                });
            }
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_normalization_collapses_underscores() {
        assert_eq!(normalize_name("p__1_"), "p_1");
        assert_eq!(normalize_name("__a___b__"), "a_b");
        assert_eq!(normalize_name("  plain  "), "plain");
        assert_eq!(normalize_name("П_42__a"), "П_42_a");
    }

    #[test]
    fn test_impact_time_is_relative_to_first_appearance() {
        let log = "П_42__a\n\
                   0.52  0.00  (первое появление)\n\
                   0.60  1.20\n\
                   0.84  3.40  (удар о поддон)\n";
        let events = parse_impact_log(log).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].particle, "П_42_a");
        assert_eq!(events[0].time_s, 0.32);
        assert_eq!(events[0].distance_cm, 3.4);
    }

    #[test]
    fn test_blocks_without_an_impact_yield_nothing() {
        let log = "p_1\n\
                   0.52  0.00  (первое появление)\n\
                   0.60  1.20\n\
                   \n\
                   p_2\n\
                   0.10  0.00  (первое появление)\n\
                   0.30  2.00  (удар о поддон)\n";
        let events = parse_impact_log(log).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].particle, "p_2");
    }

    #[test]
    fn test_blocks_without_a_first_appearance_are_skipped() {
        let log = "p_1\n\
                   0.30  2.00  (удар о поддон)\n";
        assert!(parse_impact_log(log).unwrap().is_empty());
    }

    #[test]
    fn test_rebound_impacts_count() {
        let log = "p_1\n\
                   0.10  0.00  (первое появление)\n\
                   0.50  4.00  (удар о поддон, отскочила)\n";
        let events = parse_impact_log(log).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].time_s, 0.4);
    }

    #[test]
    fn test_only_the_first_impact_row_counts() {
        let log = "p_1\n\
                   0.10  0.00  (первое появление)\n\
                   0.30  2.00  (удар о поддон)\n\
                   0.70  5.00  (удар о поддон)\n";
        let events = parse_impact_log(log).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].time_s, 0.2);
    }

    #[test]
    fn test_markers_match_case_insensitively() {
        let log = "p_1\n\
                   0.10  0.00  (Первое появление)\n\
                   0.30  2.00  (Удар о поддон)\n";
        assert_eq!(parse_impact_log(log).unwrap().len(), 1);
    }

    #[test]
    fn test_garbled_first_appearance_is_an_error() {
        // the first marked row wins, so its bad time cannot be rescued by
        // the complete row after it
        let log = "p_1\n\
                   oops  (первое появление)\n\
                   0.10  0.00  (первое появление)\n\
                   0.30  2.00  (удар о поддон)\n";
        let err = parse_impact_log(log).unwrap_err();
        assert!(err.to_string().contains("first appearance"));
    }

    #[test]
    fn test_unparseable_numbers_are_an_error() {
        let log = "p_1\n\
                   0.10  0.00  (первое появление)\n\
                   x.yz  2.00  (удар о поддон)\n";
        let err = parse_impact_log(log).unwrap_err();
        assert!(err.to_string().contains("invalid number"));
    }

    #[test]
    fn test_empty_log_yields_no_events() {
        assert!(parse_impact_log("").unwrap().is_empty());
        assert!(parse_impact_log("\n\n\n").unwrap().is_empty());
    }
}
