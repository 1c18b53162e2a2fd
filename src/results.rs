use serde::{Deserialize, Serialize};

use crate::binning::BinHeader;

/// Sample series produced by one differentiation method of the drag solve.
///
/// The three vectors advance in lockstep, one entry per accepted time step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragSeries {
    pub cd: Vec<f64>,
    pub re: Vec<f64>,
    pub a: Vec<f64>,
}

impl DragSeries {
    pub fn push(&mut self, cd: f64, re: f64, a: f64) {
        self.cd.push(cd);
        self.re.push(re);
        self.a.push(a);
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn mean_of_pair(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a + b) / 2.0),
        _ => None,
    }
}

/// Per-method averages with a combined figure.
///
/// `all` is present only when both methods produced samples; it is the mean
/// of the two method averages, not of the pooled samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodAverages {
    pub poly: Option<f64>,
    pub disc: Option<f64>,
    pub all: Option<f64>,
}

impl MethodAverages {
    fn from_series(poly: &[f64], disc: &[f64]) -> Self {
        let poly_avg = mean(poly);
        let disc_avg = mean(disc);
        MethodAverages {
            poly: poly_avg,
            disc: disc_avg,
            all: mean_of_pair(poly_avg, disc_avg),
        }
    }
}

/// Raw per-step sample series kept for downstream analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesData {
    #[serde(rename = "Cd_poly")]
    pub cd_poly: Vec<f64>,
    #[serde(rename = "Cd_disc")]
    pub cd_disc: Vec<f64>,
    #[serde(rename = "A_poly")]
    pub a_poly: Vec<f64>,
    #[serde(rename = "A_disc")]
    pub a_disc: Vec<f64>,
    #[serde(rename = "Re_poly")]
    pub re_poly: Vec<f64>,
    #[serde(rename = "Re_disc")]
    pub re_disc: Vec<f64>,
}

/// Drag solve output for one diameter bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Bin diameters: min, max and average (µm)
    #[serde(rename = "D")]
    pub diameter: [Option<f64>; 3],
    /// Reynolds number envelope across both methods: min, max
    #[serde(rename = "Re")]
    pub reynolds: [Option<f64>; 2],
    #[serde(rename = "avgCd")]
    pub avg_cd: MethodAverages,
    #[serde(rename = "avgA")]
    pub avg_a: MethodAverages,
    pub data: SeriesData,
}

impl ResultEntry {
    /// Assemble the output record for a bin from its two method series.
    pub fn from_series(header: &BinHeader, poly: DragSeries, disc: DragSeries) -> Self {
        let (re_min, re_max) = poly.re.iter().chain(disc.re.iter()).fold(
            (None, None),
            |(lo, hi): (Option<f64>, Option<f64>), &r| {
                (
                    Some(lo.map_or(r, |v: f64| v.min(r))),
                    Some(hi.map_or(r, |v: f64| v.max(r))),
                )
            },
        );

        ResultEntry {
            diameter: [
                header.min_diameter,
                header.max_diameter,
                header.average_diameter,
            ],
            reynolds: [re_min, re_max],
            avg_cd: MethodAverages::from_series(&poly.cd, &disc.cd),
            avg_a: MethodAverages::from_series(&poly.a, &disc.a),
            data: SeriesData {
                cd_poly: poly.cd,
                cd_disc: disc.cd,
                a_poly: poly.a,
                a_disc: disc.a,
                re_poly: poly.re,
                re_disc: disc.re,
            },
        }
    }
}

/// Cross-bin averages reported after a solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub avg_cd_poly: Option<f64>,
    pub avg_cd_disc: Option<f64>,
    pub avg_a_poly: Option<f64>,
    pub avg_a_disc: Option<f64>,
    pub overall_cd: Option<f64>,
    pub overall_a: Option<f64>,
}

/// Average the per-bin figures over all result entries, skipping bins whose
/// method produced no samples.
pub fn summarize_results(entries: &[ResultEntry]) -> RunSummary {
    let cd_poly: Vec<f64> = entries.iter().filter_map(|e| e.avg_cd.poly).collect();
    let cd_disc: Vec<f64> = entries.iter().filter_map(|e| e.avg_cd.disc).collect();
    let a_poly: Vec<f64> = entries.iter().filter_map(|e| e.avg_a.poly).collect();
    let a_disc: Vec<f64> = entries.iter().filter_map(|e| e.avg_a.disc).collect();

    let avg_cd_poly = mean(&cd_poly);
    let avg_cd_disc = mean(&cd_disc);
    let avg_a_poly = mean(&a_poly);
    let avg_a_disc = mean(&a_disc);

    RunSummary {
        avg_cd_poly,
        avg_cd_disc,
        avg_a_poly,
        avg_a_disc,
        overall_cd: mean_of_pair(avg_cd_poly, avg_cd_disc),
        overall_a: mean_of_pair(avg_a_poly, avg_a_disc),
    }
}
