// KPI Aggregation
// Groups the samples of one KPI by load level: run ordering, the trend
// series, per-load means, and the summary statistics table.

use crate::pure;
use crate::types::{compare_loads, PerfRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One measurement on the trend chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub load: String,
    pub run: usize,
    pub value: f64,
}

/// Mean KPI value of a load level (bar chart row)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadMean {
    pub load: String,
    pub mean: f64,
}

/// Summary statistics of a load level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub load: String,
    pub samples: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

/// Everything derived for a single KPI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiAnalysis {
    pub kpi_name: String,
    /// One point per sample, in dataset order
    pub trend: Vec<TrendPoint>,
    pub bar: Vec<LoadMean>,
    pub summary: Vec<LoadSummary>,
}

impl KpiAnalysis {
    pub fn is_empty(&self) -> bool {
        self.trend.is_empty()
    }

    /// Distinct load levels in display order
    pub fn loads(&self) -> Vec<&str> {
        self.summary.iter().map(|s| s.load.as_str()).collect()
    }

    /// Trend points ordered by load, then run index
    pub fn trend_for_display(&self) -> Vec<TrendPoint> {
        let mut points = self.trend.clone();
        points.sort_by(|a, b| compare_loads(&a.load, &b.load).then(a.run.cmp(&b.run)));
        points
    }

    pub fn summary_for(&self, load: &str) -> Option<&LoadSummary> {
        self.summary.iter().find(|s| s.load == load)
    }
}

/// Key wrapper so load levels sort with [`compare_loads`] inside a BTreeMap
#[derive(Debug, Clone, PartialEq, Eq)]
struct LoadKey(String);

impl Ord for LoadKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        compare_loads(&self.0, &other.0)
    }
}

impl PartialOrd for LoadKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Analyse one KPI.
///
/// An unknown KPI name produces an analysis with no rows.
pub fn aggregate(records: &[PerfRecord], kpi_name: &str) -> KpiAnalysis {
    let samples: Vec<&PerfRecord> = records.iter().filter(|r| r.kpi_name == kpi_name).collect();
    let runs = pure::assign_run_indices(samples.iter().map(|r| r.load.as_str()));

    let trend: Vec<TrendPoint> = samples
        .iter()
        .zip(runs)
        .map(|(record, run)| TrendPoint {
            load: record.load.clone(),
            run,
            value: record.kpi_value.get(),
        })
        .collect();

    let mut by_load: BTreeMap<LoadKey, Vec<f64>> = BTreeMap::new();
    for record in &samples {
        by_load
            .entry(LoadKey(record.load.clone()))
            .or_default()
            .push(record.kpi_value.get());
    }

    let summary: Vec<LoadSummary> = by_load
        .into_iter()
        .filter_map(|(LoadKey(load), values)| {
            Some(LoadSummary {
                samples: values.len(),
                min: pure::min(&values)?,
                max: pure::max(&values)?,
                mean: pure::mean(&values)?,
                median: pure::median(&values)?,
                load,
            })
        })
        .collect();

    let bar = summary
        .iter()
        .map(|s| LoadMean {
            load: s.load.clone(),
            mean: s.mean,
        })
        .collect();

    debug!(
        kpi = kpi_name,
        samples = trend.len(),
        loads = summary.len(),
        "Aggregated KPI"
    );

    KpiAnalysis {
        kpi_name: kpi_name.to_string(),
        trend,
        bar,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::DatasetBuilder;
    use crate::validation::validate_and_parse;

    fn latency_records() -> Vec<PerfRecord> {
        let dataset = DatasetBuilder::new()
            .measurement("Low", "Login", "Latency", "1.0")
            .measurement("High", "Login", "Latency", "4.0")
            .measurement("Low", "Login", "Latency", "2.0")
            .measurement("Low", "Login", "Other", "99.0")
            .measurement("High", "Login", "Latency", "5.0")
            .measurement("Low", "Login", "Latency", "3.0")
            .measurement("High", "Login", "Latency", "6.0")
            .build()
            .expect("build");
        validate_and_parse(&dataset).expect("valid")
    }

    #[test]
    fn test_two_load_scenario() {
        let analysis = aggregate(&latency_records(), "Latency");

        let low = analysis.summary_for("Low").expect("Low summary");
        assert_eq!((low.min, low.max, low.mean, low.median), (1.0, 3.0, 2.0, 2.0));
        let high = analysis.summary_for("High").expect("High summary");
        assert_eq!((high.min, high.max, high.mean, high.median), (4.0, 6.0, 5.0, 5.0));

        assert_eq!(analysis.loads(), vec!["High", "Low"]);
        assert_eq!(analysis.bar.len(), 2);
        assert_eq!(analysis.bar[0].mean, 5.0);
    }

    #[test]
    fn test_run_indices_within_each_load() {
        let analysis = aggregate(&latency_records(), "Latency");
        let runs: Vec<(&str, usize)> = analysis
            .trend
            .iter()
            .map(|p| (p.load.as_str(), p.run))
            .collect();
        assert_eq!(
            runs,
            vec![
                ("Low", 1),
                ("High", 1),
                ("Low", 2),
                ("High", 2),
                ("Low", 3),
                ("High", 3)
            ]
        );
    }

    #[test]
    fn test_trend_for_display_orders_by_load_then_run() {
        let analysis = aggregate(&latency_records(), "Latency");
        let ordered: Vec<f64> = analysis
            .trend_for_display()
            .iter()
            .map(|p| p.value)
            .collect();
        assert_eq!(ordered, vec![4.0, 5.0, 6.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_unknown_kpi_is_empty() {
        let analysis = aggregate(&latency_records(), "Throughput");
        assert!(analysis.is_empty());
        assert!(analysis.bar.is_empty());
        assert!(analysis.summary.is_empty());
        assert_eq!(analysis.kpi_name, "Throughput");
    }

    #[test]
    fn test_numeric_loads_sort_numerically() {
        let dataset = DatasetBuilder::new()
            .measurement("100", "F", "K", "3.0")
            .measurement("20", "F", "K", "2.0")
            .measurement("5", "F", "K", "1.0")
            .build()
            .expect("build");
        let records = validate_and_parse(&dataset).expect("valid");
        assert_eq!(aggregate(&records, "K").loads(), vec!["5", "20", "100"]);
    }

    #[test]
    fn test_nan_and_padded_loads_keep_one_row_each() {
        let loads = ["5", " 7", " NaN", "5", " 7", " NaN", "5"];
        let dataset = loads
            .iter()
            .enumerate()
            .fold(DatasetBuilder::new(), |builder, (idx, load)| {
                builder.measurement(load, "F", "K", &(idx + 1).to_string())
            })
            .build()
            .expect("build");
        let records = validate_and_parse(&dataset).expect("valid");
        let analysis = aggregate(&records, "K");

        assert_eq!(analysis.loads(), vec!["5", " 7", " NaN"]);
        let samples: Vec<usize> = analysis.summary.iter().map(|s| s.samples).collect();
        assert_eq!(samples, vec![3, 2, 2]);
        assert_eq!(analysis.bar.len(), 3);

        let display: Vec<(String, usize)> = analysis
            .trend_for_display()
            .into_iter()
            .map(|p| (p.load, p.run))
            .collect();
        assert_eq!(display[0], ("5".to_string(), 1));
        assert_eq!(display[6], (" NaN".to_string(), 2));
    }

    #[test]
    fn test_even_sample_median() {
        let dataset = DatasetBuilder::new()
            .measurement("Low", "F", "K", "1.0")
            .measurement("Low", "F", "K", "4.0")
            .measurement("Low", "F", "K", "2.0")
            .measurement("Low", "F", "K", "10.0")
            .build()
            .expect("build");
        let records = validate_and_parse(&dataset).expect("valid");
        let summary = &aggregate(&records, "K").summary[0];
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.mean, 4.25);
        assert_eq!(summary.samples, 4);
    }
}
