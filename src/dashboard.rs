// Dashboard Service
// The request/response handler behind every interaction: given a dataset and
// a KPI selection it validates, extracts metadata, aggregates each selected
// KPI, and returns a complete render payload. Nothing is cached between calls.

use crate::aggregation::{aggregate, KpiAnalysis};
use crate::charts::{bar_chart, summary_table, trend_chart, ChartRequest, TableRequest};
use crate::config::DisplayConfig;
use crate::dataset::Dataset;
use crate::metadata::{extract, Metadata};
use crate::observability::{log_operation, record_metric, MetricType, Operation, OperationContext};
use crate::types::PerfRecord;
use crate::validation::{validate_and_parse, SchemaError};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// The user's KPI filter
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "kpis", rename_all = "snake_case")]
pub enum Selection {
    /// First KPIs of the dataset in first-seen order
    #[default]
    Default,
    /// Explicit KPI names, rendered in the given order
    Kpis(Vec<String>),
}

impl Selection {
    /// Parse a comma-separated list such as `"Latency, Cold Start"`.
    pub fn parse(raw: Option<&str>) -> Self {
        Self::from_names(raw.unwrap_or_default().split(','))
    }

    /// Selection of the given KPI names.
    ///
    /// Names are trimmed and blanks dropped; no names selects the default;
    /// duplicates keep their first position.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: IndexSet<String> = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        if names.is_empty() {
            Selection::Default
        } else {
            Selection::Kpis(names.into_iter().collect())
        }
    }

    /// The KPI names to render for `metadata`
    pub fn resolve(&self, metadata: &Metadata, default_count: usize) -> Vec<String> {
        match self {
            Selection::Default => metadata.default_selection(default_count),
            Selection::Kpis(names) => names.clone(),
        }
    }
}

/// Metadata section shown for every valid upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetOverview {
    pub row_count: usize,
    pub os: String,
    pub build_number: String,
    pub target_device: String,
    pub os_version: String,
    pub feature_count: usize,
    pub unique_features: Vec<String>,
    pub kpi_count: usize,
    pub unique_kpis: Vec<String>,
    pub feature_kpis: BTreeMap<String, Vec<String>>,
    pub default_selection: Vec<String>,
}

impl DatasetOverview {
    fn new(metadata: &Metadata, row_count: usize, default_count: usize) -> Self {
        Self {
            row_count,
            os: metadata.os.clone(),
            build_number: metadata.build_number.clone(),
            target_device: metadata.target_device.clone(),
            os_version: metadata.os_version.clone(),
            feature_count: metadata.feature_count(),
            unique_features: metadata.features.iter().cloned().collect(),
            kpi_count: metadata.kpi_count(),
            unique_kpis: metadata.kpi_names.iter().cloned().collect(),
            feature_kpis: metadata
                .feature_kpis
                .iter()
                .map(|(feature, kpis)| (feature.clone(), kpis.iter().cloned().collect()))
                .collect(),
            default_selection: metadata.default_selection(default_count),
        }
    }
}

/// Everything rendered for one selected KPI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSection {
    pub kpi: String,
    pub analysis: KpiAnalysis,
    pub trend_chart: ChartRequest,
    pub bar_chart: ChartRequest,
    pub summary_table: TableRequest,
}

/// Complete response for one interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardPayload {
    pub overview: DatasetOverview,
    pub selected_kpis: Vec<String>,
    pub sections: Vec<KpiSection>,
}

/// Stateless dashboard pipeline
#[derive(Debug, Clone, Default)]
pub struct DashboardService {
    config: DisplayConfig,
}

impl DashboardService {
    pub fn new(config: DisplayConfig) -> Self {
        Self { config }
    }

    /// Validate and type the dataset, logging the outcome
    pub fn load_records(&self, dataset: &Dataset) -> Result<Vec<PerfRecord>, SchemaError> {
        let ctx = OperationContext::new("schema_validation");
        let result = validate_and_parse(dataset);
        log_operation(
            &ctx,
            &Operation::SchemaValidation {
                row_count: dataset.len(),
                passed: result.is_ok(),
            },
            &result
                .as_ref()
                .map(|_| ())
                .map_err(|e| anyhow::anyhow!(e.clone())),
        );
        result
    }

    /// Metadata section only
    pub fn overview(&self, dataset: &Dataset) -> Result<DatasetOverview, SchemaError> {
        let records = self.load_records(dataset)?;
        let metadata = extract(&records);
        Ok(DatasetOverview::new(
            &metadata,
            records.len(),
            self.config.default_kpi_count,
        ))
    }

    /// Analysis, charts, and table for one KPI of already-validated records
    pub fn kpi_section(&self, records: &[PerfRecord], kpi: &str) -> KpiSection {
        let mut ctx = OperationContext::new("kpi_aggregation");
        ctx.add_attribute("kpi", kpi);

        let analysis = aggregate(records, kpi);
        let layout = self.config.chart_layout();
        log_operation(
            &ctx,
            &Operation::KpiAggregation {
                kpi_name: kpi.to_string(),
                sample_count: analysis.trend.len(),
                load_count: analysis.summary.len(),
            },
            &Ok(()),
        );

        KpiSection {
            kpi: kpi.to_string(),
            trend_chart: trend_chart(&analysis, &layout),
            bar_chart: bar_chart(&analysis, &layout),
            summary_table: summary_table(&analysis, layout.precision),
            analysis,
        }
    }

    /// Full render pass for a dataset and KPI selection.
    ///
    /// Fails without any partial payload when the dataset is rejected.
    pub fn render(
        &self,
        dataset: &Dataset,
        selection: &Selection,
    ) -> Result<DashboardPayload, SchemaError> {
        let ctx = OperationContext::new("dashboard_render");
        let records = self.load_records(dataset)?;
        let metadata = extract(&records);
        let selected_kpis = selection.resolve(&metadata, self.config.default_kpi_count);
        for kpi in selected_kpis.iter().filter(|kpi| !metadata.has_kpi(kpi)) {
            warn!(kpi = %kpi, "Selected KPI not present in dataset");
        }
        record_metric(MetricType::Gauge {
            name: "dashboard.selected_kpis",
            value: selected_kpis.len() as f64,
        });

        let sections = selected_kpis
            .iter()
            .map(|kpi| self.kpi_section(&records, kpi))
            .collect();

        log_operation(
            &ctx,
            &Operation::DashboardRender {
                selected_kpis: selected_kpis.len(),
            },
            &Ok(()),
        );

        Ok(DashboardPayload {
            overview: DatasetOverview::new(
                &metadata,
                records.len(),
                self.config.default_kpi_count,
            ),
            selected_kpis,
            sections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{sample_dataset, DatasetBuilder};

    #[test]
    fn test_selection_parse() {
        assert_eq!(Selection::parse(None), Selection::Default);
        assert_eq!(Selection::parse(Some(" , ")), Selection::Default);
        assert_eq!(
            Selection::parse(Some("B, A,B")),
            Selection::Kpis(vec!["B".to_string(), "A".to_string()])
        );
    }

    #[test]
    fn test_selection_from_repeated_names() {
        let names = vec!["A".to_string(), " B".to_string(), "A".to_string()];
        assert_eq!(
            Selection::from_names(&names),
            Selection::Kpis(vec!["A".to_string(), "B".to_string()])
        );
        assert_eq!(Selection::from_names(Vec::<String>::new()), Selection::Default);
    }

    #[test]
    fn test_duplicate_selection_renders_once() {
        let dataset = sample_dataset().build().unwrap();
        let payload = DashboardService::default()
            .render(&dataset, &Selection::from_names(["Cold Start", "Cold Start"]))
            .expect("render");
        assert_eq!(payload.selected_kpis, vec!["Cold Start"]);
        assert_eq!(payload.sections.len(), 1);
    }

    #[test]
    fn test_default_render_uses_first_three_kpis() {
        let dataset = DatasetBuilder::new()
            .measurement("Low", "F", "A", "1.0")
            .measurement("Low", "F", "B", "1.0")
            .measurement("Low", "F", "C", "1.0")
            .measurement("Low", "F", "D", "1.0")
            .build()
            .unwrap();
        let payload = DashboardService::default()
            .render(&dataset, &Selection::Default)
            .expect("render");
        assert_eq!(payload.selected_kpis, vec!["A", "B", "C"]);
        assert_eq!(payload.sections.len(), 3);
        assert_eq!(payload.overview.kpi_count, 4);
    }

    #[test]
    fn test_explicit_selection_with_unknown_kpi() {
        let dataset = sample_dataset().build().unwrap();
        let payload = DashboardService::default()
            .render(
                &dataset,
                &Selection::Kpis(vec!["Scroll Jank".to_string(), "Nope".to_string()]),
            )
            .expect("render");
        assert_eq!(payload.sections.len(), 2);
        assert!(!payload.sections[0].analysis.is_empty());
        assert!(payload.sections[1].analysis.is_empty());
        assert!(payload.sections[1].summary_table.rows.is_empty());
    }

    #[test]
    fn test_render_rejects_invalid_dataset() {
        let dataset = DatasetBuilder::new().without_column("Load").build().unwrap();
        let err = DashboardService::default()
            .render(&dataset, &Selection::Default)
            .unwrap_err();
        assert_eq!(err.code(), "missing_columns");
    }

    #[test]
    fn test_overview_lists_features() {
        let dataset = sample_dataset().build().unwrap();
        let overview = DashboardService::default().overview(&dataset).unwrap();
        assert_eq!(overview.row_count, 18);
        assert_eq!(overview.unique_features, vec!["Login", "Feed"]);
        assert_eq!(
            overview.feature_kpis["Login"],
            vec!["Auth Latency", "Cold Start"]
        );
        assert_eq!(
            overview.default_selection,
            vec!["Cold Start", "Auth Latency", "Scroll Jank"]
        );
    }
}
