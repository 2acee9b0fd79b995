// Chart Requests
// Library-neutral descriptions of the trend chart, bar chart, and summary
// table for one KPI. The rendering layer decides how to draw them.

use crate::aggregation::KpiAnalysis;
use crate::pure::format_fixed;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Number of decimals shown for KPI values
pub const DISPLAY_PRECISION: usize = 3;

/// Column headers of the summary table
pub const SUMMARY_COLUMNS: [&str; 5] = [
    "Load",
    "Min (sec)",
    "Max (sec)",
    "Mean (sec)",
    "Median (sec)",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Nominal,
    Ordinal,
    Quantitative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mark {
    Line { points: bool },
    Bar,
}

/// Maps a data field onto a visual channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoding {
    pub field: String,
    pub field_type: FieldType,
    pub title: Option<String>,
    pub legend: bool,
}

impl Encoding {
    pub fn new(field: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field: field.into(),
            field_type,
            title: None,
            legend: true,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn without_legend(mut self) -> Self {
        self.legend = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TooltipField {
    pub field: String,
    pub field_type: FieldType,
    pub title: Option<String>,
    /// d3-style number format such as `.3f`
    pub format: Option<String>,
}

impl TooltipField {
    fn new(field: &str, field_type: FieldType) -> Self {
        Self {
            field: field.to_string(),
            field_type,
            title: None,
            format: None,
        }
    }

    fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    fn precision(mut self, decimals: usize) -> Self {
        self.format = Some(format!(".{decimals}f"));
        self
    }
}

/// A chart the presentation layer should draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub title: String,
    pub mark: Mark,
    pub x: Encoding,
    pub y: Encoding,
    pub color: Option<Encoding>,
    pub tooltip: Vec<TooltipField>,
    pub interactive: bool,
    pub width: u32,
    pub height: u32,
    pub data: Vec<serde_json::Value>,
}

/// Numeric table cell with its display string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub value: f64,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub label: String,
    pub cells: Vec<TableCell>,
}

/// A table the presentation layer should draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRequest {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

/// Chart dimensions and number formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartLayout {
    pub precision: usize,
    pub trend_width: u32,
    pub trend_height: u32,
    pub bar_width: u32,
    pub bar_height: u32,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            precision: DISPLAY_PRECISION,
            trend_width: 700,
            trend_height: 400,
            bar_width: 700,
            bar_height: 300,
        }
    }
}

/// Line chart of KPI value over run index, one series per load level
pub fn trend_chart(analysis: &KpiAnalysis, layout: &ChartLayout) -> ChartRequest {
    let data = analysis
        .trend_for_display()
        .into_iter()
        .map(|point| {
            json!({
                "Load": point.load,
                "Run": point.run,
                "KPI Value": point.value,
            })
        })
        .collect();

    ChartRequest {
        title: "Trend Chart".to_string(),
        mark: Mark::Line { points: true },
        x: Encoding::new("Run", FieldType::Ordinal).title("Run Index"),
        y: Encoding::new("KPI Value", FieldType::Quantitative).title("KPI Value (seconds)"),
        color: Some(Encoding::new("Load", FieldType::Nominal).title("Load Level")),
        tooltip: vec![
            TooltipField::new("Load", FieldType::Nominal).title("Load"),
            TooltipField::new("Run", FieldType::Ordinal).title("Run"),
            TooltipField::new("KPI Value", FieldType::Quantitative)
                .title("KPI Value (sec)")
                .precision(layout.precision),
        ],
        interactive: true,
        width: layout.trend_width,
        height: layout.trend_height,
        data,
    }
}

/// Bar chart of the mean KPI value per load level
pub fn bar_chart(analysis: &KpiAnalysis, layout: &ChartLayout) -> ChartRequest {
    let data = analysis
        .bar
        .iter()
        .map(|row| json!({ "Load": row.load, "KPI Value": row.mean }))
        .collect();

    ChartRequest {
        title: "Bar Chart".to_string(),
        mark: Mark::Bar,
        x: Encoding::new("Load", FieldType::Nominal).title("Load Level"),
        y: Encoding::new("KPI Value", FieldType::Quantitative).title("Average KPI Value (sec)"),
        color: Some(Encoding::new("Load", FieldType::Nominal).without_legend()),
        tooltip: vec![
            TooltipField::new("Load", FieldType::Nominal),
            TooltipField::new("KPI Value", FieldType::Quantitative).precision(layout.precision),
        ],
        interactive: false,
        width: layout.bar_width,
        height: layout.bar_height,
        data,
    }
}

/// Min/max/mean/median per load level
pub fn summary_table(analysis: &KpiAnalysis, precision: usize) -> TableRequest {
    let cell = |value: f64| TableCell {
        value,
        display: format_fixed(value, precision),
    };

    TableRequest {
        title: "Summary Statistics by Load".to_string(),
        columns: SUMMARY_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: analysis
            .summary
            .iter()
            .map(|s| TableRow {
                label: s.load.clone(),
                cells: vec![cell(s.min), cell(s.max), cell(s.mean), cell(s.median)],
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{KpiAnalysis, LoadMean, LoadSummary, TrendPoint};

    fn analysis() -> KpiAnalysis {
        KpiAnalysis {
            kpi_name: "Latency".to_string(),
            trend: vec![
                TrendPoint {
                    load: "Low".to_string(),
                    run: 1,
                    value: 1.23456,
                },
                TrendPoint {
                    load: "High".to_string(),
                    run: 1,
                    value: 2.0,
                },
            ],
            bar: vec![
                LoadMean {
                    load: "High".to_string(),
                    mean: 2.0,
                },
                LoadMean {
                    load: "Low".to_string(),
                    mean: 1.23456,
                },
            ],
            summary: vec![LoadSummary {
                load: "Low".to_string(),
                samples: 1,
                min: 1.23456,
                max: 1.23456,
                mean: 1.23456,
                median: 1.23456,
            }],
        }
    }

    #[test]
    fn test_trend_chart_encodings() {
        let chart = trend_chart(&analysis(), &ChartLayout::default());
        assert_eq!(chart.mark, Mark::Line { points: true });
        assert_eq!(chart.x.field, "Run");
        assert_eq!(chart.x.field_type, FieldType::Ordinal);
        assert_eq!(chart.y.title.as_deref(), Some("KPI Value (seconds)"));
        assert_eq!(chart.color.as_ref().map(|c| c.field.as_str()), Some("Load"));
        assert_eq!(chart.tooltip[2].format.as_deref(), Some(".3f"));
        assert!(chart.interactive);
        assert_eq!((chart.width, chart.height), (700, 400));
        // ordered by load for display: High before Low
        assert_eq!(chart.data[0]["Load"], "High");
        // full precision is kept in the data
        assert_eq!(chart.data[1]["KPI Value"], 1.23456);
    }

    #[test]
    fn test_bar_chart_hides_legend() {
        let chart = bar_chart(&analysis(), &ChartLayout::default());
        assert_eq!(chart.mark, Mark::Bar);
        assert!(!chart.color.expect("color encoding").legend);
        assert_eq!(chart.data.len(), 2);
        assert_eq!((chart.width, chart.height), (700, 300));
    }

    #[test]
    fn test_summary_table_formats_three_decimals() {
        let table = summary_table(&analysis(), DISPLAY_PRECISION);
        assert_eq!(table.columns, SUMMARY_COLUMNS.to_vec());
        assert_eq!(table.rows[0].label, "Low");
        assert_eq!(table.rows[0].cells[0].display, "1.235");
        assert_eq!(table.rows[0].cells[0].value, 1.23456);
    }

    #[test]
    fn test_mark_serialization() {
        let json = serde_json::to_value(Mark::Line { points: true }).expect("serialize");
        assert_eq!(json["type"], "line");
        assert_eq!(json["points"], true);
    }
}
