// Builder Patterns
// Fluent construction of performance datasets with sensible defaults for the
// constant columns, used by tests, demos, and the CLI sample command.

use crate::dataset::Dataset;
use crate::validation::{CONSTANT_COLUMNS, REQUIRED_COLUMNS};
use anyhow::{ensure, Result};

/// Fluent builder for datasets in the required column layout
pub struct DatasetBuilder {
    constants: [String; 4],
    rows: Vec<[String; 8]>,
    dropped: Vec<String>,
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetBuilder {
    /// Create a builder with a default test configuration
    pub fn new() -> Self {
        Self {
            constants: [
                "Android".to_string(),
                "1001".to_string(),
                "Pixel 8".to_string(),
                "14".to_string(),
            ],
            rows: Vec::new(),
            dropped: Vec::new(),
        }
    }

    /// Set the values of the four constant columns
    pub fn constants(
        mut self,
        os: impl Into<String>,
        build_number: impl Into<String>,
        target_device: impl Into<String>,
        os_version: impl Into<String>,
    ) -> Self {
        self.constants = [
            os.into(),
            build_number.into(),
            target_device.into(),
            os_version.into(),
        ];
        self
    }

    /// Append a measurement row using the configured constants
    pub fn measurement(self, load: &str, feature: &str, kpi_name: &str, kpi_value: &str) -> Self {
        let constants = self.constants.clone();
        self.push_row(constants, load, feature, kpi_name, kpi_value)
    }

    /// Append a row where one constant column deviates from the configured value
    pub fn row_with(
        self,
        constant_column: &str,
        value: &str,
        load: &str,
        feature: &str,
        kpi_name: &str,
        kpi_value: &str,
    ) -> Self {
        let mut constants = self.constants.clone();
        if let Some(idx) = CONSTANT_COLUMNS.iter().position(|c| *c == constant_column) {
            constants[idx] = value.to_string();
        }
        self.push_row(constants, load, feature, kpi_name, kpi_value)
    }

    /// Leave a required column out of the built dataset
    pub fn without_column(mut self, column: &str) -> Self {
        self.dropped.push(column.to_string());
        self
    }

    fn push_row(
        mut self,
        constants: [String; 4],
        load: &str,
        feature: &str,
        kpi_name: &str,
        kpi_value: &str,
    ) -> Self {
        let [os, build, device, version] = constants;
        self.rows.push([
            os,
            build,
            device,
            version,
            load.to_string(),
            feature.to_string(),
            kpi_name.to_string(),
            kpi_value.to_string(),
        ]);
        self
    }

    fn layout(&self) -> Vec<usize> {
        (0..REQUIRED_COLUMNS.len())
            .filter(|idx| !self.dropped.iter().any(|d| d == REQUIRED_COLUMNS[*idx]))
            .collect()
    }

    /// Build the dataset
    pub fn build(self) -> Result<Dataset> {
        let layout = self.layout();
        let columns = layout
            .iter()
            .map(|idx| REQUIRED_COLUMNS[*idx].to_string())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| layout.iter().map(|idx| row[*idx].clone()).collect())
            .collect();
        Ok(Dataset::new(columns, rows)?)
    }

    /// Render the dataset as CSV text, as it would be uploaded
    pub fn build_csv(self) -> Result<String> {
        let layout = self.layout();
        ensure!(
            !layout.is_empty() || self.rows.is_empty(),
            "Cannot write rows without any columns"
        );

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(layout.iter().map(|idx| REQUIRED_COLUMNS[*idx]))?;
        for row in &self.rows {
            writer.write_record(layout.iter().map(|idx| row[*idx].as_str()))?;
        }
        let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("{e}"))?;
        Ok(String::from_utf8(bytes)?)
    }
}

/// Dataset with two loads and three KPIs across two features, used by the
/// CLI `sample` command and in tests.
pub fn sample_dataset() -> DatasetBuilder {
    let mut builder = DatasetBuilder::new();
    let measurements = [
        ("Low", "Login", "Cold Start", ["1.20", "1.35", "1.28"]),
        ("High", "Login", "Cold Start", ["1.90", "2.10", "2.05"]),
        ("Low", "Login", "Auth Latency", ["0.41", "0.39", "0.44"]),
        ("High", "Login", "Auth Latency", ["0.72", "0.80", "0.77"]),
        ("Low", "Feed", "Scroll Jank", ["0.016", "0.018", "0.017"]),
        ("High", "Feed", "Scroll Jank", ["0.031", "0.029", "0.035"]),
    ];
    for (load, feature, kpi, values) in measurements {
        for value in values {
            builder = builder.measurement(load, feature, kpi, value);
        }
    }
    builder
}
