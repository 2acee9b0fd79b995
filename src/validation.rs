// Schema Validation
// Checks an uploaded dataset against the required column set and the
// constant-column rule, then converts rows into typed records.

use crate::dataset::Dataset;
use crate::types::{KpiValue, PerfRecord};
use tracing::{debug, warn};

pub const OS: &str = "OS";
pub const BUILD_NUMBER: &str = "Build Number";
pub const TARGET_DEVICE: &str = "Target Device";
pub const OS_VERSION: &str = "OS Version";
pub const LOAD: &str = "Load";
pub const FEATURE: &str = "feature";
pub const KPI_NAME: &str = "KPI Name";
pub const KPI_VALUE: &str = "KPI Value";

/// Columns every upload must carry (presence only, order-insensitive)
pub const REQUIRED_COLUMNS: [&str; 8] = [
    OS,
    BUILD_NUMBER,
    TARGET_DEVICE,
    OS_VERSION,
    LOAD,
    FEATURE,
    KPI_NAME,
    KPI_VALUE,
];

/// Columns that describe the test configuration and must hold exactly one value
pub const CONSTANT_COLUMNS: [&str; 4] = [OS, BUILD_NUMBER, TARGET_DEVICE, OS_VERSION];

/// Reasons an upload is rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("The uploaded CSV file is missing the following required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("The uploaded CSV file contains inconsistent data in: {}", .columns.join(", "))]
    InconsistentConstants { columns: Vec<String> },

    #[error("Row {row} has an invalid KPI Value: '{value}'")]
    InvalidKpiValue { row: usize, value: String },

    #[error("The uploaded file is not valid CSV (line {line}): {message}")]
    MalformedCsv { line: u64, message: String },
}

impl SchemaError {
    /// Stable identifier used in API responses
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::MissingColumns { .. } => "missing_columns",
            SchemaError::InconsistentConstants { .. } => "inconsistent_constants",
            SchemaError::InvalidKpiValue { .. } => "invalid_kpi_value",
            SchemaError::MalformedCsv { .. } => "malformed_csv",
        }
    }

    /// Follow-up hint shown beneath the error
    pub fn guidance(&self) -> String {
        match self {
            SchemaError::MissingColumns { .. } => format!(
                "Please ensure that the CSV file contains all required columns: {}",
                REQUIRED_COLUMNS.join(", ")
            ),
            SchemaError::MalformedCsv { .. } => {
                "Please upload a UTF-8 encoded CSV file with a header row and the same number of fields on every line".to_string()
            }
            SchemaError::InconsistentConstants { .. } => format!(
                "Please ensure that all constant columns have the same value: {}",
                CONSTANT_COLUMNS.join(", ")
            ),
            SchemaError::InvalidKpiValue { .. } => {
                format!("Please ensure that every '{KPI_VALUE}' entry is a number of seconds")
            }
        }
    }
}

/// Validate the dataset shape.
///
/// Column presence is checked first; the constant-column rule only runs once
/// every required column exists. A dataset with zero rows always fails the
/// constant-column rule because each constant column then has no value at all.
pub fn validate(dataset: &Dataset) -> Result<(), SchemaError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !dataset.has_column(column))
        .map(|column| column.to_string())
        .collect();

    if !missing.is_empty() {
        warn!(missing = ?missing, "Upload is missing required columns");
        return Err(SchemaError::MissingColumns { missing });
    }

    let inconsistent: Vec<String> = CONSTANT_COLUMNS
        .iter()
        .filter(|column| dataset.distinct_count(column) != 1)
        .map(|column| column.to_string())
        .collect();

    if !inconsistent.is_empty() {
        warn!(
            columns = ?inconsistent,
            rows = dataset.len(),
            "Upload has inconsistent constant columns"
        );
        return Err(SchemaError::InconsistentConstants {
            columns: inconsistent,
        });
    }

    debug!(rows = dataset.len(), "Dataset passed schema validation");
    Ok(())
}

/// Convert every row into a [`PerfRecord`].
///
/// Requires the column-presence check to have passed.
pub fn parse_records(dataset: &Dataset) -> Result<Vec<PerfRecord>, SchemaError> {
    let field = |row: &crate::dataset::Row<'_>, column: &str| -> Result<String, SchemaError> {
        row.get(column)
            .map(str::to_string)
            .ok_or_else(|| SchemaError::MissingColumns {
                missing: vec![column.to_string()],
            })
    };

    dataset
        .rows()
        .enumerate()
        .map(|(idx, row)| {
            let raw_value = field(&row, KPI_VALUE)?;
            let kpi_value =
                KpiValue::parse(&raw_value).map_err(|_| SchemaError::InvalidKpiValue {
                    row: idx + 1,
                    value: raw_value.clone(),
                })?;

            Ok(PerfRecord {
                os: field(&row, OS)?,
                build_number: field(&row, BUILD_NUMBER)?,
                target_device: field(&row, TARGET_DEVICE)?,
                os_version: field(&row, OS_VERSION)?,
                load: field(&row, LOAD)?,
                feature: field(&row, FEATURE)?,
                kpi_name: field(&row, KPI_NAME)?,
                kpi_value,
            })
        })
        .collect()
}

/// Full gate for an upload: shape checks followed by typed conversion
pub fn validate_and_parse(dataset: &Dataset) -> Result<Vec<PerfRecord>, SchemaError> {
    validate(dataset)?;
    parse_records(dataset)
}
