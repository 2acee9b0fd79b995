// Metadata Extraction
// Single-valued descriptive fields and distinct categorical values of a
// validated dataset.

use crate::types::PerfRecord;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Number of KPIs selected when the user has not chosen any
pub const DEFAULT_SELECTED_KPIS: usize = 3;

/// Descriptive summary of a validated upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub os: String,
    pub build_number: String,
    pub target_device: String,
    pub os_version: String,
    /// Distinct features in first-seen order
    pub features: IndexSet<String>,
    /// Distinct KPI names in first-seen order
    pub kpi_names: IndexSet<String>,
    /// Each feature with its KPI names, both sorted lexicographically
    pub feature_kpis: BTreeMap<String, BTreeSet<String>>,
}

impl Metadata {
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn kpi_count(&self) -> usize {
        self.kpi_names.len()
    }

    /// The first `count` KPI names in first-seen order
    pub fn default_selection(&self, count: usize) -> Vec<String> {
        self.kpi_names.iter().take(count).cloned().collect()
    }

    pub fn has_kpi(&self, kpi_name: &str) -> bool {
        self.kpi_names.contains(kpi_name)
    }
}

/// Extract metadata from validated records.
///
/// Constant fields come from the first row carrying a non-empty value, which
/// validation guarantees is the only value present.
pub fn extract(records: &[PerfRecord]) -> Metadata {
    let mut features = IndexSet::new();
    let mut kpi_names = IndexSet::new();
    let mut feature_kpis: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for record in records {
        features.insert(record.feature.clone());
        kpi_names.insert(record.kpi_name.clone());
        feature_kpis
            .entry(record.feature.clone())
            .or_default()
            .insert(record.kpi_name.clone());
    }

    Metadata {
        os: first_value(records, |r| r.os.as_str()),
        build_number: first_value(records, |r| r.build_number.as_str()),
        target_device: first_value(records, |r| r.target_device.as_str()),
        os_version: first_value(records, |r| r.os_version.as_str()),
        features,
        kpi_names,
        feature_kpis,
    }
}

fn first_value<'a>(records: &'a [PerfRecord], get: fn(&'a PerfRecord) -> &'a str) -> String {
    records
        .iter()
        .map(get)
        .find(|value| !value.trim().is_empty())
        .unwrap_or_default()
        .to_string()
}
