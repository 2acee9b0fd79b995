// Validated Types
// Strongly-typed rows and values that cannot be constructed with invalid data.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A finite KPI measurement in seconds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KpiValue {
    inner: f64,
}

impl KpiValue {
    /// Create a new KPI value
    ///
    /// # Invariants
    /// - Finite (no NaN, no infinity)
    pub fn new(value: f64) -> Result<Self> {
        ensure!(value.is_finite(), "KPI value must be a finite number");
        Ok(Self { inner: value })
    }

    /// Parse a raw cell, ignoring surrounding whitespace
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        ensure!(!trimmed.is_empty(), "KPI value is empty");
        let value: f64 = trimmed
            .parse()
            .map_err(|_| anyhow::anyhow!("KPI value '{trimmed}' is not a number"))?;
        Self::new(value)
    }

    pub fn get(&self) -> f64 {
        self.inner
    }
}

impl fmt::Display for KpiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// One typed row of a validated performance dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfRecord {
    pub os: String,
    pub build_number: String,
    pub target_device: String,
    pub os_version: String,
    pub load: String,
    pub feature: String,
    pub kpi_name: String,
    pub kpi_value: KpiValue,
}

/// Ordering used for load levels.
///
/// Labels that both parse as finite numbers compare numerically ("10" < "100"),
/// numbers sort before text, and text compares lexicographically. "NaN" and
/// "inf" count as text. Equal numbers fall back to the raw label so the order
/// stays total.
pub fn compare_loads(a: &str, b: &str) -> Ordering {
    match (numeric_load(a), numeric_load(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn numeric_load(label: &str) -> Option<f64> {
    label
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kpi_value_parse() {
        assert_eq!(KpiValue::parse(" 1.25 ").unwrap().get(), 1.25);
        assert_eq!(KpiValue::parse("3").unwrap().get(), 3.0);
        assert!(KpiValue::parse("").is_err());
        assert!(KpiValue::parse("fast").is_err());
        assert!(KpiValue::parse("NaN").is_err());
        assert!(KpiValue::parse("inf").is_err());
    }

    #[test]
    fn test_compare_loads() {
        let mut loads = vec!["100", "High", "20", "Low", "3"];
        loads.sort_by(|a, b| compare_loads(a, b));
        assert_eq!(loads, vec!["3", "20", "100", "High", "Low"]);
    }

    #[test]
    fn test_compare_loads_is_total_with_nan_and_padding() {
        let labels = ["5", " 7", " NaN", "NaN", "inf", "-inf", "7", "5.0", "High"];
        for a in labels {
            assert_eq!(compare_loads(a, a), Ordering::Equal);
            for b in labels {
                assert_eq!(compare_loads(a, b), compare_loads(b, a).reverse(), "{a:?} vs {b:?}");
                for c in labels {
                    if compare_loads(a, b) == Ordering::Less && compare_loads(b, c) == Ordering::Less {
                        assert_eq!(compare_loads(a, c), Ordering::Less, "{a:?} < {b:?} < {c:?}");
                    }
                }
            }
        }

        let mut loads = vec![" NaN", "7", "5", " 7", "inf", "5.0"];
        loads.sort_by(|a, b| compare_loads(a, b));
        assert_eq!(loads, vec!["5", "5.0", " 7", "7", " NaN", "inf"]);
    }
}
