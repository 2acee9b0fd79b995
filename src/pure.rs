// Pure Functions
// Side-effect-free statistics over KPI samples. Every function here is
// deterministic and takes plain slices so it can be tested in isolation.

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median of the values.
///
/// Odd counts take the middle element of the sorted values; even counts
/// average the two central elements.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Format with a fixed number of decimals, e.g. `format_fixed(1.23456, 3) == "1.235"`
pub fn format_fixed(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

/// 1-based position of each element within its group, in encounter order.
///
/// `assign_run_indices(["Low", "High", "Low"])` yields `[1, 1, 2]`.
pub fn assign_run_indices<'a, I>(groups: I) -> Vec<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: std::collections::HashMap<&'a str, usize> = std::collections::HashMap::new();
    groups
        .into_iter()
        .map(|group| {
            let counter = seen.entry(group).or_insert(0);
            *counter += 1;
            *counter
        })
        .collect()
}
