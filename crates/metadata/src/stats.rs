//! Label-frequency aggregation.

use darkroom_core::{LabelStats, LabelValue};
use std::collections::HashMap;

#[derive(Default)]
struct LabelAccumulator {
    count: u64,
    confidence_sum: f64,
}

/// Result of one aggregation pass.
#[derive(Clone, Debug)]
pub struct LabelAggregation {
    /// Entries sorted by count descending, ties broken by name ascending,
    /// truncated to the requested limit.
    pub stats: Vec<LabelStats>,
    /// Distinct labels meeting the minimum count, before truncation.
    pub total_distinct: usize,
}

/// Accumulate per-label count and confidence over every label of every
/// scanned record. Aggregation keys are case-sensitive; unlike search,
/// no case folding happens here.
pub fn aggregate<'a, I>(labels: I, limit: usize, min_count: u64) -> LabelAggregation
where
    I: IntoIterator<Item = &'a LabelValue>,
{
    let mut accumulators: HashMap<String, LabelAccumulator> = HashMap::new();
    for label in labels {
        let name = label.name();
        if name.is_empty() {
            continue;
        }
        let entry = accumulators.entry(name.to_string()).or_default();
        entry.count += 1;
        entry.confidence_sum += label.confidence();
    }

    let mut stats: Vec<LabelStats> = accumulators
        .into_iter()
        .filter(|(_, acc)| acc.count >= min_count)
        .map(|(name, acc)| LabelStats {
            name,
            count: acc.count,
            average_confidence: acc.confidence_sum / acc.count as f64,
        })
        .collect();

    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    let total_distinct = stats.len();
    stats.truncate(limit);
    LabelAggregation {
        stats,
        total_distinct,
    }
}
