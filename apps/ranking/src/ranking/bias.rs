//! Bias Auditor: per-education-group score means, deviation flags and a
//! shrink-toward-mean correction for flagged groups.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct BiasConfig {
    /// Batches smaller than this are never audited.
    pub min_sample_size: usize,
    /// Relative deviation from the global mean above which a group is flagged.
    pub threshold: f64,
}

impl Default for BiasConfig {
    fn default() -> Self {
        Self {
            min_sample_size: 100,
            threshold: 0.15,
        }
    }
}

/// Stored score of one candidate, keyed into groups by education rank.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub resume_id: Uuid,
    pub highest_degree: Option<u8>,
    pub ranking_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub highest_degree: u8,
    pub count: usize,
    pub mean_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BiasReport {
    pub job_id: Uuid,
    pub sample_size: usize,
    pub global_mean: Option<f64>,
    pub groups: Vec<GroupStats>,
    pub biased_groups: Vec<u8>,
    pub adjusted: usize,
}

/// Mean score per education rank, over records that have both a group and
/// a score. Sorted by rank.
pub fn group_stats(records: &[ScoredCandidate]) -> Vec<GroupStats> {
    let mut groups: BTreeMap<u8, Vec<f64>> = BTreeMap::new();
    for record in records {
        if let (Some(group), Some(score)) = (record.highest_degree, record.ranking_score) {
            groups.entry(group).or_default().push(score);
        }
    }

    groups
        .into_iter()
        .map(|(highest_degree, scores)| GroupStats {
            highest_degree,
            count: scores.len(),
            mean_score: mean(&scores),
        })
        .collect()
}

/// Mean over every grouped and scored record.
pub fn grouped_mean(stats: &[GroupStats]) -> Option<f64> {
    let count: usize = stats.iter().map(|g| g.count).sum();
    if count == 0 {
        return None;
    }
    let total: f64 = stats.iter().map(|g| g.mean_score * g.count as f64).sum();
    Some(total / count as f64)
}

/// Education ranks whose mean score deviates from the global mean by more
/// than `config.threshold`, relative to the global mean.
pub fn detect_bias(records: &[ScoredCandidate], config: &BiasConfig) -> Vec<u8> {
    if records.len() < config.min_sample_size {
        info!(
            "Not enough records for bias check ({} < {})",
            records.len(),
            config.min_sample_size
        );
        return Vec::new();
    }

    let stats = group_stats(records);
    let Some(global_mean) = grouped_mean(&stats) else {
        return Vec::new();
    };
    if global_mean == 0.0 || !global_mean.is_finite() {
        warn!(global_mean, "global mean is zero or non-finite; skipping bias check");
        return Vec::new();
    }

    stats
        .iter()
        .filter(|group| {
            let deviation = (group.mean_score - global_mean).abs() / global_mean.abs();
            debug!(
                group = group.highest_degree,
                mean = group.mean_score,
                global_mean,
                deviation,
                "group deviation"
            );
            deviation > config.threshold
        })
        .map(|group| group.highest_degree)
        .collect()
}

/// Moves every scored record of a flagged group halfway toward the global
/// mean, rounded to 4 decimals. Returns the records unchanged when nothing
/// is flagged.
pub fn reweigh(records: &[ScoredCandidate], biased_groups: &[u8]) -> Vec<ScoredCandidate> {
    if biased_groups.is_empty() {
        return records.to_vec();
    }

    let scores: Vec<f64> = records.iter().filter_map(|r| r.ranking_score).collect();
    if scores.is_empty() {
        return records.to_vec();
    }
    let global_mean = mean(&scores);
    debug!(global_mean, "global mean for reweighing");

    records
        .iter()
        .map(|record| {
            let flagged = record
                .highest_degree
                .is_some_and(|group| biased_groups.contains(&group));
            match record.ranking_score {
                Some(score) if flagged => ScoredCandidate {
                    ranking_score: Some(round4((score + global_mean) / 2.0)),
                    ..record.clone()
                },
                _ => record.clone(),
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(degree: Option<u8>, score: Option<f64>) -> ScoredCandidate {
        ScoredCandidate {
            resume_id: Uuid::new_v4(),
            highest_degree: degree,
            ranking_score: score,
        }
    }

    /// 50 bachelors at 0.5 and 50 masters at 0.9: global 0.7, both groups
    /// deviate by ~0.286.
    fn skewed_batch() -> Vec<ScoredCandidate> {
        (0..50)
            .map(|_| candidate(Some(4), Some(0.5)))
            .chain((0..50).map(|_| candidate(Some(5), Some(0.9))))
            .collect()
    }

    #[test]
    fn test_below_sample_size_flags_nothing() {
        let records: Vec<_> = skewed_batch().into_iter().take(99).collect();
        assert!(detect_bias(&records, &BiasConfig::default()).is_empty());
    }

    #[test]
    fn test_skewed_groups_are_flagged() {
        let biased = detect_bias(&skewed_batch(), &BiasConfig::default());
        assert_eq!(biased, vec![4, 5]);
    }

    #[test]
    fn test_small_deviation_is_not_flagged() {
        let records: Vec<_> = (0..50)
            .map(|_| candidate(Some(4), Some(0.65)))
            .chain((0..50).map(|_| candidate(Some(5), Some(0.75))))
            .collect();
        assert!(detect_bias(&records, &BiasConfig::default()).is_empty());
    }

    #[test]
    fn test_zero_global_mean_flags_nothing() {
        let records: Vec<_> = (0..100).map(|_| candidate(Some(3), Some(0.0))).collect();
        assert!(detect_bias(&records, &BiasConfig::default()).is_empty());
    }

    #[test]
    fn test_ungrouped_and_unscored_records_are_ignored() {
        let mut records = skewed_batch();
        records.push(candidate(None, Some(100.0)));
        records.push(candidate(Some(6), None));

        let stats = group_stats(&records);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].count, 50);
        let global = grouped_mean(&stats).unwrap();
        assert!((global - 0.7).abs() < 1e-9, "global mean {global}");
    }

    #[test]
    fn test_custom_config() {
        let config = BiasConfig {
            min_sample_size: 4,
            threshold: 0.5,
        };
        let records = vec![
            candidate(Some(1), Some(0.1)),
            candidate(Some(6), Some(0.9)),
            candidate(Some(6), Some(0.9)),
            candidate(Some(6), Some(0.9)),
        ];
        // global 0.7: group 1 deviates by ~0.857, group 6 by ~0.286
        assert_eq!(detect_bias(&records, &config), vec![1]);
    }

    #[test]
    fn test_reweigh_without_flags_is_identity() {
        let records = skewed_batch();
        assert_eq!(reweigh(&records, &[]), records);
    }

    #[test]
    fn test_reweigh_moves_flagged_scores_toward_mean() {
        let records = vec![
            candidate(Some(4), Some(0.2)),
            candidate(Some(5), Some(0.8)),
            candidate(Some(5), None),
        ];
        // global mean over scored records = 0.5
        let adjusted = reweigh(&records, &[4]);
        assert_eq!(adjusted[0].ranking_score, Some(0.35));
        assert_eq!(adjusted[1].ranking_score, Some(0.8));
        assert_eq!(adjusted[2].ranking_score, None);
        assert_eq!(adjusted[0].resume_id, records[0].resume_id);
    }

    #[test]
    fn test_reweigh_rounds_to_four_decimals() {
        let records = vec![
            candidate(Some(2), Some(0.123456)),
            candidate(Some(3), Some(0.654321)),
        ];
        let adjusted = reweigh(&records, &[2]);
        // (0.123456 + 0.3888885) / 2 = 0.25617225
        assert_eq!(adjusted[0].ranking_score, Some(0.2562));
    }
}
