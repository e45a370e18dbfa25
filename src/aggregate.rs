use std::collections::HashMap;

use crate::db::models::JoinedRow;
use crate::table::{AudioFeature, Column, MoodTable};

/// Median and mean of one feature within one mood group.
/// Both are `None` when every value in the group is null.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupStat {
    pub median: Option<f64>,
    pub mean: Option<f64>,
}

impl GroupStat {
    fn from_values(mut values: Vec<f64>) -> Self {
        Self {
            mean: mean(&values),
            median: median(&mut values),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeatureAggregates {
    pub valence: GroupStat,
    pub danceability: GroupStat,
    pub energy: GroupStat,
    pub tempo: GroupStat,
}

impl FeatureAggregates {
    pub fn get(&self, feature: AudioFeature) -> GroupStat {
        match feature {
            AudioFeature::Valence => self.valence,
            AudioFeature::Danceability => self.danceability,
            AudioFeature::Energy => self.energy,
            AudioFeature::Tempo => self.tempo,
        }
    }

    fn set(&mut self, feature: AudioFeature, stat: GroupStat) {
        match feature {
            AudioFeature::Valence => self.valence = stat,
            AudioFeature::Danceability => self.danceability = stat,
            AudioFeature::Energy => self.energy = stat,
            AudioFeature::Tempo => self.tempo = stat,
        }
    }
}

/// Group rows by mood id and compute every feature's median and mean.
pub fn summarize_groups(rows: &[JoinedRow]) -> HashMap<i64, FeatureAggregates> {
    let mut groups: HashMap<i64, Vec<&JoinedRow>> = HashMap::new();
    for row in rows {
        groups.entry(row.mood_id).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(mood_id, members)| {
            let mut aggregates = FeatureAggregates::default();
            for feature in AudioFeature::ALL {
                let values: Vec<f64> = members
                    .iter()
                    .filter_map(|r| r.feature(feature))
                    .filter(|v| !v.is_nan())
                    .collect();
                aggregates.set(feature, GroupStat::from_values(values));
            }
            (mood_id, aggregates)
        })
        .collect()
}

/// Attach `median_*` and `mean_*` to every row, keyed by its mood group.
/// Stats skip null values. Row count and order are unchanged.
///
/// An empty table, or one without `valence` or `mood_id`, is returned as is.
pub fn annotate_group_stats(mut table: MoodTable) -> MoodTable {
    if table.is_empty() || !table.has_columns(&[Column::Valence, Column::MoodId]) {
        log::debug!("Skipping group aggregates: no rows or missing valence/mood_id");
        return table;
    }

    let summaries = summarize_groups(table.rows());
    log::debug!(
        "Computed aggregates for {} mood groups over {} rows",
        summaries.len(),
        table.len()
    );

    for row in table.rows_mut() {
        row.aggregates = summaries.get(&row.mood_id).copied();
    }
    for feature in AudioFeature::ALL {
        table.add_column(Column::Median(feature));
        table.add_column(Column::Mean(feature));
    }
    table
}

/// Median of the values; even counts average the two middle values.
pub fn median(v: &mut [f64]) -> Option<f64> {
    v.sort_by(|a, b| a.total_cmp(b));
    let n = v.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        Some(v[n / 2])
    } else {
        Some((v[n / 2 - 1] + v[n / 2]) / 2.0)
    }
}

pub fn mean(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        None
    } else {
        Some(v.iter().sum::<f64>() / v.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::test_rows::*;

    fn sample_table() -> MoodTable {
        MoodTable::from_rows(vec![
            with_track(1, 7.0, ts(1, 9), "a", Some(0.2), Some(0.5), Some(0.6), Some(100.0)),
            with_track(1, 7.0, ts(1, 9), "b", Some(0.4), None, Some(0.8), Some(120.0)),
            with_track(1, 7.0, ts(1, 9), "c", Some(0.9), Some(0.7), None, Some(140.0)),
            with_track(2, 3.0, ts(2, 9), "d", Some(0.1), Some(0.3), Some(0.4), None),
            mood_only(3, 5.0, 5.0, ts(3, 9)),
        ])
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_broadcast_identical_within_group() {
        let table = annotate_group_stats(sample_table());
        let group: Vec<_> = table.rows().iter().filter(|r| r.mood_id == 1).collect();
        assert_eq!(group.len(), 3);
        for row in &group {
            assert_eq!(row.aggregates, group[0].aggregates);
        }

        let agg = group[0].aggregates.unwrap();
        assert_eq!(agg.valence.median, Some(0.4));
        assert!((agg.valence.mean.unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(agg.tempo.median, Some(120.0));
    }

    #[test]
    fn test_nulls_excluded_from_stats() {
        let table = annotate_group_stats(sample_table());
        let agg = table.rows()[0].aggregates.unwrap();
        // energy: 0.5, null, 0.7
        assert!((agg.energy.median.unwrap() - 0.6).abs() < 1e-12);
        assert!((agg.energy.mean.unwrap() - 0.6).abs() < 1e-12);
        // danceability: 0.6, 0.8, null
        assert!((agg.danceability.median.unwrap() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_all_null_group_yields_null_stats() {
        let table = annotate_group_stats(sample_table());
        let lonely = table.rows().iter().find(|r| r.mood_id == 3).unwrap();
        let agg = lonely.aggregates.unwrap();
        for feature in AudioFeature::ALL {
            assert_eq!(agg.get(feature), GroupStat::default());
        }

        let tempo_free = table.rows().iter().find(|r| r.mood_id == 2).unwrap();
        assert_eq!(tempo_free.aggregates.unwrap().tempo.median, None);
    }

    #[test]
    fn test_adds_eight_columns_and_keeps_rows() {
        let before = sample_table();
        let after = annotate_group_stats(before.clone());
        assert_eq!(after.len(), before.len());
        for feature in AudioFeature::ALL {
            assert!(after.has_column(Column::Median(feature)));
            assert!(after.has_column(Column::Mean(feature)));
        }
        assert_eq!(after.columns().count(), Column::BASE.len() + 8);
        for (a, b) in after.rows().iter().zip(before.rows()) {
            assert_eq!(a.mood_id, b.mood_id);
            assert_eq!(a.track_id, b.track_id);
        }
    }

    #[test]
    fn test_missing_valence_column_is_unchanged() {
        let rows = sample_table().rows().to_vec();
        let columns: Vec<Column> = Column::BASE
            .into_iter()
            .filter(|c| *c != Column::Valence)
            .collect();
        let table = MoodTable::with_columns(columns, rows);
        assert_eq!(annotate_group_stats(table.clone()), table);
    }

    #[test]
    fn test_missing_mood_id_column_is_unchanged() {
        let rows = sample_table().rows().to_vec();
        let columns: Vec<Column> = Column::BASE
            .into_iter()
            .filter(|c| *c != Column::MoodId)
            .collect();
        let table = MoodTable::with_columns(columns, rows);
        assert_eq!(annotate_group_stats(table.clone()), table);
    }

    #[test]
    fn test_empty_table_is_unchanged() {
        let table = MoodTable::from_rows(Vec::new());
        assert_eq!(annotate_group_stats(table.clone()), table);
    }

    #[test]
    fn test_numeric_reads_aggregates() {
        let table = annotate_group_stats(sample_table());
        let row = &table.rows()[0];
        assert_eq!(row.numeric(Column::Median(AudioFeature::Valence)), Some(0.4));
        assert_eq!(row.numeric(Column::MoodScore), Some(7.0));
        assert_eq!(row.numeric(Column::TrackName), None);
    }
}
