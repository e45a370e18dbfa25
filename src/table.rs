//! The joined mood table: typed rows plus the set of columns they carry.
//!
//! Rows always have every field, but a table only "has" a column when it is
//! listed in its column set. A table built from an empty result has no
//! columns at all, and the derived `median_*` / `mean_*` columns only appear
//! once aggregation has run. Chart builders check column presence before
//! drawing.

use std::collections::BTreeSet;
use std::fmt;

use crate::db::models::JoinedRow;

/// The four audio descriptors that get per-mood aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AudioFeature {
    Valence,
    Danceability,
    Energy,
    Tempo,
}

impl AudioFeature {
    pub const ALL: [AudioFeature; 4] = [
        AudioFeature::Valence,
        AudioFeature::Danceability,
        AudioFeature::Energy,
        AudioFeature::Tempo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Valence => "valence",
            Self::Danceability => "danceability",
            Self::Energy => "energy",
            Self::Tempo => "tempo",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Valence => "Valence",
            Self::Danceability => "Danceability",
            Self::Energy => "Energy",
            Self::Tempo => "Tempo",
        }
    }

    /// Raw column holding this feature.
    pub fn column(self) -> Column {
        match self {
            Self::Valence => Column::Valence,
            Self::Danceability => Column::Danceability,
            Self::Energy => Column::Energy,
            Self::Tempo => Column::Tempo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    MoodId,
    UserId,
    MoodScore,
    ArousalScore,
    MoodRecordedAt,
    HistoryId,
    TrackId,
    TrackName,
    ListenedArtistName,
    ListenedAt,
    TrackArtist,
    Danceability,
    Energy,
    Valence,
    Tempo,
    Median(AudioFeature),
    Mean(AudioFeature),
}

impl Column {
    /// Columns produced by the joined query, in select order.
    pub const BASE: [Column; 15] = [
        Column::MoodId,
        Column::UserId,
        Column::MoodScore,
        Column::ArousalScore,
        Column::MoodRecordedAt,
        Column::HistoryId,
        Column::TrackId,
        Column::TrackName,
        Column::ListenedArtistName,
        Column::ListenedAt,
        Column::TrackArtist,
        Column::Danceability,
        Column::Energy,
        Column::Valence,
        Column::Tempo,
    ];
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MoodId => f.write_str("mood_id"),
            Self::UserId => f.write_str("user_id"),
            Self::MoodScore => f.write_str("mood_score"),
            Self::ArousalScore => f.write_str("arousal_score"),
            Self::MoodRecordedAt => f.write_str("mood_recorded_at"),
            Self::HistoryId => f.write_str("history_id"),
            Self::TrackId => f.write_str("track_id"),
            Self::TrackName => f.write_str("track_name"),
            Self::ListenedArtistName => f.write_str("listened_artist_name"),
            Self::ListenedAt => f.write_str("listened_at"),
            Self::TrackArtist => f.write_str("track_artist"),
            Self::Danceability => f.write_str("danceability"),
            Self::Energy => f.write_str("energy"),
            Self::Valence => f.write_str("valence"),
            Self::Tempo => f.write_str("tempo"),
            Self::Median(feature) => write!(f, "median_{}", feature.name()),
            Self::Mean(feature) => write!(f, "mean_{}", feature.name()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoodTable {
    columns: BTreeSet<Column>,
    rows: Vec<JoinedRow>,
}

impl MoodTable {
    /// Table from query rows: all base columns when there is at least one row,
    /// no columns when there are none.
    pub fn from_rows(rows: Vec<JoinedRow>) -> Self {
        let columns = if rows.is_empty() {
            BTreeSet::new()
        } else {
            Column::BASE.into_iter().collect()
        };
        Self { columns, rows }
    }

    /// Table with an explicit column set.
    pub fn with_columns(columns: impl IntoIterator<Item = Column>, rows: Vec<JoinedRow>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[JoinedRow] {
        &self.rows
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn has_columns(&self, columns: &[Column]) -> bool {
        self.first_missing(columns).is_none()
    }

    /// The first of `columns` this table does not carry.
    pub fn first_missing(&self, columns: &[Column]) -> Option<Column> {
        columns.iter().copied().find(|c| !self.columns.contains(c))
    }

    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.columns.iter().copied()
    }

    pub(crate) fn add_column(&mut self, column: Column) {
        self.columns.insert(column);
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [JoinedRow] {
        &mut self.rows
    }

    /// Same columns, subset of rows.
    pub fn filter_rows(&self, mut keep: impl FnMut(&JoinedRow) -> bool) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_rows {
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::db::models::JoinedRow;

    pub fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    /// A mood row with no listening match.
    pub fn mood_only(mood_id: i64, mood: f64, arousal: f64, at: NaiveDateTime) -> JoinedRow {
        JoinedRow {
            mood_id,
            user_id: 1,
            mood_score: mood,
            arousal_score: arousal,
            mood_recorded_at: at,
            history_id: None,
            track_id: None,
            track_name: None,
            listened_artist_name: None,
            listened_at: None,
            track_artist: None,
            danceability: None,
            energy: None,
            valence: None,
            tempo: None,
            aggregates: None,
        }
    }

    /// A mood row joined to one played track with the given features.
    #[allow(clippy::too_many_arguments)]
    pub fn with_track(
        mood_id: i64,
        mood: f64,
        at: NaiveDateTime,
        track: &str,
        valence: Option<f64>,
        energy: Option<f64>,
        danceability: Option<f64>,
        tempo: Option<f64>,
    ) -> JoinedRow {
        JoinedRow {
            history_id: Some(mood_id * 100),
            track_id: Some(track.to_string()),
            track_name: Some(format!("{track} (song)")),
            listened_artist_name: Some("Khruangbin".to_string()),
            listened_at: Some(at),
            track_artist: Some("Khruangbin".to_string()),
            danceability,
            energy,
            valence,
            tempo,
            ..mood_only(mood_id, mood, 5.0, at)
        }
    }
}
