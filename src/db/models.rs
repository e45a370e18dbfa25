use chrono::NaiveDateTime;

use crate::aggregate::FeatureAggregates;
use crate::table::{AudioFeature, Column};

/// A mood check-in to insert.
#[derive(Debug, Clone)]
pub struct NewMood {
    pub user_id: i64,
    pub mood_score: f64,
    pub arousal_score: f64,
    pub recorded_at: NaiveDateTime,
}

/// A mood row read from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodRecord {
    pub mood_id: i64,
    pub user_id: i64,
    pub mood_score: f64,
    pub arousal_score: f64,
    pub recorded_at: NaiveDateTime,
}

/// One played track to insert into `listening_history`.
#[derive(Debug, Clone)]
pub struct NewListeningEntry {
    pub mood_id: Option<i64>,
    pub user_id: i64,
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub listened_at: NaiveDateTime,
}

/// Audio descriptors for one track. Everything but the id may be unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackFeatures {
    pub track_id: String,
    pub name: Option<String>,
    pub artist: Option<String>,
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub valence: Option<f64>,
    pub tempo: Option<f64>,
}

/// One row of moods ⟕ listening_history ⟕ tracks.
///
/// Listening and track fields are `None` when the left join found no match.
/// `aggregates` is filled in by [`crate::aggregate::annotate_group_stats`].
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub mood_id: i64,
    pub user_id: i64,
    pub mood_score: f64,
    pub arousal_score: f64,
    pub mood_recorded_at: NaiveDateTime,
    pub history_id: Option<i64>,
    pub track_id: Option<String>,
    pub track_name: Option<String>,
    pub listened_artist_name: Option<String>,
    pub listened_at: Option<NaiveDateTime>,
    pub track_artist: Option<String>,
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub valence: Option<f64>,
    pub tempo: Option<f64>,
    pub aggregates: Option<FeatureAggregates>,
}

impl JoinedRow {
    /// Raw per-row value of an audio feature.
    pub fn feature(&self, feature: AudioFeature) -> Option<f64> {
        match feature {
            AudioFeature::Valence => self.valence,
            AudioFeature::Danceability => self.danceability,
            AudioFeature::Energy => self.energy,
            AudioFeature::Tempo => self.tempo,
        }
    }

    /// Numeric value of a column, for charting. Non-numeric columns are `None`.
    pub fn numeric(&self, column: Column) -> Option<f64> {
        match column {
            Column::MoodScore => Some(self.mood_score),
            Column::ArousalScore => Some(self.arousal_score),
            Column::Danceability => self.danceability,
            Column::Energy => self.energy,
            Column::Valence => self.valence,
            Column::Tempo => self.tempo,
            Column::Median(f) => self.aggregates.as_ref().and_then(|a| a.get(f).median),
            Column::Mean(f) => self.aggregates.as_ref().and_then(|a| a.get(f).mean),
            _ => None,
        }
    }
}

/// Row counts for one user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserStats {
    pub moods: i64,
    pub listening_entries: i64,
    pub linked_entries: i64,
    pub tracks_with_features: i64,
    pub first_mood: Option<NaiveDateTime>,
    pub last_mood: Option<NaiveDateTime>,
}
