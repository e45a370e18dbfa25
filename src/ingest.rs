use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::db::models::{NewListeningEntry, NewMood, TrackFeatures};
use crate::db::{Database, DbError};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid import file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be between 0 and 10, got {value}")]
    ScoreOutOfRange { field: &'static str, value: f64 },
    #[error("Import contains no tracks")]
    EmptyImport,
    #[error("Mood {mood_id} does not exist for user {user_id}")]
    UnknownMood { mood_id: i64, user_id: i64 },
}

pub type Result<T> = std::result::Result<T, IngestError>;

/// Tracks played around one mood check-in, plus their audio features.
#[derive(Debug, Clone, Deserialize)]
pub struct ListeningImport {
    pub mood_id: i64,
    pub user_id: i64,
    pub tracks: Vec<PlayedTrack>,
    /// `null` where the service has no features for a track.
    #[serde(default)]
    pub audio_features: Vec<Option<AudioFeatures>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayedTrack {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub played_at: DateTime<Utc>,
}

/// One entry of an audio-features response. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeatures {
    pub id: String,
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub valence: Option<f64>,
    pub tempo: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub listening_entries: usize,
    pub tracks_with_features: usize,
    /// Feature entries that were `null` or matched no imported track.
    pub skipped_features: usize,
}

fn check_score(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&value) {
        Ok(())
    } else {
        Err(IngestError::ScoreOutOfRange { field, value })
    }
}

/// Store a mood check-in. `recorded_at` defaults to now (UTC).
pub fn record_mood(
    db: &Database,
    user_id: i64,
    mood_score: f64,
    arousal_score: f64,
    recorded_at: Option<NaiveDateTime>,
) -> Result<i64> {
    check_score("mood_score", mood_score)?;
    check_score("arousal_score", arousal_score)?;

    let recorded_at = recorded_at.unwrap_or_else(|| Utc::now().naive_utc());
    let mood_id = db.insert_mood(&NewMood {
        user_id,
        mood_score,
        arousal_score,
        recorded_at,
    })?;
    log::info!("Recorded mood {mood_id} for user {user_id} ({mood_score}/{arousal_score})");
    Ok(mood_id)
}

/// Link played tracks to a mood and store their audio features, all in one
/// transaction.
pub fn import_listening(db: &Database, import: &ListeningImport) -> Result<ImportSummary> {
    if import.tracks.is_empty() {
        return Err(IngestError::EmptyImport);
    }
    if db.get_mood(import.mood_id, import.user_id)?.is_none() {
        return Err(IngestError::UnknownMood {
            mood_id: import.mood_id,
            user_id: import.user_id,
        });
    }

    let tx = db.conn.unchecked_transaction().map_err(DbError::from)?;
    let mut summary = ImportSummary::default();

    let mut played: HashMap<&str, &PlayedTrack> = HashMap::new();
    for track in &import.tracks {
        db.upsert_listening_entry(&NewListeningEntry {
            mood_id: Some(import.mood_id),
            user_id: import.user_id,
            track_id: track.id.clone(),
            track_name: track.name.clone(),
            artist_name: track.artist.clone(),
            listened_at: track.played_at.naive_utc(),
        })?;
        played.insert(track.id.as_str(), track);
        summary.listening_entries += 1;
    }

    for features in &import.audio_features {
        let Some(features) = features else {
            summary.skipped_features += 1;
            continue;
        };
        let Some(track) = played.get(features.id.as_str()) else {
            log::debug!("No imported track for audio features {}", features.id);
            summary.skipped_features += 1;
            continue;
        };
        db.upsert_track_features(&TrackFeatures {
            track_id: features.id.clone(),
            name: Some(track.name.clone()),
            artist: Some(track.artist.clone()),
            danceability: features.danceability,
            energy: features.energy,
            valence: features.valence,
            tempo: features.tempo,
        })?;
        summary.tracks_with_features += 1;
    }

    tx.commit().map_err(DbError::from)?;
    log::info!(
        "Imported {} plays for mood {} ({} with features, {} skipped)",
        summary.listening_entries,
        import.mood_id,
        summary.tracks_with_features,
        summary.skipped_features
    );
    Ok(summary)
}

/// Parse a mood timestamp: RFC 3339 (converted to UTC) or a naive
/// `YYYY-MM-DD HH:MM[:SS]` taken as UTC.
pub fn parse_timestamp(s: &str) -> std::result::Result<NaiveDateTime, String> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.naive_utc());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| format!("invalid timestamp: {s} (expected RFC 3339 or YYYY-MM-DD HH:MM:SS)"))
}

/// Read a listening import from a JSON file.
pub fn load_import(path: &Path) -> Result<ListeningImport> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
