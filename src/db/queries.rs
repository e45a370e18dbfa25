use super::models::{JoinedRow, MoodRecord, NewListeningEntry, NewMood, TrackFeatures, UserStats};
use super::{Database, Result};
use rusqlite::{params, OptionalExtension};

impl Database {
    /// Insert a mood check-in. Returns the new mood id.
    pub fn insert_mood(&self, m: &NewMood) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO moods (user_id, mood_score, arousal_score, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![m.user_id, m.mood_score, m.arousal_score, m.recorded_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Look up a mood by id, scoped to its owner.
    pub fn get_mood(&self, mood_id: i64, user_id: i64) -> Result<Option<MoodRecord>> {
        let mood = self
            .conn
            .query_row(
                "SELECT mood_id, user_id, mood_score, arousal_score, recorded_at
                 FROM moods WHERE mood_id = ?1 AND user_id = ?2",
                params![mood_id, user_id],
                |row| {
                    Ok(MoodRecord {
                        mood_id: row.get(0)?,
                        user_id: row.get(1)?,
                        mood_score: row.get(2)?,
                        arousal_score: row.get(3)?,
                        recorded_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(mood)
    }

    /// Insert a played track. A replay of the same (user, track, listened_at)
    /// only moves the mood link.
    pub fn upsert_listening_entry(&self, e: &NewListeningEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO listening_history (
                mood_id, user_id, track_id, track_name, artist_name, listened_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id, track_id, listened_at) DO UPDATE SET
                mood_id = excluded.mood_id",
            params![
                e.mood_id, e.user_id, e.track_id, e.track_name, e.artist_name, e.listened_at,
            ],
        )?;
        Ok(())
    }

    /// Insert or refresh a track's audio features.
    pub fn upsert_track_features(&self, t: &TrackFeatures) -> Result<()> {
        self.conn.execute(
            "INSERT INTO tracks (track_id, name, artist, danceability, energy, valence, tempo)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(track_id) DO UPDATE SET
                name = COALESCE(excluded.name, tracks.name),
                artist = COALESCE(excluded.artist, tracks.artist),
                danceability = excluded.danceability,
                energy = excluded.energy,
                valence = excluded.valence,
                tempo = excluded.tempo",
            params![
                t.track_id, t.name, t.artist, t.danceability, t.energy, t.valence, t.tempo,
            ],
        )?;
        Ok(())
    }

    /// All of a user's moods, left-joined with their listening history and
    /// track features. Order is whatever the join produces.
    pub fn fetch_joined_rows(&self, user_id: i64) -> Result<Vec<JoinedRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                moods.mood_id,
                moods.user_id,
                moods.mood_score,
                moods.arousal_score,
                moods.recorded_at AS mood_recorded_at,
                listening_history.history_id,
                listening_history.track_id,
                listening_history.track_name,
                listening_history.artist_name AS listened_artist_name,
                listening_history.listened_at,
                tracks.artist AS track_artist,
                tracks.danceability,
                tracks.energy,
                tracks.valence,
                tracks.tempo
             FROM moods
             LEFT JOIN listening_history
                ON moods.mood_id = listening_history.mood_id
                AND moods.user_id = listening_history.user_id
             LEFT JOIN tracks
                ON listening_history.track_id = tracks.track_id
             WHERE moods.user_id = ?1",
        )?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(JoinedRow {
                    mood_id: row.get(0)?,
                    user_id: row.get(1)?,
                    mood_score: row.get(2)?,
                    arousal_score: row.get(3)?,
                    mood_recorded_at: row.get(4)?,
                    history_id: row.get(5)?,
                    track_id: row.get(6)?,
                    track_name: row.get(7)?,
                    listened_artist_name: row.get(8)?,
                    listened_at: row.get(9)?,
                    track_artist: row.get(10)?,
                    danceability: row.get(11)?,
                    energy: row.get(12)?,
                    valence: row.get(13)?,
                    tempo: row.get(14)?,
                    aggregates: None,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Row counts and mood date range for one user.
    pub fn user_stats(&self, user_id: i64) -> Result<UserStats> {
        let (moods, first_mood, last_mood) = self.conn.query_row(
            "SELECT COUNT(*), MIN(recorded_at), MAX(recorded_at) FROM moods WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let (listening_entries, linked_entries) = self.conn.query_row(
            "SELECT COUNT(*), COUNT(mood_id) FROM listening_history WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let tracks_with_features: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT t.track_id)
             FROM listening_history h
             JOIN tracks t ON t.track_id = h.track_id
             WHERE h.user_id = ?1
               AND COALESCE(t.danceability, t.energy, t.valence, t.tempo) IS NOT NULL",
            params![user_id],
            |row| row.get(0),
        )?;

        Ok(UserStats {
            moods,
            listening_entries,
            linked_entries,
            tracks_with_features,
            first_mood,
            last_mood,
        })
    }
}
