use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer};

/// One row of the `songs` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    /// Release year; 0 means unknown.
    pub year: i32,
    /// Duration in seconds.
    pub duration: f64,
}

/// One row of the `artists` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One row of the `time` table: a single timestamp decomposed into its
/// calendar components. `weekday` follows the Monday=0 convention.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeRow {
    pub start_time: NaiveDateTime,
    pub hour: u32,
    pub day: u32,
    /// ISO week number.
    pub week: u32,
    pub month: u32,
    pub year: i32,
    pub weekday: u32,
}

impl TimeRow {
    /// Decompose a millisecond epoch timestamp (UTC).
    pub fn from_millis(ts: i64) -> Result<Self> {
        let dt: DateTime<Utc> = DateTime::from_timestamp_millis(ts)
            .ok_or_else(|| anyhow!("timestamp {ts} out of range"))?;
        Ok(TimeRow {
            start_time: dt.naive_utc(),
            hour: dt.hour(),
            day: dt.day(),
            week: dt.iso_week().week(),
            month: dt.month(),
            year: dt.year(),
            weekday: dt.weekday().num_days_from_monday(),
        })
    }
}

/// One row of the `users` table. Re-emitted per qualifying event; the store
/// upserts, so the last event's `level` wins.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    /// Subscription level, "free" or "paid".
    pub level: String,
}

/// One row of the `songplays` fact table. `songplay_id` is the event's
/// 1-based position within its file after filtering, and is not globally
/// unique across files.
#[derive(Debug, Clone, PartialEq)]
pub struct Songplay {
    pub songplay_id: i64,
    pub start_time: NaiveDateTime,
    pub user_id: String,
    pub level: String,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Raw record in a song-data file: one song plus its performing artist.
#[derive(Debug, Deserialize)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    #[serde(default)]
    pub year: i32,
    pub duration: f64,
    pub artist_name: String,
    #[serde(default)]
    pub artist_location: Option<String>,
    #[serde(default)]
    pub artist_latitude: Option<f64>,
    #[serde(default)]
    pub artist_longitude: Option<f64>,
}

impl SongRecord {
    /// Straight positional projection; no normalization or validation.
    pub fn song(&self) -> Song {
        Song {
            song_id: self.song_id.clone(),
            title: self.title.clone(),
            artist_id: self.artist_id.clone(),
            year: self.year,
            duration: self.duration,
        }
    }

    pub fn artist(&self) -> Artist {
        Artist {
            artist_id: self.artist_id.clone(),
            name: self.artist_name.clone(),
            location: self.artist_location.clone(),
            latitude: self.artist_latitude,
            longitude: self.artist_longitude,
        }
    }
}

/// Raw record in a log file: one session event. Only `page == "NextSong"`
/// events survive filtering, so most fields are optional here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub page: String,
    /// Millisecond epoch timestamp.
    pub ts: i64,
    #[serde(default, deserialize_with = "string_or_number")]
    pub user_id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    pub level: String,
    #[serde(default)]
    pub song: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub length: Option<f64>,
    pub session_id: i64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// `userId` shows up as both `"39"` and `39` in real log data.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(i64),
    }
    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Str(s)) => s,
        Some(Raw::Num(n)) => n.to_string(),
        None => String::new(),
    })
}

/// A retained (NextSong) event with its timestamp already decomposed: the
/// unit the event extractor hands to the loading step.
#[derive(Debug, Clone)]
pub struct Play {
    pub time: TimeRow,
    pub user: User,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub length: Option<f64>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl Play {
    pub fn from_event(event: LogEvent) -> Result<Self> {
        let time = TimeRow::from_millis(event.ts)?;
        Ok(Play {
            time,
            user: User {
                user_id: event.user_id,
                first_name: event.first_name,
                last_name: event.last_name,
                gender: event.gender,
                level: event.level,
            },
            song: event.song,
            artist: event.artist,
            length: event.length,
            session_id: event.session_id,
            location: event.location,
            user_agent: event.user_agent,
        })
    }
}
