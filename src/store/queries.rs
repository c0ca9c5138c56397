//! Query catalog: the five insert templates plus the natural-key lookup.
//! The schema itself is assumed pre-created.

/// Songs and artists are dimension rows; the same artist legitimately
/// accompanies many song files, so duplicate keys are ignored rather than
/// fatal.
pub const SONG_INSERT: &str = "INSERT INTO songs (song_id, title, artist_id, year, duration) \
     VALUES ($1, $2, $3, $4, $5) \
     ON CONFLICT (song_id) DO NOTHING";

pub const ARTIST_INSERT: &str = "INSERT INTO artists (artist_id, name, location, latitude, longitude) \
     VALUES ($1, $2, $3, $4, $5) \
     ON CONFLICT (artist_id) DO NOTHING";

/// Time rows are re-emitted per event with no in-memory dedup; duplicate
/// timestamps are expected and ignored.
pub const TIME_INSERT: &str = "INSERT INTO time (start_time, hour, day, week, month, year, weekday) \
     VALUES ($1, $2, $3, $4, $5, $6, $7) \
     ON CONFLICT (start_time) DO NOTHING";

/// A user's level can change between events; the last insert wins.
pub const USER_INSERT: &str = "INSERT INTO users (user_id, first_name, last_name, gender, level) \
     VALUES ($1, $2, $3, $4, $5) \
     ON CONFLICT (user_id) DO UPDATE SET level = EXCLUDED.level";

pub const SONGPLAY_INSERT: &str = "INSERT INTO songplays (songplay_id, start_time, user_id, level, song_id, \
     artist_id, session_id, location, user_agent) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)";

pub const SONG_SELECT: &str = "SELECT s.song_id, a.artist_id \
     FROM songs s JOIN artists a ON s.artist_id = a.artist_id \
     WHERE s.title = $1 AND a.name = $2 AND s.duration = $3";
