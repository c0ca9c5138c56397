use crate::model::{LogEvent, Play, Songplay};
use crate::store::Store;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// The only page action that produces a songplay fact.
pub const NEXT_SONG: &str = "NextSong";

/// Parse a newline-delimited log file into its retained plays: events are
/// hard-filtered on `page == "NextSong"` and their timestamps decomposed.
/// A parse error on any line aborts the whole file.
pub fn parse_log_file(path: &Path) -> Result<Vec<Play>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read log file {}", path.display()))?;

    let mut plays = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: LogEvent = serde_json::from_str(line)
            .with_context(|| format!("malformed event at {}:{}", path.display(), lineno + 1))?;
        if event.page != NEXT_SONG {
            continue;
        }
        plays.push(Play::from_event(event)?);
    }
    Ok(plays)
}

/// Issue the time, user, and songplay inserts for one log file, in that
/// order, resolving each play's song/artist pair by natural key. Does not
/// commit.
pub async fn process_log_file(store: &mut dyn Store, path: &Path) -> Result<()> {
    let plays = parse_log_file(path)?;

    for play in &plays {
        store.insert_time(&play.time).await?;
    }
    for play in &plays {
        store.insert_user(&play.user).await?;
    }

    for (i, play) in plays.iter().enumerate() {
        // A play missing any of the three key fields cannot match.
        let resolved = match (&play.song, &play.artist, play.length) {
            (Some(song), Some(artist), Some(length)) => {
                store.find_song(song, artist, length).await?
            }
            _ => None,
        };
        let (song_id, artist_id) = match resolved {
            Some((song_id, artist_id)) => (Some(song_id), Some(artist_id)),
            None => (None, None),
        };

        let row = Songplay {
            songplay_id: (i + 1) as i64,
            start_time: play.time.start_time,
            user_id: play.user.user_id.clone(),
            level: play.user.level.clone(),
            song_id,
            artist_id,
            session_id: play.session_id,
            location: play.location.clone(),
            user_agent: play.user_agent.clone(),
        };
        store.insert_songplay(&row).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemStore;
    use crate::store::Store;
    use std::fs;
    use tempfile::tempdir;

    fn next_song(ts: i64, user_id: &str, level: &str, song: &str, length: f64) -> String {
        format!(
            r#"{{"page":"NextSong","ts":{ts},"userId":"{user_id}","firstName":"Sam","lastName":"Lee","gender":"F","level":"{level}","song":"{song}","artist":"Art","length":{length},"sessionId":100,"location":"NY","userAgent":"agent"}}"#
        )
    }

    fn other_page(page: &str, ts: i64) -> String {
        format!(
            r#"{{"page":"{page}","ts":{ts},"userId":"","level":"free","sessionId":100}}"#
        )
    }

    #[test]
    fn test_filter_retains_only_next_song() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("log.json");
        let lines = [
            other_page("Home", 1541207073000),
            next_song(1541207073796, "39", "free", "T", 200.5),
            other_page("Logout", 1541207074000),
            next_song(1541207075000, "39", "free", "U", 100.0),
            other_page("Help", 1541207076000),
        ];
        fs::write(&path, lines.join("\n")).unwrap();

        let plays = parse_log_file(&path).unwrap();
        assert_eq!(plays.len(), 2);
        assert_eq!(plays[0].song.as_deref(), Some("T"));
        assert_eq!(plays[1].song.as_deref(), Some("U"));
    }

    #[test]
    fn test_bad_line_aborts_whole_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("log.json");
        let contents = format!(
            "{}\nnot json\n{}",
            next_song(1541207073796, "39", "free", "T", 200.5),
            next_song(1541207075000, "39", "free", "U", 100.0),
        );
        fs::write(&path, contents).unwrap();
        assert!(parse_log_file(&path).is_err());
    }

    #[tokio::test]
    async fn test_unresolved_plays_get_null_ids() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("log.json");
        fs::write(&path, next_song(1541207073796, "39", "free", "T", 200.5)).unwrap();

        let mut store = MemStore::new();
        store.begin().await.unwrap();
        process_log_file(&mut store, &path).await.unwrap();
        store.commit().await.unwrap();

        assert_eq!(store.songplays().len(), 1);
        let play = &store.songplays()[0];
        assert_eq!(play.songplay_id, 1);
        assert_eq!(play.song_id, None);
        assert_eq!(play.artist_id, None);
        assert_eq!(store.time_rows().len(), 1);
        assert_eq!(store.users().len(), 1);
    }

    #[tokio::test]
    async fn test_songplay_ids_are_position_after_filter() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("log.json");
        let lines = [
            other_page("Home", 1541207070000),
            next_song(1541207073796, "39", "free", "T", 200.5),
            next_song(1541207075000, "39", "free", "U", 100.0),
            next_song(1541207076000, "39", "free", "V", 50.0),
        ];
        fs::write(&path, lines.join("\n")).unwrap();

        let mut store = MemStore::new();
        store.begin().await.unwrap();
        process_log_file(&mut store, &path).await.unwrap();
        store.commit().await.unwrap();

        let ids: Vec<i64> = store.songplays().iter().map(|p| p.songplay_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_user_level_change_last_write_wins() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("log.json");
        let lines = [
            next_song(1541207073796, "39", "free", "T", 200.5),
            next_song(1541207075000, "39", "paid", "U", 100.0),
        ];
        fs::write(&path, lines.join("\n")).unwrap();

        let mut store = MemStore::new();
        store.begin().await.unwrap();
        process_log_file(&mut store, &path).await.unwrap();
        store.commit().await.unwrap();

        assert_eq!(store.users()["39"].level, "paid");
        // The songplay rows keep the level at play time.
        assert_eq!(store.songplays()[0].level, "free");
        assert_eq!(store.songplays()[1].level, "paid");
    }
}
