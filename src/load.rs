use crate::discover::find_json_files;
use crate::extract;
use crate::store::Store;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info, warn};

/// Per-file extraction strategy: one for song-data trees, one for log-data
/// trees.
#[async_trait]
pub trait Extractor: Sync {
    async fn extract(&self, store: &mut dyn Store, path: &Path) -> Result<()>;
}

pub struct SongFiles;

pub struct LogFiles;

#[async_trait]
impl Extractor for SongFiles {
    async fn extract(&self, store: &mut dyn Store, path: &Path) -> Result<()> {
        extract::song::process_song_file(store, path).await
    }
}

#[async_trait]
impl Extractor for LogFiles {
    async fn extract(&self, store: &mut dyn Store, path: &Path) -> Result<()> {
        extract::event::process_log_file(store, path).await
    }
}

/// Discover every `*.json` file under `root` and run `extractor` over each
/// one in turn, committing after each file. A failure rolls back the open
/// transaction and aborts the run; remaining files are never attempted.
pub async fn process_data(
    store: &mut dyn Store,
    root: &Path,
    extractor: &dyn Extractor,
) -> Result<()> {
    let files = find_json_files(root)?;
    let total = files.len();
    info!("{} files found in {}", total, root.display());

    for (i, file) in files.iter().enumerate() {
        store.begin().await?;
        if let Err(err) = extractor.extract(store, file).await {
            if let Err(rb) = store.rollback().await {
                warn!("rollback failed: {rb:#}");
            }
            return Err(err.context(format!("failed to process {}", file.display())));
        }
        store.commit().await?;
        info!("{}/{} files processed.", i + 1, total);
        debug!(file = %file.display(), "loaded");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use crate::store::memory::MemStore;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn song_record(song_id: &str, title: &str, artist_id: &str, artist: &str) -> String {
        format!(
            r#"{{"song_id":"{song_id}","title":"{title}","artist_id":"{artist_id}","year":2000,"duration":200.5,"artist_name":"{artist}","artist_location":"NY","artist_latitude":40.7,"artist_longitude":-74.0}}"#
        )
    }

    fn write_tree(files: &[(&str, String)]) -> (tempfile::TempDir, PathBuf) {
        let tmp = tempdir().unwrap();
        for (name, contents) in files {
            let path = tmp.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        let root = tmp.path().to_path_buf();
        (tmp, root)
    }

    #[tokio::test]
    async fn test_commits_once_per_file() {
        let (_tmp, root) = write_tree(&[
            ("a/one.json", song_record("S1", "T", "A1", "Art")),
            ("b/two.json", song_record("S2", "U", "A2", "Bea")),
        ]);

        let mut store = MemStore::new();
        process_data(&mut store, &root, &SongFiles).await.unwrap();

        assert_eq!(store.songs().len(), 2);
        assert_eq!(store.artists().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_aborts_and_skips_remaining_files() {
        // glob yields alphabetical order, so the malformed file sits between
        // the two good ones.
        let (_tmp, root) = write_tree(&[
            ("a.json", song_record("S1", "T", "A1", "Art")),
            ("b.json", "{not json".to_string()),
            ("c.json", song_record("S3", "V", "A3", "Cee")),
        ]);

        let mut store = MemStore::new();
        let err = process_data(&mut store, &root, &SongFiles).await.unwrap_err();
        assert!(err.to_string().contains("b.json"));

        // Only the file before the failure was committed; the file after it
        // was never attempted.
        let ids: Vec<&str> = store.songs().iter().map(|s| s.song_id.as_str()).collect();
        assert_eq!(ids, vec!["S1"]);
    }

    #[tokio::test]
    async fn test_missing_root_aborts_before_any_work() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("absent");
        let mut store = MemStore::new();
        let err = process_data(&mut store, &missing, &SongFiles)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EtlError>(),
            Some(EtlError::MissingRoot(_))
        ));
    }

    #[tokio::test]
    async fn test_end_to_end_resolves_songplay() {
        let (_songs_tmp, song_root) =
            write_tree(&[("song.json", song_record("S1", "T", "A1", "Art"))]);
        let log_line = r#"{"page":"NextSong","ts":1541207073796,"userId":"39","firstName":"Sam","lastName":"Lee","gender":"F","level":"paid","song":"T","artist":"Art","length":200.5,"sessionId":583,"location":"NY","userAgent":"agent"}"#;
        let (_logs_tmp, log_root) = write_tree(&[("log.json", log_line.to_string())]);

        let mut store = MemStore::new();
        process_data(&mut store, &song_root, &SongFiles).await.unwrap();
        process_data(&mut store, &log_root, &LogFiles).await.unwrap();

        assert_eq!(store.songplays().len(), 1);
        let play = &store.songplays()[0];
        assert_eq!(play.songplay_id, 1);
        assert_eq!(play.song_id.as_deref(), Some("S1"));
        assert_eq!(play.artist_id.as_deref(), Some("A1"));
        assert_eq!(play.user_id, "39");
        assert_eq!(play.level, "paid");
        assert_eq!(play.session_id, 583);
        assert_eq!(store.users()["39"].first_name.as_deref(), Some("Sam"));
        assert_eq!(store.time_rows().len(), 1);
    }
}
