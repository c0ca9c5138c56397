use crate::error::EtlError;
use crate::model::{Artist, Song, SongRecord};
use crate::store::Store;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse a song-data file into its Song and Artist rows.
///
/// Song files are newline-delimited and expected to contain exactly one
/// record: zero records is an error, extra records are silently truncated
/// to the first (a preserved limitation of the upstream dataset handling).
pub fn parse_song_file(path: &Path) -> Result<(Song, Artist)> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read song file {}", path.display()))?;
    let first = contents
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| EtlError::EmptySongFile(path.to_path_buf()))?;
    let record: SongRecord = serde_json::from_str(first)
        .with_context(|| format!("malformed song record in {}", path.display()))?;
    Ok((record.song(), record.artist()))
}

/// Issue the song and artist inserts for one song file. Does not commit.
pub async fn process_song_file(store: &mut dyn Store, path: &Path) -> Result<()> {
    let (song, artist) = parse_song_file(path)?;
    store.insert_song(&song).await?;
    store.insert_artist(&artist).await?;
    Ok(())
}
