pub mod memory;
pub mod postgres;
pub mod queries;

use crate::model::{Artist, Song, Songplay, TimeRow, User};
use anyhow::Result;
use async_trait::async_trait;

/// Cursor-like handle over the five target tables. The loader brackets every
/// file with `begin`/`commit` (or `rollback` on failure); extractors only
/// issue inserts and lookups inside that bracket.
///
/// Conflict policy is the store's job: duplicate `time` rows are ignored,
/// `users` rows upsert with last-write-wins on `level`, and `songplays` are
/// append-only.
#[async_trait]
pub trait Store: Send {
    async fn begin(&mut self) -> Result<()>;
    async fn commit(&mut self) -> Result<()>;
    async fn rollback(&mut self) -> Result<()>;

    async fn insert_song(&mut self, song: &Song) -> Result<()>;
    async fn insert_artist(&mut self, artist: &Artist) -> Result<()>;
    async fn insert_time(&mut self, row: &TimeRow) -> Result<()>;
    async fn insert_user(&mut self, user: &User) -> Result<()>;
    async fn insert_songplay(&mut self, play: &Songplay) -> Result<()>;

    /// Natural-key resolution: exact match on (title, artist name, duration),
    /// no tolerance. Returns `(song_id, artist_id)` on a hit.
    async fn find_song(
        &mut self,
        title: &str,
        artist: &str,
        duration: f64,
    ) -> Result<Option<(String, String)>>;
}
