//! In-memory store backing tests and `--dry-run`. Implements the same
//! transaction bracket and conflict policy as the Postgres store, except
//! that a duplicate song/artist identifier with a *different* payload is
//! rejected instead of ignored, so conflicting inputs surface loudly.

use super::Store;
use crate::model::{Artist, Song, Songplay, TimeRow, User};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
struct Tables {
    songs: Vec<Song>,
    artists: Vec<Artist>,
    time: Vec<TimeRow>,
    users: BTreeMap<String, User>,
    songplays: Vec<Songplay>,
}

#[derive(Debug, Default)]
pub struct MemStore {
    committed: Tables,
    staged: Tables,
    open: bool,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore::default()
    }

    pub fn songs(&self) -> &[Song] {
        &self.committed.songs
    }

    pub fn artists(&self) -> &[Artist] {
        &self.committed.artists
    }

    pub fn time_rows(&self) -> &[TimeRow] {
        &self.committed.time
    }

    pub fn users(&self) -> &BTreeMap<String, User> {
        &self.committed.users
    }

    pub fn songplays(&self) -> &[Songplay] {
        &self.committed.songplays
    }

    /// Committed row counts per table, for the dry-run summary.
    pub fn counts(&self) -> [(&'static str, usize); 5] {
        [
            ("songs", self.committed.songs.len()),
            ("artists", self.committed.artists.len()),
            ("time", self.committed.time.len()),
            ("users", self.committed.users.len()),
            ("songplays", self.committed.songplays.len()),
        ]
    }

    fn require_open(&self) -> Result<()> {
        if !self.open {
            bail!("no open transaction");
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemStore {
    async fn begin(&mut self) -> Result<()> {
        if self.open {
            bail!("transaction already open");
        }
        self.staged = Tables::default();
        self.open = true;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.require_open()?;
        let staged = std::mem::take(&mut self.staged);
        self.committed.songs.extend(staged.songs);
        self.committed.artists.extend(staged.artists);
        self.committed.time.extend(staged.time);
        self.committed.users.extend(staged.users);
        self.committed.songplays.extend(staged.songplays);
        self.open = false;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.staged = Tables::default();
        self.open = false;
        Ok(())
    }

    async fn insert_song(&mut self, song: &Song) -> Result<()> {
        self.require_open()?;
        let existing = self
            .committed
            .songs
            .iter()
            .chain(self.staged.songs.iter())
            .find(|s| s.song_id == song.song_id);
        match existing {
            Some(prior) if prior == song => Ok(()),
            Some(_) => bail!("conflicting payload for song {}", song.song_id),
            None => {
                self.staged.songs.push(song.clone());
                Ok(())
            }
        }
    }

    async fn insert_artist(&mut self, artist: &Artist) -> Result<()> {
        self.require_open()?;
        let existing = self
            .committed
            .artists
            .iter()
            .chain(self.staged.artists.iter())
            .find(|a| a.artist_id == artist.artist_id);
        match existing {
            Some(prior) if prior == artist => Ok(()),
            Some(_) => bail!("conflicting payload for artist {}", artist.artist_id),
            None => {
                self.staged.artists.push(artist.clone());
                Ok(())
            }
        }
    }

    async fn insert_time(&mut self, row: &TimeRow) -> Result<()> {
        self.require_open()?;
        let duplicate = self
            .committed
            .time
            .iter()
            .chain(self.staged.time.iter())
            .any(|t| t.start_time == row.start_time);
        if !duplicate {
            self.staged.time.push(row.clone());
        }
        Ok(())
    }

    async fn insert_user(&mut self, user: &User) -> Result<()> {
        self.require_open()?;
        self.staged.users.insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn insert_songplay(&mut self, play: &Songplay) -> Result<()> {
        self.require_open()?;
        self.staged.songplays.push(play.clone());
        Ok(())
    }

    async fn find_song(
        &mut self,
        title: &str,
        artist: &str,
        duration: f64,
    ) -> Result<Option<(String, String)>> {
        self.require_open()?;
        for song in self.committed.songs.iter().chain(self.staged.songs.iter()) {
            if song.title != title || song.duration != duration {
                continue;
            }
            let matched = self
                .committed
                .artists
                .iter()
                .chain(self.staged.artists.iter())
                .find(|a| a.artist_id == song.artist_id && a.name == artist);
            if let Some(found) = matched {
                return Ok(Some((song.song_id.clone(), found.artist_id.clone())));
            }
        }
        Ok(None)
    }
}
