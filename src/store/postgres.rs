use super::{queries, Store};
use crate::model::{Artist, Song, Songplay, TimeRow, User};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::{Postgres, Row, Transaction};

/// Postgres-backed store. Holds at most one open transaction at a time;
/// exactly one statement is in flight against it at any moment.
pub struct PgStore {
    pool: PgPool,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool, tx: None }
    }

    fn tx(&mut self) -> Result<&mut Transaction<'static, Postgres>> {
        self.tx.as_mut().context("no open transaction")
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&mut self) -> Result<()> {
        if self.tx.is_some() {
            bail!("transaction already open");
        }
        let tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;
        self.tx = Some(tx);
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let tx = self.tx.take().context("no open transaction to commit")?;
        tx.commit().await.context("failed to commit transaction")
    }

    async fn rollback(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.rollback()
                .await
                .context("failed to roll back transaction")?;
        }
        Ok(())
    }

    async fn insert_song(&mut self, song: &Song) -> Result<()> {
        let tx = self.tx()?;
        sqlx::query(queries::SONG_INSERT)
            .bind(&song.song_id)
            .bind(&song.title)
            .bind(&song.artist_id)
            .bind(song.year)
            .bind(song.duration)
            .execute(&mut **tx)
            .await
            .with_context(|| format!("failed to insert song {}", song.song_id))?;
        Ok(())
    }

    async fn insert_artist(&mut self, artist: &Artist) -> Result<()> {
        let tx = self.tx()?;
        sqlx::query(queries::ARTIST_INSERT)
            .bind(&artist.artist_id)
            .bind(&artist.name)
            .bind(&artist.location)
            .bind(artist.latitude)
            .bind(artist.longitude)
            .execute(&mut **tx)
            .await
            .with_context(|| format!("failed to insert artist {}", artist.artist_id))?;
        Ok(())
    }

    async fn insert_time(&mut self, row: &TimeRow) -> Result<()> {
        let tx = self.tx()?;
        sqlx::query(queries::TIME_INSERT)
            .bind(row.start_time)
            .bind(row.hour as i32)
            .bind(row.day as i32)
            .bind(row.week as i32)
            .bind(row.month as i32)
            .bind(row.year)
            .bind(row.weekday as i32)
            .execute(&mut **tx)
            .await
            .with_context(|| format!("failed to insert time row {}", row.start_time))?;
        Ok(())
    }

    async fn insert_user(&mut self, user: &User) -> Result<()> {
        let tx = self.tx()?;
        sqlx::query(queries::USER_INSERT)
            .bind(&user.user_id)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.gender)
            .bind(&user.level)
            .execute(&mut **tx)
            .await
            .with_context(|| format!("failed to upsert user {}", user.user_id))?;
        Ok(())
    }

    async fn insert_songplay(&mut self, play: &Songplay) -> Result<()> {
        let tx = self.tx()?;
        sqlx::query(queries::SONGPLAY_INSERT)
            .bind(play.songplay_id)
            .bind(play.start_time)
            .bind(&play.user_id)
            .bind(&play.level)
            .bind(&play.song_id)
            .bind(&play.artist_id)
            .bind(play.session_id)
            .bind(&play.location)
            .bind(&play.user_agent)
            .execute(&mut **tx)
            .await
            .with_context(|| format!("failed to insert songplay {}", play.songplay_id))?;
        Ok(())
    }

    async fn find_song(
        &mut self,
        title: &str,
        artist: &str,
        duration: f64,
    ) -> Result<Option<(String, String)>> {
        let tx = self.tx()?;
        let row = sqlx::query(queries::SONG_SELECT)
            .bind(title)
            .bind(artist)
            .bind(duration)
            .fetch_optional(&mut **tx)
            .await
            .with_context(|| format!("song/artist lookup failed for `{title}`"))?;
        Ok(row.map(|r| (r.get::<String, _>(0), r.get::<String, _>(1))))
    }
}
