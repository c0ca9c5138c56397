//! Batch ETL for a song/play dataset: discovers JSON files under a
//! song-metadata tree and an event-log tree, reshapes selected fields, and
//! loads five relational tables (`songs`, `artists`, `time`, `users`,
//! `songplays`). One-shot seed job, not a service.

pub mod config;
pub mod discover;
pub mod error;
pub mod extract;
pub mod load;
pub mod model;
pub mod store;
