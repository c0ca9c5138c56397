use clap::Parser;
use sqlx::postgres::PgConnectOptions;
use std::path::PathBuf;

/// Connection and data-layout options for one ETL run.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sparkify-etl",
    about = "Load song metadata and play logs into the sparkify database"
)]
pub struct Config {
    /// Database host.
    #[arg(long, env = "SPARKIFY_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Database port.
    #[arg(long, env = "SPARKIFY_PORT", default_value_t = 5432)]
    pub port: u16,

    /// Database name.
    #[arg(long, env = "SPARKIFY_DB", default_value = "sparkifydb")]
    pub database: String,

    /// Database user.
    #[arg(long, env = "SPARKIFY_USER", default_value = "postgres")]
    pub user: String,

    /// Database password.
    #[arg(
        long,
        env = "SPARKIFY_PASSWORD",
        default_value = "",
        hide_env_values = true
    )]
    pub password: String,

    /// Root of the song-data tree.
    #[arg(long, default_value = "data/song_data")]
    pub song_data_root: PathBuf,

    /// Root of the log-data tree.
    #[arg(long, default_value = "data/log_data")]
    pub log_data_root: PathBuf,

    /// Run the whole pipeline against an in-memory store and report row
    /// counts instead of writing to the database.
    #[arg(long)]
    pub dry_run: bool,
}

impl Config {
    /// Built as options rather than a URL so passwords need no escaping.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_fixed_layout() {
        let config = Config::parse_from(["sparkify-etl"]);
        assert_eq!(config.song_data_root, PathBuf::from("data/song_data"));
        assert_eq!(config.log_data_root, PathBuf::from("data/log_data"));
        assert_eq!(config.port, 5432);
        assert_eq!(config.database, "sparkifydb");
        assert!(!config.dry_run);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::parse_from([
            "sparkify-etl",
            "--host",
            "db.internal",
            "--port",
            "5433",
            "--song-data-root",
            "/srv/songs",
            "--dry-run",
        ]);
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 5433);
        assert_eq!(config.song_data_root, PathBuf::from("/srv/songs"));
        assert!(config.dry_run);
    }
}
