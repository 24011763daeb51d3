use thiserror::Error;

#[derive(Error, Debug)]
pub enum HuddleError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Video vendor error: {0}")]
    Video(#[from] crate::video::VideoError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Other error: {0}")]
    Other(String),
}
