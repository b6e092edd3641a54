use serde::Serialize;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::PathBuf;

pub type DbPool = SqlitePool;

/// Application state holding the database connection pool
pub struct AppState {
  pub db: DbPool,
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CoachError {
  #[error("Database error: {0}")]
  Database(String),

  #[error("Incomplete profile: {0}")]
  IncompleteProfile(String),

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Missing configuration: {0}")]
  MissingConfig(String),
}

impl Serialize for CoachError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Database Setup
/// ---------------------------------------------------------------------------

/// Get the path to the database file.
/// `COACH_DB_PATH` overrides the default platform data directory location.
fn get_db_path() -> Result<PathBuf, CoachError> {
  if let Ok(path) = std::env::var("COACH_DB_PATH") {
    return Ok(PathBuf::from(path));
  }

  let data_dir = dirs::data_dir()
    .ok_or_else(|| CoachError::MissingConfig("no platform data directory".into()))?
    .join("checkin-coach");

  fs::create_dir_all(&data_dir)
    .map_err(|e| CoachError::MissingConfig(format!("Failed to create data dir: {}", e)))?;

  Ok(data_dir.join("checkin-coach.db"))
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db() -> Result<DbPool, CoachError> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let db_path = get_db_path()?;
  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

  tracing::info!("Initializing database at: {}", db_path.display());

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await
    .map_err(|e| CoachError::Database(format!("Failed to open database: {}", e)))?;

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .map_err(|e| CoachError::Database(format!("Failed to run migrations: {}", e)))?;

  tracing::info!("Database ready");

  Ok(pool)
}
