//! FTP pool management commands.
//!
//! The pool is seeded from a plain text file with one `username:password`
//! pair per line. Blank lines and `#` comments are skipped. Re-applying the
//! same file is safe; existing usernames are left untouched.

use secrecy::SecretString;
use sqlx::PgPool;
use tracing::{info, warn};

use bear_beat_core::FtpCredentials;
use bear_beat_storefront::db::{self, ftp_pool};

/// Errors from pool commands.
#[derive(Debug, thiserror::Error)]
pub enum FtpPoolError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Failed to read {path}: {source}")]
    File {
        path: String,
        source: std::io::Error,
    },

    #[error("No valid credential pairs in {0}")]
    EmptyFile(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] db::RepositoryError),
}

/// Seed the pool from a credentials file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, contains no valid pairs,
/// or the database is unreachable.
pub async fn seed(file_path: &str) -> Result<(), FtpPoolError> {
    let content =
        tokio::fs::read_to_string(file_path)
            .await
            .map_err(|source| FtpPoolError::File {
                path: file_path.to_owned(),
                source,
            })?;

    let accounts = parse_credentials(&content);
    if accounts.is_empty() {
        return Err(FtpPoolError::EmptyFile(file_path.to_owned()));
    }
    info!(count = accounts.len(), "Parsed credential pairs");

    let pool = connect().await?;
    let added = ftp_pool::restock(&pool, &accounts).await?;
    let counts = ftp_pool::counts(&pool).await?;

    info!(
        added,
        skipped = accounts.len() as u64 - added,
        total = counts.total,
        available = counts.available,
        "FTP pool seeded"
    );

    Ok(())
}

/// Show pool occupancy.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn status() -> Result<(), FtpPoolError> {
    let pool = connect().await?;
    let counts = ftp_pool::counts(&pool).await?;

    info!(
        total = counts.total,
        available = counts.available,
        in_use = counts.in_use,
        "FTP pool status"
    );

    if counts.available == 0 {
        warn!("Pool is exhausted; new purchases will be recorded without credentials");
    }

    Ok(())
}

async fn connect() -> Result<PgPool, FtpPoolError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("BEARBEAT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| FtpPoolError::MissingEnvVar("BEARBEAT_DATABASE_URL"))?;

    Ok(db::create_pool(&database_url).await?)
}

/// Parse `username:password` lines, skipping blanks and `#` comments.
fn parse_credentials(content: &str) -> Vec<FtpCredentials> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (username, password) = line.split_once(':')?;
            let (username, password) = (username.trim(), password.trim());
            if username.is_empty() || password.is_empty() {
                return None;
            }
            Some(FtpCredentials::new(username.to_owned(), password.to_owned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_credentials() {
        let content = "\
# pool batch 2026-03
bearbeat_001:pass-one
bearbeat_002:pass:with:colons

  bearbeat_003 : padded
broken-line
:no-user
no-pass:
";
        let accounts = parse_credentials(content);

        assert_eq!(accounts.len(), 3);
        assert_eq!(accounts[0].username, "bearbeat_001");
        assert_eq!(accounts[0].password, "pass-one");
        // Only the first colon splits; passwords may contain colons
        assert_eq!(accounts[1].password, "pass:with:colons");
        assert_eq!(accounts[2].username, "bearbeat_003");
        assert_eq!(accounts[2].password, "padded");
    }

    #[test]
    fn test_parse_credentials_empty_input() {
        assert!(parse_credentials("").is_empty());
        assert!(parse_credentials("# only a comment\n\n").is_empty());
    }
}
