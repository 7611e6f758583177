use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

pub mod memory;

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")?;
    Ok(db)
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    info!("migrations applied");
    Ok(())
}

/// A write hit a unique constraint. Callers downcast to tell it apart from
/// other storage failures and report it as a field error.
#[derive(Debug, thiserror::Error)]
#[error("duplicate value for unique constraint {constraint}")]
pub struct UniqueViolation {
    pub constraint: String,
}

impl UniqueViolation {
    pub fn new(constraint: &str) -> Self {
        Self {
            constraint: constraint.to_string(),
        }
    }
}

/// Maps a unique-constraint error to [`UniqueViolation`], anything else to
/// an error carrying `context`.
pub fn write_error(err: sqlx::Error, context: &'static str) -> anyhow::Error {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            UniqueViolation::new(db.constraint().unwrap_or_default()).into()
        }
        other => anyhow::Error::new(other).context(context),
    }
}

pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<UniqueViolation>().is_some()
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn unique_violation_survives_added_context() {
        let err: anyhow::Error = UniqueViolation::new("recipes_title_key").into();
        assert!(is_unique_violation(&err));
        let wrapped = Err::<(), _>(err).context("save recipe").unwrap_err();
        assert!(is_unique_violation(&wrapped));
        assert!(!is_unique_violation(&anyhow::anyhow!("connection reset")));
    }

    #[test]
    fn other_sqlx_errors_keep_their_context() {
        let err = write_error(sqlx::Error::RowNotFound, "save tag");
        assert!(!is_unique_violation(&err));
        assert_eq!(err.to_string(), "save tag");
    }
}
