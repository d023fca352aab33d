//! Open a read-only handle to the target database. One attempt, no retries.

use crate::config::DriverKind;
use crate::error::ConnectionError;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub(crate) enum DbPool {
    MySql(MySqlPool),
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

/// Live connection used for introspection. Not shared across callers.
pub struct Connection {
    driver: DriverKind,
    pub(crate) pool: DbPool,
}

impl Connection {
    pub fn driver(&self) -> DriverKind {
        self.driver
    }

    pub async fn close(self) {
        match self.pool {
            DbPool::MySql(p) => p.close().await,
            DbPool::Postgres(p) => p.close().await,
            DbPool::Sqlite(p) => p.close().await,
        }
    }
}

/// Open by driver name. Fails with `EmptyDsn` or `UnsupportedDriver` before touching the network.
pub async fn open(driver: &str, dsn: &str) -> Result<Connection, ConnectionError> {
    if dsn.trim().is_empty() {
        return Err(ConnectionError::EmptyDsn);
    }
    let kind = driver
        .parse::<DriverKind>()
        .map_err(|_| ConnectionError::UnsupportedDriver(driver.to_string()))?;
    open_kind(kind, dsn).await
}

pub async fn open_kind(driver: DriverKind, dsn: &str) -> Result<Connection, ConnectionError> {
    if dsn.trim().is_empty() {
        return Err(ConnectionError::EmptyDsn);
    }
    let name = driver.as_str();
    let open_err = |source: sqlx::Error| ConnectionError::Open { driver: name, source };
    tracing::info!(driver = name, "connecting");
    let pool = match driver {
        DriverKind::MySql => DbPool::MySql(
            MySqlPoolOptions::new()
                .max_connections(1)
                .connect(dsn)
                .await
                .map_err(open_err)?,
        ),
        DriverKind::Postgres => DbPool::Postgres(
            PgPoolOptions::new()
                .max_connections(1)
                .connect(dsn)
                .await
                .map_err(open_err)?,
        ),
        DriverKind::Sqlite => DbPool::Sqlite(
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect(&sqlite_url(dsn))
                .await
                .map_err(open_err)?,
        ),
        DriverKind::SqlServer | DriverKind::ClickHouse => {
            return Err(ConnectionError::DriverUnavailable(name));
        }
    };
    Ok(Connection { driver, pool })
}

/// Accept a bare file path for sqlite as well as a `sqlite:` URL.
fn sqlite_url(dsn: &str) -> String {
    let dsn = dsn.trim();
    if dsn.starts_with("sqlite:") {
        dsn.to_string()
    } else if dsn == ":memory:" {
        "sqlite::memory:".into()
    } else {
        format!("sqlite://{}", dsn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_dsn_fails_first() {
        assert!(matches!(open("oracle", "").await, Err(ConnectionError::EmptyDsn)));
    }

    #[tokio::test]
    async fn unknown_driver_is_unsupported() {
        let err = open("oracle", "oracle://db").await.err().unwrap();
        assert!(matches!(err, ConnectionError::UnsupportedDriver(ref d) if d == "oracle"));
        assert!(err.to_string().contains("oracle"));
    }

    #[tokio::test]
    async fn drivers_without_backend_fail_at_open() {
        let err = open_kind(DriverKind::ClickHouse, "clickhouse://localhost:9000/db")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ConnectionError::DriverUnavailable("clickhouse")));
    }

    #[tokio::test]
    async fn opens_in_memory_sqlite() {
        let conn = open("sqlite", ":memory:").await.unwrap();
        assert_eq!(conn.driver(), DriverKind::Sqlite);
        conn.close().await;
    }

    #[test]
    fn sqlite_paths_become_urls() {
        assert_eq!(sqlite_url("shop.db"), "sqlite://shop.db");
        assert_eq!(sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(sqlite_url(":memory:"), "sqlite::memory:");
    }
}
