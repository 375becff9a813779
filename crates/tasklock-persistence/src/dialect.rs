//! Server-side clock expressions per SQL dialect
//!
//! Lease expiry is always computed and compared on the database server so that
//! clock skew between application hosts cannot make two hosts disagree about
//! whether a lease is still live. Each dialect spells "now" and "now plus N
//! seconds" differently; the lock store only ever talks to the `TimeDialect`
//! trait and never branches on the backend itself.

use std::sync::Arc;
use std::time::Duration;

use sea_orm::DbBackend;

/// Strategy producing raw SQL clock expressions for one dialect
///
/// Returned strings are spliced into statements verbatim. They are built only
/// from numeric durations, never from caller-supplied text.
pub trait TimeDialect: Send + Sync + std::fmt::Debug {
    /// Expression evaluating to the server's current time
    fn now(&self) -> String;

    /// Expression evaluating to server-now plus `duration`
    fn interval_from_now(&self, duration: Duration) -> String;

    /// "now + duration", degrading to exactly `now()` for a zero duration
    fn now_plus(&self, duration: Duration) -> String {
        if duration.is_zero() {
            self.now()
        } else {
            self.interval_from_now(duration)
        }
    }
}

/// Seconds with millisecond precision, e.g. `5.000`
fn seconds_literal(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

/// PostgreSQL: native interval arithmetic on `timestamptz`
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl TimeDialect for PostgresDialect {
    fn now(&self) -> String {
        "now()".to_string()
    }

    fn interval_from_now(&self, duration: Duration) -> String {
        format!("now() + interval '{} seconds'", seconds_literal(duration))
    }
}

/// MySQL: `TIMESTAMPADD` at microsecond resolution on a UTC `DATETIME(6)`
///
/// `UTC_TIMESTAMP` rather than `CURRENT_TIMESTAMP` keeps the values independent
/// of the session time zone, since `DATETIME` stores no zone of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl TimeDialect for MySqlDialect {
    fn now(&self) -> String {
        "UTC_TIMESTAMP(6)".to_string()
    }

    fn interval_from_now(&self, duration: Duration) -> String {
        format!(
            "TIMESTAMPADD(MICROSECOND, {}, UTC_TIMESTAMP(6))",
            duration.as_micros()
        )
    }
}

/// SQLite: no interval type, timestamps are lexically ordered text
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

const SQLITE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%f";

impl TimeDialect for SqliteDialect {
    fn now(&self) -> String {
        format!("strftime('{}', 'now')", SQLITE_TIME_FORMAT)
    }

    fn interval_from_now(&self, duration: Duration) -> String {
        format!(
            "strftime('{}', 'now', '+{} seconds')",
            SQLITE_TIME_FORMAT,
            seconds_literal(duration)
        )
    }
}

/// Pick the clock strategy for a connection's backend
pub fn dialect_for(backend: DbBackend) -> Arc<dyn TimeDialect> {
    match backend {
        DbBackend::Postgres => Arc::new(PostgresDialect),
        DbBackend::MySql => Arc::new(MySqlDialect),
        DbBackend::Sqlite => Arc::new(SqliteDialect),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_expressions() {
        let d = PostgresDialect;
        assert_eq!(d.now(), "now()");
        assert_eq!(
            d.now_plus(Duration::from_secs(5)),
            "now() + interval '5.000 seconds'"
        );
        assert_eq!(
            d.now_plus(Duration::from_millis(1500)),
            "now() + interval '1.500 seconds'"
        );
    }

    #[test]
    fn test_mysql_expressions() {
        let d = MySqlDialect;
        assert_eq!(d.now(), "UTC_TIMESTAMP(6)");
        assert_eq!(
            d.now_plus(Duration::from_secs(5)),
            "TIMESTAMPADD(MICROSECOND, 5000000, UTC_TIMESTAMP(6))"
        );
        // Well past 2038, which a MySQL TIMESTAMP column could not hold
        let twenty_years = Duration::from_secs(20 * 365 * 24 * 3600);
        assert_eq!(
            d.now_plus(twenty_years),
            "TIMESTAMPADD(MICROSECOND, 630720000000000, UTC_TIMESTAMP(6))"
        );
    }

    #[test]
    fn test_sqlite_expressions() {
        let d = SqliteDialect;
        assert_eq!(d.now(), "strftime('%Y-%m-%d %H:%M:%f', 'now')");
        assert_eq!(
            d.now_plus(Duration::from_secs(5)),
            "strftime('%Y-%m-%d %H:%M:%f', 'now', '+5.000 seconds')"
        );
    }

    #[test]
    fn test_zero_duration_degrades_to_now() {
        for backend in [DbBackend::Postgres, DbBackend::MySql, DbBackend::Sqlite] {
            let d = dialect_for(backend);
            assert_eq!(d.now_plus(Duration::ZERO), d.now());
        }
    }

    #[test]
    fn test_dialect_for_backend() {
        assert_eq!(
            dialect_for(DbBackend::Postgres).now(),
            PostgresDialect.now()
        );
        assert_eq!(dialect_for(DbBackend::MySql).now(), MySqlDialect.now());
        assert_eq!(dialect_for(DbBackend::Sqlite).now(), SqliteDialect.now());
    }
}
