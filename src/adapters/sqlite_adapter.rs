//! SQLite price store.
//!
//! Closes live in a single `closes` table keyed by `(symbol, date)`. A NULL
//! close is a stored missing value and comes back as `PricePoint::missing`.

use crate::domain::error::VolgateError;
use crate::domain::price::PricePoint;
use crate::ports::config_port::{parse_value, ConfigPort};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_POOL_SIZE: u32 = 4;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> VolgateError {
    VolgateError::Database {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> VolgateError {
    VolgateError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, VolgateError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| VolgateError::Database {
        reason: format!("bad stored date '{}': {}", raw, e),
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, VolgateError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| VolgateError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size: u32 = parse_value(config, "sqlite", "pool_size", DEFAULT_POOL_SIZE)?;
        if pool_size < 1 {
            return Err(VolgateError::invalid(
                "sqlite",
                "pool_size",
                "pool_size must be at least 1",
            ));
        }

        debug!(path = %db_path, pool_size, "opening sqlite price store");
        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    /// Single-connection in-memory store; every checkout sees the same database.
    pub fn in_memory() -> Result<Self, VolgateError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, VolgateError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), VolgateError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS closes (
                    symbol TEXT NOT NULL,
                    date TEXT NOT NULL,
                    close REAL,
                    PRIMARY KEY (symbol, date)
                );
                CREATE INDEX IF NOT EXISTS idx_closes_date ON closes(date);",
            )
            .map_err(query_error)
    }

    /// Upsert closes for `symbol`; a later insert for the same date replaces the earlier one.
    pub fn insert_points(&self, symbol: &str, points: &[PricePoint]) -> Result<(), VolgateError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for point in points {
            tx.execute(
                "INSERT OR REPLACE INTO closes (symbol, date, close) VALUES (?1, ?2, ?3)",
                params![
                    symbol,
                    point.date.format(DATE_FORMAT).to_string(),
                    point.usable_value()
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;
        debug!(symbol, rows = points.len(), "stored closes");
        Ok(())
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_closes(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, VolgateError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT date, close FROM closes
                 WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(
                params![
                    symbol,
                    start_date.format(DATE_FORMAT).to_string(),
                    end_date.format(DATE_FORMAT).to_string()
                ],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<f64>>(1)?)),
            )
            .map_err(query_error)?;

        let mut points = Vec::new();
        for row in rows {
            let (date_str, value) = row.map_err(query_error)?;
            points.push(PricePoint {
                date: parse_date(&date_str)?,
                value,
            });
        }

        Ok(points)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, VolgateError> {
        let result: (Option<String>, Option<String>, i64) = self
            .conn()?
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM closes WHERE symbol = ?1",
                params![symbol],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_error)?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => Ok(Some((
                parse_date(&min_str)?,
                parse_date(&max_str)?,
                count as usize,
            ))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
            .insert_points(
                "^VIX",
                &[
                    PricePoint::new(date(2024, 1, 3), 14.0),
                    PricePoint::new(date(2024, 1, 2), 13.0),
                    PricePoint::missing(date(2024, 1, 4)),
                    PricePoint::new(date(2024, 1, 5), f64::NAN),
                ],
            )
            .unwrap();
        adapter
            .insert_points("UPRO", &[PricePoint::new(date(2024, 1, 2), 60.0)])
            .unwrap();
        adapter
    }

    #[test]
    fn from_config_missing_path() {
        let config = FileConfigAdapter::from_string("[sqlite]\npool_size = 2\n").unwrap();
        match SqliteAdapter::from_config(&config) {
            Err(VolgateError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn from_config_rejects_zero_pool() {
        let config =
            FileConfigAdapter::from_string("[sqlite]\npath = prices.db\npool_size = 0\n").unwrap();
        assert!(matches!(
            SqliteAdapter::from_config(&config),
            Err(VolgateError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn from_config_rejects_malformed_pool_size() {
        for raw in ["abc", "-2", "1.5"] {
            let ini = format!("[sqlite]\npath = prices.db\npool_size = {raw}\n");
            let config = FileConfigAdapter::from_string(&ini).unwrap();
            match SqliteAdapter::from_config(&config) {
                Err(VolgateError::ConfigInvalid { section, key, .. }) => {
                    assert_eq!(section, "sqlite");
                    assert_eq!(key, "pool_size");
                }
                Err(other) => panic!("expected ConfigInvalid for {raw}, got: {other}"),
                Ok(_) => panic!("expected error for pool_size = {raw}"),
            }
        }
    }

    #[test]
    fn fetch_closes_orders_by_date_and_keeps_nulls() {
        let adapter = seeded();
        let points = adapter
            .fetch_closes("^VIX", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();

        assert_eq!(points.len(), 4);
        assert_eq!(points[0], PricePoint::new(date(2024, 1, 2), 13.0));
        assert_eq!(points[1].value, Some(14.0));
        assert_eq!(points[2].value, None);
        // non-finite closes are stored as NULL
        assert_eq!(points[3].value, None);
    }

    #[test]
    fn fetch_closes_filters_symbol_and_range() {
        let adapter = seeded();
        let points = adapter
            .fetch_closes("^VIX", date(2024, 1, 3), date(2024, 1, 3))
            .unwrap();
        assert_eq!(points, vec![PricePoint::new(date(2024, 1, 3), 14.0)]);

        let none = adapter
            .fetch_closes("SPY", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn insert_replaces_existing_date() {
        let adapter = seeded();
        adapter
            .insert_points("UPRO", &[PricePoint::new(date(2024, 1, 2), 61.5)])
            .unwrap();
        let points = adapter
            .fetch_closes("UPRO", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        assert_eq!(points, vec![PricePoint::new(date(2024, 1, 2), 61.5)]);
    }

    #[test]
    fn get_data_range_counts_rows() {
        let adapter = seeded();
        assert_eq!(
            adapter.get_data_range("^VIX").unwrap(),
            Some((date(2024, 1, 2), date(2024, 1, 5), 4))
        );
        assert_eq!(adapter.get_data_range("SPY").unwrap(), None);
    }

    #[test]
    fn fetch_without_schema_is_query_error() {
        let adapter = SqliteAdapter::in_memory().unwrap();
        let result = adapter.fetch_closes("^VIX", date(2024, 1, 1), date(2024, 1, 31));
        assert!(matches!(result, Err(VolgateError::DatabaseQuery { .. })));
    }
}
