//! One-time seeding of the local store.
//!
//! [`ensure_data`] is safe to call on every startup: it creates the schema
//! if needed and only reaches out to the source when `countries` is empty.
//! The whole dataset is written in one transaction, so a failed load leaves
//! the table empty and the next startup tries again.

use anyhow::{Context, Result};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::migrate;
use crate::models::CountryRecord;
use crate::source::CountrySource;

/// What a call to [`ensure_data`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The store already held this many rows; nothing was fetched.
    AlreadyLoaded(i64),
    /// The store was empty and this many rows were inserted.
    Loaded(usize),
}

pub async fn ensure_data(pool: &SqlitePool, source: &dyn CountrySource) -> Result<LoadOutcome> {
    migrate::run_migrations(pool).await?;

    let existing = count_countries(pool).await?;
    if existing > 0 {
        tracing::info!(rows = existing, "country store already populated");
        return Ok(LoadOutcome::AlreadyLoaded(existing));
    }

    tracing::info!(source = %source.describe(), "country store empty, fetching dataset");
    let raw = source
        .fetch()
        .await
        .with_context(|| format!("Failed to fetch countries from {}", source.describe()))?;
    tracing::info!(fetched = raw.len(), "fetched country dataset");

    let records: Vec<CountryRecord> = raw.into_iter().map(CountryRecord::from_raw).collect();
    let inserted = load_countries(pool, &records).await?;

    tracing::info!(inserted, "country store populated");
    Ok(LoadOutcome::Loaded(inserted))
}

pub async fn count_countries(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM countries")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Writes every record inside a single transaction.
///
/// Nothing is committed unless all inserts succeed.
pub async fn load_countries(pool: &SqlitePool, records: &[CountryRecord]) -> Result<usize> {
    let mut tx = pool.begin().await?;

    for record in records {
        insert_country(&mut tx, record)
            .await
            .with_context(|| format!("Failed to insert country '{}'", record.name_common))?;
    }

    tx.commit().await?;
    Ok(records.len())
}

/// Inserts one country and returns its id.
///
/// The `countries_ai` trigger writes the matching `countries_fts` row within
/// the caller's transaction.
pub async fn insert_country(
    tx: &mut Transaction<'_, Sqlite>,
    record: &CountryRecord,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO countries (
            name_common, name_official, cca2, cca3, ccn3, capital, region, subregion,
            population, area, lat, lng, languages, flag_png, flag_svg
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.name_common)
    .bind(&record.name_official)
    .bind(&record.cca2)
    .bind(&record.cca3)
    .bind(&record.ccn3)
    .bind(&record.capital)
    .bind(&record.region)
    .bind(&record.subregion)
    .bind(record.population)
    .bind(record.area)
    .bind(record.lat)
    .bind(record.lng)
    .bind(&record.languages)
    .bind(&record.flag_png)
    .bind(&record.flag_svg)
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_rowid())
}
