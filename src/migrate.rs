//! Schema creation.
//!
//! The `countries_fts` index is an external-content FTS5 table over
//! `countries`. Three triggers keep it in step with the base table, so any
//! write to `countries` inside a transaction updates the index inside the
//! same transaction.

use anyhow::Result;
use sqlx::SqlitePool;

/// Columns projected into the full-text index, in index order.
pub const INDEXED_COLUMNS: [&str; 6] = [
    "name_common",
    "name_official",
    "capital",
    "region",
    "subregion",
    "languages",
];

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS countries (
            id INTEGER PRIMARY KEY,
            name_common TEXT NOT NULL DEFAULT '',
            name_official TEXT NOT NULL DEFAULT '',
            cca2 TEXT NOT NULL DEFAULT '',
            cca3 TEXT NOT NULL DEFAULT '',
            ccn3 TEXT NOT NULL DEFAULT '',
            capital TEXT NOT NULL DEFAULT '',
            region TEXT NOT NULL DEFAULT '',
            subregion TEXT NOT NULL DEFAULT '',
            population INTEGER NOT NULL DEFAULT 0 CHECK (population >= 0),
            area REAL NOT NULL DEFAULT 0.0 CHECK (area >= 0),
            lat REAL,
            lng REAL,
            languages TEXT NOT NULL DEFAULT '',
            flag_png TEXT NOT NULL DEFAULT '',
            flag_svg TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    // FTS5 CREATE is not idempotent natively, so we check first
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='countries_fts'",
    )
    .fetch_one(pool)
    .await?;

    if !fts_exists {
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE countries_fts USING fts5(
                name_common, name_official, capital, region, subregion, languages,
                content='countries', content_rowid='id'
            )
            "#,
        )
        .execute(pool)
        .await?;
    }

    let columns = INDEXED_COLUMNS.join(", ");
    let old_values = prefixed("old", &INDEXED_COLUMNS);
    let new_values = prefixed("new", &INDEXED_COLUMNS);

    let insert_new = format!(
        "INSERT INTO countries_fts(rowid, {columns}) VALUES (new.id, {new_values});"
    );
    let delete_old = format!(
        "INSERT INTO countries_fts(countries_fts, rowid, {columns}) VALUES ('delete', old.id, {old_values});"
    );

    let triggers = [
        ("countries_ai", "AFTER INSERT", insert_new.clone()),
        ("countries_au", "AFTER UPDATE", format!("{delete_old}\n{insert_new}")),
        ("countries_ad", "AFTER DELETE", delete_old.clone()),
    ];

    for (name, event, body) in triggers {
        sqlx::query(&format!(
            "CREATE TRIGGER IF NOT EXISTS {name} {event} ON countries BEGIN\n{body}\nEND"
        ))
        .execute(pool)
        .await?;
    }

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_countries_region ON countries(region)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_countries_subregion ON countries(subregion)")
        .execute(pool)
        .await?;

    Ok(())
}

fn prefixed(alias: &str, columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("{alias}.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}
