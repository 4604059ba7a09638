//! Core data models.
//!
//! [`CountryRecord`] is what the loader writes; [`Country`] is what the
//! query path reads back, with the store-assigned id.

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::source::RawCountry;

/// A country ready to be written, before the store assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryRecord {
    pub name_common: String,
    pub name_official: String,
    pub cca2: String,
    pub cca3: String,
    pub ccn3: String,
    pub capital: String,
    pub region: String,
    pub subregion: String,
    pub population: i64,
    pub area: f64,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub languages: String,
    pub flag_png: String,
    pub flag_svg: String,
}

impl CountryRecord {
    /// Derives the stored shape from one upstream object.
    ///
    /// - `capital`: first listed capital, else empty.
    /// - `languages`: mapping values (not keys), sorted, joined with `", "`.
    /// - `lat`/`lng`: first and second coordinate; missing entries stay `None`.
    /// - `population`/`area`: numbers or numeric strings; `0` / `0.0` when
    ///   missing, null, or not numeric.
    pub fn from_raw(raw: RawCountry) -> Self {
        let name = raw.name.unwrap_or_default();
        let flags = raw.flags.unwrap_or_default();
        let latlng = raw.latlng.unwrap_or_default();

        let capital = raw
            .capital
            .and_then(|list| list.into_iter().next())
            .unwrap_or_default();

        let mut languages: Vec<String> = raw
            .languages
            .map(|map| map.into_values().collect())
            .unwrap_or_default();
        languages.sort();

        let population = raw
            .population
            .as_ref()
            .and_then(numeric)
            .map(|p| p.max(0.0) as i64)
            .unwrap_or(0);
        let area = raw
            .area
            .as_ref()
            .and_then(numeric)
            .map(|a| a.max(0.0))
            .unwrap_or(0.0);

        Self {
            name_common: name.common.unwrap_or_default(),
            name_official: name.official.unwrap_or_default(),
            cca2: raw.cca2.unwrap_or_default(),
            cca3: raw.cca3.unwrap_or_default(),
            ccn3: raw.ccn3.unwrap_or_default(),
            capital,
            region: raw.region.unwrap_or_default(),
            subregion: raw.subregion.unwrap_or_default(),
            population,
            area,
            lat: latlng.first().copied(),
            lng: latlng.get(1).copied(),
            languages: languages.join(", "),
            flag_png: flags.png.unwrap_or_default(),
            flag_svg: flags.svg.unwrap_or_default(),
        }
    }
}

fn numeric(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// A stored country, serialized one key per column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Country {
    pub id: i64,
    pub name_common: String,
    pub name_official: String,
    pub cca2: String,
    pub cca3: String,
    pub ccn3: String,
    pub capital: String,
    pub region: String,
    pub subregion: String,
    pub population: i64,
    pub area: f64,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub languages: String,
    pub flag_png: String,
    pub flag_svg: String,
}

impl Country {
    /// Decodes a `countries` row, failing on a column type mismatch.
    pub fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name_common: row.try_get("name_common")?,
            name_official: row.try_get("name_official")?,
            cca2: row.try_get("cca2")?,
            cca3: row.try_get("cca3")?,
            ccn3: row.try_get("ccn3")?,
            capital: row.try_get("capital")?,
            region: row.try_get("region")?,
            subregion: row.try_get("subregion")?,
            population: row.try_get("population")?,
            area: row.try_get("area")?,
            lat: row.try_get("lat")?,
            lng: row.try_get("lng")?,
            languages: row.try_get("languages")?,
            flag_png: row.try_get("flag_png")?,
            flag_svg: row.try_get("flag_svg")?,
        })
    }
}

/// One page of `/countries` results.
#[derive(Debug, Clone, Serialize)]
pub struct CountryPage {
    /// Rows matching the filters, ignoring pagination.
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub items: Vec<Country>,
}
