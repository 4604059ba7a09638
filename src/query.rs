//! Query-string to SQL translation for `GET /countries`.
//!
//! Request parameters are normalized once, in [`CountryQuery::from_pairs`],
//! into a typed struct that never fails to build: unparseable numbers fall
//! back to their defaults and unknown sort/order values fall back to
//! `name`/`asc`. [`build_filters`] then turns that struct into bound SQL
//! fragments, and [`search_countries`] runs the count and the page against
//! the same fragments so `total` always describes the set `items` is cut
//! from.
//!
//! Values are only ever bound as parameters. The only text spliced into SQL
//! is the fixed fragment set, the sort column, and the direction, all of
//! which come from closed enums.

use anyhow::Result;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::{Row, SqlitePool};

use crate::models::{Country, CountryPage};

pub const DEFAULT_LIMIT: i64 = 25;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Population,
    Area,
}

impl SortKey {
    /// Exact, case-sensitive match; anything else is `Name`.
    pub fn parse(value: &str) -> Self {
        match value {
            "population" => Self::Population,
            "area" => Self::Area,
            _ => Self::Name,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::Name => "c.name_common",
            Self::Population => "c.population",
            Self::Area => "c.area",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Case-insensitive `desc`; anything else is `Asc`.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Validated `/countries` parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryQuery {
    /// Free text, trimmed; `None` when absent or blank.
    pub text: Option<String>,
    pub region: Option<String>,
    pub subregion: Option<String>,
    pub lang: Option<String>,
    pub min_pop: Option<i64>,
    pub max_pop: Option<i64>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub sort: SortKey,
    pub order: SortOrder,
    /// Always within `1..=MAX_LIMIT`.
    pub limit: i64,
    /// Always `>= 0`.
    pub offset: i64,
}

impl Default for CountryQuery {
    fn default() -> Self {
        Self {
            text: None,
            region: None,
            subregion: None,
            lang: None,
            min_pop: None,
            max_pop: None,
            min_area: None,
            max_area: None,
            sort: SortKey::default(),
            order: SortOrder::default(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl CountryQuery {
    /// Builds a query from raw key/value pairs. The first occurrence of a
    /// key wins; unknown keys are ignored.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut raw = RawParams::default();
        for (key, value) in pairs {
            let slot = match key {
                "q" => &mut raw.q,
                "region" => &mut raw.region,
                "subregion" => &mut raw.subregion,
                "lang" => &mut raw.lang,
                "min_pop" => &mut raw.min_pop,
                "max_pop" => &mut raw.max_pop,
                "min_area" => &mut raw.min_area,
                "max_area" => &mut raw.max_area,
                "sort" => &mut raw.sort,
                "order" => &mut raw.order,
                "limit" => &mut raw.limit,
                "offset" => &mut raw.offset,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }

        Self {
            text: raw
                .q
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            region: non_empty(raw.region),
            subregion: non_empty(raw.subregion),
            lang: non_empty(raw.lang),
            min_pop: raw.min_pop.and_then(parse_int),
            max_pop: raw.max_pop.and_then(parse_int),
            min_area: raw.min_area.and_then(parse_float),
            max_area: raw.max_area.and_then(parse_float),
            sort: raw.sort.map(SortKey::parse).unwrap_or_default(),
            order: raw.order.map(SortOrder::parse).unwrap_or_default(),
            limit: clamp_limit(raw.limit.and_then(parse_int).unwrap_or(DEFAULT_LIMIT)),
            offset: clamp_offset(raw.offset.and_then(parse_int).unwrap_or(0)),
        }
    }
}

#[derive(Default)]
struct RawParams<'a> {
    q: Option<&'a str>,
    region: Option<&'a str>,
    subregion: Option<&'a str>,
    lang: Option<&'a str>,
    min_pop: Option<&'a str>,
    max_pop: Option<&'a str>,
    min_area: Option<&'a str>,
    max_area: Option<&'a str>,
    sort: Option<&'a str>,
    order: Option<&'a str>,
    limit: Option<&'a str>,
    offset: Option<&'a str>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn parse_int(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

fn parse_float(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_LIMIT)
}

pub fn clamp_offset(offset: i64) -> i64 {
    offset.max(0)
}

/// Normalizes free text into an FTS5 match expression.
///
/// Quote characters are stripped. A single bare token gets a trailing `*`
/// for prefix matching; the wildcard is skipped when the token already has
/// one, contains whitespace, or the caller wrapped it in double quotes.
/// Returns `None` when nothing is left to match.
///
/// Other FTS5 syntax passes through untouched, so a hyphenated name such as
/// `Guinea-Bissau` becomes an invalid expression and the query fails with a
/// store error.
pub fn match_expression(text: &str) -> Option<String> {
    let text = text.trim();
    let token: String = text.chars().filter(|c| *c != '"' && *c != '\'').collect();
    let token = token.trim();

    if token.is_empty() {
        return None;
    }

    let quoted = text.contains('"');
    let expandable = !quoted && !token.contains('*') && !token.contains(char::is_whitespace);

    if expandable {
        Some(format!("{token}*"))
    } else {
        Some(token.to_string())
    }
}

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Real(f64),
}

/// WHERE fragments and their bound values, in matching order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    /// Join against `countries_fts` when set.
    pub use_index: bool,
    pub clauses: Vec<String>,
    pub values: Vec<FilterValue>,
}

impl Filters {
    fn push(&mut self, clause: &str, value: FilterValue) {
        self.clauses.push(clause.to_string());
        self.values.push(value);
    }

    pub fn from_clause(&self) -> &'static str {
        if self.use_index {
            "FROM countries c JOIN countries_fts f ON f.rowid = c.id"
        } else {
            "FROM countries c"
        }
    }

    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }

    /// The filtered, unordered, unpaginated select both queries share.
    pub fn base_sql(&self) -> String {
        format!("SELECT c.* {} {}", self.from_clause(), self.where_clause())
            .trim_end()
            .to_string()
    }
}

pub fn build_filters(query: &CountryQuery) -> Filters {
    let mut filters = Filters::default();

    if let Some(expr) = query.text.as_deref().and_then(match_expression) {
        filters.use_index = true;
        filters.push("countries_fts MATCH ?", FilterValue::Text(expr));
    }
    if let Some(region) = &query.region {
        filters.push("c.region = ?", FilterValue::Text(region.clone()));
    }
    if let Some(subregion) = &query.subregion {
        filters.push("c.subregion = ?", FilterValue::Text(subregion.clone()));
    }
    if let Some(lang) = &query.lang {
        filters.push("c.languages LIKE ?", FilterValue::Text(format!("%{lang}%")));
    }
    if let Some(min_pop) = query.min_pop {
        filters.push("c.population >= ?", FilterValue::Integer(min_pop));
    }
    if let Some(max_pop) = query.max_pop {
        filters.push("c.population <= ?", FilterValue::Integer(max_pop));
    }
    if let Some(min_area) = query.min_area {
        filters.push("c.area >= ?", FilterValue::Real(min_area));
    }
    if let Some(max_area) = query.max_area {
        filters.push("c.area <= ?", FilterValue::Real(max_area));
    }

    filters
}

fn bind_values<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    values: &[FilterValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in values {
        query = match value {
            FilterValue::Text(s) => query.bind(s.clone()),
            FilterValue::Integer(n) => query.bind(*n),
            FilterValue::Real(x) => query.bind(*x),
        };
    }
    query
}

/// Runs the count and page queries on one pooled connection.
pub async fn search_countries(pool: &SqlitePool, query: &CountryQuery) -> Result<CountryPage> {
    let filters = build_filters(query);
    let base_sql = filters.base_sql();

    let count_sql = format!("SELECT COUNT(*) FROM ({base_sql})");
    let page_sql = format!(
        "{base_sql} ORDER BY {} {}, c.id ASC LIMIT ? OFFSET ?",
        query.sort.column(),
        query.order.sql()
    );

    tracing::debug!(sql = %page_sql, params = filters.values.len(), "countries query");

    let mut conn = pool.acquire().await?;

    let total: i64 = bind_values(sqlx::query(&count_sql), &filters.values)
        .fetch_one(&mut *conn)
        .await?
        .get(0);

    let rows = bind_values(sqlx::query(&page_sql), &filters.values)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&mut *conn)
        .await?;

    let items = rows
        .iter()
        .map(Country::from_row)
        .collect::<sqlx::Result<Vec<_>>>()?;

    Ok(CountryPage {
        total,
        limit: query.limit,
        offset: query.offset,
        items,
    })
}
