//! Upstream country data.
//!
//! [`CountrySource`] is the seam between the loader and the network: the
//! binary uses [`RestCountriesSource`], tests hand the loader a fixed list.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::SourceConfig;

/// One country object as returned by the REST Countries API.
///
/// Every field may be missing or null upstream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCountry {
    pub name: Option<RawName>,
    pub cca2: Option<String>,
    pub cca3: Option<String>,
    pub ccn3: Option<String>,
    pub capital: Option<Vec<String>>,
    pub region: Option<String>,
    pub subregion: Option<String>,
    /// Any JSON number, or a string holding one.
    pub population: Option<serde_json::Value>,
    /// Any JSON number, or a string holding one.
    pub area: Option<serde_json::Value>,
    pub latlng: Option<Vec<f64>>,
    pub languages: Option<BTreeMap<String, String>>,
    pub flags: Option<RawFlags>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawName {
    pub common: Option<String>,
    pub official: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFlags {
    pub png: Option<String>,
    pub svg: Option<String>,
}

/// Produces the full upstream dataset in one call.
#[async_trait]
pub trait CountrySource: Send + Sync {
    /// Short label used in log lines.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<Vec<RawCountry>>;
}

/// Fetches the dataset with a single GET against the configured endpoint.
pub struct RestCountriesSource {
    url: String,
    timeout: Duration,
}

impl RestCountriesSource {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            url: config.url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl CountrySource for RestCountriesSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Vec<RawCountry>> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        let response = client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to reach country source: {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Country source error {}: {}", status, body_text);
        }

        let countries: Vec<RawCountry> = response
            .json()
            .await
            .with_context(|| "Invalid country source response: expected a JSON array")?;

        Ok(countries)
    }
}

/// A source backed by an in-memory list.
pub struct StaticSource {
    countries: Vec<RawCountry>,
}

impl StaticSource {
    pub fn new(countries: Vec<RawCountry>) -> Self {
        Self { countries }
    }

    /// Parses a JSON document shaped like the upstream response.
    pub fn from_json(json: &str) -> Result<Self> {
        let countries: Vec<RawCountry> =
            serde_json::from_str(json).with_context(|| "Invalid country JSON")?;
        Ok(Self::new(countries))
    }
}

#[async_trait]
impl CountrySource for StaticSource {
    fn describe(&self) -> String {
        format!("static ({} countries)", self.countries.len())
    }

    async fn fetch(&self) -> Result<Vec<RawCountry>> {
        Ok(self.countries.clone())
    }
}
