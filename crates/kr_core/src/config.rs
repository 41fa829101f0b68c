use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DEFAULT_LOCATION: &str = "India";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_MIN_SEARCH_VOLUME: u64 = 100;
pub const DEFAULT_MAX_COMPETITION: f64 = 0.3;
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.3;
pub const DEFAULT_EXPANSION_LIMIT: usize = 50;
/// A full first page of organic results.
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_SERP_LOOKUP_LIMIT: usize = 20;
pub const DEFAULT_SERP_SPACING: Duration = Duration::from_secs(2);
pub const DEFAULT_SERP_CONCURRENCY: usize = 1;

/// Settings for one research run. Owned by the caller, never by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchConfig {
    pub location: String,
    pub language: String,
    pub min_search_volume: u64,
    pub max_competition: f64,
    pub overlap_threshold: f64,
    pub expansion_limit: usize,
    /// Expected length of a full result page; also the overlap denominator floor.
    pub page_size: usize,
    /// How many filtered candidates are sent to SERP lookup and clustered.
    pub serp_lookup_limit: usize,
    /// Minimum gap between two consecutive SERP requests.
    pub serp_spacing: Duration,
    pub serp_concurrency: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            location: DEFAULT_LOCATION.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            min_search_volume: DEFAULT_MIN_SEARCH_VOLUME,
            max_competition: DEFAULT_MAX_COMPETITION,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            expansion_limit: DEFAULT_EXPANSION_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
            serp_lookup_limit: DEFAULT_SERP_LOOKUP_LIMIT,
            serp_spacing: DEFAULT_SERP_SPACING,
            serp_concurrency: DEFAULT_SERP_CONCURRENCY,
        }
    }
}

impl ResearchConfig {
    /// Reads overrides from the process environment on top of the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ResearchConfig::from_env`] with an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let spacing_secs = parse_var(&lookup, "SERP_SPACING_SECS", defaults.serp_spacing.as_secs_f64())?;
        if !spacing_secs.is_finite() || spacing_secs < 0.0 {
            return Err(Error::Config(format!("SERP_SPACING_SECS must be a non-negative number, got {}", spacing_secs)));
        }

        let config = Self {
            location: lookup("TARGET_LOCATION").unwrap_or(defaults.location),
            language: lookup("TARGET_LANGUAGE").unwrap_or(defaults.language),
            min_search_volume: parse_var(&lookup, "MIN_SEARCH_VOLUME", defaults.min_search_volume)?,
            max_competition: parse_var(&lookup, "MAX_COMPETITION", defaults.max_competition)?,
            overlap_threshold: parse_var(&lookup, "SERP_OVERLAP_THRESHOLD", defaults.overlap_threshold)?,
            expansion_limit: parse_var(&lookup, "KEYWORD_EXPANSION_LIMIT", defaults.expansion_limit)?,
            page_size: parse_var(&lookup, "SERP_PAGE_SIZE", defaults.page_size)?,
            serp_lookup_limit: parse_var(&lookup, "SERP_LOOKUP_LIMIT", defaults.serp_lookup_limit)?,
            serp_spacing: Duration::from_secs_f64(spacing_secs),
            serp_concurrency: parse_var(&lookup, "SERP_CONCURRENCY", defaults.serp_concurrency)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.max_competition) {
            return Err(Error::Config(format!("max competition must be within [0, 1], got {}", self.max_competition)));
        }
        if !(0.0..=1.0).contains(&self.overlap_threshold) {
            return Err(Error::Config(format!("overlap threshold must be within [0, 1], got {}", self.overlap_threshold)));
        }
        if self.page_size == 0 {
            return Err(Error::Config("page size must be at least 1".to_string()));
        }
        if self.expansion_limit == 0 {
            return Err(Error::Config("expansion limit must be at least 1".to_string()));
        }
        if self.serp_lookup_limit == 0 {
            return Err(Error::Config("SERP lookup limit must be at least 1".to_string()));
        }
        if self.serp_concurrency == 0 {
            return Err(Error::Config("SERP concurrency must be at least 1".to_string()));
        }
        if self.location.trim().is_empty() || self.language.trim().is_empty() {
            return Err(Error::Config("location and language must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: '{}' ({})", name, raw, e))),
        None => Ok(default),
    }
}
