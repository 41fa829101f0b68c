pub mod dataforseo;
pub mod fixture;

pub use dataforseo::{DataForSeoClient, DataForSeoCredentials, DataForSeoKeywordSource, DataForSeoSerpSource};
pub use fixture::{FixtureData, FixtureSource};

/// Common utilities for sources
pub(crate) mod utils {
    use kr_core::{Error, Result};
    use url::Url;

    pub fn parse_url(url: &str) -> Result<Url> {
        Url::parse(url).map_err(|e| Error::Config(format!("Failed to parse URL '{}': {}", url, e)))
    }

    /// True for absolute http(s) URLs, the only kind a result page can have.
    pub fn is_result_url(url: &str) -> bool {
        Url::parse(url)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
            .unwrap_or(false)
    }

    /// Two or three letters is a language code, anything else a language name.
    pub fn is_language_code(language: &str) -> bool {
        let language = language.trim();
        (2..=3).contains(&language.len()) && language.chars().all(|c| c.is_ascii_alphabetic())
    }
}
