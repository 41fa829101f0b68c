use std::fmt;
use std::time::Duration;

use kr_core::{Error, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::utils;

pub mod keywords;
pub mod serp;

pub use keywords::DataForSeoKeywordSource;
pub use serp::DataForSeoSerpSource;

pub const DEFAULT_BASE_URL: &str = "https://api.dataforseo.com/v3/";
const STATUS_OK: u32 = 20000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// API login, read once when a run is set up.
pub struct DataForSeoCredentials {
    login: String,
    password: SecretString,
}

impl DataForSeoCredentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Reads `DATAFORSEO_LOGIN` and `DATAFORSEO_PASSWORD`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let login = lookup("DATAFORSEO_LOGIN").filter(|v| !v.trim().is_empty());
        let password = lookup("DATAFORSEO_PASSWORD").filter(|v| !v.trim().is_empty());
        match (login, password) {
            (Some(login), Some(password)) => Ok(Self::new(login, password)),
            _ => Err(Error::Config(
                "DataForSEO credentials not found. Set DATAFORSEO_LOGIN and DATAFORSEO_PASSWORD".to_string(),
            )),
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }
}

impl fmt::Debug for DataForSeoCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataForSeoCredentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Standard response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub status_code: u32,
    #[serde(default)]
    pub status_message: String,
    #[serde(default = "Vec::new")]
    pub tasks: Vec<ApiTask<T>>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTask<T> {
    pub status_code: u32,
    #[serde(default)]
    pub status_message: String,
    #[serde(default = "Option::default")]
    pub result: Option<Vec<T>>,
}

impl<T> ApiResponse<T> {
    /// Returns the first task, failing on any non-OK status along the way.
    pub fn into_first_task(self) -> Result<ApiTask<T>> {
        if self.status_code != STATUS_OK {
            return Err(Error::DataSource(format!(
                "request failed with status {}: {}",
                self.status_code, self.status_message
            )));
        }
        let task = self
            .tasks
            .into_iter()
            .next()
            .ok_or_else(|| Error::DataSource("response contained no tasks".to_string()))?;
        if task.status_code != STATUS_OK {
            return Err(Error::DataSource(format!(
                "task failed with status {}: {}",
                task.status_code, task.status_message
            )));
        }
        Ok(task)
    }
}

/// `language_code` for codes like `en`, `language_name` for names like `English`.
#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct LanguageField<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_name: Option<&'a str>,
}

impl<'a> LanguageField<'a> {
    pub fn new(language: &'a str) -> Self {
        let language = language.trim();
        if utils::is_language_code(language) {
            Self { language_code: Some(language), language_name: None }
        } else {
            Self { language_code: None, language_name: Some(language) }
        }
    }
}

pub struct DataForSeoClient {
    client: Client,
    base_url: Url,
    credentials: DataForSeoCredentials,
}

impl DataForSeoClient {
    pub fn new(credentials: DataForSeoCredentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("kr/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: utils::parse_url(DEFAULT_BASE_URL)?,
            credentials,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        self.base_url = utils::parse_url(&base_url)?;
        Ok(self)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("Invalid endpoint '{}': {}", endpoint, e)))
    }

    /// POSTs a task list to `endpoint` and returns the first task.
    pub async fn post<P, T>(&self, endpoint: &str, tasks: &P) -> Result<ApiTask<T>>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint_url(endpoint)?;
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .basic_auth(&self.credentials.login, Some(self.credentials.password.expose_secret()))
            .json(tasks)
            .send()
            .await?
            .error_for_status()?;

        let body: ApiResponse<T> = response.json().await?;
        body.into_first_task()
    }
}

impl fmt::Debug for DataForSeoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataForSeoClient")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url.as_str())
            .field("credentials", &self.credentials)
            .finish()
    }
}
