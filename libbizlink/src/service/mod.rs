//! Domain services for Bizlink
//!
//! Each service wraps one REST resource. Every method issues exactly one
//! request, performs no retries and returns `Result<T, ApiError>`.
//!
//! # Architecture
//!
//! `Services` is the facade handed to the application context. All backend
//! services share one `Arc<ApiClient>`, so a token set after login is seen by
//! every subsequent call:
//!
//! - `AuthService`: login and registration
//! - `AnnouncementService`: the announcement board
//! - `CompanyService`: company directory and own profile
//! - `ProjectService`: partner projects
//! - `NewsService`: third-party news feed (built on demand)
//!
//! # Example
//!
//! ```no_run
//! use libbizlink::service::Services;
//! use libbizlink::Config;
//!
//! # async fn example() -> libbizlink::Result<()> {
//! let config = Config::load_or_default()?;
//! let services = Services::from_config(&config)?;
//!
//! let payload = services.auth().login("a@b.com", "abc12345").await?;
//! services.client().set_token(payload.token);
//!
//! let announcements = services.announcements().list().await?;
//! println!("{} announcements", announcements.len());
//! # Ok(())
//! # }
//! ```

pub mod announcements;
pub mod auth;
pub mod companies;
pub mod events;
pub mod news;
pub mod projects;

use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

use self::announcements::AnnouncementService;
use self::auth::AuthService;
use self::companies::CompanyService;
use self::news::NewsService;
use self::projects::ProjectService;
use crate::config::{Config, NewsConfig};
use crate::error::Result;
use crate::http::{classify_reqwest_error, ApiClient};

/// Service facade sharing one authenticated HTTP client
pub struct Services {
    client: Arc<ApiClient>,
    auth: AuthService,
    announcements: AnnouncementService,
    companies: CompanyService,
    projects: ProjectService,
    news_http: reqwest::Client,
    news_config: NewsConfig,
    news_api_key: Option<SecretString>,
}

impl Services {
    /// Build all services around an existing client
    pub fn new(client: Arc<ApiClient>, news_config: NewsConfig, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let news_http = builder.build().map_err(classify_reqwest_error)?;

        Ok(Self {
            auth: AuthService::new(Arc::clone(&client)),
            announcements: AnnouncementService::new(Arc::clone(&client)),
            companies: CompanyService::new(Arc::clone(&client)),
            projects: ProjectService::new(Arc::clone(&client)),
            client,
            news_http,
            news_config,
            news_api_key: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Arc::new(ApiClient::from_config(&config.api)?);
        Self::new(
            client,
            config.news.clone(),
            config.api.timeout_secs.map(Duration::from_secs),
        )
    }

    /// Use `key` instead of reading the configured environment variable
    pub fn set_news_api_key(&mut self, key: SecretString) {
        self.news_api_key = Some(key);
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn announcements(&self) -> &AnnouncementService {
        &self.announcements
    }

    pub fn companies(&self) -> &CompanyService {
        &self.companies
    }

    pub fn projects(&self) -> &ProjectService {
        &self.projects
    }

    /// News service with the API key resolved now
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no key is configured.
    pub fn news(&self) -> Result<NewsService> {
        let api_key = match &self.news_api_key {
            Some(key) => key.clone(),
            None => self.news_config.api_key()?,
        };

        Ok(NewsService::new(
            self.news_http.clone(),
            self.news_config.clone(),
            api_key,
        ))
    }
}
