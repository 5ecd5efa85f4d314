//! State slices
//!
//! Everything here is plain data. Transient fields (`loading` flags and the
//! bearer token) are skipped when the tree is serialized into the root
//! snapshot.

use serde::{Deserialize, Serialize};

use crate::types::{Announcement, AuthToken, CompanyInfo, NewsArticle, Project};

pub const PLACEHOLDER_COMPANY_NAME: &str = "NovaAI Solutions";
pub const PLACEHOLDER_COMPANY_EMAIL: &str = "novaai@gmail.com";
pub const PLACEHOLDER_COMPANY_INDUSTRY: &str = "Artificial Intelligence";
pub const PLACEHOLDER_COMPANY_DESCRIPTION: &str = "NovaAI Solutions builds and operates artificial intelligence services. \
We create intelligent systems that help companies automate processes, increase efficiency and expand their capabilities.";

/// Root application state
///
/// The single source of truth, snapshotted after every dispatched action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    pub session: SessionState,
    pub company: CompanyState,
    pub announcements: AnnouncementsState,
    pub projects: ProjectsState,
    pub news: NewsState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a tree decoded from a snapshot
    ///
    /// No request is in flight after a restart, and the token only comes
    /// back through the secure store, so the session starts out
    /// unauthenticated until `restore_auth_state` runs.
    pub fn rehydrated(mut self) -> Self {
        self.session.loading = false;
        self.session.authenticated = self.session.token.is_some();
        self.company.loading = false;
        self.announcements.loading = false;
        self.projects.loading = false;
        self.news.loading = false;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.authenticated
    }
}

/// Authentication status and identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionState {
    /// True iff `token` is present
    pub authenticated: bool,
    #[serde(skip)]
    pub token: Option<AuthToken>,
    pub user_id: Option<String>,
    pub email: Option<String>,
    #[serde(skip)]
    pub loading: bool,
    pub last_error: Option<String>,
}

/// The signed-in company's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompanyState {
    pub name: String,
    pub email: String,
    pub industry: String,
    pub description: String,
    pub profile_photo: Option<String>,
    #[serde(skip)]
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for CompanyState {
    fn default() -> Self {
        Self {
            name: PLACEHOLDER_COMPANY_NAME.to_string(),
            email: PLACEHOLDER_COMPANY_EMAIL.to_string(),
            industry: PLACEHOLDER_COMPANY_INDUSTRY.to_string(),
            description: PLACEHOLDER_COMPANY_DESCRIPTION.to_string(),
            profile_photo: None,
            loading: false,
            error: None,
        }
    }
}

impl CompanyState {
    pub fn info(&self) -> CompanyInfo {
        CompanyInfo {
            name: self.name.clone(),
            email: self.email.clone(),
            industry: self.industry.clone(),
            description: self.description.clone(),
        }
    }
}

/// A fetched list with its request status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionState<T> {
    pub items: Vec<T>,
    #[serde(skip)]
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for CollectionState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

impl<T> CollectionState<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Announcement board, newest first
pub type AnnouncementsState = CollectionState<Announcement>;

pub type ProjectsState = CollectionState<Project>;

/// News feed, articles with an image only
pub type NewsState = CollectionState<NewsArticle>;
