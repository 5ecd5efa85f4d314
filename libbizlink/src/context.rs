//! Application context
//!
//! `AppContext` owns the state tree together with everything needed to change
//! it: the domain services, the secure store, the snapshot storage and the
//! event bus. Front ends create one with [`AppContext::from_config`] (or
//! [`AppContext::bootstrap`] for explicit wiring) and pass it by mutable
//! reference to their handlers.
//!
//! Each operation follows the same shape: dispatch a loading action, do the
//! work, then dispatch either the result or the collapsed error message.
//! Operations also return a `Result` so callers can pick an exit code, but
//! the message stored in the state is what users see.
//!
//! # Example
//!
//! ```no_run
//! use libbizlink::{AppContext, Config};
//!
//! # async fn example() -> libbizlink::Result<()> {
//! let config = Config::load_or_default()?;
//! let mut ctx = AppContext::from_config(&config).await?;
//!
//! if !ctx.restore_auth_state().await {
//!     ctx.login("a@b.com", "abc12345").await?;
//! }
//!
//! ctx.fetch_announcements().await?;
//! for announcement in &ctx.state().announcements.items {
//!     println!("{}", announcement.title);
//! }
//! # Ok(())
//! # }
//! ```

use chrono::Datelike;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{ApiError, BizlinkError, ConfigError, Result};
use crate::secure_store::{keys, SecureStorage};
use crate::service::events::{Event, EventBus, EventReceiver};
use crate::service::Services;
use crate::state::{reduce, Action, AppState};
use crate::storage::{load_snapshot, save_snapshot, SqliteStateStorage, StateStorage};
use crate::types::{
    Announcement, AnnouncementDraft, AuthPayload, AuthToken, Company, CompanyInfo,
    CompanyRegistration, Project, ProjectInput, ProjectStage, RegisterRequest,
    UpdateCompanyRequest,
};
use crate::validation;

pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTRATION_FAILED: &str = "Registration failed";
pub const PROFILE_UPDATE_FAILED: &str = "Failed to update company profile";
pub const PROFILE_FETCH_FAILED: &str = "Failed to fetch company profile";
pub const ANNOUNCEMENTS_FETCH_FAILED: &str = "Failed to fetch announcements";
pub const ANNOUNCEMENT_SAVE_FAILED: &str = "Failed to save announcement";
pub const ANNOUNCEMENT_DELETE_FAILED: &str = "Failed to delete announcement";
pub const PROJECTS_FETCH_FAILED: &str = "Failed to fetch projects";
pub const PROJECT_SAVE_FAILED: &str = "Failed to save project";
pub const PROJECT_DELETE_FAILED: &str = "Failed to delete project";
pub const NEWS_FETCH_FAILED: &str = "Failed to fetch news";

const EVENT_CAPACITY: usize = 100;

pub struct AppContext {
    state: AppState,
    services: Services,
    secure: SecureStorage,
    storage: Arc<dyn StateStorage>,
    events: EventBus,
}

impl AppContext {
    /// Wire a context from explicit parts, rehydrating the root snapshot
    ///
    /// A missing or undecodable snapshot yields the empty state.
    pub async fn bootstrap(
        services: Services,
        secure: SecureStorage,
        storage: Arc<dyn StateStorage>,
    ) -> Self {
        let state = load_snapshot(storage.as_ref()).await;

        Self {
            state,
            services,
            secure,
            storage,
            events: EventBus::new(EVENT_CAPACITY),
        }
    }

    /// Build services, secure storage and the SQLite snapshot store from
    /// configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        let services = Services::from_config(config)?;

        let mut credentials = config.credentials.clone();
        credentials.load_master_password_from_env();
        let secure = SecureStorage::new(credentials)?;

        let db_path = config.storage_path();
        let db_path = db_path.to_str().ok_or_else(|| {
            ConfigError::MissingField("storage.path is not valid UTF-8".to_string())
        })?;
        let storage = SqliteStateStorage::new(db_path).await?;

        Ok(Self::bootstrap(services, secure, Arc::new(storage)).await)
    }

    /// Open a context from configuration and restore the stored session
    ///
    /// Fails with `ApiError::Unauthenticated` (exit code 2) when no session
    /// can be restored. Every front-end command that needs a signed-in
    /// company starts here.
    pub async fn open_session(config: &Config) -> Result<Self> {
        let mut ctx = Self::from_config(config).await?;
        if !ctx.restore_auth_state().await {
            tracing::debug!("No stored session found");
        }
        ctx.require_session()?;
        Ok(ctx)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn services_mut(&mut self) -> &mut Services {
        &mut self.services
    }

    pub fn secure_storage(&self) -> &SecureStorage {
        &self.secure
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Apply `action`, write the root snapshot and notify subscribers
    ///
    /// A failed snapshot write is logged and reported as an event; the
    /// in-memory state stays authoritative.
    pub async fn dispatch(&mut self, action: Action) {
        let slice = action.slice();
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);

        if let Err(e) = save_snapshot(self.storage.as_ref(), &self.state).await {
            tracing::warn!("Failed to persist state snapshot: {}", e);
            self.events.emit(Event::SnapshotFailed {
                error: e.to_string(),
            });
        }

        self.events.emit(Event::StateChanged(slice));
    }

    /// Fail with `ApiError::Unauthenticated` unless a session is active
    pub fn require_session(&self) -> Result<()> {
        if self.state.session.authenticated {
            Ok(())
        } else {
            Err(ApiError::Unauthenticated.into())
        }
    }

    // === Session ===

    /// Validate locally, then authenticate against the backend
    ///
    /// Malformed input never reaches the network. On failure the message is
    /// also stored in `session.last_error`.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        self.dispatch(Action::SessionLoading).await;

        let result = self.try_login(email, password).await;
        if let Err(e) = &result {
            tracing::debug!("Login failed: {}", e);
            self.dispatch(Action::SessionFailed(e.user_message(LOGIN_FAILED)))
                .await;
        }
        result
    }

    async fn try_login(&mut self, email: &str, password: &str) -> Result<()> {
        validation::validate_credentials(email, password)?;
        let payload = self.services.auth().login(email, password).await?;
        self.start_session(payload, email).await
    }

    /// Validate locally (including the password confirmation), register the
    /// company and start a session
    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        confirm_password: &str,
        company: Option<CompanyRegistration>,
    ) -> Result<()> {
        self.dispatch(Action::SessionLoading).await;

        let result = self
            .try_register(email, password, confirm_password, company)
            .await;
        if let Err(e) = &result {
            tracing::debug!("Registration failed: {}", e);
            self.dispatch(Action::SessionFailed(e.user_message(REGISTRATION_FAILED)))
                .await;
        }
        result
    }

    async fn try_register(
        &mut self,
        email: &str,
        password: &str,
        confirm_password: &str,
        company: Option<CompanyRegistration>,
    ) -> Result<()> {
        validation::validate_credentials(email, password)?;
        validation::validate_password_match(password, confirm_password)?;

        let company = company.unwrap_or_default();
        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: company.name,
            description: company.description,
            industry: company.industry,
            founded_year: company
                .founded_year
                .unwrap_or_else(|| chrono::Utc::now().year()),
            services: company.services,
        };

        let payload = self.services.auth().register(&request).await?;
        self.start_session(payload, email).await
    }

    /// Persist the session keys, install the token and seed the profile
    async fn start_session(&mut self, payload: AuthPayload, email: &str) -> Result<()> {
        let AuthPayload { token, company } = payload;
        let user_id = company.id.to_string();
        let email = if company.email.is_empty() {
            email.to_string()
        } else {
            company.email.clone()
        };

        self.secure.set(keys::AUTH_TOKEN, token.expose())?;
        self.secure.set(keys::USER_ID, &user_id)?;
        self.secure.set(keys::EMAIL, &email)?;
        self.secure.set(keys::IS_AUTHENTICATED, "true")?;

        self.services.client().set_token(token.clone());

        tracing::info!(user_id = %user_id, "Session started");

        self.dispatch(Action::SessionStarted {
            token,
            user_id: Some(user_id),
            email: Some(email),
        })
        .await;
        self.dispatch(Action::CompanyLoaded {
            info: CompanyInfo::from(&company),
            profile_photo: company.profile_photo,
        })
        .await;

        Ok(())
    }

    /// Bring back a persisted session
    ///
    /// Returns true only when a token is stored and the `isAuthenticated`
    /// flag is exactly `"true"`. Storage failures count as "not restored".
    pub async fn restore_auth_state(&mut self) -> bool {
        match self.read_persisted_session() {
            Ok(Some((token, user_id, email))) => {
                self.services.client().set_token(token.clone());
                self.dispatch(Action::SessionStarted {
                    token,
                    user_id,
                    email,
                })
                .await;
                tracing::debug!("Restored persisted session");
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Failed to restore session: {}", e);
                false
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn read_persisted_session(&self) -> Result<Option<(AuthToken, Option<String>, Option<String>)>> {
        let token = self
            .secure
            .get(keys::AUTH_TOKEN)?
            .filter(|token| !token.is_empty());
        let flag = self.secure.get(keys::IS_AUTHENTICATED)?;

        match (token, flag.as_deref()) {
            (Some(token), Some("true")) => {
                let user_id = self.secure.get(keys::USER_ID)?;
                let email = self.secure.get(keys::EMAIL)?;
                Ok(Some((AuthToken::new(token), user_id, email)))
            }
            _ => Ok(None),
        }
    }

    /// Clear the in-memory session and delete all four persisted keys
    ///
    /// Every key is attempted even if one deletion fails; the first failure
    /// is returned.
    pub async fn logout(&mut self) -> Result<()> {
        self.services.client().clear_token();
        self.dispatch(Action::SessionCleared).await;

        let mut first_error = None;
        for key in keys::SESSION {
            if let Err(e) = self.secure.delete(key) {
                tracing::warn!("Failed to delete {}: {}", key, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        tracing::info!("Session cleared");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // === Company profile ===

    pub async fn set_company_info(&mut self, info: CompanyInfo) {
        self.dispatch(Action::SetCompanyInfo(info)).await;
    }

    pub async fn update_company_name(&mut self, name: impl Into<String>) {
        self.dispatch(Action::UpdateCompanyName(name.into())).await;
    }

    pub async fn update_company_email(&mut self, email: impl Into<String>) {
        self.dispatch(Action::UpdateCompanyEmail(email.into())).await;
    }

    pub async fn update_company_industry(&mut self, industry: impl Into<String>) {
        self.dispatch(Action::UpdateCompanyIndustry(industry.into()))
            .await;
    }

    pub async fn update_company_description(&mut self, description: impl Into<String>) {
        self.dispatch(Action::UpdateCompanyDescription(description.into()))
            .await;
    }

    pub async fn update_profile_photo(&mut self, uri: Option<String>) {
        self.dispatch(Action::UpdateProfilePhoto(uri)).await;
    }

    /// Validate the edit form, save it to the backend and replace the profile
    pub async fn save_profile(&mut self, info: CompanyInfo) -> Result<()> {
        self.dispatch(Action::CompanyLoading).await;

        let result = self.try_save_profile(info).await;
        self.finish_company(result, PROFILE_UPDATE_FAILED).await
    }

    async fn try_save_profile(&self, info: CompanyInfo) -> Result<Company> {
        info.validate()?;
        let company = self
            .services
            .companies()
            .update_me(&UpdateCompanyRequest::from(info))
            .await?;
        Ok(company)
    }

    /// Replace the profile with the backend's copy
    pub async fn sync_profile(&mut self) -> Result<()> {
        self.dispatch(Action::CompanyLoading).await;

        let result = self
            .services
            .companies()
            .me()
            .await
            .map_err(BizlinkError::from);
        self.finish_company(result, PROFILE_FETCH_FAILED).await
    }

    /// Upload a new profile photo for the signed-in company
    pub async fn upload_profile_photo(&mut self, bytes: Vec<u8>, filename: &str) -> Result<()> {
        self.dispatch(Action::CompanyLoading).await;

        let result = self.try_upload_photo(bytes, filename).await;
        self.finish_company(result, PROFILE_UPDATE_FAILED).await
    }

    async fn try_upload_photo(&self, bytes: Vec<u8>, filename: &str) -> Result<Company> {
        let id = self
            .state
            .session
            .user_id
            .as_deref()
            .and_then(|id| id.parse::<i64>().ok())
            .ok_or(ApiError::Unauthenticated)?;

        let company = self
            .services
            .companies()
            .upload_photo(id, bytes, filename)
            .await?;
        Ok(company)
    }

    async fn finish_company(&mut self, result: Result<Company>, fallback: &str) -> Result<()> {
        match result {
            Ok(company) => {
                self.dispatch(Action::CompanyLoaded {
                    info: CompanyInfo::from(&company),
                    profile_photo: company.profile_photo,
                })
                .await;
                Ok(())
            }
            Err(e) => {
                self.dispatch(Action::CompanyFailed(e.user_message(fallback)))
                    .await;
                Err(e)
            }
        }
    }

    // === Announcements ===

    pub async fn fetch_announcements(&mut self) -> Result<()> {
        self.dispatch(Action::AnnouncementsLoading).await;

        match self.services.announcements().list().await {
            Ok(items) => {
                self.dispatch(Action::AnnouncementsLoaded(items)).await;
                Ok(())
            }
            Err(e) => {
                let e = BizlinkError::from(e);
                self.dispatch(Action::AnnouncementsFailed(
                    e.user_message(ANNOUNCEMENTS_FETCH_FAILED),
                ))
                .await;
                Err(e)
            }
        }
    }

    /// Post a new announcement; it is placed first in the list
    pub async fn create_announcement(&mut self, draft: AnnouncementDraft) -> Result<Announcement> {
        self.dispatch(Action::AnnouncementsLoading).await;

        let result = match draft.into_input() {
            Ok(input) => self
                .services
                .announcements()
                .create(&input)
                .await
                .map_err(BizlinkError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(announcement) => {
                self.dispatch(Action::AnnouncementAdded(announcement.clone()))
                    .await;
                Ok(announcement)
            }
            Err(e) => {
                self.dispatch(Action::AnnouncementsFailed(
                    e.user_message(ANNOUNCEMENT_SAVE_FAILED),
                ))
                .await;
                Err(e)
            }
        }
    }

    pub async fn update_announcement(
        &mut self,
        id: i64,
        draft: AnnouncementDraft,
    ) -> Result<Announcement> {
        self.dispatch(Action::AnnouncementsLoading).await;

        let result = match draft.into_input() {
            Ok(input) => self
                .services
                .announcements()
                .update(id, &input)
                .await
                .map_err(BizlinkError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(announcement) => {
                self.dispatch(Action::AnnouncementUpdated(announcement.clone()))
                    .await;
                Ok(announcement)
            }
            Err(e) => {
                self.dispatch(Action::AnnouncementsFailed(
                    e.user_message(ANNOUNCEMENT_SAVE_FAILED),
                ))
                .await;
                Err(e)
            }
        }
    }

    pub async fn delete_announcement(&mut self, id: i64) -> Result<()> {
        self.dispatch(Action::AnnouncementsLoading).await;

        match self.services.announcements().delete(id).await {
            Ok(()) => {
                self.dispatch(Action::AnnouncementRemoved(id)).await;
                Ok(())
            }
            Err(e) => {
                let e = BizlinkError::from(e);
                self.dispatch(Action::AnnouncementsFailed(
                    e.user_message(ANNOUNCEMENT_DELETE_FAILED),
                ))
                .await;
                Err(e)
            }
        }
    }

    // === Projects ===

    pub async fn fetch_projects(&mut self) -> Result<()> {
        self.dispatch(Action::ProjectsLoading).await;

        match self.services.projects().list().await {
            Ok(items) => {
                self.dispatch(Action::ProjectsLoaded(items)).await;
                Ok(())
            }
            Err(e) => {
                let e = BizlinkError::from(e);
                self.dispatch(Action::ProjectsFailed(e.user_message(PROJECTS_FETCH_FAILED)))
                    .await;
                Err(e)
            }
        }
    }

    pub async fn create_project(&mut self, input: ProjectInput) -> Result<Project> {
        self.dispatch(Action::ProjectsLoading).await;

        let result = match validate_project_input(&input) {
            Ok(()) => self
                .services
                .projects()
                .create(&input)
                .await
                .map_err(BizlinkError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(project) => {
                self.dispatch(Action::ProjectAdded(project.clone())).await;
                Ok(project)
            }
            Err(e) => {
                self.dispatch(Action::ProjectsFailed(e.user_message(PROJECT_SAVE_FAILED)))
                    .await;
                Err(e)
            }
        }
    }

    pub async fn delete_project(&mut self, id: i64) -> Result<()> {
        self.dispatch(Action::ProjectsLoading).await;

        match self.services.projects().delete(id).await {
            Ok(()) => {
                self.dispatch(Action::ProjectRemoved(id)).await;
                Ok(())
            }
            Err(e) => {
                let e = BizlinkError::from(e);
                self.dispatch(Action::ProjectsFailed(e.user_message(PROJECT_DELETE_FAILED)))
                    .await;
                Err(e)
            }
        }
    }

    pub async fn update_project_stage(&mut self, id: i64, stage: ProjectStage) -> Result<Project> {
        self.modify_project(id, |project| {
            project.update_stage(stage);
            true
        })
        .await
    }

    pub async fn update_project_status(&mut self, id: i64, status: &str) -> Result<Project> {
        let status = status.to_string();
        self.modify_project(id, move |project| {
            project.update_status(status);
            true
        })
        .await
    }

    pub async fn add_project_function(&mut self, id: i64, function: &str) -> Result<Project> {
        let function = function.trim().to_string();
        if function.is_empty() {
            return Err(BizlinkError::InvalidInput(
                "Function cannot be empty".to_string(),
            ));
        }

        self.modify_project(id, move |project| {
            project.add_function(function);
            true
        })
        .await
    }

    /// Removing a function the project doesn't have changes nothing and
    /// sends nothing
    pub async fn remove_project_function(&mut self, id: i64, function: &str) -> Result<Project> {
        self.modify_project(id, |project| project.remove_function(function))
            .await
    }

    /// Apply a local edit (which bumps `updated_at`), then save it
    ///
    /// `edit` returns false when it changed nothing. If the save fails the
    /// local edit is rolled back.
    async fn modify_project<F>(&mut self, id: i64, edit: F) -> Result<Project>
    where
        F: FnOnce(&mut Project) -> bool,
    {
        let original = match self.state.projects.items.iter().find(|p| p.id == id) {
            Some(project) => project.clone(),
            None => {
                self.dispatch(Action::ProjectsLoading).await;
                match self.services.projects().get(id).await {
                    Ok(project) => {
                        self.dispatch(Action::ProjectAdded(project.clone())).await;
                        project
                    }
                    Err(e) => {
                        let e = BizlinkError::from(e);
                        self.dispatch(Action::ProjectsFailed(
                            e.user_message(PROJECTS_FETCH_FAILED),
                        ))
                        .await;
                        return Err(e);
                    }
                }
            }
        };

        let mut edited = original.clone();
        if !edit(&mut edited) {
            return Ok(original);
        }

        self.dispatch(Action::ProjectUpdated(edited.clone())).await;
        self.dispatch(Action::ProjectsLoading).await;

        match self
            .services
            .projects()
            .update(id, &edited.to_input())
            .await
        {
            Ok(saved) => {
                self.dispatch(Action::ProjectUpdated(saved.clone())).await;
                Ok(saved)
            }
            Err(e) => {
                let e = BizlinkError::from(e);
                self.dispatch(Action::ProjectUpdated(original)).await;
                self.dispatch(Action::ProjectsFailed(e.user_message(PROJECT_SAVE_FAILED)))
                    .await;
                Err(e)
            }
        }
    }

    // === News ===

    /// Fetch the news feed; only articles with an image are kept
    pub async fn fetch_news(&mut self) -> Result<()> {
        self.dispatch(Action::NewsLoading).await;

        let result = match self.services.news() {
            Ok(news) => news.fetch_articles().await.map_err(BizlinkError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(articles) => {
                self.dispatch(Action::NewsLoaded(articles)).await;
                Ok(())
            }
            Err(e) => {
                tracing::debug!("News fetch failed: {}", e);
                self.dispatch(Action::NewsFailed(NEWS_FETCH_FAILED.to_string()))
                    .await;
                Err(e)
            }
        }
    }

    // === Directory ===

    /// All registered companies; not kept in the state tree
    pub async fn list_companies(&self) -> Result<Vec<Company>> {
        Ok(self.services.companies().list().await?)
    }
}

fn validate_project_input(input: &ProjectInput) -> Result<()> {
    let required = [
        (&input.name, "Project name is required"),
        (&input.customer_company, "Customer company is required"),
        (&input.executor_company, "Executor company is required"),
    ];

    for (value, message) in required {
        if value.trim().is_empty() {
            return Err(BizlinkError::InvalidInput(message.to_string()));
        }
    }

    Ok(())
}
