//! Actions for the reducer pattern
//!
//! Every state transition is described by an `Action`. Side effects (HTTP,
//! secure storage, snapshots) happen in the context before or after an
//! action is dispatched, never inside the reducer.

use crate::service::events::Slice;
use crate::types::{Announcement, AuthToken, CompanyInfo, NewsArticle, Project};

#[derive(Debug, Clone)]
pub enum Action {
    // === Session ===
    /// Login/registration started: set loading, clear the last error
    SessionLoading,

    /// A token was obtained (login, registration or restore)
    SessionStarted {
        token: AuthToken,
        user_id: Option<String>,
        email: Option<String>,
    },

    /// Login/registration failed
    SessionFailed(String),

    /// Logout: every session field back to empty
    SessionCleared,

    // === Company profile ===
    CompanyLoading,

    /// Replace the four profile fields wholesale
    SetCompanyInfo(CompanyInfo),

    /// Profile saved or synced from the backend
    CompanyLoaded {
        info: CompanyInfo,
        profile_photo: Option<String>,
    },

    CompanyFailed(String),

    UpdateCompanyName(String),
    UpdateCompanyEmail(String),
    UpdateCompanyIndustry(String),
    UpdateCompanyDescription(String),
    UpdateProfilePhoto(Option<String>),

    // === Announcements ===
    AnnouncementsLoading,
    AnnouncementsLoaded(Vec<Announcement>),
    AnnouncementsFailed(String),
    AnnouncementAdded(Announcement),
    AnnouncementUpdated(Announcement),
    AnnouncementRemoved(i64),

    // === Projects ===
    ProjectsLoading,
    ProjectsLoaded(Vec<Project>),
    ProjectsFailed(String),
    ProjectAdded(Project),
    ProjectUpdated(Project),
    ProjectRemoved(i64),

    // === News ===
    NewsLoading,
    NewsLoaded(Vec<NewsArticle>),
    NewsFailed(String),
}

impl Action {
    /// The state slice this action touches
    pub fn slice(&self) -> Slice {
        match self {
            Action::SessionLoading
            | Action::SessionStarted { .. }
            | Action::SessionFailed(_)
            | Action::SessionCleared => Slice::Session,

            Action::CompanyLoading
            | Action::SetCompanyInfo(_)
            | Action::CompanyLoaded { .. }
            | Action::CompanyFailed(_)
            | Action::UpdateCompanyName(_)
            | Action::UpdateCompanyEmail(_)
            | Action::UpdateCompanyIndustry(_)
            | Action::UpdateCompanyDescription(_)
            | Action::UpdateProfilePhoto(_) => Slice::Company,

            Action::AnnouncementsLoading
            | Action::AnnouncementsLoaded(_)
            | Action::AnnouncementsFailed(_)
            | Action::AnnouncementAdded(_)
            | Action::AnnouncementUpdated(_)
            | Action::AnnouncementRemoved(_) => Slice::Announcements,

            Action::ProjectsLoading
            | Action::ProjectsLoaded(_)
            | Action::ProjectsFailed(_)
            | Action::ProjectAdded(_)
            | Action::ProjectUpdated(_)
            | Action::ProjectRemoved(_) => Slice::Projects,

            Action::NewsLoading | Action::NewsLoaded(_) | Action::NewsFailed(_) => Slice::News,
        }
    }
}
