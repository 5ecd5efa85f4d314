//! Pure reducer function for state transitions
//!
//! `(State, Action) -> State` with no side effects. All I/O happens in the
//! context around it.

use super::actions::Action;
use super::app_state::{AppState, CollectionState, CompanyState, SessionState};
use crate::types::{Announcement, Project};

/// Pure reducer function
///
/// # Purity Guarantees
///
/// - No network requests
/// - No secure store or snapshot writes
/// - Deterministic (same inputs -> same output)
///
/// The session slice always leaves here with
/// `authenticated == token.is_some()`.
pub fn reduce(state: AppState, action: Action) -> AppState {
    match action {
        // === Session ===
        Action::SessionLoading => AppState {
            session: SessionState {
                loading: true,
                last_error: None,
                ..state.session
            },
            ..state
        },

        Action::SessionStarted {
            token,
            user_id,
            email,
        } => AppState {
            session: SessionState {
                authenticated: true,
                token: Some(token),
                user_id,
                email,
                loading: false,
                last_error: None,
            },
            ..state
        },

        Action::SessionFailed(error) => AppState {
            session: SessionState {
                loading: false,
                last_error: Some(error),
                ..state.session
            },
            ..state
        },

        Action::SessionCleared => AppState {
            session: SessionState::default(),
            ..state
        },

        // === Company profile ===
        Action::CompanyLoading => AppState {
            company: CompanyState {
                loading: true,
                error: None,
                ..state.company
            },
            ..state
        },

        Action::SetCompanyInfo(info) => AppState {
            company: CompanyState {
                name: info.name,
                email: info.email,
                industry: info.industry,
                description: info.description,
                ..state.company
            },
            ..state
        },

        Action::CompanyLoaded {
            info,
            profile_photo,
        } => AppState {
            company: CompanyState {
                name: info.name,
                email: info.email,
                industry: info.industry,
                description: info.description,
                profile_photo: profile_photo.or(state.company.profile_photo),
                loading: false,
                error: None,
            },
            ..state
        },

        Action::CompanyFailed(error) => AppState {
            company: CompanyState {
                loading: false,
                error: Some(error),
                ..state.company
            },
            ..state
        },

        Action::UpdateCompanyName(name) => AppState {
            company: CompanyState {
                name,
                ..state.company
            },
            ..state
        },

        Action::UpdateCompanyEmail(email) => AppState {
            company: CompanyState {
                email,
                ..state.company
            },
            ..state
        },

        Action::UpdateCompanyIndustry(industry) => AppState {
            company: CompanyState {
                industry,
                ..state.company
            },
            ..state
        },

        Action::UpdateCompanyDescription(description) => AppState {
            company: CompanyState {
                description,
                ..state.company
            },
            ..state
        },

        Action::UpdateProfilePhoto(profile_photo) => AppState {
            company: CompanyState {
                profile_photo,
                ..state.company
            },
            ..state
        },

        // === Announcements ===
        Action::AnnouncementsLoading => AppState {
            announcements: loading(state.announcements),
            ..state
        },

        Action::AnnouncementsLoaded(mut items) => {
            sort_newest_first(&mut items);
            AppState {
                announcements: loaded(items),
                ..state
            }
        }

        Action::AnnouncementsFailed(error) => AppState {
            announcements: failed(state.announcements, error),
            ..state
        },

        Action::AnnouncementAdded(announcement) => {
            let mut announcements = settled(state.announcements);
            announcements.items.insert(0, announcement);
            AppState {
                announcements,
                ..state
            }
        }

        Action::AnnouncementUpdated(announcement) => {
            let mut announcements = settled(state.announcements);
            if let Some(existing) = announcements
                .items
                .iter_mut()
                .find(|a| a.id == announcement.id)
            {
                *existing = announcement;
            }
            AppState {
                announcements,
                ..state
            }
        }

        Action::AnnouncementRemoved(id) => {
            let mut announcements = settled(state.announcements);
            announcements.items.retain(|a| a.id != id);
            AppState {
                announcements,
                ..state
            }
        }

        // === Projects ===
        Action::ProjectsLoading => AppState {
            projects: loading(state.projects),
            ..state
        },

        Action::ProjectsLoaded(items) => AppState {
            projects: loaded(items),
            ..state
        },

        Action::ProjectsFailed(error) => AppState {
            projects: failed(state.projects, error),
            ..state
        },

        Action::ProjectAdded(project) => {
            let mut projects = settled(state.projects);
            projects.items.insert(0, project);
            AppState { projects, ..state }
        }

        Action::ProjectUpdated(project) => {
            let mut projects = settled(state.projects);
            replace_project(&mut projects.items, project);
            AppState { projects, ..state }
        }

        Action::ProjectRemoved(id) => {
            let mut projects = settled(state.projects);
            projects.items.retain(|p| p.id != id);
            AppState { projects, ..state }
        }

        // === News ===
        Action::NewsLoading => AppState {
            news: loading(state.news),
            ..state
        },

        Action::NewsLoaded(articles) => AppState {
            news: loaded(articles.into_iter().filter(|a| a.has_image()).collect()),
            ..state
        },

        Action::NewsFailed(error) => AppState {
            news: failed(state.news, error),
            ..state
        },
    }
}

fn loading<T>(collection: CollectionState<T>) -> CollectionState<T> {
    CollectionState {
        loading: true,
        error: None,
        ..collection
    }
}

fn loaded<T>(items: Vec<T>) -> CollectionState<T> {
    CollectionState {
        items,
        loading: false,
        error: None,
    }
}

/// A single-item change completed the pending request
fn settled<T>(collection: CollectionState<T>) -> CollectionState<T> {
    CollectionState {
        loading: false,
        error: None,
        ..collection
    }
}

/// Keep the previous items; only the status changes
fn failed<T>(collection: CollectionState<T>, error: String) -> CollectionState<T> {
    CollectionState {
        loading: false,
        error: Some(error),
        ..collection
    }
}

fn sort_newest_first(items: &mut [Announcement]) {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

fn replace_project(items: &mut [Project], project: Project) {
    if let Some(existing) = items.iter_mut().find(|p| p.id == project.id) {
        *existing = project;
    }
}
