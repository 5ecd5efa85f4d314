//! Bizlink - client library for the Bizlink business directory
//!
//! Company accounts authenticate, maintain a profile, post announcements,
//! follow partner projects and read industry news. This crate holds
//! everything below the front ends: secure storage, the HTTP client, domain
//! services, the state tree and the application context that ties them
//! together.

pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod logging;
pub mod secure_store;
pub mod service;
pub mod state;
pub mod storage;
pub mod types;
pub mod validation;
pub mod wizard;

// Re-export commonly used types
pub use config::Config;
pub use context::AppContext;
pub use error::{ApiError, BizlinkError, Result};
pub use http::ApiClient;
pub use secure_store::{SecureStorage, SecureStoreConfig, StorageBackend};
pub use state::{Action, AppState};
pub use storage::{MemoryStateStorage, SqliteStateStorage, StateStorage};
pub use types::{
    Announcement, AnnouncementDraft, AnnouncementKind, Company, CompanyInfo, CompanyRegistration,
    NewsArticle, Project, ProjectInput, ProjectStage,
};
pub use wizard::{RegistrationWizard, WizardStep};
