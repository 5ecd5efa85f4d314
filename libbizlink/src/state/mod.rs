//! Application state tree
//!
//! - Actions: what can happen
//! - State: what is true right now
//! - Reducer: pure function (State, Action) -> State
//!
//! The tree is owned by [`crate::context::AppContext`], which is the only
//! caller of [`reduce`].

pub mod actions;
pub mod app_state;
pub mod reducer;

pub use actions::Action;
pub use app_state::{
    AnnouncementsState, AppState, CollectionState, CompanyState, NewsState, ProjectsState,
    SessionState,
};
pub use reducer::reduce;
