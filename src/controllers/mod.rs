//! UI-agnostic screen logic on top of the typed API.

pub mod auth;
pub mod detail;
pub mod editor;
pub mod feed;
pub mod list;
pub mod profile;

pub use auth::{
    AuthService, Authenticator, LoginForm, MockAuthenticator, RegisterForm, RemoteAuthenticator,
};
pub use detail::{DetailController, DiaryView};
pub use editor::{DiaryEditor, MediaSource};
pub use feed::{FeedController, FeedSource, MyDiariesController, MyDiariesSource};
pub use list::{ListController, ListSource, ListState, LoadOutcome, Trigger, has_more_pages};
pub use profile::{ModerationSummary, ProfileController};
