// src/models/mod.rs

//! Domain models for the diary client.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod diary;
mod page;
mod session;
mod upload;

use serde::{Deserialize, Deserializer};

// Re-export all public types
pub use config::{
    ApiConfig, AuthConfig, AuthMode, Config, EditorConfig, ListConfig, LoggingConfig,
    SessionConfig,
};
pub use diary::{Author, Comment, Diary, DiaryDraft, DiaryStatus, LikeState, format_date};
pub use page::{PageQuery, PageResult};
pub use session::{AuthResponse, SavedCredentials, Session, UserInfo};
pub use upload::{MediaFile, UploadKind, UploadResponse};

/// Identifiers arrive as strings from some endpoints and numbers from others.
pub(crate) fn de_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
