//! Diary post data structures.

use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use super::de_id;

/// Moderation state of a diary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiaryStatus {
    /// Awaiting review
    #[default]
    Pending,
    /// Publicly visible
    Approved,
    /// Hidden, with a reason
    Rejected,
}

impl DiaryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiaryStatus::Pending => "pending",
            DiaryStatus::Approved => "approved",
            DiaryStatus::Rejected => "rejected",
        }
    }

    /// Badge shown next to the title; approved diaries carry none.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            DiaryStatus::Pending => Some("Under review"),
            DiaryStatus::Approved => None,
            DiaryStatus::Rejected => Some("Rejected"),
        }
    }
}

impl fmt::Display for DiaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author of a diary as embedded in diary responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(default, deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub avatar_url: String,
}

impl Author {
    pub fn display_name(&self) -> &str {
        if self.nickname.is_empty() {
            "Anonymous"
        } else {
            &self.nickname
        }
    }
}

/// A travel diary post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diary {
    #[serde(deserialize_with = "de_id", alias = "postId")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "de_author")]
    pub author: Author,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub status: DiaryStatus,
    #[serde(default)]
    pub reject_reason: Option<String>,
    #[serde(default, alias = "createTime")]
    pub created_at: String,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub liked: Option<bool>,
}

impl Diary {
    /// First `max` graphemes of the content, with an ellipsis when cut.
    pub fn summary(&self, max: usize) -> String {
        let content = self.content.trim();
        let mut graphemes = content.graphemes(true);
        let head: String = graphemes.by_ref().take(max).collect();
        if graphemes.next().is_some() {
            format!("{head}…")
        } else {
            head
        }
    }

    /// Creation day as `YYYY-MM-DD`, empty when unknown.
    pub fn created_date(&self) -> String {
        format_date(&self.created_at)
    }

    /// Image shown on list cards: the cover, else the first image.
    pub fn card_image(&self) -> Option<&str> {
        if !self.cover_image.is_empty() {
            return Some(&self.cover_image);
        }
        self.images.first().map(String::as_str)
    }

    /// Rewrite every media reference through `f`.
    pub fn map_media(&mut self, f: impl Fn(&str) -> String) {
        self.cover_image = f(&self.cover_image);
        for image in &mut self.images {
            *image = f(image);
        }
        if let Some(video) = self.video_url.as_mut() {
            *video = f(video);
        }
        self.author.avatar_url = f(&self.author.avatar_url);
    }
}

/// Payload for creating or updating a diary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryDraft {
    pub title: String,
    pub content: String,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cover_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

/// A comment on a diary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default, deserialize_with = "de_id")]
    pub id: String,
    pub content: String,
    #[serde(default, deserialize_with = "de_author")]
    pub author: Author,
    #[serde(default)]
    pub created_at: String,
}

/// Like state reported by the like endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    #[serde(default)]
    pub liked: Option<bool>,
    #[serde(default)]
    pub like_count: Option<u64>,
}

/// Format an ISO-ish timestamp as `YYYY-MM-DD`.
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d").to_string();
    }
    match raw.get(..10).map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d")) {
        Some(Ok(date)) => date.format("%Y-%m-%d").to_string(),
        _ => raw.to_string(),
    }
}

/// Authors arrive either as an object or, from older endpoints, as a bare name.
fn de_author<'de, D>(deserializer: D) -> Result<Author, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Full(Author),
        Name(String),
        Missing(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Full(author) => author,
        Raw::Name(nickname) => Author {
            nickname,
            ..Author::default()
        },
        Raw::Missing(()) => Author::default(),
    })
}
