//! Single diary view: likes, comments and deletion by the author.

use crate::api::DiaryApi;
use crate::error::{AppError, Result};
use crate::models::{Comment, Diary, LikeState};
use crate::notify::Notice;
use crate::resource::ResourceUrls;

/// A loaded diary and what the current user may do with it.
#[derive(Debug, Clone)]
pub struct DiaryView {
    pub diary: Diary,
    pub is_owner: bool,
    pub comments: Vec<Comment>,
}

pub struct DetailController {
    api: DiaryApi,
    urls: ResourceUrls,
    view: Option<DiaryView>,
}

impl DetailController {
    pub fn new(api: DiaryApi, urls: ResourceUrls) -> Self {
        Self {
            api,
            urls,
            view: None,
        }
    }

    pub fn view(&self) -> Option<&DiaryView> {
        self.view.as_ref()
    }

    /// Fetch a diary and work out whether the stored user wrote it.
    pub async fn load(&mut self, id: &str) -> Result<&DiaryView> {
        let id = id.trim();
        if id.is_empty() {
            return Err(self.reject("Invalid diary id"));
        }

        let mut diary = self.api.get(id).await?;
        self.urls.absolutize(&mut diary);

        let user = self.api.client().session().get_user_info().await?;
        let is_owner = user.is_some_and(|u| !u.id.is_empty() && u.id == diary.author.id);
        log::debug!("Loaded diary {} (owner: {})", diary.id, is_owner);

        Ok(self.view.insert(DiaryView {
            diary,
            is_owner,
            comments: Vec::new(),
        }))
    }

    /// Like or unlike the loaded diary. Returns the new liked flag.
    pub async fn toggle_like(&mut self) -> Result<bool> {
        let id = self.loaded_id()?;
        let state = self.api.like(&id).await?;

        let Some(view) = self.view.as_mut() else {
            return Err(AppError::validation("No diary loaded"));
        };
        let liked = apply_like(&mut view.diary, &state);
        let message = if liked { "Liked" } else { "Like removed" };
        self.api.client().notifier().notify(Notice::success(message));
        Ok(liked)
    }

    /// Post a comment on the loaded diary.
    pub async fn comment(&mut self, text: &str) -> Result<Option<Comment>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(self.reject("Please enter a comment"));
        }
        let id = self.loaded_id()?;

        let comment = self.api.comment(&id, text).await?.map(|mut c| {
            c.author.avatar_url = self.urls.to_absolute(&c.author.avatar_url);
            c
        });
        if let (Some(view), Some(comment)) = (self.view.as_mut(), comment.as_ref()) {
            view.comments.push(comment.clone());
        }
        self.api
            .client()
            .notifier()
            .notify(Notice::success("Comment posted"));
        Ok(comment)
    }

    /// Delete the loaded diary; only its author may.
    pub async fn delete(&mut self) -> Result<()> {
        let id = self.loaded_id()?;
        if !self.view.as_ref().is_some_and(|v| v.is_owner) {
            return Err(self.reject("Only the author can delete this diary"));
        }

        self.api.delete(&id).await?;
        log::info!("Deleted diary {}", id);
        self.view = None;
        self.api
            .client()
            .notifier()
            .notify(Notice::success("Diary deleted"));
        Ok(())
    }

    fn loaded_id(&self) -> Result<String> {
        self.view
            .as_ref()
            .map(|v| v.diary.id.clone())
            .ok_or_else(|| AppError::validation("No diary loaded"))
    }

    fn reject(&self, message: &str) -> AppError {
        self.api.client().notifier().notify(Notice::warning(message));
        AppError::validation(message)
    }
}

/// Fold a like answer into the diary. Fields the server leaves out are
/// derived from the previous state.
fn apply_like(diary: &mut Diary, state: &LikeState) -> bool {
    let was_liked = diary.liked.unwrap_or(false);
    let liked = state.liked.unwrap_or(!was_liked);

    let count = match state.like_count {
        Some(count) => count,
        None => {
            let previous = diary.like_count.unwrap_or(0);
            match (was_liked, liked) {
                (false, true) => previous + 1,
                (true, false) => previous.saturating_sub(1),
                _ => previous,
            }
        }
    };

    diary.liked = Some(liked);
    diary.like_count = Some(count);
    liked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diary(liked: Option<bool>, count: Option<u64>) -> Diary {
        let mut diary: Diary = serde_json::from_str(r#"{"id": 1, "title": "t"}"#).unwrap();
        diary.liked = liked;
        diary.like_count = count;
        diary
    }

    #[test]
    fn test_server_count_wins() {
        let mut d = diary(Some(false), Some(3));
        let liked = apply_like(
            &mut d,
            &LikeState {
                liked: Some(true),
                like_count: Some(10),
            },
        );
        assert!(liked);
        assert_eq!(d.like_count, Some(10));
    }

    #[test]
    fn test_local_toggle_without_server_state() {
        let mut d = diary(None, None);
        assert!(apply_like(&mut d, &LikeState::default()));
        assert_eq!(d.like_count, Some(1));

        assert!(!apply_like(&mut d, &LikeState::default()));
        assert_eq!(d.like_count, Some(0));
        assert!(!apply_like(
            &mut d,
            &LikeState {
                liked: Some(false),
                like_count: None
            }
        ));
        assert_eq!(d.like_count, Some(0));
    }
}
