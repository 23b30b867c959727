//! The "my" screen: who is logged in and how their diaries fare in review.

use std::collections::HashSet;
use std::fmt;

use crate::api::DiaryApi;
use crate::controllers::auth::AuthService;
use crate::controllers::list::has_more_pages;
use crate::error::{AppError, Result};
use crate::models::{Diary, DiaryStatus, PageQuery, UserInfo};

/// Count of own diaries per moderation state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModerationSummary {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl ModerationSummary {
    pub fn from_diaries<'a>(diaries: impl IntoIterator<Item = &'a Diary>) -> Self {
        diaries
            .into_iter()
            .fold(Self::default(), |mut summary, diary| {
                match diary.status {
                    DiaryStatus::Pending => summary.pending += 1,
                    DiaryStatus::Approved => summary.approved += 1,
                    DiaryStatus::Rejected => summary.rejected += 1,
                }
                summary
            })
    }

    pub fn total(&self) -> usize {
        self.pending + self.approved + self.rejected
    }
}

impl fmt::Display for ModerationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} approved, {} under review, {} rejected",
            self.approved, self.pending, self.rejected
        )
    }
}

pub struct ProfileController {
    api: DiaryApi,
    auth: AuthService,
    page_size: u32,
    max_pages: u32,
}

impl ProfileController {
    pub fn new(api: DiaryApi, auth: AuthService, page_size: u32, max_pages: u32) -> Self {
        Self {
            api,
            auth,
            page_size: page_size.max(1),
            max_pages: max_pages.max(1),
        }
    }

    /// The stored user; sends the host to the login screen when there is
    /// none.
    pub async fn current_user(&self) -> Result<UserInfo> {
        let session = self.auth.session().snapshot().await?;
        match session.user {
            Some(user) if session.is_logged_in() => Ok(user),
            _ => {
                self.api.client().schedule_login_redirect();
                Err(AppError::NotLoggedIn)
            }
        }
    }

    /// Every diary of the logged-in user, fetched page by page.
    ///
    /// Stops at the last page, at a page that adds nothing new (backends
    /// that ignore `page` repeat themselves), or after `max_pages` pages.
    pub async fn all_diaries(&self) -> Result<Vec<Diary>> {
        self.current_user().await?;

        let mut seen = HashSet::new();
        let mut diaries = Vec::new();
        for page in 1..=self.max_pages {
            let result = self.api.mine(&PageQuery::new(page, self.page_size)).await?;
            let received = result.items.len();
            let before = diaries.len();
            diaries.extend(
                result
                    .items
                    .into_iter()
                    .filter(|d| seen.insert(d.id.clone())),
            );

            if diaries.len() == before {
                log::debug!("Page {} added no new diaries, stopping", page);
                break;
            }
            if !has_more_pages(page, self.page_size, received, result.total, result.total_pages) {
                break;
            }
            if page == self.max_pages {
                log::warn!("Stopped after {} pages of own diaries", page);
            }
        }
        Ok(diaries)
    }

    /// Count the user's diaries per moderation state.
    pub async fn moderation_summary(&self) -> Result<ModerationSummary> {
        let summary = ModerationSummary::from_diaries(&self.all_diaries().await?);
        log::debug!("Moderation summary: {}", summary);
        Ok(summary)
    }

    /// End the session and head back to the login screen.
    pub async fn logout(&self) -> Result<()> {
        self.auth.logout().await?;
        self.api.client().schedule_login_redirect();
        Ok(())
    }

    /// Title and reason of each rejected diary.
    pub fn rejection_notes(diaries: &[Diary]) -> Vec<(String, String)> {
        diaries
            .iter()
            .filter(|d| d.status == DiaryStatus::Rejected)
            .map(|d| {
                (
                    d.title.clone(),
                    d.reject_reason
                        .clone()
                        .unwrap_or_else(|| "No reason given".to_string()),
                )
            })
            .collect()
    }
}
