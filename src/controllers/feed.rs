//! Diary list sources: the public feed (and its search) and "my diaries".

use async_trait::async_trait;

use crate::api::DiaryApi;
use crate::controllers::list::{ListController, ListSource};
use crate::error::{AppError, Result};
use crate::models::{Diary, DiaryStatus, PageQuery, PageResult};
use crate::notify::Notice;
use crate::resource::ResourceUrls;

/// Public feed of approved diaries; a search term narrows it.
#[derive(Clone)]
pub struct FeedSource {
    api: DiaryApi,
    urls: ResourceUrls,
}

impl FeedSource {
    pub fn new(api: DiaryApi, urls: ResourceUrls) -> Self {
        Self { api, urls }
    }
}

#[async_trait]
impl ListSource for FeedSource {
    type Item = Diary;

    async fn fetch(&self, query: &PageQuery) -> Result<PageResult<Diary>> {
        let mut page = self.api.list(query).await?;
        for diary in &mut page.items {
            self.urls.absolutize(diary);
        }
        Ok(page)
    }
}

/// The logged-in user's diaries, in every moderation state unless filtered.
#[derive(Clone)]
pub struct MyDiariesSource {
    api: DiaryApi,
    urls: ResourceUrls,
    status: Option<DiaryStatus>,
}

impl MyDiariesSource {
    pub fn new(api: DiaryApi, urls: ResourceUrls) -> Self {
        Self {
            api,
            urls,
            status: None,
        }
    }

    pub fn with_status(mut self, status: DiaryStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[async_trait]
impl ListSource for MyDiariesSource {
    type Item = Diary;

    async fn fetch(&self, query: &PageQuery) -> Result<PageResult<Diary>> {
        let client = self.api.client();
        if !client.session().is_logged_in().await? {
            client
                .notifier()
                .notify(Notice::warning(AppError::NotLoggedIn.user_message()));
            client.schedule_login_redirect();
            return Err(AppError::NotLoggedIn);
        }

        let mut query = query.clone();
        query.status = self.status;
        let mut page = self.api.mine(&query).await?;
        for diary in &mut page.items {
            self.urls.absolutize(diary);
        }
        Ok(page)
    }
}

pub type FeedController = ListController<FeedSource>;
pub type MyDiariesController = ListController<MyDiariesSource>;
