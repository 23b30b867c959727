//! Diary endpoints.

use serde_json::json;

use crate::api::{decode, decode_optional, endpoints};
use crate::error::Result;
use crate::http::ApiClient;
use crate::models::{Comment, Diary, DiaryDraft, LikeState, PageQuery, PageResult};

#[derive(Clone)]
pub struct DiaryApi {
    client: ApiClient,
}

impl DiaryApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Public feed; a keyword turns it into a search.
    pub async fn list(&self, query: &PageQuery) -> Result<PageResult<Diary>> {
        decode(self.client.get(endpoints::DIARIES, query).await?)
    }

    /// Diaries of the logged-in user, whatever their moderation state.
    pub async fn mine(&self, query: &PageQuery) -> Result<PageResult<Diary>> {
        decode(self.client.get(endpoints::MY_DIARIES, query).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Diary> {
        decode(self.client.get(&endpoints::diary(id), &()).await?)
    }

    /// Publish a diary. The created record is returned when the server
    /// echoes it.
    pub async fn create(&self, draft: &DiaryDraft) -> Result<Option<Diary>> {
        let value = self.client.post(endpoints::DIARIES, draft).await?;
        Ok(decode_optional(value))
    }

    pub async fn update(&self, id: &str, draft: &DiaryDraft) -> Result<Option<Diary>> {
        let value = self.client.put(&endpoints::diary(id), draft).await?;
        Ok(decode_optional(value))
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&endpoints::diary(id)).await?;
        Ok(())
    }

    pub async fn like(&self, id: &str) -> Result<LikeState> {
        let value = self.client.post(&endpoints::like(id), &json!({})).await?;
        Ok(decode_optional(value).unwrap_or_default())
    }

    pub async fn comment(&self, id: &str, content: &str) -> Result<Option<Comment>> {
        let body = json!({ "content": content });
        let value = self.client.post(&endpoints::comments(id), &body).await?;
        Ok(decode_optional(value))
    }
}
