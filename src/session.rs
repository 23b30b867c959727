// src/session.rs

//! Session persistence on top of a durable key-value store.
//!
//! The store is injected; nothing here reaches for process-wide state.

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::models::{SavedCredentials, Session, UserInfo};
use crate::storage::KeyValueStore;

const TOKEN_KEY: &str = "token";
const USER_INFO_KEY: &str = "userInfo";
const CREDENTIALS_KEY: &str = "savedCredentials";

/// Token and user-profile bookkeeping.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn set_token(&self, token: &str) -> Result<()> {
        self.store.set(TOKEN_KEY, Value::from(token)).await
    }

    /// Stored token; empty or non-string values read as `None`.
    pub async fn get_token(&self) -> Result<Option<String>> {
        Ok(match self.store.get(TOKEN_KEY).await? {
            Some(Value::String(token)) if !token.is_empty() => Some(token),
            _ => None,
        })
    }

    pub async fn clear_token(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY).await
    }

    pub async fn set_user_info(&self, user: &UserInfo) -> Result<()> {
        self.store
            .set(USER_INFO_KEY, serde_json::to_value(user)?)
            .await
    }

    /// Stored profile. A record that no longer decodes reads as absent.
    pub async fn get_user_info(&self) -> Result<Option<UserInfo>> {
        let Some(value) = self.store.get(USER_INFO_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                log::warn!("Ignoring unreadable user record: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn clear_user_info(&self) -> Result<()> {
        self.store.remove(USER_INFO_KEY).await
    }

    pub async fn set_saved_credentials(&self, credentials: &SavedCredentials) -> Result<()> {
        self.store
            .set(CREDENTIALS_KEY, serde_json::to_value(credentials)?)
            .await
    }

    pub async fn get_saved_credentials(&self) -> Result<Option<SavedCredentials>> {
        Ok(self
            .store
            .get(CREDENTIALS_KEY)
            .await?
            .and_then(|value| serde_json::from_value(value).ok()))
    }

    pub async fn clear_saved_credentials(&self) -> Result<()> {
        self.store.remove(CREDENTIALS_KEY).await
    }

    /// True iff a non-empty token is stored. Decides whether requests
    /// carry an `Authorization` header.
    pub async fn has_token(&self) -> Result<bool> {
        Ok(self.get_token().await?.is_some())
    }

    /// True iff a non-empty token and a readable user record are both stored.
    pub async fn is_logged_in(&self) -> Result<bool> {
        Ok(self.snapshot().await?.is_logged_in())
    }

    pub async fn snapshot(&self) -> Result<Session> {
        Ok(Session {
            token: self.get_token().await?,
            user: self.get_user_info().await?,
        })
    }

    /// Store a fresh login.
    pub async fn start(&self, token: &str, user: &UserInfo) -> Result<()> {
        self.set_token(token).await?;
        self.set_user_info(user).await
    }

    /// Drop token and user record. Saved credentials are kept.
    pub async fn clear(&self) -> Result<()> {
        self.clear_token().await?;
        self.clear_user_info().await
    }
}
