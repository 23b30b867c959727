//! Login and registration endpoints.

use serde_json::json;

use crate::api::{decode, decode_optional, endpoints};
use crate::error::Result;
use crate::http::ApiClient;
use crate::models::AuthResponse;

#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        let body = json!({ "username": username, "password": password });
        decode(self.client.post(endpoints::LOGIN, &body).await?)
    }

    /// Register an account. Backends that log the new user in straight
    /// away answer with a token, others with a bare message.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        nickname: Option<&str>,
    ) -> Result<Option<AuthResponse>> {
        let mut body = json!({ "username": username, "password": password });
        if let Some(nickname) = nickname.filter(|n| !n.trim().is_empty()) {
            body["nickname"] = json!(nickname.trim());
        }
        let value = self.client.post(endpoints::REGISTER, &body).await?;
        Ok(decode_optional(value))
    }
}
