//! Login, registration and logout.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::api::AuthApi;
use crate::error::{AppError, Result};
use crate::models::{AuthResponse, SavedCredentials, UserInfo};
use crate::notify::{Notice, Notifier};
use crate::session::SessionStore;

/// Login form input.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Keep the credentials for the next visit
    pub remember: bool,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            remember: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(AppError::validation("Please enter a username"));
        }
        if self.password.trim().is_empty() {
            return Err(AppError::validation("Please enter a password"));
        }
        Ok(())
    }
}

/// Registration form input.
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub nickname: Option<String>,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(AppError::validation("Please enter a username"));
        }
        if self.password.trim().is_empty() {
            return Err(AppError::validation("Please enter a password"));
        }
        if self.password != self.confirm_password {
            return Err(AppError::validation("Passwords do not match"));
        }
        Ok(())
    }
}

/// Checks credentials and creates accounts.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse>;

    /// Create an account; `Some` when the new user is logged in right away.
    async fn register(&self, form: &RegisterForm) -> Result<Option<AuthResponse>>;
}

/// Authenticates against the backend.
#[derive(Clone)]
pub struct RemoteAuthenticator {
    api: AuthApi,
}

impl RemoteAuthenticator {
    pub fn new(api: AuthApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Authenticator for RemoteAuthenticator {
    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        self.api.login(username, password).await
    }

    async fn register(&self, form: &RegisterForm) -> Result<Option<AuthResponse>> {
        self.api
            .register(form.username.trim(), &form.password, form.nickname.as_deref())
            .await
    }
}

#[derive(Debug, Clone)]
struct MockAccount {
    user: UserInfo,
    password: String,
}

/// Demo accounts held in memory; never touches the network.
///
/// Starts with the `admin` / `admin` account.
#[derive(Debug)]
pub struct MockAuthenticator {
    accounts: Mutex<Vec<MockAccount>>,
}

impl MockAuthenticator {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(vec![MockAccount {
                user: UserInfo {
                    id: "1".into(),
                    username: "admin".into(),
                    nickname: "admin".into(),
                    avatar_url: String::new(),
                },
                password: "admin".into(),
            }]),
        }
    }

    fn token_for(user: &UserInfo) -> String {
        format!("mock_token_{}_{}", user.id, Utc::now().timestamp_millis())
    }
}

impl Default for MockAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        let accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        let account = accounts
            .iter()
            .find(|a| a.user.username == username && a.password == password)
            .ok_or_else(|| AppError::server(400, "Incorrect username or password"))?;

        Ok(AuthResponse {
            token: Self::token_for(&account.user),
            user: account.user.clone(),
        })
    }

    async fn register(&self, form: &RegisterForm) -> Result<Option<AuthResponse>> {
        let mut accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        let username = form.username.trim();
        if accounts.iter().any(|a| a.user.username == username) {
            return Err(AppError::server(409, "Username already exists"));
        }

        let user = UserInfo {
            id: (accounts.len() + 1).to_string(),
            username: username.to_string(),
            nickname: form
                .nickname
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| username.to_string()),
            avatar_url: String::new(),
        };
        log::info!("Registered mock account '{}'", user.username);
        accounts.push(MockAccount {
            user,
            password: form.password.clone(),
        });
        Ok(None)
    }
}

/// Session lifecycle on top of an [`Authenticator`].
#[derive(Clone)]
pub struct AuthService {
    authenticator: Arc<dyn Authenticator>,
    session: SessionStore,
    notifier: Arc<dyn Notifier>,
}

impl AuthService {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        session: SessionStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            authenticator,
            session,
            notifier,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Validate the form, authenticate and store the session.
    pub async fn login(&self, form: &LoginForm) -> Result<UserInfo> {
        self.check(form.validate())?;

        let username = form.username.trim();
        let response = self
            .authenticator
            .login(username, &form.password)
            .await
            .inspect_err(|e| self.report(e))?;

        self.session.start(&response.token, &response.user).await?;
        if form.remember {
            self.session
                .set_saved_credentials(&SavedCredentials {
                    username: username.to_string(),
                    password: form.password.clone(),
                })
                .await?;
        } else {
            self.session.clear_saved_credentials().await?;
        }

        log::info!("Logged in as '{}'", response.user.username);
        self.notifier.notify(Notice::success("Login successful"));
        Ok(response.user)
    }

    /// Validate the form and create the account. Returns the user when the
    /// backend logged them in straight away.
    pub async fn register(&self, form: &RegisterForm) -> Result<Option<UserInfo>> {
        self.check(form.validate())?;

        let response = self
            .authenticator
            .register(form)
            .await
            .inspect_err(|e| self.report(e))?;

        match response {
            Some(response) => {
                self.session.start(&response.token, &response.user).await?;
                self.notifier.notify(Notice::success("Registration successful"));
                Ok(Some(response.user))
            }
            None => {
                self.notifier
                    .notify(Notice::success("Registration successful, please log in"));
                Ok(None)
            }
        }
    }

    pub async fn logout(&self) -> Result<()> {
        self.session.clear().await?;
        log::info!("Logged out");
        self.notifier.notify(Notice::success("Logged out"));
        Ok(())
    }

    /// Credentials remembered from an earlier login, for prefilling.
    pub async fn remembered(&self) -> Result<Option<SavedCredentials>> {
        self.session.get_saved_credentials().await
    }

    fn check(&self, validation: Result<()>) -> Result<()> {
        validation.inspect_err(|e| self.notifier.notify(Notice::warning(e.user_message())))
    }

    /// Surface failures the request layer did not already report.
    fn report(&self, e: &AppError) {
        if !matches!(
            e,
            AppError::Server { .. } | AppError::Network(_) | AppError::SessionExpired
        ) {
            self.notifier.notify(Notice::error(e.user_message()));
        }
    }
}
