// src/app.rs

//! Wiring of configuration, environment, session and controllers.

use std::sync::Arc;

use crate::api::{AuthApi, DiaryApi, UploadApi};
use crate::controllers::{
    AuthService, Authenticator, DetailController, DiaryEditor, FeedController, FeedSource,
    ListController, MockAuthenticator, MyDiariesController, MyDiariesSource, ProfileController,
    RemoteAuthenticator,
};
use crate::environment::{EnvironmentResolver, HostProbe};
use crate::error::Result;
use crate::http::ApiClient;
use crate::models::{AuthMode, Config};
use crate::notify::Notifier;
use crate::resource::ResourceUrls;
use crate::session::SessionStore;
use crate::storage::KeyValueStore;

/// One client instance: shared session, transport and environment.
#[derive(Clone)]
pub struct TravelogApp {
    config: Arc<Config>,
    client: ApiClient,
    urls: ResourceUrls,
    authenticator: Arc<dyn Authenticator>,
}

impl TravelogApp {
    pub fn new(
        config: Config,
        probe: Arc<dyn HostProbe>,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let env = EnvironmentResolver::new(config.api.clone(), probe);
        let session = SessionStore::new(store);
        let client = ApiClient::from_config(&config, env.clone(), session, notifier)?;
        let urls = ResourceUrls::new(env);

        let authenticator: Arc<dyn Authenticator> = match config.auth.mode {
            AuthMode::Remote => Arc::new(RemoteAuthenticator::new(AuthApi::new(client.clone()))),
            AuthMode::Mock => {
                log::info!("Using built-in demo accounts");
                Arc::new(MockAuthenticator::new())
            }
        };

        Ok(Self {
            config: Arc::new(config),
            client,
            urls,
            authenticator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn environment(&self) -> &EnvironmentResolver {
        self.client.environment()
    }

    pub fn session(&self) -> &SessionStore {
        self.client.session()
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn urls(&self) -> &ResourceUrls {
        &self.urls
    }

    pub fn diaries(&self) -> DiaryApi {
        DiaryApi::new(self.client.clone())
    }

    pub fn uploads(&self) -> UploadApi {
        UploadApi::new(self.client.clone())
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(
            Arc::clone(&self.authenticator),
            self.session().clone(),
            Arc::clone(self.client.notifier()),
        )
    }

    pub fn feed(&self) -> FeedController {
        ListController::new(
            FeedSource::new(self.diaries(), self.urls.clone()),
            self.config.list.page_size,
        )
    }

    pub fn my_diaries(&self) -> MyDiariesController {
        ListController::new(
            MyDiariesSource::new(self.diaries(), self.urls.clone()),
            self.config.list.page_size,
        )
    }

    pub fn detail(&self) -> DetailController {
        DetailController::new(self.diaries(), self.urls.clone())
    }

    pub fn editor(&self) -> DiaryEditor {
        DiaryEditor::new(self.diaries(), self.uploads(), self.config.editor.clone())
    }

    pub fn profile(&self) -> ProfileController {
        ProfileController::new(
            self.diaries(),
            self.auth(),
            self.config.list.page_size,
            self.config.list.max_pages,
        )
    }
}
