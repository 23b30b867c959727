//! Create and edit diaries, uploading local media first.

use std::path::PathBuf;

use futures::future::try_join_all;
use unicode_segmentation::UnicodeSegmentation;

use crate::api::{DiaryApi, UploadApi};
use crate::error::{AppError, Result};
use crate::models::{Diary, DiaryDraft, EditorConfig, MediaFile, UploadKind};
use crate::notify::Notice;

/// Where a piece of media lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Already stored on the server
    Remote(String),
    /// On this device, uploaded on submit
    Local(PathBuf),
}

impl MediaSource {
    pub fn is_local(&self) -> bool {
        matches!(self, MediaSource::Local(_))
    }
}

impl From<PathBuf> for MediaSource {
    fn from(path: PathBuf) -> Self {
        MediaSource::Local(path)
    }
}

/// Form state of the diary editor.
pub struct DiaryEditor {
    diaries: DiaryApi,
    uploads: UploadApi,
    limits: EditorConfig,
    editing: Option<String>,
    title: String,
    content: String,
    images: Vec<MediaSource>,
    video: Option<MediaSource>,
}

impl DiaryEditor {
    pub fn new(diaries: DiaryApi, uploads: UploadApi, limits: EditorConfig) -> Self {
        Self {
            diaries,
            uploads,
            limits,
            editing: None,
            title: String::new(),
            content: String::new(),
            images: Vec::new(),
            video: None,
        }
    }

    /// Id of the diary being edited, `None` for a new one.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn images(&self) -> &[MediaSource] {
        &self.images
    }

    pub fn video(&self) -> Option<&MediaSource> {
        self.video.as_ref()
    }

    /// Prefill the form from an existing diary.
    pub async fn load(&mut self, id: &str) -> Result<()> {
        let diary = self.diaries.get(id).await?;
        self.editing = Some(diary.id.clone());
        self.title = diary.title;
        self.content = diary.content;
        self.images = diary.images.into_iter().map(MediaSource::Remote).collect();
        self.video = diary
            .video_url
            .filter(|v| !v.is_empty())
            .map(MediaSource::Remote);
        Ok(())
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Append images up to the configured maximum. Returns how many were
    /// taken.
    pub fn add_images(&mut self, images: impl IntoIterator<Item = MediaSource>) -> usize {
        let room = self.limits.max_images.saturating_sub(self.images.len());
        let mut images = images.into_iter();
        let before = self.images.len();
        self.images.extend(images.by_ref().take(room));
        let added = self.images.len() - before;

        if images.next().is_some() {
            self.notify(Notice::warning(format!(
                "At most {} images per diary",
                self.limits.max_images
            )));
        }
        added
    }

    pub fn remove_image(&mut self, index: usize) -> Option<MediaSource> {
        (index < self.images.len()).then(|| self.images.remove(index))
    }

    pub fn set_video(&mut self, video: Option<MediaSource>) {
        self.video = video;
    }

    /// Check the form without sending anything.
    pub fn validate(&self) -> Result<()> {
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() {
            return Err(AppError::validation("Please enter a title"));
        }
        if content.is_empty() {
            return Err(AppError::validation("Please enter the diary content"));
        }
        if title.graphemes(true).count() > self.limits.max_title_len {
            return Err(AppError::validation(format!(
                "Title must be at most {} characters",
                self.limits.max_title_len
            )));
        }
        if content.graphemes(true).count() > self.limits.max_content_len {
            return Err(AppError::validation(format!(
                "Content must be at most {} characters",
                self.limits.max_content_len
            )));
        }
        if self.images.len() > self.limits.max_images {
            return Err(AppError::validation(format!(
                "At most {} images per diary",
                self.limits.max_images
            )));
        }
        Ok(())
    }

    /// Upload local media, then create or update the diary.
    ///
    /// A failed image upload aborts; a failed video upload only drops the
    /// video. Returns the stored diary when the server echoes it.
    pub async fn submit(&mut self) -> Result<Option<Diary>> {
        let client = self.diaries.client();
        if !client.session().is_logged_in().await? {
            client
                .notifier()
                .notify(Notice::warning(AppError::NotLoggedIn.user_message()));
            client.schedule_login_redirect();
            return Err(AppError::NotLoggedIn);
        }
        if let Err(e) = self.validate() {
            self.notify(Notice::warning(e.user_message()));
            return Err(e);
        }

        let images = match self.upload_images().await {
            Ok(images) => images,
            Err(e) => {
                log::error!("Image upload failed: {}", e);
                self.notify(Notice::error("Image upload failed"));
                return Err(e);
            }
        };
        // Keep the stored paths so a retry does not upload twice.
        self.images = images.iter().cloned().map(MediaSource::Remote).collect();

        let video_url = self.upload_video().await;

        let draft = DiaryDraft {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            cover_image: images.first().cloned().unwrap_or_default(),
            images,
            video_url,
        };

        let saved = match self.editing.as_deref() {
            Some(id) => {
                let saved = self.diaries.update(id, &draft).await?;
                log::info!("Updated diary {}", id);
                self.notify(Notice::success("Diary updated"));
                saved
            }
            None => {
                let saved = self.diaries.create(&draft).await?;
                log::info!("Published diary '{}'", draft.title);
                self.notify(Notice::success("Diary published, awaiting review"));
                saved
            }
        };
        Ok(saved)
    }

    /// Server paths for every image, in form order.
    async fn upload_images(&self) -> Result<Vec<String>> {
        let local: Vec<&PathBuf> = self
            .images
            .iter()
            .filter_map(|m| match m {
                MediaSource::Local(path) => Some(path),
                MediaSource::Remote(_) => None,
            })
            .collect();

        let files = try_join_all(local.into_iter().map(|path| MediaFile::from_path(path))).await?;
        let mut uploaded = self
            .uploads
            .upload(files, UploadKind::Image)
            .await?
            .into_iter();

        let mut paths = Vec::with_capacity(self.images.len());
        for image in &self.images {
            match image {
                MediaSource::Remote(path) => paths.push(path.clone()),
                MediaSource::Local(path) => {
                    let stored = uploaded.next().ok_or_else(|| {
                        AppError::upload(path.display().to_string(), "missing from upload answer")
                    })?;
                    paths.push(stored);
                }
            }
        }
        Ok(paths)
    }

    async fn upload_video(&mut self) -> Option<String> {
        let path = match self.video.as_ref()? {
            MediaSource::Remote(url) => return Some(url.clone()),
            MediaSource::Local(path) => path.clone(),
        };

        let result = async {
            let file = MediaFile::from_path(&path).await?;
            self.uploads.upload(vec![file], UploadKind::Video).await
        }
        .await;

        match result {
            Ok(urls) => {
                let url = urls.into_iter().next()?;
                self.video = Some(MediaSource::Remote(url.clone()));
                Some(url)
            }
            Err(e) => {
                log::warn!("Video upload failed for {}: {}", path.display(), e);
                self.notify(Notice::warning(
                    "Video upload failed, publishing without video",
                ));
                None
            }
        }
    }

    fn notify(&self, notice: Notice) {
        self.diaries.client().notifier().notify(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::environment::{EnvironmentResolver, StaticProbe};
    use crate::http::ApiClient;
    use crate::models::{ApiConfig, SessionConfig};
    use crate::notify::RecordingNotifier;
    use crate::session::SessionStore;
    use crate::storage::MemoryStore;

    fn editor(limits: EditorConfig) -> (DiaryEditor, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let env = EnvironmentResolver::new(
            ApiConfig::default(),
            Arc::new(StaticProbe::web("localhost", Some(3000))),
        );
        let client = ApiClient::new(
            reqwest::Client::new(),
            env,
            SessionStore::new(Arc::new(MemoryStore::new())),
            notifier.clone(),
            SessionConfig::default(),
        );
        let editor = DiaryEditor::new(
            DiaryApi::new(client.clone()),
            UploadApi::new(client),
            limits,
        );
        (editor, notifier)
    }

    fn local(name: &str) -> MediaSource {
        MediaSource::Local(PathBuf::from(name))
    }

    #[test]
    fn test_add_images_respects_limit() {
        let limits = EditorConfig {
            max_images: 3,
            ..EditorConfig::default()
        };
        let (mut e, notifier) = editor(limits);

        assert_eq!(e.add_images(vec![local("a.jpg"), local("b.jpg")]), 2);
        assert_eq!(e.add_images(vec![local("c.jpg"), local("d.jpg")]), 1);
        assert_eq!(e.images().len(), 3);
        assert_eq!(notifier.notices()[0].message, "At most 3 images per diary");

        assert_eq!(e.remove_image(0), Some(local("a.jpg")));
        assert_eq!(e.remove_image(5), None);
        assert_eq!(e.add_images(vec![local("d.jpg")]), 1);
    }

    #[test]
    fn test_validate() {
        let (mut e, _) = editor(EditorConfig::default());
        assert!(matches!(e.validate(), Err(AppError::Validation(_))));

        e.set_title("  Kyoto  ");
        assert!(matches!(e.validate(), Err(AppError::Validation(_))));

        e.set_content("Temples.");
        assert!(e.validate().is_ok());

        e.set_title("京".repeat(51));
        assert!(matches!(e.validate(), Err(AppError::Validation(_))));
        e.set_title("京".repeat(50));
        assert!(e.validate().is_ok());
    }

    #[tokio::test]
    async fn test_submit_requires_login() {
        let (mut e, notifier) = editor(EditorConfig::default());
        e.set_title("t");
        e.set_content("c");

        let err = e.submit().await.unwrap_err();
        assert!(matches!(err, AppError::NotLoggedIn));
        assert_eq!(notifier.notices()[0].message, "Please log in first");
    }
}
