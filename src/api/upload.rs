//! Multipart media upload.

use reqwest::multipart::{Form, Part};

use crate::api::{decode, endpoints};
use crate::error::{AppError, Result};
use crate::http::ApiClient;
use crate::models::{MediaFile, UploadKind, UploadResponse};

#[derive(Clone)]
pub struct UploadApi {
    client: ApiClient,
}

impl UploadApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Upload files of one kind in a single request and return their
    /// server-relative paths, in order.
    pub async fn upload(&self, files: Vec<MediaFile>, kind: UploadKind) -> Result<Vec<String>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let count = files.len();
        let names: Vec<String> = files.iter().map(|f| f.file_name.clone()).collect();
        let form = build_form(files, kind)?;

        log::info!("Uploading {} {} file(s)", count, kind);
        let response: UploadResponse = decode(
            self.client
                .post_multipart(endpoints::UPLOAD, form)
                .await?,
        )?;

        if response.urls.len() < count {
            return Err(AppError::upload(
                names.join(", "),
                format!("server stored {} of {} files", response.urls.len(), count),
            ));
        }
        Ok(response.urls)
    }
}

fn build_form(files: Vec<MediaFile>, kind: UploadKind) -> Result<Form> {
    let mut form = Form::new().text(endpoints::UPLOAD_KIND_FIELD, kind.as_str());
    for file in files {
        let mime = kind.mime_for(&file.file_name);
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(mime)?;
        form = form.part(endpoints::UPLOAD_FILES_FIELD, part);
    }
    Ok(form)
}
