//! Endpoint paths, relative to the API base.

pub const LOGIN: &str = "/auth/login";
pub const REGISTER: &str = "/auth/register";

pub const DIARIES: &str = "/diaries";
pub const MY_DIARIES: &str = "/diaries/my";

pub const UPLOAD: &str = "/upload";

/// Multipart field carrying the files.
pub const UPLOAD_FILES_FIELD: &str = "files";
/// Multipart field naming the media kind.
pub const UPLOAD_KIND_FIELD: &str = "type";

pub fn diary(id: &str) -> String {
    format!("{DIARIES}/{}", id.trim())
}

pub fn like(id: &str) -> String {
    format!("{}/like", diary(id))
}

pub fn comments(id: &str) -> String {
    format!("{}/comments", diary(id))
}
