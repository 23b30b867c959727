// src/utils/url.rs

//! URL manipulation utilities.

/// Whether `path` is an absolute `http://` or `https://` URL.
pub fn is_http_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Whether `path` carries any URL scheme (`https://`, `wxfile://`, ...).
pub fn has_scheme(path: &str) -> bool {
    match path.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Whether `path` begins with the path segment `prefix` (`/api`, `/api/x`,
/// `/api?q`), as opposed to merely sharing characters (`/apis`).
fn starts_with_segment(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(['/', '?', '#']),
        None => false,
    }
}

/// Drop a trailing `prefix` segment from `base`.
///
/// # Examples
/// ```
/// use travelog::utils::url::strip_api_suffix;
///
/// assert_eq!(strip_api_suffix("http://h:5000/api", "/api"), "http://h:5000");
/// assert_eq!(strip_api_suffix("/api", "/api"), "");
/// ```
pub fn strip_api_suffix(base: &str, prefix: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    trimmed
        .strip_suffix(prefix)
        .unwrap_or(trimmed)
        .to_string()
}

/// Build the request URL for `path` against the API base.
///
/// Absolute URLs pass through. Paths that already begin with `prefix` are
/// appended to the base with its own `prefix` removed, so it appears once.
///
/// # Examples
/// ```
/// use travelog::utils::url::join_api_url;
///
/// let base = "http://h:5000/api";
/// assert_eq!(join_api_url(base, "/api", "diaries"), "http://h:5000/api/diaries");
/// assert_eq!(join_api_url(base, "/api", "/api/diaries"), "http://h:5000/api/diaries");
/// ```
pub fn join_api_url(base: &str, prefix: &str, path: &str) -> String {
    if is_http_url(path) {
        return path.to_string();
    }

    if starts_with_segment(path, prefix) {
        return format!("{}{}", strip_api_suffix(base, prefix), path);
    }

    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Turn a server-relative media path into a URL under `resource_base`.
///
/// Empty input stays empty, URLs with a scheme are returned unchanged, and
/// with an empty base the path is returned with a single leading `/`.
///
/// # Examples
/// ```
/// use travelog::utils::url::to_absolute;
///
/// assert_eq!(to_absolute("http://h:5000", "uploads/a.jpg"), "http://h:5000/uploads/a.jpg");
/// assert_eq!(to_absolute("", "uploads/a.jpg"), "/uploads/a.jpg");
/// ```
pub fn to_absolute(resource_base: &str, path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        return String::new();
    }
    if has_scheme(path) {
        return path.to_string();
    }

    let normalized = format!("/{}", path.trim_start_matches('/'));
    let base = resource_base.trim_end_matches('/');
    if base.is_empty() {
        normalized
    } else {
        format!("{base}{normalized}")
    }
}
