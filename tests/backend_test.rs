//! End-to-end tests against an in-process fake backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use travelog::{
    TravelogApp,
    controllers::{LoadOutcome, LoginForm, MediaSource},
    environment::StaticProbe,
    error::AppError,
    models::{Config, UserInfo},
    notify::{Notice, NoticeLevel, RecordingNotifier},
    storage::MemoryStore,
};

async fn spawn(router: Router) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    port
}

fn app_with(config: Config, probe: StaticProbe) -> (TravelogApp, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let app = TravelogApp::new(
        config,
        Arc::new(probe),
        Arc::new(MemoryStore::new()),
        notifier.clone(),
    )
    .unwrap();
    (app, notifier)
}

/// Client whose API base points straight at the fake backend.
fn app_for(port: u16) -> (TravelogApp, Arc<RecordingNotifier>) {
    let mut config = Config::default();
    config.api.backend_port = port;
    config.list.page_size = 8;
    config.session.redirect_delay_ms = 10;
    app_with(config, StaticProbe::web("127.0.0.1", None))
}

fn mei() -> UserInfo {
    UserInfo {
        id: "7".into(),
        username: "mei".into(),
        nickname: "Mei".into(),
        avatar_url: String::new(),
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["username"] == "mei" && body["password"] == "pw" {
        Json(json!({
            "token": "t1",
            "user": {"id": 7, "username": "mei", "nickname": "Mei"}
        }))
        .into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Incorrect username or password"})),
        )
            .into_response()
    }
}

async fn my_diaries(headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some("Bearer t1") => Json(json!({
            "data": [
                {"id": 1, "title": "Kyoto", "status": "approved", "author": {"id": 7}},
                {"id": 2, "title": "Osaka", "status": "rejected", "rejectReason": "blurry", "author": {"id": 7}}
            ],
            "total": 2
        }))
        .into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

#[tokio::test]
async fn test_login_stores_session_and_sends_token() {
    let router = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/diaries/my", get(my_diaries));
    let (app, notifier) = app_for(spawn(router).await);

    let user = app
        .auth()
        .login(&LoginForm::new("mei", "pw"))
        .await
        .unwrap();
    assert_eq!(user.display_name(), "Mei");
    assert_eq!(app.session().get_token().await.unwrap().as_deref(), Some("t1"));
    assert!(app.session().is_logged_in().await.unwrap());
    assert_eq!(notifier.notices().last(), Some(&Notice::success("Login successful")));

    let mine = app.my_diaries();
    let outcome = mine.refresh().await.unwrap();
    assert_eq!(
        outcome,
        LoadOutcome::Applied {
            received: 2,
            has_more: false
        }
    );

    let summary = app.profile().moderation_summary().await.unwrap();
    assert_eq!((summary.approved, summary.rejected), (1, 1));
}

#[tokio::test]
async fn test_rejected_login_surfaces_server_message() {
    let router = Router::new().route("/api/auth/login", post(login));
    let (app, notifier) = app_for(spawn(router).await);

    let err = app
        .auth()
        .login(&LoginForm::new("mei", "wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Server { status: 400, .. }));
    assert_eq!(
        notifier.notices(),
        vec![Notice::error("Incorrect username or password")]
    );
    assert!(!app.session().is_logged_in().await.unwrap());
}

#[tokio::test]
async fn test_unauthorized_clears_session_and_redirects() {
    let router = Router::new().route(
        "/api/diaries/{id}",
        get(|| async { StatusCode::UNAUTHORIZED }),
    );
    let (app, notifier) = app_for(spawn(router).await);
    app.session().start("stale", &mei()).await.unwrap();

    let err = app.detail().load("5").await.unwrap_err();
    assert!(matches!(err, AppError::SessionExpired));
    assert!(app.session().get_token().await.unwrap().is_none());
    assert!(app.session().get_user_info().await.unwrap().is_none());
    assert_eq!(
        notifier.notices(),
        vec![Notice::error("Session expired, please log in again")]
    );

    app.client().finish_redirect().await;
    assert_eq!(notifier.routes(), vec!["/pages/login/index"]);
}

fn own_diary(id: usize) -> Value {
    json!({"id": id, "title": format!("Trip {id}"), "status": "pending", "author": {"id": 7}})
}

/// Backend that ignores `page` and always answers with the same full page.
async fn same_page_every_time(State(hits): State<Arc<AtomicUsize>>) -> Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    Json(Value::Array((1..=8).map(own_diary).collect()))
}

/// Backend with endless full pages and no totals.
async fn endless_pages(
    State(hits): State<Arc<AtomicUsize>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let first = (page - 1) * 8 + 1;
    Json(Value::Array((first..first + 8).map(own_diary).collect()))
}

#[tokio::test]
async fn test_summary_stops_when_page_is_ignored() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/api/diaries/my", get(same_page_every_time))
        .with_state(hits.clone());
    let (app, _) = app_for(spawn(router).await);
    app.session().start("t1", &mei()).await.unwrap();

    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        app.profile().moderation_summary(),
    )
    .await
    .expect("summary should finish")
    .unwrap();
    assert_eq!(summary.total(), 8);
    assert_eq!(summary.pending, 8);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_all_diaries_respects_page_cap() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/api/diaries/my", get(endless_pages))
        .with_state(hits.clone());
    let port = spawn(router).await;

    let mut config = Config::default();
    config.api.backend_port = port;
    config.list.page_size = 8;
    config.list.max_pages = 3;
    let (app, _) = app_with(config, StaticProbe::web("127.0.0.1", None));
    app.session().start("t1", &mei()).await.unwrap();

    let diaries = app.profile().all_diaries().await.unwrap();
    assert_eq!(diaries.len(), 24);
    assert_eq!(diaries.last().map(|d| d.id.as_str()), Some("24"));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_network_failure_is_reported() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let (app, notifier) = app_for(port);

    let feed = app.feed();
    let err = feed.refresh().await.unwrap_err();
    assert!(matches!(err, AppError::Network(_)));
    assert_eq!(
        notifier.notices(),
        vec![Notice::error("Network error, please try again later")]
    );
    assert_eq!(
        feed.last_error().as_deref(),
        Some("Network error, please try again later")
    );
}

async fn feed_page(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let size: usize = params
        .get("pageSize")
        .and_then(|p| p.parse().ok())
        .unwrap_or(10);

    if let Some(keyword) = params.get("keyword") {
        return Json(json!({
            "list": [{"id": 99, "title": format!("About {keyword}"), "status": "approved"}],
            "total": 1
        }));
    }

    let total = 24;
    let start = (page - 1) * size;
    let items: Vec<Value> = (start..(start + size).min(total))
        .map(|i| {
            json!({
                "id": i + 1,
                "title": format!("Trip {}", i + 1),
                "coverImage": format!("/uploads/{}.jpg", i + 1),
                "author": "admin",
                "status": "approved"
            })
        })
        .collect();
    Json(json!({"data": items, "total": total}))
}

#[tokio::test]
async fn test_feed_pages_through_results() {
    let router = Router::new().route("/api/diaries", get(feed_page));
    let port = spawn(router).await;
    let (app, _) = app_for(port);
    let feed = app.feed();

    let mut seen = Vec::new();
    for _ in 0..3 {
        feed.load_more().await.unwrap();
        seen.push((feed.len(), feed.has_more()));
    }
    assert_eq!(seen, vec![(8, true), (16, true), (24, false)]);
    assert_eq!(feed.load_more().await.unwrap(), LoadOutcome::Exhausted);

    let items = feed.items();
    assert_eq!(items[0].author.display_name(), "admin");
    assert_eq!(
        items[0].cover_image,
        format!("http://127.0.0.1:{port}/uploads/1.jpg")
    );

    feed.set_search("kyoto").await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed.items()[0].title, "About kyoto");
}

#[tokio::test]
async fn test_dev_proxy_uses_page_origin() {
    let router = Router::new().route("/api/diaries", get(feed_page));
    let port = spawn(router).await;

    let mut config = Config::default();
    config.api.dev_server_ports = vec![port];
    let (app, _) = app_with(config, StaticProbe::web("127.0.0.1", Some(port)));
    assert_eq!(app.environment().resolve_api_base(), "/api");

    let feed = app.feed();
    feed.refresh().await.unwrap();
    // No resource base behind the proxy; paths stay relative.
    assert_eq!(feed.items()[0].cover_image, "/uploads/1.jpg");
}

#[derive(Clone, Default)]
struct Backend {
    drafts: Arc<Mutex<Vec<Value>>>,
    uploads: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

async fn upload(State(backend): State<Backend>, mut multipart: Multipart) -> Response {
    let mut kind = String::new();
    let mut names = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "type" {
            kind = field.text().await.unwrap();
        } else if name == "files" {
            names.push(field.file_name().unwrap_or_default().to_string());
            field.bytes().await.unwrap();
        }
    }
    backend
        .uploads
        .lock()
        .unwrap()
        .push((kind.clone(), names.clone()));

    if kind == "video" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "transcoder unavailable"})),
        )
            .into_response();
    }
    let urls: Vec<String> = names.iter().map(|n| format!("/uploads/{n}")).collect();
    Json(json!({ "urls": urls })).into_response()
}

async fn create(State(backend): State<Backend>, Json(body): Json<Value>) -> Json<Value> {
    let title = body["title"].clone();
    backend.drafts.lock().unwrap().push(body);
    Json(json!({"data": {"id": 42, "title": title, "status": "pending"}}))
}

fn editor_backend() -> (Router, Backend) {
    let backend = Backend::default();
    let router = Router::new()
        .route("/api/upload", post(upload))
        .route("/api/diaries", post(create))
        .with_state(backend.clone());
    (router, backend)
}

#[tokio::test]
async fn test_publish_uploads_media_then_creates() {
    let (router, backend) = editor_backend();
    let (app, notifier) = app_for(spawn(router).await);
    app.session().start("t1", &mei()).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.jpg");
    let b = dir.path().join("b.png");
    let clip = dir.path().join("clip.mp4");
    std::fs::write(&a, b"jpeg").unwrap();
    std::fs::write(&b, b"png").unwrap();
    std::fs::write(&clip, b"mp4").unwrap();

    let mut editor = app.editor();
    editor.set_title("Three days in Kyoto");
    editor.set_content("Temples and tea.");
    editor.add_images(vec![MediaSource::from(a), MediaSource::from(b)]);
    editor.set_video(Some(MediaSource::from(clip)));

    let diary = editor.submit().await.unwrap().unwrap();
    assert_eq!(diary.id, "42");

    let uploads = backend.uploads.lock().unwrap().clone();
    assert_eq!(
        uploads[0],
        ("image".to_string(), vec!["a.jpg".to_string(), "b.png".to_string()])
    );
    assert_eq!(uploads[1].0, "video");

    let drafts = backend.drafts.lock().unwrap().clone();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0]["images"], json!(["/uploads/a.jpg", "/uploads/b.png"]));
    assert_eq!(drafts[0]["coverImage"], "/uploads/a.jpg");
    assert!(drafts[0].get("videoUrl").is_none());

    let notices = notifier.notices();
    assert!(notices.contains(&Notice::warning(
        "Video upload failed, publishing without video"
    )));
    assert_eq!(
        notices.last(),
        Some(&Notice::success("Diary published, awaiting review"))
    );
}

#[tokio::test]
async fn test_image_failure_aborts_publish() {
    let (router, backend) = editor_backend();
    let (app, notifier) = app_for(spawn(router).await);
    app.session().start("t1", &mei()).await.unwrap();

    let mut editor = app.editor();
    editor.set_title("t");
    editor.set_content("c");
    editor.add_images(vec![MediaSource::from(std::path::PathBuf::from(
        "/nonexistent/photo.jpg",
    ))]);

    let err = editor.submit().await.unwrap_err();
    assert!(matches!(err, AppError::Upload { .. }));
    assert!(backend.drafts.lock().unwrap().is_empty());
    assert!(
        notifier
            .notices()
            .iter()
            .any(|n| n.level == NoticeLevel::Error && n.message == "Image upload failed")
    );
}

async fn diary(Path(id): Path<String>) -> Json<Value> {
    Json(json!({
        "id": id,
        "title": "Hangzhou",
        "content": "West Lake at dawn.",
        "author": {"id": 7, "nickname": "Mei"},
        "likeCount": 2,
        "liked": false
    }))
}

#[tokio::test]
async fn test_detail_like_comment_and_delete() {
    let router = Router::new()
        .route("/api/diaries/{id}", get(diary).delete(|| async { StatusCode::OK }))
        .route(
            "/api/diaries/{id}/like",
            post(|| async { Json(json!({"liked": true, "likeCount": 3})) }),
        )
        .route(
            "/api/diaries/{id}/comments",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "id": 1,
                    "content": body["content"],
                    "author": {"nickname": "Mei", "avatarUrl": "/uploads/mei.png"}
                }))
            }),
        );
    let port = spawn(router).await;
    let (app, _) = app_for(port);
    app.session().start("t1", &mei()).await.unwrap();

    let mut detail = app.detail();
    assert!(detail.load("5").await.unwrap().is_owner);

    assert!(detail.toggle_like().await.unwrap());
    assert_eq!(detail.view().unwrap().diary.like_count, Some(3));

    let comment = detail.comment("  Lovely  ").await.unwrap().unwrap();
    assert_eq!(comment.content, "Lovely");
    assert_eq!(
        comment.author.avatar_url,
        format!("http://127.0.0.1:{port}/uploads/mei.png")
    );
    assert!(matches!(
        detail.comment("   ").await,
        Err(AppError::Validation(_))
    ));

    // Empty 200 bodies resolve to an empty object.
    assert_eq!(app.client().delete("/diaries/5").await.unwrap(), json!({}));
    detail.delete().await.unwrap();
    assert!(detail.view().is_none());
}

#[tokio::test]
async fn test_delete_refused_for_other_authors() {
    let router = Router::new().route("/api/diaries/{id}", get(diary));
    let (app, _) = app_for(spawn(router).await);
    let mut stranger = mei();
    stranger.id = "8".into();
    app.session().start("t1", &stranger).await.unwrap();

    let mut detail = app.detail();
    assert!(!detail.load("5").await.unwrap().is_owner);
    assert!(matches!(
        detail.delete().await,
        Err(AppError::Validation(_))
    ));
}
