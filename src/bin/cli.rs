//! Travelog CLI
//!
//! Drives the client library from a terminal. Session files live under
//! `{storage_dir}/session`, configuration in `{storage_dir}/config.toml`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use travelog::{
    TravelogApp,
    controllers::{LoadOutcome, LoginForm, MediaSource, ProfileController, RegisterForm},
    environment::ProcessEnvProbe,
    error::Result,
    models::{AuthMode, Config, Diary},
    notify::LogNotifier,
    storage::LocalStore,
};

/// Travelog - travel diary client
#[derive(Parser, Debug)]
#[command(name = "travelog", version, about = "Travel diary sharing client")]
struct Cli {
    /// Path to storage directory holding config and session files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the resolved API and resource bases
    Env,

    /// Validate the configuration file
    Validate,

    /// Log in and store the session
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        /// Remember the credentials
        #[arg(long)]
        remember: bool,
    },

    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        /// Defaults to the password
        #[arg(long)]
        confirm: Option<String>,
        #[arg(long)]
        nickname: Option<String>,
    },

    /// Discard the stored session
    Logout,

    /// Show the logged-in user and their review summary
    Whoami,

    /// Browse approved diaries
    Feed {
        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
        /// Search term
        #[arg(long)]
        search: Option<String>,
    },

    /// List your own diaries with their review state
    Mine,

    /// Show one diary
    Show { id: String },

    /// Like or unlike a diary
    Like { id: String },

    /// Comment on a diary
    Comment { id: String, text: String },

    /// Publish a new diary
    Publish {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Local image file, repeatable
        #[arg(long = "image")]
        images: Vec<PathBuf>,
        /// Local video file
        #[arg(long)]
        video: Option<PathBuf>,
    },

    /// Edit one of your diaries
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        /// Local image file to append, repeatable
        #[arg(long = "image")]
        images: Vec<PathBuf>,
        /// Drop the existing images first
        #[arg(long)]
        clear_images: bool,
        /// Replace the video with a local file
        #[arg(long)]
        video: Option<PathBuf>,
    },

    /// Delete one of your diaries
    Delete { id: String },
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_card(diary: &Diary, summary_len: usize) {
    let badge = diary
        .status
        .label()
        .map(|l| format!(" [{l}]"))
        .unwrap_or_default();
    println!("#{} {}{}", diary.id, diary.title, badge);
    println!(
        "    {} · {}",
        diary.author.display_name(),
        diary.created_date()
    );
    let summary = diary.summary(summary_len);
    if !summary.is_empty() {
        println!("    {summary}");
    }
    if let Some(image) = diary.card_image() {
        println!("    image: {image}");
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.storage_dir.join("config.toml");
    let config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        Config::default()
    };
    init_logging(cli.verbose, &config.logging.level);
    log::debug!("Storage directory: {}", cli.storage_dir.display());

    let summary_len = config.editor.summary_len;
    let store = LocalStore::new(cli.storage_dir.join("session"));
    let app = TravelogApp::new(
        config,
        Arc::new(ProcessEnvProbe),
        Arc::new(store),
        Arc::new(LogNotifier),
    )?;

    let result = run(&app, cli.command, summary_len).await;
    if let Err(e) = &result {
        if e.requires_login() {
            log::info!("Run `travelog login` to sign in again");
            app.client().finish_redirect().await;
        }
    }
    result
}

async fn run(app: &TravelogApp, command: Command, summary_len: usize) -> Result<()> {
    match command {
        Command::Env => {
            let env = app.environment();
            println!("target:        {}", env.target());
            println!("api base:      {}", env.resolve_api_base());
            let resources = env.resolve_resource_base();
            println!(
                "resource base: {}",
                if resources.is_empty() { "(relative)" } else { resources.as_str() }
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = app.config().validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Login {
            username,
            password,
            remember,
        } => {
            let form = LoginForm {
                username,
                password,
                remember,
            };
            let user = app.auth().login(&form).await?;
            println!("Logged in as {}", user.display_name());
        }

        Command::Register {
            username,
            password,
            confirm,
            nickname,
        } => {
            let form = RegisterForm {
                confirm_password: confirm.unwrap_or_else(|| password.clone()),
                username,
                password,
                nickname,
            };
            match app.auth().register(&form).await? {
                Some(user) => println!("Registered and logged in as {}", user.display_name()),
                None => println!("Registered, run `travelog login` to continue"),
            }
        }

        Command::Logout => {
            app.auth().logout().await?;
        }

        Command::Whoami => {
            let profile = app.profile();
            let user = profile.current_user().await?;
            println!("{} (@{})", user.display_name(), user.username);
            if app.config().auth.mode == AuthMode::Remote {
                let summary = profile.moderation_summary().await?;
                println!("{} diaries: {}", summary.total(), summary);
            }
        }

        Command::Feed { pages, search } => {
            let feed = app.feed();
            match search.as_deref() {
                Some(term) => feed.set_search(term).await?,
                None => feed.refresh().await?,
            };
            for _ in 1..pages {
                if matches!(feed.load_more().await?, LoadOutcome::Exhausted) {
                    break;
                }
            }
            for diary in feed.items() {
                print_card(&diary, summary_len);
            }
            if feed.is_empty() {
                println!("No diaries found");
            } else if feed.has_more() {
                println!("(more available, use --pages)");
            }
        }

        Command::Mine => {
            let mut items = app.profile().all_diaries().await?;
            for diary in &mut items {
                app.urls().absolutize(diary);
            }
            if items.is_empty() {
                println!("You have not written any diaries yet");
            }
            for diary in &items {
                print_card(diary, summary_len);
            }
            for (title, reason) in ProfileController::rejection_notes(&items) {
                println!("Rejected '{title}': {reason}");
            }
        }

        Command::Show { id } => {
            let mut detail = app.detail();
            let view = detail.load(&id).await?;
            let d = &view.diary;
            println!("{}", d.title);
            if let Some(label) = d.status.label() {
                println!("[{label}]");
            }
            println!("{} · {}", d.author.display_name(), d.created_date());
            println!();
            println!("{}", d.content);
            for image in &d.images {
                println!("image: {image}");
            }
            if let Some(video) = &d.video_url {
                println!("video: {video}");
            }
            if let Some(likes) = d.like_count {
                println!("likes: {likes}");
            }
            if view.is_owner {
                println!("(you wrote this)");
            }
        }

        Command::Like { id } => {
            let mut detail = app.detail();
            detail.load(&id).await?;
            let liked = detail.toggle_like().await?;
            println!("{}", if liked { "Liked" } else { "Unliked" });
        }

        Command::Comment { id, text } => {
            let mut detail = app.detail();
            detail.load(&id).await?;
            detail.comment(&text).await?;
        }

        Command::Publish {
            title,
            content,
            images,
            video,
        } => {
            let mut editor = app.editor();
            editor.set_title(title);
            editor.set_content(content);
            editor.add_images(images.into_iter().map(MediaSource::from));
            editor.set_video(video.map(MediaSource::from));
            if let Some(diary) = editor.submit().await? {
                println!("Published #{} ({})", diary.id, diary.status);
            }
        }

        Command::Edit {
            id,
            title,
            content,
            images,
            clear_images,
            video,
        } => {
            let mut editor = app.editor();
            editor.load(&id).await?;
            if let Some(title) = title {
                editor.set_title(title);
            }
            if let Some(content) = content {
                editor.set_content(content);
            }
            if clear_images {
                while editor.remove_image(0).is_some() {}
            }
            editor.add_images(images.into_iter().map(MediaSource::from));
            if let Some(video) = video {
                editor.set_video(Some(MediaSource::from(video)));
            }
            editor.submit().await?;
        }

        Command::Delete { id } => {
            let mut detail = app.detail();
            detail.load(&id).await?;
            detail.delete().await?;
        }
    }

    Ok(())
}
