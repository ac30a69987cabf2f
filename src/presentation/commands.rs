//! Subcommand handlers.
//!
//! Results go to stdout, progress and warnings to stderr.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr, bail, eyre};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::application::dto::LoginRequest;
use crate::application::services::{UploadEvent, UploadPipeline, UploadSettings};
use crate::application::use_cases::LoginUseCase;
use crate::domain::entities::{
    DataSource, ImageId, ImagePatch, ImageRecord, ListQuery, ProfilePatch, SortKey, SortOrder,
    UploadMetadata, UserProfile,
};
use crate::domain::ports::{AuthPort, ImageApiPort, PreviewPort};
use crate::infrastructure::api::ApiService;
use crate::infrastructure::config::{AppConfig, Command, StorageManager, ThemeMode};
use crate::presentation::format::record_line;
use crate::presentation::theme::Theme;
use crate::presentation::ui::BrowseApp;

/// Everything a subcommand may need.
pub struct CommandContext {
    /// Backend client.
    pub api: Arc<ApiService>,
    /// Login and logout workflow.
    pub login: LoginUseCase,
    /// Config and state files.
    pub storage: StorageManager,
    /// Effective configuration.
    pub config: AppConfig,
    /// Upload preview renderer.
    pub previewer: Arc<dyn PreviewPort>,
}

impl CommandContext {
    fn upload_settings(&self) -> UploadSettings {
        UploadSettings {
            max_bytes: self.config.max_upload_bytes,
            simulate_offline: self.config.simulate_offline_uploads,
            ..UploadSettings::default()
        }
    }

    fn theme_mode(&self) -> ThemeMode {
        match self.storage.load_state() {
            Ok(state) => state.effective_theme(self.config.theme),
            Err(e) => {
                warn!(error = %e, "Could not read saved state, using configured theme");
                self.config.theme
            }
        }
    }
}

/// Runs `command`.
///
/// # Errors
/// Returns error if the command fails.
pub async fn run(command: Command, ctx: &CommandContext) -> Result<()> {
    match command {
        Command::List {
            page,
            sort,
            order,
            filter,
        } => list(ctx, page, sort, order, filter.as_deref()).await,
        Command::Search { query, page } => search(ctx, &query, page).await,
        Command::Upload {
            files,
            title,
            description,
            tags,
        } => upload(ctx, files, title, description, tags.as_deref()).await,
        Command::Edit {
            id,
            title,
            description,
            tags,
        } => {
            let patch = ImagePatch {
                title,
                description,
                tags: tags.as_deref().map(UploadMetadata::parse_tags),
            };
            if patch == ImagePatch::default() {
                bail!("nothing to change, pass --title, --description or --tags");
            }
            let record = ctx.api.update_image(&ImageId::new(id), patch).await?;
            println!("{}", record_line(&record));
            Ok(())
        }
        Command::Delete { id } => {
            ctx.api.delete_image(&ImageId::new(id.as_str())).await?;
            println!("Deleted {id}");
            Ok(())
        }
        Command::Login {
            email,
            password,
            no_persist,
        } => {
            let password = password_or_prompt(password)?;
            let mut request = LoginRequest::new(email, password);
            if no_persist {
                request = request.without_persistence();
            }
            let response = ctx.login.execute(request).await?;
            report_sign_in(response.user.as_ref(), response.token_persisted);
            Ok(())
        }
        Command::Logout => {
            ctx.login.logout().await?;
            println!("Signed out");
            Ok(())
        }
        Command::Register {
            email,
            username,
            password,
        } => {
            let password = password_or_prompt(password)?;
            let request = LoginRequest::new(email, password).with_username(username);
            let response = ctx.login.register(request).await?;
            if response.token_issued {
                report_sign_in(response.user.as_ref(), response.token_persisted);
            } else {
                println!(
                    "{}",
                    response
                        .message
                        .unwrap_or_else(|| "Account created, sign in to continue".to_string())
                );
            }
            Ok(())
        }
        Command::Whoami => {
            let user = ctx
                .api
                .current_user()
                .await
                .wrap_err("not signed in, run `carousel login`")?;
            print_profile(&user);
            Ok(())
        }
        Command::Profile {
            username,
            email,
            bio,
        } => {
            let patch = ProfilePatch {
                username,
                email,
                bio,
            };
            profile(ctx, patch).await
        }
        Command::Theme { mode } => theme(ctx, mode),
        Command::Health => {
            let status = ctx.api.health().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Command::Browse => browse(ctx).await,
    }
}

async fn list(
    ctx: &CommandContext,
    page: u32,
    sort: SortKey,
    order: SortOrder,
    filter: Option<&str>,
) -> Result<()> {
    let query = ListQuery::page(page)
        .with_limit(ctx.config.page_size)
        .sorted_by(sort, order);
    let mut result = ctx.api.list_images(query).await?;
    warn_if_degraded(result.source);

    if let Some(filter) = filter {
        result.images = filter_records(result.images, filter);
    }

    for record in &result.images {
        println!("{}", record_line(record));
    }
    println!(
        "Page {} of {} ({} images)",
        result.page,
        result.total_pages.max(1),
        result.total
    );
    Ok(())
}

async fn search(ctx: &CommandContext, query: &str, page: u32) -> Result<()> {
    let results = ctx
        .api
        .search_images(query, page, ctx.config.page_size)
        .await?;
    warn_if_degraded(results.source);

    for record in &results.images {
        println!("{}", record_line(record));
    }
    println!("{} matches for {query:?}", results.total);
    Ok(())
}

async fn upload(
    ctx: &CommandContext,
    files: Vec<PathBuf>,
    title: Option<String>,
    description: Option<String>,
    tags: Option<&str>,
) -> Result<()> {
    let api: Arc<dyn ImageApiPort> = ctx.api.clone();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let pipeline = UploadPipeline::new(
        api,
        Arc::clone(&ctx.previewer),
        tx,
        UploadSettings {
            display_delay: Duration::ZERO,
            ..ctx.upload_settings()
        },
    );

    let mut rejected = 0;
    for path in &files {
        let queued = match UploadPipeline::read_file(path).await {
            Ok(file) => pipeline.add_file(file).await,
            Err(e) => Err(e),
        };
        match queued {
            Ok(id) => {
                let default_title = pipeline
                    .items()
                    .into_iter()
                    .find(|i| i.id == id)
                    .map(|i| i.metadata.title)
                    .unwrap_or_default();
                let metadata =
                    metadata_for(default_title, title.as_deref(), description.as_deref(), tags);
                pipeline.update_metadata(id, metadata)?;
            }
            Err(e) => {
                eprintln!("skipped: {e}");
                rejected += 1;
            }
        }
    }

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                UploadEvent::Progress { id, percent } => eprintln!("{id}: {percent}%"),
                UploadEvent::ImageUploaded(record) => println!("{}", record_line(&record)),
                UploadEvent::StatusChanged { .. } => {}
            }
        }
    });

    let report = pipeline.start_upload().await;
    drop(pipeline);
    if let Err(e) = printer.await {
        warn!(error = %e, "Upload progress printer failed");
    }

    for outcome in &report.outcomes {
        if outcome.simulated {
            eprintln!("{}: stored locally, the backend was unreachable", outcome.file_name);
        }
        if let Some(error) = &outcome.error {
            eprintln!("{}: {error}", outcome.file_name);
        }
    }
    info!(
        completed = report.completed(),
        failed = report.failed(),
        rejected,
        "Upload command finished"
    );

    let failed = report.failed() + rejected;
    if failed > 0 {
        bail!("{failed} of {} files were not uploaded", files.len());
    }
    Ok(())
}

async fn profile(ctx: &CommandContext, patch: ProfilePatch) -> Result<()> {
    if patch == ProfilePatch::default() {
        let (user, source) = ctx.api.get_user().await?;
        warn_if_degraded(source);
        print_profile(&user);
    } else {
        let user = ctx.api.update_user(&patch).await?;
        println!("Profile updated");
        print_profile(&user);
    }
    Ok(())
}

fn theme(ctx: &CommandContext, mode: Option<ThemeMode>) -> Result<()> {
    let Some(mode) = mode else {
        println!("{}", ctx.theme_mode());
        return Ok(());
    };

    let mut state = ctx.storage.load_state()?;
    state.theme = Some(mode);
    ctx.storage.save_state(&state)?;
    println!("Theme set to {mode}");
    Ok(())
}

async fn browse(ctx: &CommandContext) -> Result<()> {
    let api: Arc<dyn ImageApiPort> = ctx.api.clone();
    let app = BrowseApp::new(
        api,
        Arc::clone(&ctx.previewer),
        ctx.upload_settings(),
        ctx.config.page_size,
        Theme::from_mode(ctx.theme_mode()),
    );

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal).await;
    ratatui::restore();
    result
}

fn warn_if_degraded(source: DataSource) {
    if source.is_degraded() {
        eprintln!("warning: backend unreachable, showing sample images");
    }
}

fn report_sign_in(user: Option<&UserProfile>, persisted: bool) {
    let name = user.map_or("unknown user", UserProfile::display_name);
    if persisted {
        println!("Signed in as {name}, token saved to the system keyring");
    } else {
        println!("Signed in as {name} for this session only");
    }
}

fn print_profile(user: &UserProfile) {
    println!("{}", user.display_name());
    if let Some(email) = &user.email {
        println!("  email: {email}");
    }
    if let Some(bio) = &user.bio {
        println!("  bio:   {bio}");
    }
}

/// Keeps records matching `filter`, the way the browse screen does.
fn filter_records(records: Vec<ImageRecord>, filter: &str) -> Vec<ImageRecord> {
    let needle = filter.trim().to_lowercase();
    records.into_iter().filter(|r| r.matches(&needle)).collect()
}

fn metadata_for(
    default_title: String,
    title: Option<&str>,
    description: Option<&str>,
    tags: Option<&str>,
) -> UploadMetadata {
    UploadMetadata {
        title: title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map_or(default_title, ToString::to_string),
        description: description.unwrap_or_default().trim().to_string(),
        tags: tags.map(UploadMetadata::parse_tags).unwrap_or_default(),
    }
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => prompt_password(),
    }
}

fn prompt_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;

    terminal::enable_raw_mode()?;
    let entered = read_hidden_line();
    terminal::disable_raw_mode()?;
    eprintln!();

    entered
}

fn read_hidden_line() -> Result<String> {
    let mut value = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(value),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(eyre!("password entry cancelled"));
            }
            KeyCode::Backspace => {
                value.pop();
            }
            KeyCode::Char(c) => value.push(c),
            _ => {}
        }
    }
}
