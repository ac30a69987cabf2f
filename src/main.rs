use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use carousel::application::use_cases::{LoginUseCase, RestoreSessionUseCase};
use carousel::domain::ports::{AuthPort, TokenStoragePort};
use carousel::infrastructure::{
    ApiOptions, ApiService, AppConfig, CliArgs, Command, HttpClient, HttpClientConfig,
    KeyringTokenStorage, ResponseCache, RetryPolicy, StorageManager, ThumbnailPreviewer,
};
use carousel::presentation::commands::{self, CommandContext};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<(AppConfig, StorageManager)> {
    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(args);
    Ok((config, storage))
}

async fn create_context(args: &CliArgs) -> Result<CommandContext> {
    let (config, storage) = load_config(args)?;

    init_logging(&config)?;

    info!(version = carousel::VERSION, api = %config.api_url, "Starting Carousel");

    let client_config = HttpClientConfig::new(config.api_url.clone())
        .with_timeout(config.request_timeout())
        .with_retry(RetryPolicy::new(config.retry_attempts, config.retry_delay()));
    let cache = Arc::new(ResponseCache::new(config.cache_capacity, config.cache_ttl()));
    let token_storage: Arc<dyn TokenStoragePort> =
        Arc::new(KeyringTokenStorage::for_backend(&config.api_url));

    let api = Arc::new(ApiService::new(
        HttpClient::new(client_config)?,
        cache,
        Arc::clone(&token_storage),
        ApiOptions {
            offline_fallback: config.offline_fallback,
            cache_ttl: Some(config.cache_ttl()),
        },
    ));

    let auth: Arc<dyn AuthPort> = api.clone();
    RestoreSessionUseCase::new(Arc::clone(&auth), Arc::clone(&token_storage))
        .execute(args.token.clone())
        .await;

    Ok(CommandContext {
        login: LoginUseCase::new(auth, token_storage),
        api,
        storage,
        config,
        previewer: Arc::new(ThumbnailPreviewer::new()),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = dotenvy::dotenv();

    let mut args = CliArgs::parse();
    let command = args.command.take().unwrap_or(Command::Browse);

    let context = create_context(&args).await?;
    let result = commands::run(command, &context).await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    result
}
