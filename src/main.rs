use std::{process, sync::Arc, time::Duration};

use purge_cache::{
    application::{
        error::AppError, planner, purge::PurgeService, trigger::PurgeScheduler,
    },
    config::{self, Command, ExpandArgs, PurgeTarget},
    domain::{content::ContentItem, purge::PurgeRequest},
    infra::{
        cloudflare::CloudflareClient,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
        wordpress::WordPressContentSource,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        Command::Serve(_) => run_serve(settings).await,
        Command::Purge(args) => run_purge(settings, args.target).await,
        Command::Expand(args) => run_expand(settings, args).await,
    }
}

fn build_purge_service(settings: &config::Settings) -> Result<Arc<PurgeService>, AppError> {
    let executor =
        CloudflareClient::new(&settings.cloudflare.api_base_url, settings.cloudflare.timeout)?;
    let content = WordPressContentSource::new(&settings.site.wordpress_api_url)?;

    let service = PurgeService::new(
        Arc::new(settings.purge_config()),
        Arc::new(content),
        Arc::new(executor),
    );
    if !service.config().has_credentials() {
        warn!(
            target: "purge_cache::startup",
            "Cloudflare zone id or API token missing; purges will be rejected"
        );
    }
    Ok(Arc::new(service))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let service = build_purge_service(&settings)?;
    let scheduler = Arc::new(PurgeScheduler::new(
        service.clone(),
        settings.trigger.debounce,
    ));

    if settings.admin.token.is_empty() {
        warn!(
            target: "purge_cache::startup",
            "admin token not set; admin routes and the content hook reject every request"
        );
    }

    let state = ApiState::new(service, scheduler.clone(), settings.admin.token.as_str());
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|source| InfraError::Bind {
            addr: settings.server.addr,
            source,
        })?;

    info!(
        target: "purge_cache::serve",
        addr = %settings.server.addr,
        endpoint_enabled = settings.endpoint.enabled,
        admin_button_enabled = settings.admin.button_enabled,
        "listening"
    );

    let shutdown = Arc::new(Notify::new());
    let signal = {
        let shutdown = shutdown.clone();
        async move {
            wait_for_signal().await;
            shutdown.notify_waiters();
        }
    };

    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(signal)
        .into_future();
    let grace = settings.server.graceful_shutdown;

    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = drain_deadline(&shutdown, grace) => {
            warn!(
                target: "purge_cache::serve",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    match tokio::time::timeout(grace, scheduler.drain()).await {
        Ok(drained) => info!(
            target: "purge_cache::serve",
            drained,
            "scheduled purges flushed"
        ),
        Err(_) => warn!(
            target: "purge_cache::serve",
            grace_seconds = grace.as_secs(),
            "scheduled purges still running at shutdown deadline"
        ),
    }

    info!(target: "purge_cache::serve", "server stopped");
    Ok(())
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(err) => {
                warn!(
                    target: "purge_cache::serve",
                    error = %err,
                    "failed to install SIGTERM handler"
                );
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!(target: "purge_cache::serve", "shutdown signal received");
}

async fn drain_deadline(shutdown: &Notify, grace: Duration) {
    shutdown.notified().await;
    tokio::time::sleep(grace).await;
}

async fn run_purge(settings: config::Settings, target: PurgeTarget) -> Result<(), AppError> {
    let service = build_purge_service(&settings)?;

    let outcome = match target {
        PurgeTarget::Everything => service.purge_everything().await?,
        PurgeTarget::Post { id } => service.purge_item(id).await?,
        PurgeTarget::Latest => service.purge_latest().await?,
    };

    println!("{}", outcome.message());
    Ok(())
}

async fn run_expand(settings: config::Settings, args: ExpandArgs) -> Result<(), AppError> {
    let raw = tokio::fs::read_to_string(&args.item)
        .await
        .map_err(|source| InfraError::ReadFile {
            path: args.item.clone(),
            source,
        })?;
    let item: ContentItem = serde_json::from_str(&raw).map_err(|err| {
        AppError::validation(format!(
            "invalid content item `{}`: {err}",
            args.item.display()
        ))
    })?;

    match planner::build(Some(&item), &settings.purge_config()) {
        PurgeRequest::Everything => println!("everything"),
        PurgeRequest::FileList(files) => {
            for file in files {
                println!("{file}");
            }
        }
    }
    Ok(())
}
