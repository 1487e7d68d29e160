use anyhow::Context;
use clap::Parser;
use offsite_cache::CacheStorage;
use offsite_core::config::Config;
use offsite_core::fetch::{Fetcher, OriginFetcher};
use offsite_core::push::{Notification, PushPayload};
use offsite_core::request::{Destination, FetchRequest};
use offsite_core::response::ServeSource;
use offsite_core::theme::ThemeMode;
use offsite_core::{App, CacheWorker, Clients, ControlMessage, FetchOutcome, WorkerRegistry};
use offsite_net::OriginClient;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

#[derive(Parser)]
#[command(name = "offsite")]
#[command(version, about = "Offline-first cache and preference tooling for the consulting site", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Precache every core asset and activate the current version
    Install,
    /// Fetch a URL or site path the way an intercepted request would be served
    Fetch {
        /// Absolute URL or site-relative path like /css/style.css
        target: String,
        /// Override the guessed destination (document, style, script, image, font, other)
        #[arg(long)]
        destination: Option<String>,
        /// Write the response body to a file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show the governing version and every store on disk
    Status,
    /// Delete every store except the current version's
    Purge,
    /// Read or change the saved site preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Render the notification a push payload would display
    Notify {
        /// Push payload as JSON; omit for an empty push
        payload: Option<String>,
    },
}

#[derive(clap::Subcommand)]
enum PrefsAction {
    /// Print the current preferences
    Show,
    /// Set the interface language (ar or en)
    Language { value: String },
    /// Set the color theme (light or dark)
    Theme { value: String },
    /// Flip between Arabic and English
    ToggleLanguage,
    /// Flip between light and dark
    ToggleTheme,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - helps when things go sideways
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offsite=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Install) => install().await,
        Some(Commands::Fetch {
            target,
            destination,
            output,
        }) => fetch(target, destination, output).await,
        Some(Commands::Status) => status().await,
        Some(Commands::Purge) => purge(),
        Some(Commands::Prefs { action }) => prefs(action),
        Some(Commands::Notify { payload }) => notify(payload),
        None => {
            println!("No command specified. Try --help");
            Ok(())
        }
    }
}

fn build_worker(config: &Config, storage: &CacheStorage) -> anyhow::Result<CacheWorker> {
    let origin = Url::parse(&config.site.origin)?;
    let client = OriginClient::new(origin);
    let fetcher: Arc<dyn Fetcher> = Arc::new(OriginFetcher::new(client));
    Ok(CacheWorker::new(&config.site, storage.clone(), fetcher)?)
}

/// Adopt the already-installed worker, the way a fresh page load does
fn resume_registry(config: &Config, storage: &CacheStorage) -> anyhow::Result<WorkerRegistry> {
    let worker = Arc::new(build_worker(config, storage)?);
    let mut registry = WorkerRegistry::new(Clients::new());
    registry
        .resume(worker)
        .context("no installed version found, run `offsite install` first")?;
    Ok(registry)
}

async fn install() -> anyhow::Result<()> {
    let config = Config::load()?;
    let storage = CacheStorage::new(&config.cache.db_path)?;
    let worker = Arc::new(build_worker(&config, &storage)?);

    let mut registry = WorkerRegistry::new(Clients::new());
    registry.register(worker).await?;

    match registry.current_version() {
        Some(version) => println!(
            "Installed {} ({} core assets precached)",
            version,
            config.site.assets.core.len()
        ),
        None => println!("Install finished but no version is governing"),
    }
    Ok(())
}

async fn fetch(
    target: String,
    destination: Option<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let storage = CacheStorage::new(&config.cache.db_path)?;
    let registry = resume_registry(&config, &storage)?;

    let origin = Url::parse(&config.site.origin)?;
    let url = if target.contains("://") {
        Url::parse(&target)?
    } else {
        origin.join(&target)?
    };

    let mut request = FetchRequest::get(url);
    if let Some(value) = destination {
        request = request.with_destination(parse_destination(&value)?);
    }

    let worker = registry.active().context("no governing worker")?;
    match worker.handle_fetch(&request).await {
        FetchOutcome::Ignored => {
            println!("Scheme {} is not handled, passing through", request.url.scheme());
        }
        FetchOutcome::Served(served) => {
            println!(
                "{} {} ({} bytes, {})",
                served.resource.status,
                served.resource.status_text,
                served.resource.body.len(),
                source_label(served.source)
            );
            if let Some(job) = served.revalidation {
                job.spawn().await?;
                println!("Background refresh finished");
            }
            if let Some(path) = output {
                std::fs::write(&path, &served.resource.body)?;
                println!("Body written to {}", path.display());
            }
        }
    }
    Ok(())
}

async fn status() -> anyhow::Result<()> {
    let config = Config::load()?;
    println!("Site:    {}", config.site.origin);
    println!("Current: {}", config.site.store_name());

    let storage = CacheStorage::new(&config.cache.db_path)?;

    let mut registry = WorkerRegistry::new(Clients::new());
    match build_worker(&config, &storage) {
        Ok(worker) => {
            if let Err(e) = registry.resume(Arc::new(worker)) {
                tracing::debug!("Nothing to resume: {}", e);
            }
        }
        Err(e) => tracing::debug!("Could not build a worker: {}", e),
    }

    let (tx, rx) = tokio::sync::oneshot::channel();
    registry.handle_message(ControlMessage::GetVersion { reply: tx })?;
    let governing = rx.await?;
    if governing.is_empty() {
        println!("Governing: none (not installed)");
    } else {
        println!("Governing: {}", governing);
    }

    let names = storage.store_names()?;
    if names.is_empty() {
        println!("No stores on disk");
        return Ok(());
    }
    println!("Stores:");
    for name in names {
        let store = storage.open(&name)?;
        let marker = if name == config.site.store_name() {
            " (current)"
        } else {
            ""
        };
        println!("  {} - {} entries{}", name, store.len()?, marker);
    }
    Ok(())
}

fn purge() -> anyhow::Result<()> {
    let config = Config::load()?;
    let storage = CacheStorage::new(&config.cache.db_path)?;
    let mut registry = resume_registry(&config, &storage)?;

    registry.handle_message(ControlMessage::CleanOldCaches)?;
    println!("Old stores deleted, {} remains", config.site.store_name());
    Ok(())
}

fn prefs(action: PrefsAction) -> anyhow::Result<()> {
    let config = Config::load()?;
    let system_locale = std::env::var("LANG").ok();
    let mut app = App::init(config, ThemeMode::default(), system_locale.as_deref());

    match action {
        PrefsAction::Show => {
            let info = app.language_info();
            println!("Language:  {} ({})", info.code, info.name);
            println!("Direction: {}", info.direction.as_str());
            println!("Font:      {}", info.font_family);
            println!("Theme:     {}", app.theme().current().as_str());
            println!("Follows system theme: {}", app.theme().follows_system());
        }
        PrefsAction::Language { value } => {
            app.switch_language(&value);
            println!("Language is now {}", app.language().current());
        }
        PrefsAction::Theme { value } => {
            let theme = ThemeMode::parse(&value)
                .with_context(|| format!("unknown theme {:?}, expected light or dark", value))?;
            app.switch_theme(theme);
            println!("Theme is now {}", app.theme().current().as_str());
        }
        PrefsAction::ToggleLanguage => {
            app.toggle_language();
            println!("Language is now {}", app.language().current());
        }
        PrefsAction::ToggleTheme => {
            app.toggle_theme();
            println!("Theme is now {}", app.theme().current().as_str());
        }
    }
    Ok(())
}

fn notify(payload: Option<String>) -> anyhow::Result<()> {
    let raw = payload.unwrap_or_default();
    match PushPayload::parse(raw.as_bytes())? {
        None => println!("Empty push, no notification to show"),
        Some(payload) => {
            let notification = Notification::from_payload(&payload);
            println!("{}", serde_json::to_string_pretty(&notification)?);
        }
    }
    Ok(())
}

fn parse_destination(value: &str) -> anyhow::Result<Destination> {
    match value.to_lowercase().as_str() {
        "document" => Ok(Destination::Document),
        "style" => Ok(Destination::Style),
        "script" => Ok(Destination::Script),
        "image" => Ok(Destination::Image),
        "font" => Ok(Destination::Font),
        "other" => Ok(Destination::Other),
        other => anyhow::bail!("unknown destination {:?}", other),
    }
}

fn source_label(source: ServeSource) -> &'static str {
    match source {
        ServeSource::Cache => "from cache",
        ServeSource::Network => "from network",
        ServeSource::OfflinePage => "offline page fallback",
        ServeSource::PlaceholderImage => "placeholder image fallback",
        ServeSource::Synthetic => "synthetic offline response",
    }
}
