use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

use catalog_admin::api::CatalogClient;
use catalog_admin::app::{App, AppEvent};
use catalog_admin::config::Config;
use catalog_admin::tracker::{LaunchContext, UserAuth, VisitTracker, VisitType};
use catalog_admin::ui;
use catalog_admin::util::parse_base_url;

/// Get the config directory path (~/.config/catalog-admin/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("catalog-admin");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(
    name = "catalog-admin",
    about = "Terminal admin console for a product catalog backend"
)]
struct Args {
    /// Config file (defaults to ~/.config/catalog-admin/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Catalog backend base URL, overrides the config file
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one tracked visit event and print the session info as JSON
    Visit {
        /// launch, auth, browse or order
        visit_type: VisitType,

        /// Entry scene; attribution is only read when a scene is given
        #[arg(long)]
        scene: Option<String>,

        #[arg(long)]
        promotion_code: Option<String>,

        /// Referrer user id
        #[arg(long)]
        referrer: Option<String>,

        /// Page path reported with the event
        #[arg(long, default_value = "pages/index/index")]
        page: String,

        /// User id reported with an auth event
        #[arg(long)]
        user_id: Option<i64>,

        /// Tracker base URL, overrides the config file
        #[arg(long, value_name = "URL")]
        visit_base_url: Option<String>,
    },
}

/// Build the shared HTTP client.
fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(4)
        .user_agent(concat!("catalog-admin/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Send logs to a file while the TUI owns the terminal.
fn init_file_logging(config_dir: &Path) -> Result<()> {
    let log_path = config_dir.join("catalog-admin.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file '{}'", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;
    }

    // Set directory permissions on Unix (user-only access)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        config,
        base_url,
        command,
    } = Args::parse();

    let config_dir = get_config_dir()?;
    let config_path = config.unwrap_or_else(|| config_dir.join("config.toml"));

    match command {
        Some(Command::Visit {
            visit_type,
            scene,
            promotion_code,
            referrer,
            page,
            user_id,
            visit_base_url,
        }) => {
            // Logs go to stderr; stdout carries the JSON result
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_writer(std::io::stderr)
                .init();

            let config = Config::load(&config_path).context("Failed to load config")?;
            let raw_base = visit_base_url.as_deref().unwrap_or(&config.visit_base_url);
            let base = parse_base_url(raw_base)
                .with_context(|| format!("Invalid visit base URL '{}'", raw_base))?;
            let http = build_http_client(config.visit_timeout())?;
            let tracker = VisitTracker::new(http, &base, config.visit_timeout())
                .context("Failed to build visit endpoint URL")?;

            let mut query = HashMap::new();
            if let Some(code) = promotion_code {
                query.insert("promotionCode".to_string(), code);
            }
            if let Some(referrer) = referrer {
                query.insert("referrerUserId".to_string(), referrer);
            }
            tracker
                .init(LaunchContext {
                    scene,
                    query,
                    path: Some(page.clone()),
                })
                .await;

            match visit_type {
                VisitType::Launch => {}
                VisitType::Auth => {
                    tracker
                        .on_user_authorize(UserAuth {
                            user_info: serde_json::json!({}),
                            open_id: None,
                            user_id,
                        })
                        .await;
                }
                VisitType::Browse => {
                    tracker.on_page_visit(&page, serde_json::json!({})).await;
                }
                VisitType::Order => {
                    tracker.on_order(serde_json::json!({ "pagePath": page })).await;
                }
            }

            let info = serde_json::to_string_pretty(&tracker.session_info())
                .context("Failed to serialize session info")?;
            println!("{}", info);
            Ok(())
        }
        None => run_console(base_url.as_deref(), &config_dir, &config_path).await,
    }
}

async fn run_console(base_url: Option<&str>, config_dir: &Path, config_path: &Path) -> Result<()> {
    ensure_config_dir(config_dir)?;
    init_file_logging(config_dir)?;

    let config = Config::load(config_path).context("Failed to load config")?;
    let raw_base = base_url.unwrap_or(&config.api_base_url);
    let base = parse_base_url(raw_base)
        .with_context(|| format!("Invalid catalog base URL '{}'", raw_base))?;

    let http = build_http_client(config.request_timeout())?;
    let client = CatalogClient::new(http, base, config.request_timeout());
    tracing::info!(base_url = %client.base_url(), "Starting catalog admin console");

    let mut app = App::new(client, &config);

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    // The first snapshot arrives through the event channel like any reload
    ui::spawn_reload(&mut app, &event_tx);
    app.set_status("Loading catalog...");

    ui::run(&mut app, event_tx, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}
