mod routes;
mod singleton;
mod state;

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use axum::{Router, response::Redirect, routing::get};
use calzone_core::config::CalzoneConfig;
use clap::Parser;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::state::AppState;

const STATIC_SECTIONS: [&str; 4] = ["add", "manage", "today", "common"];

#[derive(Parser)]
#[command(name = "calzone-server")]
#[command(about = "Record, list and delete calendar events over HTTP")]
struct Cli {
    /// Port to be used for the server
    #[arg(long)]
    port: Option<u16>,

    /// Development mode (keeps ledgers in the working directory)
    #[arg(long)]
    dev: bool,

    /// Config file (defaults to ~/.config/calzone/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CALZONE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("calzone_core=info,calzone_server=info,warn"));

    let format = env::var("CALZONE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(routes::api::router())
        .merge(routes::calendar::router())
        .merge(routes::removal::router())
        .route("/", get(|| async { Redirect::to("/add") }));

    for section in STATIC_SECTIONS {
        router = router.nest_service(
            &format!("/{section}"),
            ServeDir::new(state.static_dir.join(section)),
        );
    }

    router
        .nest_service("/lib", ServeDir::new(&state.storage_root))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = CalzoneConfig::load(cli.config.as_deref())?;
    if cli.dev {
        config.storage_root = PathBuf::from(".");
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    // Ledger mutations assume a single writer per storage root
    let _lock = singleton::lock_storage_root(&config.storage_path())?;

    let state = AppState::new(&config);
    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    if cli.dev {
        info!(%addr, "starting server in development mode");
    } else {
        info!(%addr, storage_root = %config.storage_path().display(), "starting server");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
