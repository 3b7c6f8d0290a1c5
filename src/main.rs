use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use atelier::{
    bootstrap_operator, spawn_event_pump, AppState, AuthSession, Config, Database, LocalProvider,
    SessionStore,
};

#[tokio::main]
async fn main() -> atelier::Result<()> {
    let config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    atelier::logging::init(&config.logging)?;

    info!("{} admin panel", config.site.name);

    let db = Database::open(&config.database.path).await?;

    if let Some(bootstrap) = &config.auth.bootstrap {
        bootstrap_operator(&db, bootstrap).await?;
    }

    let provider = LocalProvider::new(&db);
    let store = SessionStore::new(&config.auth.session_file);
    let mut session = AuthSession::new(provider, db.clone(), store)
        .with_init_timeout(Duration::from_secs(config.auth.init_timeout_secs));
    session.initialize().await;

    let shared = Arc::new(Mutex::new(session));
    let events = shared.lock().await.subscribe();
    let pump = spawn_event_pump(shared.clone(), events);

    let state = AppState::new(shared)
        .with_login_path(&config.auth.login_path)
        .with_cors_origins(config.server.cors_origins.clone())
        .with_site_name(&config.site.name);

    let server = atelier::web::serve(&config.server, state);
    tokio::select! {
        result = server => {
            if let Err(e) = &result {
                warn!(error = %e, "server exited with error");
            }
            pump.abort();
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            pump.abort();
            Ok(())
        }
    }
}
