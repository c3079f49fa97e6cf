use brokerage_portal::{
    AppState, RemoteAuthBackend, RouteTable, SessionRegistry,
    auth::TokenVerifier,
    backend::AuthBackendState,
    config::{AppConfig, Env},
    create_router,
};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: configuration, logging, the auth backend, the client registry,
/// the route table and the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production settings).
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "brokerage_portal=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Portal starting in {:?} mode", config.env);

    // 3. Auth backend and the provider of per-client session stores.
    let backend = Arc::new(RemoteAuthBackend::new(&config.api_base_url)) as AuthBackendState;
    let verifier = config.token_secret.as_deref().map(TokenVerifier::new);
    if verifier.is_some() {
        tracing::info!("Local session token validation enabled.");
    }

    let sessions = Arc::new(
        SessionRegistry::new(backend)
            .with_verifier(verifier)
            .with_restore_timeout(config.restore_timeout),
    );

    // 4. Idle client pruning.
    let pruned = sessions.clone();
    let idle_timeout = config.client_idle_timeout;
    let period = idle_timeout.clamp(Duration::from_secs(1), Duration::from_secs(300));
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(period);
        loop {
            tick.tick().await;
            let removed = pruned.prune_idle(idle_timeout).await;
            if removed > 0 {
                tracing::debug!(removed, "pruned idle clients");
            }
        }
    });

    // 5. Route table, state and router.
    let routes = RouteTable::standard().expect("FATAL: route table failed to build.");
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(sessions, routes, config));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API documentation available at /swagger-ui");

    axum::serve(listener, app).await.expect("FATAL: HTTP server terminated.");
}
