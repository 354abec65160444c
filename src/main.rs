mod config;
mod db;
mod error;
mod handlers;
mod models;
mod routes;
mod state;
mod utils;

#[cfg(test)]
mod testing;

use std::net::SocketAddr;

use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    tracing::info!(
        "Configuración cargada: perfil {:?}, entorno {:?}, despliegue {:?}",
        config.profile,
        config.environment,
        config.deployment
    );

    let pool = db::init_db(&config).await?;
    tracing::info!("✅ Store listo");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = routes::create_routes(AppState::new(pool, config));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("🚀 Servidor del blog corriendo en http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Servidor detenido");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("No se pudo escuchar Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!("No se pudo escuchar SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Señal recibida, cerrando...");
}
