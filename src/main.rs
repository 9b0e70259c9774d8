use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use daily_car_card::config::environment::EnvironmentConfig;
use daily_car_card::create_app;
use daily_car_card::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🚗 Daily Car Card - Carta de coche diaria");
    info!("==========================================");

    let config = EnvironmentConfig::from_env().map_err(|e| {
        error!("❌ Configuración inválida: {}", e);
        anyhow::anyhow!("Error de configuración: {}", e)
    })?;
    info!("⚙️ Entorno: {}", config.environment);
    info!("📁 Datos en: {}", config.data_dir.display());
    match config.generation_timeout {
        Some(limit) => info!("⌛ Timeout de generación: {:?}", limit),
        None => info!("⌛ Sin timeout de generación"),
    }

    let state = AppState::from_config(config.clone()).map_err(|e| {
        error!("❌ Error inicializando el servicio: {}", e);
        anyhow::anyhow!("Error de inicialización: {}", e)
    })?;

    let app = create_app(state);

    let addr: SocketAddr = config.server_url().parse()?;
    let base = &config.base_path;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  {}/api/card?date=YYYY-MM-DD - Carta de una fecha", base);
    info!("   GET  {}/api/card/today - Carta de hoy (JST)", base);
    info!("   GET  {}/api/card/yesterday - Carta de ayer (JST)", base);
    info!("   GET  {}/api/gallery?month=YYYY-MM - Calendario del mes", base);
    info!("   GET  {}/data/images/<fecha>.png - Imágenes de las cartas", base);
    info!("   GET  {}/health - Health check", base);

    // Iniciar servidor en background
    let server_handle = tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                error!("❌ Error del servidor: {}", e);
                e
            })
    });

    // Esperar a que el servidor termine
    if let Err(e) = server_handle.await? {
        error!("❌ Servidor terminó con error: {}", e);
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
