//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use salon_booking::{
    config::{AppState, Settings},
    routes,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG manda; sem ele, info para a aplicação
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("salon_booking=info")),
        )
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar
    let settings = Settings::from_env().inspect_err(|e| {
        tracing::error!("🔥 Falha ao carregar a configuração: {:?}", e);
    })?;
    let bind_addr = settings.bind_addr.clone();

    let app_state = AppState::new(settings)?;
    let loaded = app_state.warm_schedule().await?;
    tracing::info!("✅ Estado da aplicação montado ({} turnos em cache)", loaded);

    let app = routes::app(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
