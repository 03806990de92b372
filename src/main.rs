//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use hotel_orders::{config::AppState, routes::build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env antes do logger, para RUST_LOG valer
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,hotel_orders=debug")),
        )
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar
    let app_state = AppState::new().await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let addr = app_state.settings.bind_addr.clone();
    let app = build_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
