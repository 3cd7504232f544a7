use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskboard::backend::BackendClient;
use taskboard::config::{AppConfig, BackendConfig};
use taskboard::local::LocalBackend;
use taskboard::routes::router;
use taskboard::state::AppState;
use taskboard::supabase::SupabaseClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "taskboard=debug,tower_http=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let backend: Arc<dyn BackendClient> = match &config.backend {
        BackendConfig::Supabase(supabase) => {
            info!("using hosted backend at {}", supabase.url);
            Arc::new(SupabaseClient::new(supabase.clone())?)
        }
        BackendConfig::Local { database_url } => {
            info!("using embedded backend at {}", database_url);
            Arc::new(LocalBackend::connect(database_url).await?)
        }
    };

    let addr = config.bind_addr;
    let state = AppState::new(backend, config);
    let app = router(state);

    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
