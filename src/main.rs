use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use veltis::chain::{MintVerifier, RpcMintVerifier};
use veltis::config::{Config, PinningProvider};
use veltis::db::Database;
use veltis::pinning::{LocalPinner, PinataPinner, Pinner};
use veltis::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "veltis=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Veltis...");

    // Load configuration
    let config = Config::load()?;
    let config = Arc::new(config);
    tracing::info!("Configuration loaded");

    // Initialize database
    let db = Database::new(&config.database.path).await?;
    db.run_migrations().await?;
    tracing::info!("Database initialized");

    // Initialize the pinning client
    let pinner: Arc<dyn Pinner> = match config.pinning.provider {
        PinningProvider::Pinata => {
            let pinata = PinataPinner::new(
                &config.pinning.api_key,
                &config.pinning.secret_api_key,
            )?;
            if !pinata.test_authentication().await {
                tracing::warn!("Pinata credentials rejected; pinning calls will fail");
            }
            Arc::new(pinata)
        }
        PinningProvider::Local => {
            tracing::info!("Pinning to local store at {}", config.pinning.local_path);
            Arc::new(LocalPinner::new(&config.pinning.local_path))
        }
    };

    // Initialize on-chain mint verification
    let verifier: Option<Arc<dyn MintVerifier>> = if config.chain.verify_mints {
        let verifier = RpcMintVerifier::new(&config.chain.rpc_url, &config.chain.contract_address)?;
        tracing::info!(
            "Verifying mints against {} via {}",
            config.chain.contract_address,
            config.chain.rpc_url
        );
        Some(Arc::new(verifier))
    } else {
        tracing::warn!("On-chain mint verification is disabled; confirmations trust the client");
        None
    };

    // Create app state
    let state = AppState {
        db,
        config: config.clone(),
        pinner,
        verifier,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
