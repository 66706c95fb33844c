use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aramiyot::{
    api::routes::{self, AppState},
    config::Config,
    flows::Flows,
    services::genai_client::GenAiClient,
    storage::{self, SeaOrmBoardRepository},
};

#[derive(Parser, Debug)]
#[command(name = "aramiyot", about = "Aramiyot wellness service")]
struct Args {
    /// Config file to read instead of ~/.aramiyot/config
    #[arg(long)]
    config: Option<String>,

    /// Port to listen on, overriding the configured one
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Load config
    let mut config = Config::load_from(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server_port = port;
    }

    // Initialize tracing; RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.genai_api_key.is_none() {
        tracing::warn!("No generative backend API key configured; AI requests may be rejected");
    }

    // Initialize database
    let db_conn = storage::init_db(&config.database_url).await?;
    let boards = Arc::new(SeaOrmBoardRepository::new(db_conn));

    // Generative backend shared by every flow
    let backend = Arc::new(GenAiClient::new(
        config.model_endpoint(),
        config.genai_api_key.clone(),
    ));
    let flows = Arc::new(Flows::new(backend));

    let port = config.server_port;
    let model = config.genai_model.clone();
    let state = AppState::new(config, flows, boards);

    // Forget idle rate-limit buckets
    let limiter = state.limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            limiter.cleanup_expired();
        }
    });

    let app = routes::create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Generative model: {}", model);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
