use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{Level, info};

use learnlogix_server::config::AppConfig;
use learnlogix_server::events::EventHub;
use learnlogix_server::mailer::{Mailer, SmtpMailer};
use learnlogix_server::state::AppState;
use learnlogix_server::storage::ImageStore;
use learnlogix_server::storage::s3::S3ImageStore;
use learnlogix_server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = database::init_db(&config.database.url).await?;
    seed::ensure_admin(&db, &config.auth).await?;

    let images: Arc<dyn ImageStore> = Arc::new(S3ImageStore::from_config(&config.storage)?);
    let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::from_config(&config.mail)?);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState {
        db,
        images,
        mailer,
        events: EventHub::new(),
        config: Arc::new(config),
    };

    let app = build_router(state);

    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
