use anyhow::Context;

use grocer_api::app::{AppServices, build_app};
use grocer_infra::{AppConfig, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    grocer_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let services = match &config.database {
        Some(database) => {
            let pool = db::connect(database)
                .await
                .context("failed to connect to database")?;
            db::migrate(&pool).await.context("failed to run migrations")?;
            tracing::info!("using persistent stores");
            AppServices::persistent(pool, config.ledger)
        }
        None => {
            tracing::info!("using in-memory stores");
            AppServices::in_memory(config.ledger)
        }
    };

    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
