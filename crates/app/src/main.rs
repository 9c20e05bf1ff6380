use chrono_tz::Tz;
use migration::{Migrator, MigratorTrait};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "fleetbook={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;
    let engine = build_engine(db, &settings.engine).await?;

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(engine, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let database = sea_orm::Database::connect(config.url()).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}

async fn build_engine(
    db: sea_orm::DatabaseConnection,
    config: &settings::EngineSettings,
) -> Result<engine::Engine, Box<dyn std::error::Error + Send + Sync>> {
    let mut builder = engine::Engine::builder()
        .database(db)
        .cancel_policy(config.cancel_policy)
        .reassign_policy(config.reassign_policy)
        .assignment_guard(config.assignment_guard);
    if let Some(name) = config.timezone.as_deref() {
        let tz: Tz = name
            .parse()
            .map_err(|err| format!("invalid timezone {name:?}: {err}"))?;
        builder = builder.timezone(tz);
    }
    if let Some(prefix) = config.invoice_prefix.as_deref() {
        builder = builder.invoice_prefix(prefix);
    }

    let engine = builder.build().await?;
    tracing::info!(
        timezone = %engine.timezone(),
        cancel_policy = %engine.cancel_policy(),
        reassign_policy = %engine.reassign_policy(),
        assignment_guard = %engine.assignment_guard(),
        "engine ready"
    );
    Ok(engine)
}
