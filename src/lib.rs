pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use std::path::PathBuf;

use anyhow::Context;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::config::{ImportSettings, Settings};
use crate::core::{state::AppState, telemetry, time::primitive_now_utc};
use crate::db::types::SourceType;
use crate::services::json_import::{self, ImportReport};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await.context("failed to open database")?;
    db::run_migrations(&db_pool).await.context("failed to apply migrations")?;

    let state = AppState::new(settings, db_pool);
    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        "Edumate API listening"
    );

    axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await?;

    state.db().close().await;
    tracing::info!("Database pool closed");
    Ok(())
}

/// Arguments of the headless `edumate-import` command.
#[derive(Debug)]
pub struct ImportArgs {
    pub file: PathBuf,
    pub document_id: Option<String>,
    pub source_uri: Option<String>,
}

/// Imports one JSON file and prints the report to stdout. Returns whether any
/// content was imported.
pub async fn run_import(args: ImportArgs) -> anyhow::Result<bool> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;

    let pool = db::init_pool(&settings).await.context("failed to open database")?;
    db::run_migrations(&pool).await.context("failed to apply migrations")?;

    let raw = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let source_uri = args.source_uri.unwrap_or_else(|| args.file.display().to_string());
    let report = import_payload(
        &pool,
        settings.import(),
        &raw,
        args.document_id.as_deref(),
        &source_uri,
    )
    .await?;
    let succeeded = report.succeeded();

    let body = json_import::ImportReportBody::from(report);
    println!("{}", serde_json::to_string_pretty(&body)?);

    pool.close().await;
    Ok(succeeded)
}

/// Validates the payload, registers a document for it when none is given and
/// runs the import. A rejected payload leaves the store untouched.
async fn import_payload(
    pool: &SqlitePool,
    settings: &ImportSettings,
    raw: &str,
    document_id: Option<&str>,
    source_uri: &str,
) -> anyhow::Result<ImportReport> {
    let value = json_import::parse_payload(settings, raw).context("import payload rejected")?;

    let document_id = match document_id {
        Some(id) => id.to_string(),
        None => {
            let user = core::bootstrap::ensure_default_user(pool, settings).await?;
            let document = repositories::documents::create(
                pool,
                repositories::documents::CreateDocument {
                    id: &Uuid::new_v4().to_string(),
                    user_id: &user.id,
                    source_uri,
                    source_type: SourceType::Text,
                    text_content: None,
                    uploaded_at: primitive_now_utc(),
                },
            )
            .await
            .context("failed to register document for import")?;
            tracing::info!(document_id = %document.id, source_uri, "Registered document for import");
            document.id
        }
    };

    json_import::import_value(pool, settings, &document_id, &value)
        .await
        .with_context(|| format!("import into document {document_id} failed"))
}
