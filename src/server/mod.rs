pub mod app;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod response;

use anyhow::Result;
use clap::Subcommand;
use sea_orm_migration::prelude::*;
use tracing::info;

use crate::config::AppConfig;
use crate::database::{connection::*, migrations::Migrator, seed_data};

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    let database_url = get_database_url(Some(&config.database.path));
    let db = establish_connection(&database_url).await?;
    setup_database(&db).await?;

    let port = config.server.port;
    info!(
        "Environment: {}, compatibility policy: {}",
        config.environment, config.compatibility.policy
    );
    let app = app::create_app(db, config).await?;

    log_routes();

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_routes() {
    info!("API Endpoints:");
    info!("  /health                                    - Health check");
    info!("  /api                                       - Endpoint catalogue");
    info!("  /api/openapi.json                          - OpenAPI document");
    info!("  /api/product-templates                     - Product templates");
    info!("  /api/option-categories                     - Option categories");
    info!("  /api/option-choices                        - Option choices and their rules");
    info!("  /api/compatibility-rules/:rule_id          - Rule activation and removal");
    info!("  /api/product-templates/:id/configurations/check - Configuration evaluation");
}

pub async fn migrate_database(database_path: &str, direction: MigrateDirection) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    match direction {
        MigrateDirection::Up => {
            info!("Running migrations up");
            Migrator::up(&db, None).await?;
        }
        MigrateDirection::Down => {
            info!("Running migrations down");
            Migrator::down(&db, None).await?;
        }
        MigrateDirection::Fresh => {
            info!("Running fresh migrations (down then up)");
            Migrator::down(&db, None).await?;
            Migrator::up(&db, None).await?;
        }
    }

    info!("Database migration completed");
    Ok(())
}

pub async fn seed_database(database_path: &str) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;
    setup_database(&db).await?;

    seed_data::create_example_catalog(&db).await?;
    Ok(())
}
