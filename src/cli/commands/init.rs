use serde_json::json;
use tracing::info;

use crate::cli::utils::output_success;
use crate::cli::{Context, OutputFormat};
use crate::database::models::{Announcement, Device, User};
use crate::database::{DatabaseManager, Entity};

pub async fn handle(context: &Context, output_format: OutputFormat) -> anyhow::Result<()> {
    DatabaseManager::create_table::<Device>(&context.pool).await?;
    DatabaseManager::create_table::<Announcement>(&context.pool).await?;
    DatabaseManager::create_table::<User>(&context.pool).await?;

    let tables = [Device::TABLE, Announcement::TABLE, User::TABLE];
    info!(?tables, "Tables initialized");

    output_success(
        &output_format,
        &format!("Initialized tables: {}", tables.join(", ")),
        Some(json!({ "tables": tables })),
    )
}
