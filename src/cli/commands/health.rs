use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::{Context, OutputFormat};

pub async fn handle(context: &Context, output_format: OutputFormat) -> anyhow::Result<()> {
    context.manager.health_check().await?;
    output_success(&output_format, "Database is reachable", Some(json!({ "healthy": true })))
}
