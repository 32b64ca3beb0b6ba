use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_device, output_devices, output_success, parse_properties, parse_query_value};
use crate::cli::{Context, OutputFormat};
use crate::database::models::DeviceRepository;
use crate::services::{DeviceDto, DeviceService};

#[derive(Subcommand)]
pub enum DeviceCommands {
    #[command(about = "Create a device")]
    Create {
        #[arg(long, help = "Device name")]
        name: String,
        #[arg(long, help = "Properties as a JSON object")]
        properties: Option<String>,
    },

    #[command(about = "Show a device")]
    Get {
        #[arg(help = "Device ID")]
        id: i64,
    },

    #[command(about = "Replace a device's name and properties")]
    Update {
        #[arg(help = "Device ID")]
        id: i64,
        #[arg(long, help = "Device name")]
        name: String,
        #[arg(long, help = "Properties as a JSON object")]
        properties: Option<String>,
    },

    #[command(about = "Delete a device")]
    Delete {
        #[arg(help = "Device ID")]
        id: i64,
    },

    #[command(about = "Search device names and property values")]
    Search {
        #[arg(help = "Text to look for, case-insensitive")]
        text: String,
    },

    #[command(about = "Devices having a property key at any depth")]
    HasKey {
        #[arg(help = "Property key")]
        key: String,
    },

    #[command(about = "Devices whose property key equals a value")]
    Find {
        #[arg(help = "Property key")]
        key: String,
        #[arg(help = "Value: null, true/false, a number, or text")]
        value: String,
        #[arg(long, help = "Treat the value as text")]
        text: bool,
    },

    #[command(about = "First device whose property key equals a value")]
    First {
        #[arg(help = "Property key")]
        key: String,
        #[arg(help = "Value: null, true/false, a number, or text")]
        value: String,
        #[arg(long, help = "Treat the value as text")]
        text: bool,
    },

    #[command(about = "Whether any device's property key equals a value")]
    Exists {
        #[arg(help = "Property key")]
        key: String,
        #[arg(help = "Value: null, true/false, a number, or text")]
        value: String,
        #[arg(long, help = "Treat the value as text")]
        text: bool,
    },

    #[command(about = "Count devices having a property key")]
    CountKey {
        #[arg(help = "Property key")]
        key: String,
    },
}

pub async fn handle(cmd: DeviceCommands, context: &Context, output_format: OutputFormat) -> anyhow::Result<()> {
    let service = DeviceService::new(context.factory().create::<DeviceRepository>()?);

    match cmd {
        DeviceCommands::Create { name, properties } => {
            let dto = DeviceDto { name, properties: parse_properties(properties.as_deref())? };
            let device = service.create_device(dto).await?;
            output_device(&output_format, &device)
        }
        DeviceCommands::Get { id } => match service.get_device(id).await? {
            Some(device) => output_device(&output_format, &device),
            None => Err(anyhow::anyhow!("Device {} not found", id)),
        },
        DeviceCommands::Update { id, name, properties } => {
            let dto = DeviceDto { name, properties: parse_properties(properties.as_deref())? };
            match service.update_device(id, dto).await? {
                Some(device) => output_device(&output_format, &device),
                None => Err(anyhow::anyhow!("Device {} not found", id)),
            }
        }
        DeviceCommands::Delete { id } => {
            if !service.delete_device(id).await? {
                return Err(anyhow::anyhow!("Device {} not found", id));
            }
            output_success(&output_format, &format!("Device {} deleted", id), Some(json!({ "id": id })))
        }
        DeviceCommands::Search { text } => {
            let devices = service.search_devices(&text).await?;
            output_devices(&output_format, &devices)
        }
        DeviceCommands::HasKey { key } => {
            let devices = service.devices_with_property(&key).await?;
            output_devices(&output_format, &devices)
        }
        DeviceCommands::Find { key, value, text } => {
            let devices = service.find_by_property(&key, parse_query_value(&value, text)).await?;
            output_devices(&output_format, &devices)
        }
        DeviceCommands::First { key, value, text } => {
            match service.first_by_property(&key, parse_query_value(&value, text)).await? {
                Some(device) => output_device(&output_format, &device),
                None => output_devices(&output_format, &[]),
            }
        }
        DeviceCommands::Exists { key, value, text } => {
            let value = parse_query_value(&value, text);
            let exists = service.has_property_value(&key, value.clone()).await?;
            output_success(
                &output_format,
                &format!("{} = {}: {}", key, value, if exists { "found" } else { "not found" }),
                Some(json!({ "exists": exists })),
            )
        }
        DeviceCommands::CountKey { key } => {
            let count = service.count_with_property(&key).await?;
            output_success(
                &output_format,
                &format!("{} device(s) have '{}'", count, key),
                Some(json!({ "count": count })),
            )
        }
    }
}
