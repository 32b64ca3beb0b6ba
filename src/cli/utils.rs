use std::convert::Infallible;

use serde_json::{json, Map, Value};

use crate::cli::OutputFormat;
use crate::database::models::Device;
use crate::json::QueryValue;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = Map::new();
            response.insert("success".to_string(), json!(true));
            response.insert("message".to_string(), json!(message));

            if let Some(Value::Object(fields)) = data {
                response.extend(fields);
            }

            println!("{}", serde_json::to_string_pretty(&Value::Object(response))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output a list of devices, one line each in text mode
pub fn output_devices(output_format: &OutputFormat, devices: &[Device]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "devices": device_values(devices) }))?);
        }
        OutputFormat::Text => {
            if devices.is_empty() {
                println!("No devices found");
            }
            for device in devices {
                println!("{}", device_line(device));
            }
        }
    }
    Ok(())
}

pub fn output_device(output_format: &OutputFormat, device: &Device) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "device": device_value(device) }))?);
        }
        OutputFormat::Text => println!("{}", device_line(device)),
    }
    Ok(())
}

fn device_line(device: &Device) -> String {
    let id = device.id.map_or_else(|| "-".to_string(), |id| id.to_string());
    format!("{:>6}  {}  {}", id, device.name, device.properties)
}

fn device_value(device: &Device) -> Value {
    json!({
        "id": device.id,
        "name": device.name,
        "properties": Value::Object(device.properties()),
    })
}

fn device_values(devices: &[Device]) -> Vec<Value> {
    devices.iter().map(device_value).collect()
}

/// Properties given on the command line; absent means an empty object
pub fn parse_properties(raw: Option<&str>) -> anyhow::Result<Map<String, Value>> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(anyhow::anyhow!("Properties must be a JSON object, got: {}", other)),
    }
}

/// `--text` keeps the literal as a string instead of interpreting it
pub fn parse_query_value(raw: &str, force_text: bool) -> QueryValue {
    if force_text {
        return QueryValue::Text(raw.to_string());
    }
    raw.parse().unwrap_or_else(|never: Infallible| match never {})
}
