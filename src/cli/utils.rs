use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::database::PgStore;

/// Output a success message in the appropriate format; the fields of `data`
/// are merged into the JSON envelope
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print `value` as JSON, or hand it to `text` for the human-readable form
pub fn output_value<T, F>(output_format: &OutputFormat, value: &T, text: F) -> anyhow::Result<()>
where
    T: Serialize,
    F: FnOnce(&T),
{
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}

/// Connect to the database named by DATABASE_URL (a `.env` file is honored)
pub async fn connect() -> anyhow::Result<PgStore> {
    let _ = dotenvy::dotenv();
    Ok(PgStore::connect().await?)
}
