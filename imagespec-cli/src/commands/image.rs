//! Image command handlers
//!
//! Fetching, saving and deleting image records.

use anyhow::{Context, Result};
use colored::*;
use imagespec_client::{ChefImageSpec, DataBagStore};
use imagespec_core::domain::image::{ImageData, ImageLocation};
use serde_json::Value as JsonValue;
use tracing::info;

use crate::config::Config;

/// Field changes requested by `save`
#[derive(Debug, Default)]
pub struct ImageChanges {
    pub file: Option<String>,
    pub driver_url: Option<String>,
    pub image_id: Option<String>,
    pub bootstrap: Vec<(String, String)>,
    pub attributes: Vec<(String, String)>,
}

/// Parse a single key=value pair
pub fn parse_key_val(s: &str) -> Result<(String, String)> {
    let pos = s
        .find('=')
        .ok_or_else(|| anyhow::anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Interpret a flag value as JSON, falling back to a plain string
fn parse_value(raw: &str) -> JsonValue {
    serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()))
}

/// Print the identifier of an image
pub fn print_id(config: &Config, name: &str) -> Result<()> {
    println!("{}", ChefImageSpec::id_from(&config.server, name));
    Ok(())
}

/// Show an image record
pub async fn get_image(config: &Config, name: &str) -> Result<()> {
    match ChefImageSpec::get(name, &config.server).await? {
        Some(spec) => print_image(&spec)?,
        None => println!("{}", format!("Image {} not found.", name).yellow()),
    }
    Ok(())
}

/// Create or update an image record
pub async fn save_image(config: &Config, name: &str, changes: ImageChanges) -> Result<()> {
    let mut spec = match &changes.file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read image file: {}", path))?;
            let mut data: ImageData = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse image file: {}", path))?;
            data.id = name.to_string();
            ChefImageSpec::new(data, config.server.clone())
        }
        None => ChefImageSpec::get(name, &config.server)
            .await?
            .unwrap_or_else(|| ChefImageSpec::empty(name, config.server.clone())),
    };

    apply_changes(&mut spec, changes);

    let store = DataBagStore::new();
    spec.save(&store).await?;
    info!(image = name, "Saved image record");

    println!("{}", "✓ Image saved successfully!".green().bold());
    println!("  ID:     {}", spec.id().cyan());
    Ok(())
}

/// Delete an image record
pub async fn delete_image(config: &Config, name: &str) -> Result<()> {
    let spec = ChefImageSpec::empty(name, config.server.clone());
    spec.delete(&DataBagStore::new()).await?;

    println!("{}", format!("✓ Image {} deleted.", name).green().bold());
    Ok(())
}

fn apply_changes(spec: &mut ChefImageSpec, changes: ImageChanges) {
    if changes.driver_url.is_some() || changes.image_id.is_some() {
        let mut location = spec.location().cloned().unwrap_or_default();
        if let Some(driver_url) = changes.driver_url {
            location.driver_url = Some(driver_url);
        }
        if let Some(image_id) = changes.image_id {
            location.image_id = Some(image_id);
        }
        spec.set_location(location);
    }

    if !changes.bootstrap.is_empty() {
        let mut options = spec.machine_options().cloned().unwrap_or_default();
        for (key, value) in changes.bootstrap {
            options.set_bootstrap_option(key, parse_value(&value));
        }
        spec.set_machine_options(options);
    }

    for (key, value) in changes.attributes {
        spec.image_data_mut()
            .attributes
            .insert(key, parse_value(&value));
    }
}

fn print_image(spec: &ChefImageSpec) -> Result<()> {
    println!("{} {}", "▸".cyan(), spec.name().bold());
    println!("  ID:         {}", spec.id().dimmed());
    println!(
        "  Driver:     {}",
        spec.driver_url().unwrap_or("-").to_string().dimmed()
    );
    println!(
        "  Image:      {}",
        spec.location()
            .and_then(|l: &ImageLocation| l.image_id.as_deref())
            .unwrap_or("-")
            .dimmed()
    );
    println!();
    println!("{}", serde_json::to_string_pretty(spec.image_data())?);
    Ok(())
}
