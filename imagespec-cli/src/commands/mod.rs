//! Commands module
//!
//! Defines all CLI commands and routes them to their handlers.

mod image;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the globally unique identifier of an image
    Id {
        /// Image name
        name: String,
    },
    /// Show an image record
    Get {
        /// Image name
        name: String,
    },
    /// Create or update an image record
    Save {
        /// Image name
        name: String,

        /// JSON file with the full record (replaces the stored fields)
        #[arg(short, long)]
        file: Option<String>,

        /// Driver URL of the image location
        #[arg(long)]
        driver_url: Option<String>,

        /// Driver-side image id (e.g., an AMI id)
        #[arg(long)]
        image_id: Option<String>,

        /// Bootstrap options as key=value pairs (values may be JSON)
        #[arg(short, long, value_parser = image::parse_key_val)]
        bootstrap: Vec<(String, String)>,

        /// Extra top-level attributes as key=value pairs (values may be JSON)
        #[arg(short, long, value_parser = image::parse_key_val)]
        attr: Vec<(String, String)>,
    },
    /// Delete an image record
    Delete {
        /// Image name
        name: String,
    },
}

/// Handle a CLI command
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Id { name } => image::print_id(config, &name),
        Commands::Get { name } => image::get_image(config, &name).await,
        Commands::Save {
            name,
            file,
            driver_url,
            image_id,
            bootstrap,
            attr,
        } => {
            let changes = image::ImageChanges {
                file,
                driver_url,
                image_id,
                bootstrap,
                attributes: attr,
            };
            image::save_image(config, &name, changes).await
        }
        Commands::Delete { name } => image::delete_image(config, &name).await,
    }
}
